//! URL slugs for courses and series.

use unicode_normalization::UnicodeNormalization;

/// Build a lowercase, ASCII, hyphen-separated slug from a title.
///
/// Accents are folded (`"Café"` becomes `"cafe"`), common ligatures are
/// expanded, and every run of other characters becomes a single hyphen.
/// Returns an empty string when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .replace('ß', "ss")
        .replace('æ', "ae")
        .replace('œ', "oe")
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric() || (!c.is_alphanumeric() && !is_combining(*c)))
        .collect();

    let mut slug = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Append a short suffix so a slug can be retried after a collision.
pub fn with_suffix(slug: &str, suffix: &str) -> String {
    if slug.is_empty() {
        suffix.to_string()
    } else {
        format!("{slug}-{suffix}")
    }
}

fn is_combining(c: char) -> bool {
    matches!(
        c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}
