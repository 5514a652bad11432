//! Dense ordering of sibling items.
//!
//! Modules within a course, lessons within a module and courses within a
//! series all carry a 1-based position that is unique per parent. These
//! helpers compute the writes needed to keep positions dense (`1..N`) without
//! ever producing two siblings with the same position while the writes are
//! being applied.

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

/// Lower bound of the temporary range used while reordering.
///
/// The effective base is raised to the current highest position when that is
/// larger, so temporary values never overlap an existing or final value.
pub const TEMPORARY_ORDER_BASE: i32 = 1000;

/// Why a reorder request or a compaction input was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// No ids were given
    #[error("ordered id list cannot be empty")]
    Empty,
    /// The same id was listed twice
    #[error("id {0} appears more than once in the ordered list")]
    DuplicateId(Uuid),
    /// The id is not a child of the parent
    #[error("id {0} does not belong to this parent")]
    UnknownId(Uuid),
    /// Some current children were left out
    #[error("ordered list is missing {missing} of the current items")]
    MissingIds {
        /// How many were left out
        missing: usize,
    },
    /// Compaction input was not in strictly ascending position order
    #[error("siblings must be sorted by ascending, unique position")]
    Unsorted,
}

/// An item and its current position under a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling {
    /// Item id
    pub id: Uuid,
    /// Current 1-based position
    pub position: i32,
}

impl From<(Uuid, i32)> for Sibling {
    fn from((id, position): (Uuid, i32)) -> Self {
        Self { id, position }
    }
}

/// A validated reorder request for one sibling set.
///
/// Applying [`ReorderPlan::temporary_positions`] and then
/// [`ReorderPlan::final_positions`] moves every item to its index in the
/// requested order. Each batch is collision free no matter in which order the
/// individual rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    ids: Vec<Uuid>,
    base: i32,
}

impl ReorderPlan {
    /// Validate `ordered_ids` against the current siblings.
    ///
    /// The list must be non-empty, free of duplicates, and name exactly the
    /// current sibling set.
    pub fn new(current: &[Sibling], ordered_ids: &[Uuid]) -> Result<Self, OrderingError> {
        if ordered_ids.is_empty() {
            return Err(OrderingError::Empty);
        }

        let known: HashSet<Uuid> = current.iter().map(|s| s.id).collect();
        let mut seen = HashSet::with_capacity(ordered_ids.len());

        for id in ordered_ids {
            if !known.contains(id) {
                return Err(OrderingError::UnknownId(*id));
            }
            if !seen.insert(*id) {
                return Err(OrderingError::DuplicateId(*id));
            }
        }

        if seen.len() != known.len() {
            return Err(OrderingError::MissingIds {
                missing: known.len() - seen.len(),
            });
        }

        let highest = current.iter().map(|s| s.position).max().unwrap_or(0);

        Ok(Self {
            ids: ordered_ids.to_vec(),
            base: TEMPORARY_ORDER_BASE.max(highest),
        })
    }

    /// First phase: `base + index + 1` for every item, in request order.
    pub fn temporary_positions(&self) -> Vec<(Uuid, i32)> {
        self.ids.iter().copied().zip(self.base + 1..).collect()
    }

    /// Second phase: `index + 1` for every item, in request order.
    pub fn final_positions(&self) -> Vec<(Uuid, i32)> {
        self.ids.iter().copied().zip(1..).collect()
    }
}

/// Writes that close the gaps left by a removed sibling.
///
/// `remaining` must be sorted by strictly ascending position. The returned
/// writes are in that same order and only include items whose position
/// changes. Applied one at a time in order, every write moves an item to a
/// slot at or below its current one that no other remaining item occupies.
pub fn compaction_plan(remaining: &[Sibling]) -> Result<Vec<(Uuid, i32)>, OrderingError> {
    if remaining.windows(2).any(|w| w[0].position >= w[1].position) {
        return Err(OrderingError::Unsorted);
    }

    Ok(remaining
        .iter()
        .zip(1..)
        .filter(|(sibling, target)| sibling.position != *target)
        .map(|(sibling, target)| (sibling.id, target))
        .collect())
}

/// Position for a newly appended item.
pub fn next_position(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |max| max + 1)
}
