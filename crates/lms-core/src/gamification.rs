//! XP, levels, streaks, badges and challenges.
//!
//! The HTTP layer loads a learner's counters, feeds them through these
//! functions after an activity, and writes the results back in the same
//! transaction.

use std::{fmt, str::FromStr};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// XP unit of the level curve: level `L` starts at `100 * (L - 1)^2` XP.
pub const XP_LEVEL_UNIT: i64 = 100;

/// A stored name that matches no variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Level reached with `total_xp` (levels start at 1).
pub fn level_for_xp(total_xp: i64) -> i32 {
    let units = total_xp.max(0) / XP_LEVEL_UNIT;
    let mut level = (units as f64).sqrt() as i64;

    // Float rounding can be off by one on large inputs.
    while level * level > units {
        level -= 1;
    }
    while (level + 1) * (level + 1) <= units {
        level += 1;
    }

    i32::try_from(level + 1).unwrap_or(i32::MAX)
}

/// Total XP at which `level` starts.
pub fn xp_for_level(level: i32) -> i64 {
    let steps = i64::from(level.max(1) - 1);
    XP_LEVEL_UNIT * steps * steps
}

/// Where a learner stands on the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current level
    pub level: i32,
    /// Lifetime XP
    pub total_xp: i64,
    /// XP at which the current level started
    pub current_level_xp: i64,
    /// XP at which the next level starts
    pub next_level_xp: i64,
    /// Share of the current level completed, 0 to 100
    pub progress_percentage: f64,
}

/// Level and progress towards the next one for `total_xp`.
pub fn level_progress(total_xp: i64) -> LevelProgress {
    let level = level_for_xp(total_xp);
    let current_level_xp = xp_for_level(level);
    let next_level_xp = xp_for_level(level + 1);
    let span = (next_level_xp - current_level_xp).max(1);

    LevelProgress {
        level,
        total_xp,
        current_level_xp,
        next_level_xp,
        progress_percentage: (total_xp.max(0) - current_level_xp) as f64 / span as f64 * 100.0,
    }
}

/// Daily activity streak, counted in UTC calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Consecutive active days, ending at `last_activity`
    pub current: i32,
    /// Best streak ever reached
    pub longest: i32,
    /// Last day with activity
    pub last_activity: Option<NaiveDate>,
}

impl Streak {
    /// Record activity on `today`.
    ///
    /// Same day keeps the streak, the following day extends it, and any gap
    /// (or a clock that went backwards) starts over at 1.
    pub fn record_activity(self, today: NaiveDate) -> Self {
        let current = match self.last_activity {
            Some(last) if last == today => self.current.max(1),
            Some(last) if last.checked_add_days(Days::new(1)) == Some(today) => self.current + 1,
            _ => 1,
        };

        Self {
            current,
            longest: self.longest.max(current),
            last_activity: Some(today),
        }
    }

    /// The streak as it stands on `today`, without recording activity.
    ///
    /// A streak whose last activity is older than yesterday has lapsed.
    pub fn as_of(self, today: NaiveDate) -> Self {
        let alive = self.last_activity.is_some_and(|last| {
            last == today || last.checked_add_days(Days::new(1)) == Some(today)
        });

        if alive {
            self
        } else {
            Self { current: 0, ..self }
        }
    }
}

/// Learner counters that badges and challenges are judged against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    /// Lifetime XP
    pub total_xp: i64,
    /// Distinct lessons completed
    pub lessons_completed: i32,
    /// Courses completed
    pub courses_completed: i32,
    /// Current streak in days
    pub current_streak: i32,
}

/// Learner statistic a badge threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCriterion {
    /// Distinct lessons completed
    LessonsCompleted,
    /// Courses completed
    CoursesCompleted,
    /// Current streak in days
    StreakDays,
    /// Lifetime XP
    TotalXp,
}

impl BadgeCriterion {
    /// Stored and wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::CoursesCompleted => "courses_completed",
            Self::StreakDays => "streak_days",
            Self::TotalXp => "total_xp",
        }
    }

    /// The statistic this criterion reads from `snapshot`.
    pub fn value(self, snapshot: &LearnerSnapshot) -> i64 {
        match self {
            Self::LessonsCompleted => i64::from(snapshot.lessons_completed),
            Self::CoursesCompleted => i64::from(snapshot.courses_completed),
            Self::StreakDays => i64::from(snapshot.current_streak),
            Self::TotalXp => snapshot.total_xp,
        }
    }
}

impl fmt::Display for BadgeCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeCriterion {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lessons_completed" => Ok(Self::LessonsCompleted),
            "courses_completed" => Ok(Self::CoursesCompleted),
            "streak_days" => Ok(Self::StreakDays),
            "total_xp" => Ok(Self::TotalXp),
            _ => Err(UnknownVariant {
                kind: "badge criterion",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for BadgeCriterion {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A badge the learner does not hold yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRule {
    /// Badge id
    pub badge_id: Uuid,
    /// Statistic compared with `threshold`
    pub criterion: BadgeCriterion,
    /// Minimum value that earns the badge
    pub threshold: i64,
    /// XP granted on award
    pub xp_bonus: i64,
}

/// Result of [`evaluate_badges`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeAwards {
    /// Badges earned, in award order
    pub badge_ids: Vec<Uuid>,
    /// Sum of their XP bonuses
    pub bonus_xp: i64,
    /// Snapshot with the bonuses applied
    pub snapshot: LearnerSnapshot,
}

/// Award every candidate badge whose criterion is met.
///
/// Bonus XP from one badge can unlock an XP badge, so evaluation repeats
/// until nothing new is earned. Each candidate is awarded at most once.
pub fn evaluate_badges(snapshot: LearnerSnapshot, candidates: &[BadgeRule]) -> BadgeAwards {
    let mut awards = BadgeAwards {
        snapshot,
        ..BadgeAwards::default()
    };
    let mut pending: Vec<&BadgeRule> = candidates.iter().collect();

    loop {
        let (earned, rest): (Vec<&BadgeRule>, Vec<&BadgeRule>) = pending
            .into_iter()
            .partition(|rule| rule.criterion.value(&awards.snapshot) >= rule.threshold);

        if earned.is_empty() {
            break;
        }

        for rule in earned {
            awards.badge_ids.push(rule.badge_id);
            awards.bonus_xp += rule.xp_bonus;
            awards.snapshot.total_xp += rule.xp_bonus;
        }
        pending = rest;
    }

    awards
}

/// What a challenge counts towards its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeMetric {
    /// Lessons completed while joined
    LessonsCompleted,
    /// XP earned while joined
    XpEarned,
    /// Current streak length
    StreakDays,
}

impl ChallengeMetric {
    /// Stored and wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::XpEarned => "xp_earned",
            Self::StreakDays => "streak_days",
        }
    }
}

impl fmt::Display for ChallengeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeMetric {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lessons_completed" => Ok(Self::LessonsCompleted),
            "xp_earned" => Ok(Self::XpEarned),
            "streak_days" => Ok(Self::StreakDays),
            _ => Err(UnknownVariant {
                kind: "challenge metric",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ChallengeMetric {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What a single activity contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityDelta {
    /// Lessons newly completed
    pub lessons_completed: i32,
    /// XP gained
    pub xp_earned: i64,
    /// Streak after the activity
    pub current_streak: i32,
}

/// Challenge standing after one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeProgress {
    /// New progress, capped at the target
    pub progress: i64,
    /// True only on the activity that crossed the target.
    pub completed_now: bool,
}

/// Advance a joined, not yet completed challenge by one activity.
///
/// Progress is capped at `target`.
pub fn advance_challenge(
    metric: ChallengeMetric,
    target: i64,
    progress: i64,
    delta: ActivityDelta,
) -> ChallengeProgress {
    let advanced = match metric {
        ChallengeMetric::LessonsCompleted => progress + i64::from(delta.lessons_completed),
        ChallengeMetric::XpEarned => progress + delta.xp_earned,
        ChallengeMetric::StreakDays => progress.max(i64::from(delta.current_streak)),
    };
    let progress = advanced.min(target);

    ChallengeProgress {
        progress,
        completed_now: progress >= target,
    }
}

/// Time window a leaderboard ranks XP over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    /// Lifetime XP
    #[default]
    All,
    /// XP earned over the last 7 days
    Weekly,
}
