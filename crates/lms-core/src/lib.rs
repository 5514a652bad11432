//! Domain logic for the course platform.
//!
//! Everything in this crate is free of I/O: the database and HTTP layers load
//! state, hand it to these functions, and persist whatever plan comes back.
//!
//! - [`ordering`]: dense sibling positions (reorder and compaction plans)
//! - [`graph`]: guards for prerequisite and relation edges between courses
//! - [`gamification`]: XP, levels, streaks, badge criteria and challenges
//! - [`slug`]: URL slugs derived from titles

pub mod gamification;
pub mod graph;
pub mod ordering;
pub mod slug;
