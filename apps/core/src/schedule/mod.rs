//! # Schedule Module
//!
//! Conflict-checked weekly schedules, one per user identifier.
//!
//! ## Components
//! - `time_block`: `"LU 645-815"` parsing and readable formatting
//! - `store`: per-user subject map + day grid, conflicts, display, ranking
//! - `pending`: options offered to a user and the selection commit

pub mod pending;
pub mod store;
pub mod time_block;

pub use pending::{CommitOutcome, PendingSelection};
pub use store::{Enrollment, GridEntry, RankedOption, Schedule, ScheduleRejection, ScheduleStore};
pub use time_block::{format_readable, parse_time_block, TimeBlock, Weekday};
