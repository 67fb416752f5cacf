//! Pass-throughs to the ORM, one function per query the routes need.

pub mod addresses;
pub mod messages;
pub mod posts;
pub mod roles;
pub mod users;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

/// Offset window: `take` defaults to 20, clamped to 1..=100.
pub fn page(skip: Option<u64>, take: Option<u64>) -> (u64, u64) {
    (skip.unwrap_or(0), take.unwrap_or(20).clamp(1, 100))
}
