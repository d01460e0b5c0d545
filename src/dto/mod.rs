use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Quiz bodies.
pub mod game;
/// Health endpoint body.
pub mod health;
/// Score and leaderboard bodies.
pub mod score;
/// Shared validation helpers.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
