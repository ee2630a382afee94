use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health check payloads.
pub mod health;
/// Game and match payloads.
pub mod matches;
/// Event and standings payloads.
pub mod member;
/// Lifecycle phase as exposed over HTTP.
pub mod phase;
/// Team balancing and override payloads.
pub mod team;
/// Input validation helpers.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
