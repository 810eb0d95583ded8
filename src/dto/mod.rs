//! Wire types of the HTTP and SSE surface.

use std::time::SystemTime;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// `GET /healthcheck` body.
pub mod health;
/// Leaderboard and personal-best views.
pub mod leaderboard;
/// Client-facing phase names.
pub mod phase;
/// Session requests, snapshots and move results.
pub mod session;
/// Server-sent event payloads.
pub mod sse;
/// Custom `validator` rules.
pub mod validation;

/// Render a stored timestamp as RFC 3339 in UTC.
fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("invalid-timestamp"))
}
