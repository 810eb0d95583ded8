/// Per-epoch task ticking a running round clock.
pub mod clock_driver;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard and personal best reads.
pub mod leaderboard_service;
/// Recording of final scores.
pub mod score_service;
/// Eviction of sessions left idle past their TTL.
pub mod session_reaper;
/// Session operations behind the per-session lock.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Score store connection supervisor with reconnect backoff.
pub mod storage_supervisor;
