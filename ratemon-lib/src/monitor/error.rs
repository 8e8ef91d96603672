use chrono::{DateTime, Utc};
use thiserror::Error;

/// Returned when a sample is recorded at an instant no bucket covers.
///
/// The window may still come to cover the instant after enough rotations, so
/// callers decide whether to drop, log, or retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no bucket covers {timestamp}")]
pub struct NotCoveredError {
    pub timestamp: DateTime<Utc>,
}
