use super::Bucket;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use serde::Serialize;

/// The two independent notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The bucket covering "now" holds more than its upper boundary.
    UpperExceeded,

    /// The bucket covering "now" holds less than its lower boundary, or no bucket covers "now".
    LowerNotMet,
}

impl Channel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UpperExceeded => "upper boundary exceeded",
            Self::LowerNotMet => "lower boundary not met",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Threshold state of one bucket at the moment a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketStatus {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total: u64,
    pub lower_boundary: u32,
    pub upper_boundary: u32,
}

impl From<&Bucket> for BucketStatus {
    fn from(bucket: &Bucket) -> Self {
        Self {
            from: bucket.from(),
            to: bucket.to(),
            total: bucket.total(),
            lower_boundary: bucket.lower_boundary(),
            upper_boundary: bucket.upper_boundary(),
        }
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub channel: Channel,

    /// The instant the state was evaluated at.
    pub now: DateTime<Utc>,

    /// The bucket covering `now`, if any.
    pub bucket: Option<BucketStatus>,
}

/// Receives notifications synchronously on the thread that called
/// [`ThroughputMonitor::record`](super::ThroughputMonitor::record).
pub trait Listener: Send + Sync {
    fn notify(&self, notification: &Notification);
}

impl<F> Listener for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn notify(&self, notification: &Notification) {
        self(notification);
    }
}

/// Which channels fired for a single `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Crossings {
    pub upper_exceeded: bool,
    pub lower_not_met: bool,
}

impl Crossings {
    /// Returns `true` if nothing fired.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.upper_exceeded && !self.lower_not_met
    }

    /// The channels that fired, upper before lower.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        [
            self.upper_exceeded.then_some(Channel::UpperExceeded),
            self.lower_not_met.then_some(Channel::LowerNotMet),
        ]
        .into_iter()
        .flatten()
    }
}
