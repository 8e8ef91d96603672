//! Rolling-window throughput monitoring.
//!
//! A [`ThroughputMonitor`] owns an ordered, contiguous run of [`Bucket`]s, each
//! covering a half-open window `(from, to]` with its own lower and upper
//! threshold. Amounts are recorded into the bucket that owns their timestamp,
//! and after every successful recording the bucket covering "now" (as reported
//! by the injected [`Clock`]) is checked against its thresholds. Listeners
//! subscribed to the two channels are notified synchronously.
//!
//! # Rotation
//!
//! [`ThroughputMonitor::rotate`] evicts the oldest bucket and appends an empty
//! copy of it shifted forward by the rotation period (one day by default), so
//! the window slides forward while keeping per-time-of-day thresholds. A
//! [`Rotator`] drives this from a tokio task at a fixed cadence.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use ratemon_lib::monitor::{Bucket, FixedClock, Notification, ThroughputMonitor};
//! use std::sync::Arc;
//!
//! let start = Utc.with_ymd_and_hms(2018, 1, 18, 12, 0, 0).unwrap();
//! let buckets = vec![
//!     Bucket::new(start, start + TimeDelta::minutes(30), 5, 15),
//!     Bucket::new(start + TimeDelta::minutes(30), start + TimeDelta::minutes(60), 6, 18),
//! ];
//!
//! let clock = Arc::new(FixedClock::new(start + TimeDelta::minutes(10)));
//! let monitor = ThroughputMonitor::new(buckets, clock);
//! monitor.on_upper_exceeded(|n: &Notification| println!("{}", n.channel));
//!
//! let crossings = monitor.record(20, start + TimeDelta::minutes(5)).unwrap();
//! assert!(crossings.upper_exceeded);
//! assert!(monitor.currently_exceeding_upper());
//! ```

mod bucket;
mod clock;
mod error;
mod notification;
mod rotator;
mod throughput_monitor;

pub use bucket::{Bucket, Sample};
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::NotCoveredError;
pub use notification::{BucketStatus, Channel, Crossings, Listener, Notification};
pub use rotator::{DEFAULT_ROTATION_INTERVAL, Rotator};
pub use throughput_monitor::{DEFAULT_ROTATION_PERIOD, ThroughputMonitor};
