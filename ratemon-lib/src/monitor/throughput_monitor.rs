use super::{Bucket, BucketStatus, Channel, Clock, Crossings, Listener, Notification, NotCoveredError};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

const LOG_TARGET: &str = "   monitor";

/// How far an evicted bucket is shifted forward unless configured otherwise.
pub const DEFAULT_ROTATION_PERIOD: TimeDelta = TimeDelta::days(1);

/// Tracks amounts recorded against a sliding window of contiguous buckets and
/// raises notifications when the bucket covering "now" crosses its thresholds.
///
/// The initial buckets must be ordered by `from`, contiguous and
/// non-overlapping. This is not checked; with overlapping buckets the earliest
/// matching bucket wins.
///
/// Lookup, recording, state evaluation and rotation all run under one lock, so
/// a [`Rotator`](super::Rotator) can rotate the window while other threads
/// record into it. Listeners are invoked after that lock is released, still on
/// the recording thread.
pub struct ThroughputMonitor {
    buckets: Mutex<VecDeque<Bucket>>,
    clock: Arc<dyn Clock>,
    rotation_period: TimeDelta,
    upper_exceeded_listeners: RwLock<Vec<Arc<dyn Listener>>>,
    lower_not_met_listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl core::fmt::Debug for ThroughputMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThroughputMonitor")
            .field("buckets", &self.buckets)
            .field("clock", &"<dyn Clock>")
            .field("rotation_period", &self.rotation_period)
            .field("upper_exceeded_listeners", &self.listener_count(Channel::UpperExceeded))
            .field("lower_not_met_listeners", &self.listener_count(Channel::LowerNotMet))
            .finish()
    }
}

impl ThroughputMonitor {
    /// Create a monitor over `buckets` with the default one-day rotation period.
    pub fn new(buckets: impl IntoIterator<Item = Bucket>, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(buckets.into_iter().collect()),
            clock,
            rotation_period: DEFAULT_ROTATION_PERIOD,
            upper_exceeded_listeners: RwLock::new(Vec::new()),
            lower_not_met_listeners: RwLock::new(Vec::new()),
        }
    }

    /// Override the distance an evicted bucket is shifted by on rotation.
    #[must_use]
    pub fn with_rotation_period(mut self, rotation_period: TimeDelta) -> Self {
        self.rotation_period = rotation_period;
        self
    }

    #[must_use]
    pub const fn rotation_period(&self) -> TimeDelta {
        self.rotation_period
    }

    /// Subscribe to the "upper boundary exceeded" channel.
    pub fn on_upper_exceeded(&self, listener: impl Listener + 'static) {
        self.listeners(Channel::UpperExceeded)
            .write()
            .expect("lock poisoned")
            .push(Arc::new(listener));
    }

    /// Subscribe to the "lower boundary not met" channel.
    pub fn on_lower_not_met(&self, listener: impl Listener + 'static) {
        self.listeners(Channel::LowerNotMet)
            .write()
            .expect("lock poisoned")
            .push(Arc::new(listener));
    }

    /// A copy of the bucket whose `(from, to]` contains `timestamp`.
    #[must_use]
    pub fn find_bucket(&self, timestamp: DateTime<Utc>) -> Option<Bucket> {
        let buckets = self.buckets.lock().expect("lock poisoned");
        position(&buckets, timestamp).map(|index| buckets[index].clone())
    }

    /// A copy of the bucket covering the clock's current instant.
    #[must_use]
    pub fn current_bucket(&self) -> Option<Bucket> {
        self.find_bucket(self.clock.now())
    }

    /// A copy of every bucket, oldest first.
    #[must_use]
    pub fn buckets(&self) -> Vec<Bucket> {
        self.buckets.lock().expect("lock poisoned").iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.lock().expect("lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `amount` into the bucket covering `timestamp`, then evaluate the
    /// bucket covering "now" and notify the listeners of every channel it trips.
    ///
    /// "Now" comes from the clock, so a notification reflects the current bucket
    /// even when the sample landed in a different one.
    ///
    /// # Errors
    ///
    /// Returns [`NotCoveredError`] if no bucket covers `timestamp`; nothing is recorded.
    pub fn record(&self, amount: u32, timestamp: DateTime<Utc>) -> Result<Crossings, NotCoveredError> {
        let (now, status, crossings) = {
            let mut buckets = self.buckets.lock().expect("lock poisoned");

            let index = position(&buckets, timestamp).ok_or(NotCoveredError { timestamp })?;
            buckets[index].record(amount, timestamp);
            log::trace!(target: LOG_TARGET, "Recorded {amount} at {timestamp} into bucket ending {}", buckets[index].to());

            let now = self.clock.now();
            let current = position(&buckets, now).map(|index| &buckets[index]);
            let crossings = Crossings {
                upper_exceeded: current.is_some_and(Bucket::upper_exceeded),
                lower_not_met: current.is_none_or(Bucket::lower_not_met),
            };

            (now, current.map(BucketStatus::from), crossings)
        };

        for channel in crossings.channels() {
            self.dispatch(&Notification {
                channel,
                now,
                bucket: status,
            });
        }

        Ok(crossings)
    }

    /// Whether the bucket covering "now" holds more than its upper boundary.
    ///
    /// Returns `false` when no bucket covers "now".
    #[must_use]
    pub fn currently_exceeding_upper(&self) -> bool {
        let now = self.clock.now();
        let buckets = self.buckets.lock().expect("lock poisoned");
        position(&buckets, now).is_some_and(|index| buckets[index].upper_exceeded())
    }

    /// Whether the bucket covering "now" holds at least its lower boundary.
    ///
    /// Returns `false` when no bucket covers "now": missing data reads as not
    /// meeting the lower boundary.
    #[must_use]
    pub fn currently_meeting_lower(&self) -> bool {
        let now = self.clock.now();
        let buckets = self.buckets.lock().expect("lock poisoned");
        position(&buckets, now).is_some_and(|index| !buckets[index].lower_not_met())
    }

    /// Evict the oldest bucket and append its successor, one rotation period
    /// later with the same thresholds and no samples.
    ///
    /// Returns the evicted bucket, or `None` if nothing was rotated: the monitor
    /// holds no buckets, or the successor's boundaries would leave the
    /// representable time range. In the latter case the window is left as it was.
    pub fn rotate(&self) -> Option<Bucket> {
        let mut buckets = self.buckets.lock().expect("lock poisoned");

        let Some(oldest) = buckets.front() else {
            log::debug!(target: LOG_TARGET, "Nothing to rotate, the monitor holds no buckets");
            return None;
        };

        let Some(successor) = oldest.shifted(self.rotation_period) else {
            log::warn!(
                target: LOG_TARGET,
                "Cannot rotate ({}, {}] forward by {}, the result is out of range; keeping the window unchanged",
                oldest.from(),
                oldest.to(),
                self.rotation_period
            );
            return None;
        };

        let evicted = buckets.pop_front()?;
        log::debug!(
            target: LOG_TARGET,
            "Rotated out ({}, {}] with total {}, appended ({}, {}]",
            evicted.from(),
            evicted.to(),
            evicted.total(),
            successor.from(),
            successor.to()
        );
        buckets.push_back(successor);

        Some(evicted)
    }

    fn listeners(&self, channel: Channel) -> &RwLock<Vec<Arc<dyn Listener>>> {
        match channel {
            Channel::UpperExceeded => &self.upper_exceeded_listeners,
            Channel::LowerNotMet => &self.lower_not_met_listeners,
        }
    }

    fn listener_count(&self, channel: Channel) -> usize {
        self.listeners(channel).read().map_or(0, |l| l.len())
    }

    fn dispatch(&self, notification: &Notification) {
        // Clone the list so a listener may subscribe further listeners.
        let listeners = self.listeners(notification.channel).read().expect("lock poisoned").clone();

        log::debug!(
            target: LOG_TARGET,
            "{} at {}, notifying {} listener(s)",
            notification.channel,
            notification.now,
            listeners.len()
        );

        for listener in &listeners {
            listener.notify(notification);
        }
    }
}

/// Index of the first bucket whose `(from, to]` contains `timestamp`.
fn position(buckets: &VecDeque<Bucket>, timestamp: DateTime<Utc>) -> Option<usize> {
    buckets.iter().position(|bucket| bucket.contains(timestamp))
}
