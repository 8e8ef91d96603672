use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;

/// Source of the current instant.
///
/// The monitor only asks a clock for "now" when evaluating threshold state, so
/// substituting a [`FixedClock`] or [`ManualClock`] makes that evaluation
/// deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock whose instant is moved explicitly by its owner.
///
/// Used when replaying recorded traffic, where "now" should track the data
/// being fed in rather than the wall clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("lock poisoned") = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().expect("lock poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("lock poisoned")
    }
}
