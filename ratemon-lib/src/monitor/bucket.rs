use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// A single recorded amount and the instant it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub amount: u32,
}

/// One time window `(from, to]` with its thresholds and the samples recorded into it.
///
/// The boundaries and thresholds never change once the bucket exists; only the
/// sample list grows. The derived values ([`total`](Self::total),
/// [`upper_exceeded`](Self::upper_exceeded), [`lower_not_met`](Self::lower_not_met))
/// are recomputed from the samples on every call.
///
/// `lower_boundary <= upper_boundary` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    lower_boundary: u32,
    upper_boundary: u32,
    samples: Vec<Sample>,
}

impl Bucket {
    /// Create an empty bucket covering `(from, to]`.
    #[must_use]
    pub const fn new(from: DateTime<Utc>, to: DateTime<Utc>, lower_boundary: u32, upper_boundary: u32) -> Self {
        Self {
            from,
            to,
            lower_boundary,
            upper_boundary,
            samples: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    #[must_use]
    pub const fn lower_boundary(&self) -> u32 {
        self.lower_boundary
    }

    #[must_use]
    pub const fn upper_boundary(&self) -> u32 {
        self.upper_boundary
    }

    /// Samples in recording order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Whether `timestamp` falls in `(from, to]`.
    ///
    /// An instant equal to `from` belongs to the previous bucket.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from < timestamp && timestamp <= self.to
    }

    /// Append a sample.
    ///
    /// No boundary check happens here; callers pick the bucket.
    pub fn record(&mut self, amount: u32, timestamp: DateTime<Utc>) {
        self.samples.push(Sample { timestamp, amount });
    }

    /// Sum of all recorded amounts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.amount)).sum()
    }

    #[must_use]
    pub fn upper_exceeded(&self) -> bool {
        self.total() > u64::from(self.upper_boundary)
    }

    #[must_use]
    pub fn lower_not_met(&self) -> bool {
        self.total() < u64::from(self.lower_boundary)
    }

    /// The empty bucket that replaces this one when it is rotated out: same
    /// width and thresholds, both boundaries advanced by `period`.
    ///
    /// Returns `None` if either boundary would leave the representable range.
    #[must_use]
    pub fn shifted(&self, period: TimeDelta) -> Option<Self> {
        let from = self.from.checked_add_signed(period)?;
        let to = self.to.checked_add_signed(period)?;
        Some(Self::new(from, to, self.lower_boundary, self.upper_boundary))
    }
}
