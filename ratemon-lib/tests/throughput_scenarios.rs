//! End-to-end scenarios against a full day of half-hour buckets.
//!
//! The window covers 2018-01-18 in 48 half-hour buckets whose thresholds rise
//! towards midday and fall off in the evening. The clock is pinned at 12:10, so
//! the current bucket is 12:00-12:30 with lower=260 and upper=1082.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ratemon_lib::monitor::{Bucket, Channel, FixedClock, Notification, ThroughputMonitor};
use std::sync::{Arc, Mutex};

const SCHEDULE: [(u32, u32); 48] = [
    (5, 15),
    (6, 18),
    (7, 21),
    (8, 25),
    (9, 30),
    (10, 36),
    (12, 43),
    (14, 51),
    (16, 61),
    (19, 73),
    (22, 87),
    (26, 104),
    (31, 124),
    (37, 148),
    (44, 177),
    (52, 212),
    (62, 254),
    (74, 304),
    (88, 364),
    (105, 436),
    (126, 523),
    (151, 627),
    (181, 752),
    (217, 902),
    (260, 1082),
    (312, 1298),
    (260, 1081),
    (216, 900),
    (180, 750),
    (150, 625),
    (125, 520),
    (104, 433),
    (86, 360),
    (71, 300),
    (59, 250),
    (49, 208),
    (40, 173),
    (33, 144),
    (27, 120),
    (22, 100),
    (18, 83),
    (15, 69),
    (12, 57),
    (10, 47),
    (8, 39),
    (6, 32),
    (5, 26),
    (4, 21),
];

fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 18, 0, 0, 0).unwrap()
}

fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 18, 12, 5, 16).unwrap()
}

fn configured_buckets() -> Vec<Bucket> {
    let width = TimeDelta::minutes(30);
    let mut from = day_start();
    SCHEDULE
        .iter()
        .map(|&(lower, upper)| {
            let bucket = Bucket::new(from, from + width, lower, upper);
            from += width;
            bucket
        })
        .collect()
}

struct Harness {
    monitor: ThroughputMonitor,
    fired: Arc<Mutex<Vec<Channel>>>,
}

impl Harness {
    fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2018, 1, 18, 12, 10, 0).unwrap();
        let monitor = ThroughputMonitor::new(configured_buckets(), Arc::new(FixedClock::new(now)));
        let fired = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&fired);
        monitor.on_upper_exceeded(move |n: &Notification| sink.lock().unwrap().push(n.channel));
        let sink = Arc::clone(&fired);
        monitor.on_lower_not_met(move |n: &Notification| sink.lock().unwrap().push(n.channel));

        Self { monitor, fired }
    }

    fn fired(&self) -> Vec<Channel> {
        self.fired.lock().unwrap().clone()
    }
}

#[test]
fn test_schedule_thresholds_by_time_of_day() {
    let buckets = configured_buckets();
    for (hour, minute, lower, upper) in [(10, 0, 126, 523), (0, 0, 5, 15), (23, 30, 4, 21), (17, 30, 49, 208)] {
        let instant = Utc.with_ymd_and_hms(2018, 1, 18, hour, minute, 1).unwrap();
        let bucket = buckets.iter().find(|b| b.contains(instant)).unwrap();
        assert_eq!((bucket.lower_boundary(), bucket.upper_boundary()), (lower, upper), "at {hour:02}:{minute:02}");
    }
}

#[test]
fn test_every_instant_in_span_has_exactly_one_bucket() {
    let buckets = configured_buckets();
    let mut instant = day_start() + TimeDelta::seconds(1);
    while instant <= day_start() + TimeDelta::days(1) {
        assert_eq!(buckets.iter().filter(|b| b.contains(instant)).count(), 1, "at {instant}");
        instant += TimeDelta::minutes(7);
    }
}

#[test]
fn test_below_lower_boundary_fires_lower_not_met() {
    let harness = Harness::new();
    let _ = harness.monitor.record(1, sample_time()).unwrap();
    assert_eq!(harness.fired(), vec![Channel::LowerNotMet]);
}

#[test]
fn test_below_lower_boundary_is_not_meeting_lower() {
    let harness = Harness::new();
    let _ = harness.monitor.record(1, sample_time()).unwrap();
    assert!(!harness.monitor.currently_meeting_lower());
}

#[test]
fn test_below_lower_boundary_is_not_exceeding_upper() {
    let harness = Harness::new();
    let _ = harness.monitor.record(1, sample_time()).unwrap();
    assert!(!harness.monitor.currently_exceeding_upper());
}

#[test]
fn test_within_limits_fires_nothing() {
    let harness = Harness::new();
    let crossings = harness.monitor.record(500, sample_time()).unwrap();
    assert!(crossings.is_empty());
    assert!(harness.fired().is_empty());
}

#[test]
fn test_within_limits_is_not_exceeding_upper() {
    let harness = Harness::new();
    let _ = harness.monitor.record(500, sample_time()).unwrap();
    assert!(!harness.monitor.currently_exceeding_upper());
}

#[test]
fn test_within_limits_is_meeting_lower() {
    let harness = Harness::new();
    let _ = harness.monitor.record(500, sample_time()).unwrap();
    assert!(harness.monitor.currently_meeting_lower());
}

#[test]
fn test_above_limit_fires_upper_exceeded_only() {
    let harness = Harness::new();
    let _ = harness.monitor.record(5000, sample_time()).unwrap();
    assert_eq!(harness.fired(), vec![Channel::UpperExceeded]);
}

#[test]
fn test_above_limit_is_exceeding_upper() {
    let harness = Harness::new();
    let _ = harness.monitor.record(5000, sample_time()).unwrap();
    assert!(harness.monitor.currently_exceeding_upper());
}

#[test]
fn test_above_limit_is_meeting_lower() {
    let harness = Harness::new();
    let _ = harness.monitor.record(5000, sample_time()).unwrap();
    assert!(harness.monitor.currently_meeting_lower());
}

#[test]
fn test_out_of_window_sample_is_rejected() {
    let harness = Harness::new();
    let before = harness.monitor.buckets();

    for timestamp in [day_start(), day_start() - TimeDelta::hours(1), day_start() + TimeDelta::days(1) + TimeDelta::seconds(1)] {
        let err = harness.monitor.record(10, timestamp).unwrap_err();
        assert_eq!(err.timestamp, timestamp);
    }

    assert_eq!(harness.monitor.buckets(), before);
    assert!(harness.fired().is_empty());
}

#[test]
fn test_rotation_removes_first_bucket_and_appends_next_day() {
    let harness = Harness::new();
    let _ = harness.monitor.record(500, sample_time()).unwrap();

    assert_eq!(harness.monitor.buckets()[0].from(), day_start());

    let evicted = harness.monitor.rotate().unwrap();
    assert_eq!(evicted.from(), day_start());

    let buckets = harness.monitor.buckets();
    assert_eq!(buckets.len(), 48);
    assert_eq!(buckets[0].from(), day_start() + TimeDelta::minutes(30));

    let newest = buckets.last().unwrap();
    assert_eq!(newest.from(), day_start() + TimeDelta::days(1));
    assert_eq!(newest.to(), day_start() + TimeDelta::days(1) + TimeDelta::minutes(30));
    assert_eq!((newest.lower_boundary(), newest.upper_boundary()), (5, 15));
    assert!(newest.samples().is_empty());

    // The noon bucket and its samples are untouched by rotating the midnight one.
    assert_eq!(harness.monitor.find_bucket(sample_time()).unwrap().total(), 500);
}

#[test]
fn test_full_day_of_rotation_slides_window_by_one_day() {
    let harness = Harness::new();
    let _ = harness.monitor.record(500, sample_time()).unwrap();

    for _ in 0..48 {
        let _ = harness.monitor.rotate();
    }

    let buckets = harness.monitor.buckets();
    let expected: Vec<_> = configured_buckets().iter().map(|b| b.shifted(TimeDelta::days(1)).unwrap()).collect();
    assert_eq!(buckets, expected);

    // "now" (12:10 on the first day) is no longer covered.
    assert!(harness.monitor.current_bucket().is_none());
    assert!(!harness.monitor.currently_meeting_lower());
    assert!(!harness.monitor.currently_exceeding_upper());
}
