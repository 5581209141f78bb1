/*
 * Time sources and local-day arithmetic
 *
 * Capture timestamps are nanoseconds since the Unix epoch. The system
 * clock is read at millisecond resolution and widened, so the trailing
 * six rendered digits are zero; the nanosecond unit keeps the door open
 * for finer sources behind the same trait.
 */

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};

pub(crate) const NANOS_PER_MILLI: i64 = 1_000_000;
pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Supplies capture timestamps for log records.
pub trait Clock: Send + Sync {
    /// Nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> i64;
}

/// Wall clock, millisecond resolution widened to nanoseconds. Two reads
/// within the same millisecond observe the same timestamp.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        chrono::Utc::now().timestamp_millis() * NANOS_PER_MILLI
    }
}

/// Settable clock for tests and deterministic embeddings.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    pub fn new(nanos: i64) -> Self {
        ManualClock {
            nanos: AtomicI64::new(nanos),
        }
    }

    pub fn set(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::Relaxed);
    }

    pub fn advance(&self, delta: i64) {
        self.nanos.fetch_add(delta, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.nanos.load(Ordering::Relaxed)
    }
}

/// Cached `[today-start, tomorrow-start)` window in epoch nanoseconds,
/// where both bounds are local midnights.
///
/// A fresh window is an impossible interval, so the first timestamp probed
/// always forces a recompute. Consumers re-derive the window only when a
/// timestamp falls outside it; day length is never assumed constant, which
/// keeps DST transitions correct.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DayWindow {
    pub(crate) start: i64,
    pub(crate) end: i64,
}

impl DayWindow {
    pub(crate) fn unset() -> Self {
        DayWindow {
            start: i64::MAX,
            end: i64::MIN,
        }
    }

    pub(crate) fn contains(&self, nanos: i64) -> bool {
        nanos >= self.start && nanos < self.end
    }

    /// Recompute both bounds for the local day containing `nanos`.
    pub(crate) fn reset_to(&mut self, nanos: i64) {
        let millis = nanos.div_euclid(NANOS_PER_MILLI);
        // out-of-range input falls back to the epoch day
        let utc = DateTime::from_timestamp_millis(millis).unwrap_or_default();
        let day = utc.with_timezone(&Local).date_naive();
        let next = day.succ_opt().unwrap_or(day);
        self.start = day_start_nanos(day);
        self.end = day_start_nanos(next);
    }
}

/// First instant of `day` in the local zone, in epoch nanoseconds.
fn day_start_nanos(day: NaiveDate) -> i64 {
    // DST gaps can swallow midnight; scan forward to the first minute the
    // zone can actually represent.
    for minutes in [0i64, 30, 60, 90, 120] {
        let t = day.and_time(NaiveTime::MIN) + Duration::minutes(minutes);
        if let Some(start) = Local.from_local_datetime(&t).earliest() {
            return start.timestamp_millis() * NANOS_PER_MILLI;
        }
    }
    day.and_time(NaiveTime::MIN).and_utc().timestamp_millis() * NANOS_PER_MILLI
}
