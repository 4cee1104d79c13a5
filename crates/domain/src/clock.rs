//! Process-wide UTC clock that never runs backwards.
//!
//! Wall-clock adjustments can move `Utc::now()` back in time. Every timestamp
//! stamped on a result or a state-change notification goes through [`now`],
//! so sequential operations on a driver observe non-decreasing timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

static LAST_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current UTC time, clamped to be >= every value previously returned.
pub fn now() -> DateTime<Utc> {
    let wall = Utc::now().timestamp_micros();
    let previous = LAST_MICROS.fetch_max(wall, Ordering::AcqRel);
    let micros = previous.max(wall);
    DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
}
