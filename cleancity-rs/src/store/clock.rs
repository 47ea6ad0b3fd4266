//! Strictly increasing timestamps
//!
//! Every timestamp the store hands out is later than every earlier one, even
//! if the wall clock steps backwards. This keeps creation order total and
//! guarantees a decision timestamp never precedes its record's creation.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug)]
pub struct MonotonicClock {
    last_us: AtomicI64,
}

impl MonotonicClock {
    /// Clock whose first reading is strictly after `last_us` microseconds
    pub fn starting_after(last_us: i64) -> Self {
        Self {
            last_us: AtomicI64::new(last_us),
        }
    }

    /// Next timestamp in microseconds since the Unix epoch
    pub fn now_micros(&self) -> i64 {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_us.load(Ordering::SeqCst);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last_us
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::starting_after(0)
    }
}

/// Convert stored microseconds back to a UTC timestamp
pub fn from_micros(us: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us)
}
