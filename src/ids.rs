//! Post and report ids are decimal millisecond timestamps.
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing millisecond ids. Two calls in the same millisecond get
/// consecutive values instead of colliding.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicU64,
}

static CLOCK: IdClock = IdClock::new();

/// The next id from the process-wide clock.
pub fn next_id() -> String {
    CLOCK.next_at(now_millis()).to_string()
}

/// Make sure the process-wide clock never hands out `issued` or anything below it again.
pub fn reserve_through(issued: u64) {
    CLOCK.reserve_through(issued);
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

impl IdClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    pub fn reserve_through(&self, issued: u64) {
        self.last.fetch_max(issued, Ordering::SeqCst);
    }

    pub fn next_at(&self, now_ms: u64) -> u64 {
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let next = now_ms.max(last + 1);
            match self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}
