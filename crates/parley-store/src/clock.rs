//! Timestamp source for the store.
//!
//! Wall-clock time can stall or step backwards; the store needs every issued
//! instant to be strictly later than the previous one so that `updatedAt`
//! and `lastMessageAt` never decrease and messages have a total order.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Default)]
pub struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, bumped one microsecond past the last issued instant
    /// when the wall clock has not moved forward.
    pub fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last = Some(now);
        now
    }

    /// Record an externally produced timestamp (e.g. from an imported
    /// snapshot) so later instants are issued after it.
    pub fn observe(&mut self, at: DateTime<Utc>) {
        if self.last.map_or(true, |last| at > last) {
            self.last = Some(at);
        }
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}
