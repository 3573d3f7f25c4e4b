// =============================================================================
// Bar Aggregator — minute-boundary detection
// =============================================================================
//
// Buckets by clock time-of-day only: a bar closes when the wall-clock minute
// differs from the last-seen minute. Labels are `HH:MM` strings and repeat
// across days; arrival order in the store is the only total order. The first
// observation only arms the detector (no partial bar for the minute the
// session started in).

use chrono::{DateTime, Local, Timelike};

/// Detects minute-boundary crossings for one session.
#[derive(Debug, Default)]
pub struct BarAggregator {
    /// Minute-of-day last seen; `None` before the first observation.
    last_minute: Option<u32>,
}

impl BarAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the current wall clock. Returns the `HH:MM` label to close
    /// bars under when a minute boundary was crossed.
    pub fn observe(&mut self, now: DateTime<Local>) -> Option<String> {
        self.observe_minute(now.hour() * 60 + now.minute(), || {
            now.format("%H:%M").to_string()
        })
    }

    fn observe_minute(
        &mut self,
        minute_of_day: u32,
        label: impl FnOnce() -> String,
    ) -> Option<String> {
        match self.last_minute {
            None => {
                self.last_minute = Some(minute_of_day);
                None
            }
            Some(last) if last == minute_of_day => None,
            Some(_) => {
                self.last_minute = Some(minute_of_day);
                Some(label())
            }
        }
    }
}
