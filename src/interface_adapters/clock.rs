use crate::domain::ports::Clock;
use std::time::{SystemTime, UNIX_EPOCH};

// Wall-clock time source for the running engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // A clock before the epoch reads as 0; render elapsed saturates anyway.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
