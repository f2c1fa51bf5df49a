//! Time sources for request timing

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Supplies the instants used to time a request and the wall time it finished
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn wall_time(&self) -> DateTime<Utc>;
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that advances by a fixed step on every reading
///
/// Each request reads the clock twice, so a request served on its own
/// reports exactly `step` as its response time. Overlapping requests
/// interleave their readings and report a multiple of `step`.
#[derive(Debug)]
pub struct SteppingClock {
    step: Duration,
    current: Mutex<Instant>,
    wall_time: DateTime<Utc>,
}

impl SteppingClock {
    pub fn new(step: Duration, wall_time: DateTime<Utc>) -> Self {
        Self {
            step,
            current: Mutex::new(Instant::now()),
            wall_time,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let reading = *current;
        *current += self.step;
        reading
    }

    fn wall_time(&self) -> DateTime<Utc> {
        self.wall_time
    }
}
