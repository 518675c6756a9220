//! Sample clocks.
//!
//! The controller takes sample times as plain seconds. The monitoring loop
//! gets them from a [`Clock`]: wall-clock time in production, a manually
//! stepped clock in simulation and tests.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Seconds since the UNIX epoch, as used when a caller omits the sample time.
pub fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Source of sample timestamps [s].
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        wall_clock_secs()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn starting_at(secs: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(secs)),
        }
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock() += secs;
    }

    pub fn set(&self, secs: f64) {
        *self.now.lock() = secs;
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        *self.now.lock()
    }
}
