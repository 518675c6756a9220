//! Thread-safe controller handle.
//!
//! The monitoring loop drives the controller while a status path reads
//! tuning snapshots. Every operation takes the same lock for its whole
//! duration, so an `update` together with the adaptation it triggers is
//! one atomic step for any reader, and two updates never interleave.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::control::pid::PidGains;
use crate::control::tuning::TuningInfo;
use crate::controller::{AdaptivePid, PidConfig};
use crate::error::ControllerError;
use crate::state::ControllerState;

/// Cloneable handle to one [`AdaptivePid`].
#[derive(Debug, Clone)]
pub struct SharedController {
    inner: Arc<Mutex<AdaptivePid>>,
}

impl SharedController {
    pub fn new(config: &PidConfig) -> Result<Self, ControllerError> {
        Ok(Self::from_controller(AdaptivePid::new(config)?))
    }

    pub fn from_controller(controller: AdaptivePid) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn update(&self, measured_value: f64, current_time: Option<f64>) -> f64 {
        self.inner.lock().update(measured_value, current_time)
    }

    /// Update with the measurement mirrored about the setpoint
    /// (`2·setpoint − measured`). The setpoint is read under the same lock
    /// as the update, so a concurrent `set_setpoint` lands entirely before
    /// or after this step.
    pub fn update_mirrored(&self, measured_value: f64, current_time: Option<f64>) -> f64 {
        let mut guard = self.inner.lock();
        let mirrored = 2.0 * guard.setpoint() - measured_value;
        guard.update(mirrored, current_time)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn set_setpoint(&self, setpoint: f64) -> Result<(), ControllerError> {
        self.inner.lock().set_setpoint(setpoint)
    }

    pub fn set_adaptive(&self, enabled: bool) {
        self.inner.lock().set_adaptive(enabled);
    }

    pub fn reset_to_base_parameters(&self) {
        self.inner.lock().reset_to_base_parameters();
    }

    pub fn tuning_info(&self) -> TuningInfo {
        self.inner.lock().tuning_info()
    }

    pub fn state(&self) -> ControllerState {
        self.inner.lock().state()
    }

    pub fn gains(&self) -> PidGains {
        self.inner.lock().gains()
    }

    /// Run `f` against the controller with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&AdaptivePid) -> R) -> R {
        let guard = self.inner.lock();
        f(&*guard)
    }
}
