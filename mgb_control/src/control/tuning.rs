//! Tuning snapshot exposed to status reporting.

use serde::Serialize;

use super::pid::PidGains;
use crate::state::ControllerState;

/// Read-only snapshot of a controller's tuning.
///
/// Serialized field names match what the dashboard consumes
/// (`kp`, `kp_base`, ..., `avg_error`, `error_count`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningInfo {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub kp_base: f64,
    pub ki_base: f64,
    pub kd_base: f64,
    pub adaptive: bool,
    /// Mean of the stored absolute errors (0 if none).
    pub avg_error: f64,
    /// Number of stored error samples.
    pub error_count: usize,
    pub setpoint: f64,
    pub state: ControllerState,
}

impl TuningInfo {
    pub fn live_gains(&self) -> PidGains {
        PidGains::new(self.kp, self.ki, self.kd)
    }

    pub fn base_gains(&self) -> PidGains {
        PidGains::new(self.kp_base, self.ki_base, self.kd_base)
    }
}
