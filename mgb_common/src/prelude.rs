//! Prelude module for common re-exports.
//!
//! ```rust
//! use mgb_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Controller Constants ───────────────────────────────────────────
pub use crate::consts::{ADAPTATION_WINDOW, HISTORY_CAPACITY};

// ─── Devices ────────────────────────────────────────────────────────
pub use crate::device::{Actuator, ActuatorStatus, DeviceError, Sensor, SensorStatus};

// ─── Records ────────────────────────────────────────────────────────
pub use crate::reading::{
    ActuatorEvent, ActuatorKind, Alarm, AlarmKind, ControlledVariable, Reading,
};
