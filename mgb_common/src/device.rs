//! Sensor and actuator driver traits.
//!
//! This module defines:
//! - `Sensor` trait - a source of one numeric process value
//! - `Actuator` trait - a switchable output (heater, humidifier, fan)
//! - `DeviceError` enum - error types for driver operations
//! - `SensorStatus` / `ActuatorStatus` - status snapshots for reporting
//!
//! The controller itself never sees these traits; it only consumes the
//! numbers a `Sensor` yields. Hardware variants (GPIO, I2C, simulation)
//! implement the traits behind `Box<dyn Sensor>` / `Box<dyn Actuator>`.

use serde::Serialize;
use thiserror::Error;

use crate::reading::{ActuatorKind, ControlledVariable};

/// Error types for driver operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    /// Driver initialization failed.
    #[error("Initialization failed for {device}: {reason}")]
    InitFailed { device: String, reason: String },

    /// Device used before a successful `initialize()`.
    #[error("{0} is not initialized")]
    NotInitialized(String),

    /// Bus / GPIO communication error.
    #[error("Hardware communication error on {device}: {reason}")]
    CommunicationError { device: String, reason: String },
}

/// Status snapshot of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub name: String,
    pub unit: &'static str,
    pub available: bool,
    pub last_value: Option<f64>,
    pub last_read_time: Option<f64>,
}

/// Status snapshot of an actuator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorStatus {
    pub name: String,
    pub kind: ActuatorKind,
    pub active: bool,
    pub available: bool,
    pub last_state_change: Option<f64>,
}

/// A source of one process value.
///
/// # Lifecycle
///
/// 1. `initialize()` - called once before the monitoring loop starts
/// 2. `read()` - called once per sampling interval
pub trait Sensor: Send {
    /// Unique name (e.g. "sht31-temperature").
    fn name(&self) -> &str;

    /// Variable this sensor measures.
    fn variable(&self) -> ControlledVariable;

    /// Unit of the returned values.
    fn unit(&self) -> &'static str {
        self.variable().unit()
    }

    /// Prepare the device.
    fn initialize(&mut self) -> Result<(), DeviceError>;

    /// Read the current value.
    ///
    /// Returns `None` when no valid reading is available. A failed read must
    /// never be reported as a number; callers skip the controller update.
    fn read(&mut self) -> Option<f64>;

    /// Status snapshot for reporting.
    fn status(&self) -> SensorStatus;
}

/// A switchable output device.
///
/// The actuator alone decides how a controller command maps to hardware
/// (relay threshold, PWM duty); the controller makes no such assumption.
pub trait Actuator: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> ActuatorKind;

    /// Prepare the device.
    fn initialize(&mut self) -> Result<(), DeviceError>;

    fn turn_on(&mut self) -> Result<(), DeviceError>;

    fn turn_off(&mut self) -> Result<(), DeviceError>;

    fn is_active(&self) -> bool;

    /// Status snapshot for reporting.
    fn status(&self) -> ActuatorStatus;
}
