//! Controlled variables and the timestamped records handed to persistence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process variable regulated by one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlledVariable {
    /// Air temperature [°C], driven by the heater.
    Temperature,
    /// Relative humidity [%], driven by the humidifier.
    Humidity,
    /// CO2 concentration [ppm], driven by the fan.
    Co2,
}

impl ControlledVariable {
    /// All variables, in monitoring order.
    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Co2];

    /// Measurement unit.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Co2 => "ppm",
        }
    }

    /// Actuator that acts on this variable.
    pub const fn actuator_kind(self) -> ActuatorKind {
        match self {
            Self::Temperature => ActuatorKind::Heater,
            Self::Humidity => ActuatorKind::Humidifier,
            Self::Co2 => ActuatorKind::Fan,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Co2 => "co2",
        }
    }
}

impl fmt::Display for ControlledVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of actuator attached to a control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    Heater,
    Humidifier,
    Fan,
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heater => f.write_str("heater"),
            Self::Humidifier => f.write_str("humidifier"),
            Self::Fan => f.write_str("fan"),
        }
    }
}

/// One sensor value as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sample time [s since UNIX epoch or sample-clock origin].
    pub timestamp: f64,
    /// Sensor name.
    pub sensor: String,
    pub variable: ControlledVariable,
    pub value: f64,
    pub unit: String,
    /// Controller command computed from this reading.
    pub command: f64,
}

/// Actuator state change as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorEvent {
    pub timestamp: f64,
    pub actuator: String,
    pub kind: ActuatorKind,
    /// `true` = switched on.
    pub active: bool,
}

/// What raised an [`Alarm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// A sensor read returned no value.
    SensorUnavailable,
    /// An actuator rejected an on/off command.
    ActuatorFailure,
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => f.write_str("sensor_unavailable"),
            Self::ActuatorFailure => f.write_str("actuator_failure"),
        }
    }
}

/// Fault condition as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub timestamp: f64,
    pub kind: AlarmKind,
    /// Sensor or actuator name.
    pub source: String,
    pub message: String,
}
