//! Simulated chamber drivers.
//!
//! A first-order model of the chamber air: temperature and humidity relax
//! toward ambient and are pushed up by the heater and humidifier, CO2 is
//! produced by the substrate and removed by leakage and the fan. Sensors and
//! actuators created from one [`SimulatedChamber`] share the model, and the
//! chamber doubles as the sample [`Clock`] (simulated seconds).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use mgb_common::device::{Actuator, ActuatorStatus, DeviceError, Sensor, SensorStatus};
use mgb_common::reading::{ActuatorKind, ControlledVariable};

use crate::clock::Clock;

/// Integration sub-step [s].
const MAX_STEP_S: f64 = 1.0;

/// Conditions outside the chamber.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ambient {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
}

impl Default for Ambient {
    fn default() -> Self {
        Self {
            temperature: 18.0,
            humidity: 60.0,
            co2: 420.0,
        }
    }
}

/// Model constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamberParams {
    /// Thermal time constant toward ambient [s].
    pub thermal_tau_s: f64,
    /// Heating rate with the heater on [°C/s].
    pub heater_rate: f64,
    /// Moisture exchange time constant toward ambient [s].
    pub humidity_tau_s: f64,
    /// Humidification rate with the humidifier on [%/s].
    pub humidifier_rate: f64,
    /// CO2 produced by the substrate [ppm/s].
    pub co2_production: f64,
    /// Passive air exchange time constant [s].
    pub leak_tau_s: f64,
    /// Air exchange time constant with the fan on [s].
    pub fan_tau_s: f64,
}

impl Default for ChamberParams {
    fn default() -> Self {
        Self {
            thermal_tau_s: 900.0,
            heater_rate: 0.02,
            humidity_tau_s: 1200.0,
            humidifier_rate: 0.05,
            co2_production: 0.5,
            leak_tau_s: 3600.0,
            fan_tau_s: 120.0,
        }
    }
}

/// Chamber state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamberModel {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    pub ambient: Ambient,
    pub params: ChamberParams,
    pub heater_on: bool,
    pub humidifier_on: bool,
    pub fan_on: bool,
    /// Simulated time since start [s].
    pub elapsed_s: f64,
}

impl Default for ChamberModel {
    fn default() -> Self {
        Self::at_ambient(Ambient::default())
    }
}

impl ChamberModel {
    /// Chamber air equal to ambient, all actuators off.
    pub fn at_ambient(ambient: Ambient) -> Self {
        Self {
            temperature: ambient.temperature,
            humidity: ambient.humidity,
            co2: ambient.co2,
            ambient,
            params: ChamberParams::default(),
            heater_on: false,
            humidifier_on: false,
            fan_on: false,
            elapsed_s: 0.0,
        }
    }

    pub fn value(&self, variable: ControlledVariable) -> f64 {
        match variable {
            ControlledVariable::Temperature => self.temperature,
            ControlledVariable::Humidity => self.humidity,
            ControlledVariable::Co2 => self.co2,
        }
    }

    pub fn is_on(&self, kind: ActuatorKind) -> bool {
        match kind {
            ActuatorKind::Heater => self.heater_on,
            ActuatorKind::Humidifier => self.humidifier_on,
            ActuatorKind::Fan => self.fan_on,
        }
    }

    fn set(&mut self, kind: ActuatorKind, on: bool) {
        match kind {
            ActuatorKind::Heater => self.heater_on = on,
            ActuatorKind::Humidifier => self.humidifier_on = on,
            ActuatorKind::Fan => self.fan_on = on,
        }
    }

    /// Advance the model by `dt` seconds (explicit Euler, sub-stepped).
    pub fn step(&mut self, dt: f64) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let mut remaining = dt;
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_S);
            self.integrate(h);
            remaining -= h;
        }
        self.elapsed_s += dt;
    }

    fn integrate(&mut self, h: f64) {
        let p = &self.params;
        let a = &self.ambient;
        let on = |flag: bool| if flag { 1.0 } else { 0.0 };

        self.temperature += h
            * ((a.temperature - self.temperature) / p.thermal_tau_s
                + on(self.heater_on) * p.heater_rate);

        self.humidity += h
            * ((a.humidity - self.humidity) / p.humidity_tau_s
                + on(self.humidifier_on) * p.humidifier_rate);
        self.humidity = self.humidity.clamp(0.0, 100.0);

        let mut exchange = 1.0 / p.leak_tau_s;
        if self.fan_on {
            exchange += 1.0 / p.fan_tau_s;
        }
        self.co2 += h * (p.co2_production - (self.co2 - a.co2) * exchange);
        self.co2 = self.co2.max(0.0);
    }
}

/// Shared handle to a [`ChamberModel`]. Clones share the same chamber.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChamber {
    model: Arc<Mutex<ChamberModel>>,
}

impl SimulatedChamber {
    pub fn new(model: ChamberModel) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
        }
    }

    pub fn step(&self, dt: f64) {
        let mut model = self.model.lock();
        model.step(dt);
        trace!(
            t = model.elapsed_s,
            temperature = model.temperature,
            humidity = model.humidity,
            co2 = model.co2,
            "chamber step"
        );
    }

    pub fn snapshot(&self) -> ChamberModel {
        *self.model.lock()
    }

    /// Overwrite one process value (disturbance injection).
    pub fn set_value(&self, variable: ControlledVariable, value: f64) {
        let mut model = self.model.lock();
        match variable {
            ControlledVariable::Temperature => model.temperature = value,
            ControlledVariable::Humidity => model.humidity = value,
            ControlledVariable::Co2 => model.co2 = value,
        }
    }

    pub fn sensor(&self, variable: ControlledVariable) -> SimSensor {
        SimSensor::new(self.clone(), variable)
    }

    pub fn actuator(&self, kind: ActuatorKind) -> SimActuator {
        SimActuator::new(self.clone(), kind)
    }
}

impl Clock for SimulatedChamber {
    fn now_secs(&self) -> f64 {
        self.model.lock().elapsed_s
    }
}

/// Sensor reading one variable of the simulated chamber.
#[derive(Debug)]
pub struct SimSensor {
    name: String,
    variable: ControlledVariable,
    chamber: SimulatedChamber,
    initialized: bool,
    /// Every n-th read fails.
    fail_every: Option<u32>,
    reads: u32,
    last_value: Option<f64>,
    last_read_time: Option<f64>,
}

impl SimSensor {
    pub fn new(chamber: SimulatedChamber, variable: ControlledVariable) -> Self {
        Self {
            name: format!("sim-{variable}"),
            variable,
            chamber,
            initialized: false,
            fail_every: None,
            reads: 0,
            last_value: None,
            last_read_time: None,
        }
    }

    /// Make every `n`-th read return no value. `0` disables injection.
    pub fn with_failures_every(mut self, n: u32) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }
}

impl Sensor for SimSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn variable(&self) -> ControlledVariable {
        self.variable
    }

    fn initialize(&mut self) -> Result<(), DeviceError> {
        self.initialized = true;
        debug!("{} initialized", self.name);
        Ok(())
    }

    fn read(&mut self) -> Option<f64> {
        if !self.initialized {
            return None;
        }
        self.reads = self.reads.wrapping_add(1);
        if self.fail_every.is_some_and(|n| self.reads % n == 0) {
            return None;
        }
        let model = self.chamber.snapshot();
        let value = model.value(self.variable);
        self.last_value = Some(value);
        self.last_read_time = Some(model.elapsed_s);
        Some(value)
    }

    fn status(&self) -> SensorStatus {
        SensorStatus {
            name: self.name.clone(),
            unit: self.unit(),
            available: self.initialized,
            last_value: self.last_value,
            last_read_time: self.last_read_time,
        }
    }
}

/// On/off actuator acting on the simulated chamber.
#[derive(Debug)]
pub struct SimActuator {
    name: String,
    kind: ActuatorKind,
    chamber: SimulatedChamber,
    initialized: bool,
    last_state_change: Option<f64>,
}

impl SimActuator {
    pub fn new(chamber: SimulatedChamber, kind: ActuatorKind) -> Self {
        Self {
            name: format!("sim-{kind}"),
            kind,
            chamber,
            initialized: false,
            last_state_change: None,
        }
    }

    fn switch(&mut self, on: bool) -> Result<(), DeviceError> {
        if !self.initialized {
            return Err(DeviceError::NotInitialized(self.name.clone()));
        }
        let mut model = self.chamber.model.lock();
        if model.is_on(self.kind) != on {
            model.set(self.kind, on);
            self.last_state_change = Some(model.elapsed_s);
        }
        Ok(())
    }
}

impl Actuator for SimActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActuatorKind {
        self.kind
    }

    fn initialize(&mut self) -> Result<(), DeviceError> {
        self.initialized = true;
        debug!("{} initialized", self.name);
        Ok(())
    }

    fn turn_on(&mut self) -> Result<(), DeviceError> {
        self.switch(true)
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        self.switch(false)
    }

    fn is_active(&self) -> bool {
        self.chamber.model.lock().is_on(self.kind)
    }

    fn status(&self) -> ActuatorStatus {
        ActuatorStatus {
            name: self.name.clone(),
            kind: self.kind,
            active: self.is_active(),
            available: self.initialized,
            last_state_change: self.last_state_change,
        }
    }
}
