//! Chamber configuration: TOML loading and validation.
//!
//! One file describes the whole chamber: shared settings, the measurement
//! interval, optional data logging and one `[loops.<variable>]` table per
//! controlled variable. Loops without a table are not run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mgb_common::config::{ConfigError, ConfigLoader, SharedConfig};
use mgb_common::consts::{DEFAULT_MEASUREMENT_INTERVAL_S, DEFAULT_RELAY_ON_THRESHOLD};
use mgb_common::reading::ControlledVariable;

use crate::controller::PidConfig;
use crate::error::ControllerError;
use crate::shared::SharedController;

// ─── Sections ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Seconds between monitoring cycles.
    #[serde(default = "default_interval_s")]
    pub interval_s: f64,
}

fn default_interval_s() -> f64 {
    DEFAULT_MEASUREMENT_INTERVAL_S
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            interval_s: DEFAULT_MEASUREMENT_INTERVAL_S,
        }
    }
}

impl MeasurementConfig {
    /// Cycle period. `interval_s` must have passed [`ChamberConfig::validate`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatalogConfig {
    /// JSON-lines output file. `None` disables persistence.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// One control loop: controller parameters plus the relay threshold the
/// actuator uses to turn a command into on/off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(flatten)]
    pub pid: PidConfig,
    #[serde(default = "default_on_threshold")]
    pub on_threshold: f64,
    /// The actuator lowers the variable (fan against CO2). The loop mirrors
    /// the measurement around the setpoint before handing it to the controller.
    #[serde(default)]
    pub reverse_acting: bool,
}

fn default_on_threshold() -> f64 {
    DEFAULT_RELAY_ON_THRESHOLD
}

impl LoopConfig {
    pub fn new(pid: PidConfig) -> Self {
        Self {
            pid,
            on_threshold: DEFAULT_RELAY_ON_THRESHOLD,
            reverse_acting: false,
        }
    }

    pub fn build_controller(&self) -> Result<SharedController, ControllerError> {
        SharedController::new(&self.pid)
    }

    fn validate(&self, variable: ControlledVariable) -> Result<(), ConfigError> {
        self.pid.validate().map_err(|e| {
            ConfigError::ValidationError(format!("loops.{variable}: {e}"))
        })?;
        if !self.on_threshold.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "loops.{variable}: on_threshold must be finite"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopsConfig {
    #[serde(default)]
    pub temperature: Option<LoopConfig>,
    #[serde(default)]
    pub humidity: Option<LoopConfig>,
    #[serde(default)]
    pub co2: Option<LoopConfig>,
}

impl LoopsConfig {
    pub fn get(&self, variable: ControlledVariable) -> Option<&LoopConfig> {
        match variable {
            ControlledVariable::Temperature => self.temperature.as_ref(),
            ControlledVariable::Humidity => self.humidity.as_ref(),
            ControlledVariable::Co2 => self.co2.as_ref(),
        }
    }

    /// Configured loops in monitoring order.
    pub fn iter(&self) -> impl Iterator<Item = (ControlledVariable, &LoopConfig)> + '_ {
        ControlledVariable::ALL
            .into_iter()
            .filter_map(|var| self.get(var).map(|cfg| (var, cfg)))
    }
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete chamber configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub measurement: MeasurementConfig,
    #[serde(default)]
    pub datalog: DatalogConfig,
    #[serde(default)]
    pub loops: LoopsConfig,
}

impl ChamberConfig {
    /// Semantic checks on top of what serde already enforced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let interval = self.measurement.interval_s;
        if !(interval > 0.0 && Duration::try_from_secs_f64(interval).is_ok()) {
            return Err(ConfigError::ValidationError(format!(
                "measurement.interval_s must be a positive duration, got {interval}"
            )));
        }

        let mut configured = 0;
        for (variable, cfg) in self.loops.iter() {
            cfg.validate(variable)?;
            configured += 1;
        }
        if configured == 0 {
            return Err(ConfigError::ValidationError(
                "at least one [loops.<variable>] table is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a chamber configuration file.
pub fn load_config(path: &Path) -> Result<ChamberConfig, ConfigError> {
    let config = ChamberConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a chamber configuration held in memory.
pub fn parse_config(content: &str) -> Result<ChamberConfig, ConfigError> {
    let config = ChamberConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}
