//! Adaptive PID controller, one instance per controlled variable.
//!
//! Owns the PID state, the live/base gain sets, the error/output history
//! and the adaptation counter. Each `update` runs the PID core, records the
//! sample and, every `adaptation_interval` updates, lets the adaptation
//! engine retune the live gains. All of that happens inside one `&mut self`
//! call, so an observer holding a lock around the controller (see
//! [`crate::shared`]) never sees a half-applied step.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use mgb_common::consts::{
    DEFAULT_ADAPTATION_INTERVAL, DEFAULT_LEARNING_RATE, DEFAULT_OUTPUT_MAX, DEFAULT_OUTPUT_MIN,
};

use crate::clock::wall_clock_secs;
use crate::control::adaptation::{Adaptation, adapt};
use crate::control::history::ControlHistory;
use crate::control::pid::{
    OutputBounds, PidGains, PidState, PidTerms, pid_compute, pid_compute_untimed,
};
use crate::control::tuning::TuningInfo;
use crate::error::ControllerError;
use crate::state::ControllerState;

// ─── Construction Parameters ────────────────────────────────────────

/// Construction parameters of one controller.
///
/// Deserializable so a chamber config can embed it directly; omitted
/// fields take the defaults of [`PidConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    #[serde(default)]
    pub setpoint: f64,
    #[serde(default = "default_output_min")]
    pub output_min: f64,
    #[serde(default = "default_output_max")]
    pub output_max: f64,
    #[serde(default = "default_adaptive")]
    pub adaptive: bool,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_adaptation_interval")]
    pub adaptation_interval: u32,
    /// Symmetric clamp on the integral accumulator. `None` = unbounded.
    #[serde(default)]
    pub integral_limit: Option<f64>,
}

fn default_output_min() -> f64 {
    DEFAULT_OUTPUT_MIN
}

fn default_output_max() -> f64 {
    DEFAULT_OUTPUT_MAX
}

fn default_adaptive() -> bool {
    true
}

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_adaptation_interval() -> u32 {
    DEFAULT_ADAPTATION_INTERVAL
}

impl PidConfig {
    /// Gains with all other fields at their defaults: setpoint 0, output
    /// `[0, 100]`, adaptive, learning rate 0.01, interval 10, no integral limit.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            output_min: DEFAULT_OUTPUT_MIN,
            output_max: DEFAULT_OUTPUT_MAX,
            adaptive: true,
            learning_rate: DEFAULT_LEARNING_RATE,
            adaptation_interval: DEFAULT_ADAPTATION_INTERVAL,
            integral_limit: None,
        }
    }

    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = setpoint;
        self
    }

    pub fn with_output_bounds(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_adaptation_interval(mut self, interval: u32) -> Self {
        self.adaptation_interval = interval;
        self
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit);
        self
    }

    pub fn gains(&self) -> PidGains {
        PidGains::new(self.kp, self.ki, self.kd)
    }

    /// Check every parameter the arithmetic relies on.
    pub fn validate(&self) -> Result<(), ControllerError> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ControllerError::InvalidGain { name, value });
            }
        }
        if !self.output_min.is_finite()
            || !self.output_max.is_finite()
            || self.output_min > self.output_max
        {
            return Err(ControllerError::InvalidOutputBounds {
                min: self.output_min,
                max: self.output_max,
            });
        }
        if !self.setpoint.is_finite() {
            return Err(ControllerError::InvalidSetpoint(self.setpoint));
        }
        // Written so NaN fails too.
        if !(self.learning_rate > 0.0 && self.learning_rate < 1.0) {
            return Err(ControllerError::InvalidLearningRate(self.learning_rate));
        }
        if self.adaptation_interval == 0 {
            return Err(ControllerError::InvalidAdaptationInterval);
        }
        if let Some(limit) = self.integral_limit {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(ControllerError::InvalidIntegralLimit(limit));
            }
        }
        Ok(())
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Self-tuning PID controller.
#[derive(Debug, Clone)]
pub struct AdaptivePid {
    setpoint: f64,
    base: PidGains,
    live: PidGains,
    bounds: OutputBounds,
    integral_limit: Option<f64>,
    pid: PidState,
    history: ControlHistory,
    adaptive: bool,
    learning_rate: f64,
    adaptation_interval: u32,
    cycles_since_adaptation: u32,
    last_terms: Option<PidTerms>,
    last_adaptation: Option<Adaptation>,
}

impl AdaptivePid {
    /// Build a controller from validated parameters.
    pub fn new(config: &PidConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        let base = config.gains();
        Ok(Self {
            setpoint: config.setpoint,
            base,
            live: base,
            bounds: OutputBounds {
                min: config.output_min,
                max: config.output_max,
            },
            integral_limit: config.integral_limit,
            pid: PidState::default(),
            history: ControlHistory::new(),
            adaptive: config.adaptive,
            learning_rate: config.learning_rate,
            adaptation_interval: config.adaptation_interval,
            cycles_since_adaptation: 0,
            last_terms: None,
            last_adaptation: None,
        })
    }

    /// Compute the actuator command for one sample.
    ///
    /// `current_time` is in seconds; `None` means "now" on the wall clock.
    /// A non-finite time counts as no elapsed time: P and the current I
    /// term apply, the derivative is skipped and the time base is kept.
    /// `measured_value` must be a real reading;
    /// callers skip the update when the sensor failed. A non-finite value
    /// is ignored: nothing is recorded and the previous command is repeated.
    pub fn update(&mut self, measured_value: f64, current_time: Option<f64>) -> f64 {
        if !measured_value.is_finite() {
            warn!(measured_value, "ignoring non-finite measurement");
            return self.history.latest_output().unwrap_or(self.bounds.min);
        }
        let error = self.setpoint - measured_value;
        let terms = match current_time {
            Some(t) if !t.is_finite() => {
                warn!(current_time = t, "non-finite sample time, no time elapsed");
                pid_compute_untimed(&mut self.pid, &self.live, self.bounds, error)
            }
            _ => pid_compute(
                &mut self.pid,
                &self.live,
                self.bounds,
                self.integral_limit,
                error,
                current_time.unwrap_or_else(wall_clock_secs),
            ),
        };
        trace!(
            error,
            dt = terms.dt,
            p = terms.p,
            i = terms.i,
            d = terms.d,
            output = terms.output,
            "pid update"
        );

        self.history.push(error.abs(), terms.output);
        self.last_terms = Some(terms);

        if self.adaptive {
            self.cycles_since_adaptation += 1;
            if self.cycles_since_adaptation >= self.adaptation_interval {
                self.run_adaptation();
                self.cycles_since_adaptation = 0;
            }
        }

        terms.output
    }

    fn run_adaptation(&mut self) {
        let Some(outcome) = adapt(&self.history, self.live, &self.base, self.learning_rate) else {
            return;
        };
        debug!(
            regime = ?outcome.regime,
            avg_error = outcome.stats.mean,
            error_std = outcome.stats.std_dev,
            kp = outcome.gains.kp,
            ki = outcome.gains.ki,
            kd = outcome.gains.kd,
            "gain adaptation"
        );
        self.live = outcome.gains;
        self.last_adaptation = Some(outcome);
    }

    /// Forget integral and derivative memory. Gains and history are kept.
    pub fn reset(&mut self) {
        self.pid.reset();
    }

    /// Change the target. Clears integral/derivative memory so stale
    /// accumulation from the old regime does not kick the output.
    pub fn set_setpoint(&mut self, setpoint: f64) -> Result<(), ControllerError> {
        if !setpoint.is_finite() {
            return Err(ControllerError::InvalidSetpoint(setpoint));
        }
        info!(from = self.setpoint, to = setpoint, "setpoint changed");
        self.setpoint = setpoint;
        self.reset();
        Ok(())
    }

    /// Enable or disable adaptation. Disabling restores the base gains.
    pub fn set_adaptive(&mut self, enabled: bool) {
        self.adaptive = enabled;
        if !enabled {
            self.live = self.base;
        }
        info!(adaptive = enabled, "adaptation toggled");
    }

    /// Restore base gains and forget history and the adaptation counter.
    /// Setpoint and integral state are untouched.
    pub fn reset_to_base_parameters(&mut self) {
        self.live = self.base;
        self.history.clear();
        self.cycles_since_adaptation = 0;
        self.last_adaptation = None;
        info!("gains reset to base parameters");
    }

    /// Consistent snapshot of the tuning state.
    pub fn tuning_info(&self) -> TuningInfo {
        TuningInfo {
            kp: self.live.kp,
            ki: self.live.ki,
            kd: self.live.kd,
            kp_base: self.base.kp,
            ki_base: self.base.ki,
            kd_base: self.base.kd,
            adaptive: self.adaptive,
            avg_error: self.history.mean_error(),
            error_count: self.history.len(),
            setpoint: self.setpoint,
            state: self.state(),
        }
    }

    pub fn state(&self) -> ControllerState {
        ControllerState::derive(
            self.pid.last_time().is_some(),
            self.adaptive,
            self.history.error_window().is_some(),
        )
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn gains(&self) -> PidGains {
        self.live
    }

    pub fn base_gains(&self) -> PidGains {
        self.base
    }

    pub fn output_bounds(&self) -> OutputBounds {
        self.bounds
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn integral(&self) -> f64 {
        self.pid.integral()
    }

    pub fn cycles_since_adaptation(&self) -> u32 {
        self.cycles_since_adaptation
    }

    pub fn history(&self) -> &ControlHistory {
        &self.history
    }

    /// Term breakdown of the most recent update.
    pub fn last_terms(&self) -> Option<PidTerms> {
        self.last_terms
    }

    /// Most recent adaptation event, if any since the last base reset.
    pub fn last_adaptation(&self) -> Option<Adaptation> {
        self.last_adaptation
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
