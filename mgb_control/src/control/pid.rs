//! PID core with explicit-time rectangular integration and output clamp.
//!
//! `dt` is derived from the sample timestamps. A missing previous sample,
//! a repeated timestamp or a clock that went backwards all count as "no
//! time elapsed": integral and derivative are left untouched for that cycle.

use serde::{Deserialize, Serialize};

use mgb_common::consts::{GAIN_CEILING_FACTOR, GAIN_FLOOR_FACTOR};

/// PID gains. Used both for the operator-configured base set and the live
/// set the adaptation engine perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Clamp each gain to `[GAIN_FLOOR_FACTOR × base, GAIN_CEILING_FACTOR × base]`.
    ///
    /// `base` must be non-negative (enforced at controller construction).
    #[inline]
    pub fn clamped_to(self, base: &PidGains) -> Self {
        Self {
            kp: clamp_gain(self.kp, base.kp),
            ki: clamp_gain(self.ki, base.ki),
            kd: clamp_gain(self.kd, base.kd),
        }
    }

    /// True if every gain lies inside its band around `base`.
    pub fn within_band_of(&self, base: &PidGains) -> bool {
        let inside = |live: f64, base: f64| {
            live >= base * GAIN_FLOOR_FACTOR && live <= base * GAIN_CEILING_FACTOR
        };
        inside(self.kp, base.kp) && inside(self.ki, base.ki) && inside(self.kd, base.kd)
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

#[inline]
fn clamp_gain(live: f64, base: f64) -> f64 {
    live.clamp(base * GAIN_FLOOR_FACTOR, base * GAIN_CEILING_FACTOR)
}

/// Inclusive output range. `min <= max` is checked at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputBounds {
    pub min: f64,
    pub max: f64,
}

impl OutputBounds {
    /// Clamp into range. NaN maps to `min`, infinities to the matching bound.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Integral / derivative memory of the PID core.
///
/// Reset on setpoint change or any other discontinuity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Running sum of `error × dt`.
    integral: f64,
    /// Error of the previous sample.
    last_error: Option<f64>,
    /// Time of the previous sample [s].
    last_time: Option<f64>,
}

impl PidState {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_error(&self) -> Option<f64> {
        self.last_error
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Seconds since the previous sample; 0 when there is none or when
    /// `now` is not strictly later.
    #[inline]
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.last_time {
            Some(prev) => {
                let dt = now - prev;
                if dt > 0.0 { dt } else { 0.0 }
            }
            None => 0.0,
        }
    }
}

/// Breakdown of one PID evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PidTerms {
    /// `setpoint − measured`.
    pub error: f64,
    /// Effective time step [s] (0 if none elapsed).
    pub dt: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    /// `clamp(p + i + d)`.
    pub output: f64,
}

/// Compute one PID cycle.
///
/// # Arguments
/// - `state`: integral / derivative memory, updated in place.
/// - `gains`: live gains for this cycle.
/// - `bounds`: output clamp.
/// - `integral_limit`: optional symmetric clamp on the accumulator
///   (`None` leaves it unbounded).
/// - `error`: `setpoint − measured`.
/// - `now`: sample time [s].
#[inline]
pub fn pid_compute(
    state: &mut PidState,
    gains: &PidGains,
    bounds: OutputBounds,
    integral_limit: Option<f64>,
    error: f64,
    now: f64,
) -> PidTerms {
    let dt = state.elapsed(now);

    // ── P term ──────────────────────────────────────────────
    let p = gains.kp * error;

    // ── I term ──────────────────────────────────────────────
    // The accumulator stays finite: an overflowing step is dropped and a
    // sum past the f64 range saturates.
    let step = error * dt;
    if dt > 0.0 && step.is_finite() {
        state.integral = (state.integral + step).clamp(-f64::MAX, f64::MAX);
        if let Some(limit) = integral_limit {
            state.integral = state.integral.clamp(-limit, limit);
        }
    }
    let i = gains.ki * state.integral;

    // ── D term ──────────────────────────────────────────────
    let d = match state.last_error {
        Some(prev) if dt > 0.0 => gains.kd * (error - prev) / dt,
        _ => 0.0,
    };

    state.last_error = Some(error);
    state.last_time = Some(now);

    let output = bounds.clamp(p + i + d);
    debug_assert!(bounds.contains(output));

    PidTerms {
        error,
        dt,
        p,
        i,
        d,
        output,
    }
}

/// PID cycle for a sample without a usable timestamp.
///
/// Treated as no elapsed time: P plus the current I term, no derivative.
/// The stored sample time is left as it was so the next timed sample
/// measures `dt` from the last good timestamp.
#[inline]
pub fn pid_compute_untimed(
    state: &mut PidState,
    gains: &PidGains,
    bounds: OutputBounds,
    error: f64,
) -> PidTerms {
    let p = gains.kp * error;
    let i = gains.ki * state.integral;
    state.last_error = Some(error);
    PidTerms {
        error,
        dt: 0.0,
        p,
        i,
        d: 0.0,
        output: bounds.clamp(p + i),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
