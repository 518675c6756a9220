//! Online gain adaptation.
//!
//! Every adaptation event looks at the last `ADAPTATION_WINDOW` absolute
//! errors, classifies the loop behaviour and nudges the live gains by a
//! multiplicative step of `learning_rate`:
//!
//! | Regime            | Condition                                   | Step                       |
//! |-------------------|---------------------------------------------|----------------------------|
//! | Oscillating       | `std > 0.5·avg` and `std > 0.1`             | `kp ×(1−lr)`, `kd ×(1+lr)` |
//! | Large error       | `avg > 2.0`                                 | `kp ×(1+2·lr)`             |
//! | Steady-state err. | `0.1 < avg < 1.0` and `std < 0.2`           | `ki ×(1+lr)`               |
//! | Nominal           | otherwise                                   | none                       |
//!
//! Rows are checked top to bottom; the first match wins. The result is
//! always clamped to the band around the base gains, which is what keeps
//! repeated steps from diverging.

use serde::Serialize;

use mgb_common::consts::{
    LARGE_ERROR_THRESHOLD, OSCILLATION_STD_MIN, OSCILLATION_STD_RATIO, STEADY_STATE_ERROR_MAX,
    STEADY_STATE_ERROR_MIN, STEADY_STATE_STD_MAX,
};

use super::history::ControlHistory;
use super::pid::PidGains;

/// Loop behaviour inferred from recent errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Oscillating,
    LargeError,
    SteadyStateError,
    Nominal,
}

/// Mean and population standard deviation of a set of absolute errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ErrorStats {
    /// Statistics of `samples`; all zero for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Classify loop behaviour. Priority: oscillating, large error, steady-state.
pub fn classify(stats: &ErrorStats) -> Regime {
    let ErrorStats { mean, std_dev } = *stats;

    if std_dev > mean * OSCILLATION_STD_RATIO && std_dev > OSCILLATION_STD_MIN {
        Regime::Oscillating
    } else if mean > LARGE_ERROR_THRESHOLD {
        Regime::LargeError
    } else if mean > STEADY_STATE_ERROR_MIN
        && mean < STEADY_STATE_ERROR_MAX
        && std_dev < STEADY_STATE_STD_MAX
    {
        Regime::SteadyStateError
    } else {
        Regime::Nominal
    }
}

/// Apply the step for `regime` to `live` and clamp against `base`.
pub fn adjust_gains(
    live: PidGains,
    base: &PidGains,
    regime: Regime,
    learning_rate: f64,
) -> PidGains {
    let mut next = live;
    match regime {
        Regime::Oscillating => {
            next.kp *= 1.0 - learning_rate;
            next.kd *= 1.0 + learning_rate;
        }
        Regime::LargeError => {
            next.kp *= 1.0 + 2.0 * learning_rate;
        }
        Regime::SteadyStateError => {
            next.ki *= 1.0 + learning_rate;
        }
        Regime::Nominal => {}
    }
    next.clamped_to(base)
}

/// Outcome of one adaptation event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adaptation {
    pub stats: ErrorStats,
    pub regime: Regime,
    /// Gains before the step.
    pub previous: PidGains,
    /// Gains after the step and clamp.
    pub gains: PidGains,
}

/// Run one adaptation event against `history`.
///
/// Returns `None` without touching anything when fewer than
/// `ADAPTATION_WINDOW` samples are available.
pub fn adapt(
    history: &ControlHistory,
    live: PidGains,
    base: &PidGains,
    learning_rate: f64,
) -> Option<Adaptation> {
    let window = history.error_window()?;
    let stats = ErrorStats::from_samples(&window);
    let regime = classify(&stats);
    Some(Adaptation {
        stats,
        regime,
        previous: live,
        gains: adjust_gains(live, base, regime, learning_rate),
    })
}
