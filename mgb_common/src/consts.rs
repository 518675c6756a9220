//! Controller-wide constants for the MGB workspace.
//!
//! Single source of truth for history sizes, adaptation thresholds and
//! default paths. Imported by all crates.

use static_assertions::const_assert;

/// Capacity of the per-controller error / output ring buffers.
pub const HISTORY_CAPACITY: usize = 20;

/// Number of most recent absolute errors the adaptation engine evaluates.
pub const ADAPTATION_WINDOW: usize = 10;

/// Default number of updates between adaptation events.
pub const DEFAULT_ADAPTATION_INTERVAL: u32 = 10;

/// Default fractional gain step per adaptation event.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Live gains never drop below `GAIN_FLOOR_FACTOR × base`.
pub const GAIN_FLOOR_FACTOR: f64 = 0.1;

/// Live gains never exceed `GAIN_CEILING_FACTOR × base`.
pub const GAIN_CEILING_FACTOR: f64 = 5.0;

/// Oscillation: `std > avg × OSCILLATION_STD_RATIO` ...
pub const OSCILLATION_STD_RATIO: f64 = 0.5;

/// ... and `std > OSCILLATION_STD_MIN`.
pub const OSCILLATION_STD_MIN: f64 = 0.1;

/// Mean absolute error above which the proportional gain is raised.
pub const LARGE_ERROR_THRESHOLD: f64 = 2.0;

/// Lower (exclusive) bound of the steady-state error band.
pub const STEADY_STATE_ERROR_MIN: f64 = 0.1;

/// Upper (exclusive) bound of the steady-state error band.
pub const STEADY_STATE_ERROR_MAX: f64 = 1.0;

/// Steady-state error requires `std < STEADY_STATE_STD_MAX`.
pub const STEADY_STATE_STD_MAX: f64 = 0.2;

/// Default controller output range.
pub const DEFAULT_OUTPUT_MIN: f64 = 0.0;
pub const DEFAULT_OUTPUT_MAX: f64 = 100.0;

/// Default command at/above which relay actuators are switched on.
pub const DEFAULT_RELAY_ON_THRESHOLD: f64 = 50.0;

/// Default measurement interval in seconds.
pub const DEFAULT_MEASUREMENT_INTERVAL_S: f64 = 60.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mgb/config.toml";

const_assert!(ADAPTATION_WINDOW <= HISTORY_CAPACITY);
const_assert!(ADAPTATION_WINDOW > 1);
