//! MGB Common Library
//!
//! Shared constants, configuration loading utilities and device contracts
//! for all MGB workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Controller constants (history capacity, gain bounds, ...)
//! - [`device`] - Sensor / actuator driver traits
//! - [`reading`] - Controlled variables and timestamped records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use mgb_common::prelude::*;
//!
//! let unit = ControlledVariable::Temperature.unit();
//! assert_eq!(unit, "°C");
//! ```

pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
pub mod reading;
