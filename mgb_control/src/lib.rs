//! # MGB Control Library
//!
//! Environmental control for a closed cultivation chamber. One adaptive PID
//! controller per controlled variable (temperature, humidity, CO2) turns a
//! measurement into a bounded actuator command and retunes its own gains
//! from recent error statistics.
//!
//! ## Layers
//!
//! 1. **Sample clock** - [`clock`], supplies the time of each sample
//! 2. **PID core** - [`control::pid`], P/I/D terms and the clamped output
//! 3. **Adaptation engine** - [`control::adaptation`], regime
//!    classification and bounded gain steps
//! 4. **Tuning accessor** - [`control::tuning`], snapshots for reporting
//!
//! [`controller::AdaptivePid`] ties the layers together and
//! [`shared::SharedController`] makes one instance safe to read from a
//! status path while the monitoring [`cycle`] drives it.

pub mod clock;
pub mod config;
pub mod control;
pub mod controller;
pub mod cycle;
pub mod datalog;
pub mod error;
pub mod shared;
pub mod sim;
pub mod state;
