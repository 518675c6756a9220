//! Control engine root.
//!
//! PID core + adaptation engine + history buffers + tuning snapshots.
//! Everything here is pure arithmetic on plain structs; the lifecycle
//! around it lives in [`crate::controller`].

pub mod adaptation;
pub mod history;
pub mod pid;
pub mod tuning;
