//! Controller lifecycle states.
//!
//! Derived from the controller's fields rather than stored, so the view can
//! never drift from the data:
//!
//! ```text
//!   Fresh ──update──► Tracking ──history ≥ window──► Adapting
//!     ▲                  │                             │  ▲
//!     └──reset/setpoint──┴─────────────────────────────┘  │ set_adaptive
//!                                                   Locked ┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    /// No previous sample; next update is proportional-only.
    #[default]
    Fresh,
    /// Has a previous sample but not enough history to adapt.
    Tracking,
    /// Enough history and adaptation enabled.
    Adapting,
    /// Adaptation disabled; live gains pinned to base gains.
    Locked,
}

impl ControllerState {
    /// Compute the state from the controller's observable fields.
    ///
    /// `Fresh` wins over `Locked`: after a reset the next update is
    /// proportional-only regardless of the adaptation flag.
    pub const fn derive(has_previous_sample: bool, adaptive: bool, history_full: bool) -> Self {
        match (has_previous_sample, adaptive, history_full) {
            (false, _, _) => Self::Fresh,
            (true, false, _) => Self::Locked,
            (true, true, true) => Self::Adapting,
            (true, true, false) => Self::Tracking,
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Tracking => "tracking",
            Self::Adapting => "adapting",
            Self::Locked => "locked",
        };
        f.write_str(s)
    }
}
