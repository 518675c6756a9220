//! Fixed-capacity error / output history.
//!
//! Two `heapless::HistoryBuffer` rings written in lock-step, so both always
//! hold the same number of samples. Push is O(1); once full the oldest
//! sample is overwritten. No heap allocation.

use heapless::HistoryBuffer;

use mgb_common::consts::{ADAPTATION_WINDOW, HISTORY_CAPACITY};

/// Most recent absolute errors and outputs of one controller.
#[derive(Debug, Clone, Default)]
pub struct ControlHistory {
    errors: HistoryBuffer<f64, HISTORY_CAPACITY>,
    outputs: HistoryBuffer<f64, HISTORY_CAPACITY>,
}

impl ControlHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cycle. `abs_error` is stored as given; callers pass `|error|`.
    #[inline]
    pub fn push(&mut self, abs_error: f64, output: f64) {
        self.errors.write(abs_error);
        self.outputs.write(output);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.errors.len() == self.errors.capacity()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.outputs.clear();
    }

    /// Absolute errors, oldest first.
    pub fn errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.errors.oldest_ordered().copied()
    }

    /// Outputs, oldest first.
    pub fn outputs(&self) -> impl Iterator<Item = f64> + '_ {
        self.outputs.oldest_ordered().copied()
    }

    pub fn latest_output(&self) -> Option<f64> {
        self.outputs.recent().copied()
    }

    /// Mean of all stored absolute errors; 0 when empty.
    pub fn mean_error(&self) -> f64 {
        let n = self.errors.len();
        if n == 0 {
            return 0.0;
        }
        self.errors().sum::<f64>() / n as f64
    }

    /// The last `ADAPTATION_WINDOW` absolute errors, oldest first, or
    /// `None` if fewer have been recorded.
    pub fn error_window(&self) -> Option<[f64; ADAPTATION_WINDOW]> {
        let n = self.errors.len();
        if n < ADAPTATION_WINDOW {
            return None;
        }
        let mut window = [0.0; ADAPTATION_WINDOW];
        for (slot, value) in window
            .iter_mut()
            .zip(self.errors().skip(n - ADAPTATION_WINDOW))
        {
            *slot = value;
        }
        Some(window)
    }
}
