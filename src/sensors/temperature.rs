//! Oven temperature tracking.
//!
//! Two small jobs sit between the raw thermocouple value and the control
//! loop:
//!
//! - optional smoothing over the last [`FILTER_WINDOW`] samples, and
//! - deciding whether a new value moved far enough from the last *reported*
//!   value to be worth a `TemperatureChanged` notification.  Displays
//!   redraw on that event, so sub-threshold jitter must not produce it.

use heapless::HistoryBuffer;

/// Number of samples in the moving-average window.
pub const FILTER_WINDOW: usize = 4;

pub struct TemperatureTracker {
    window: HistoryBuffer<f64, FILTER_WINDOW>,
    filter_enabled: bool,
    change_threshold_c: f64,
    last_reported: Option<f64>,
}

impl TemperatureTracker {
    pub fn new(filter_enabled: bool, change_threshold_c: f64) -> Self {
        Self {
            window: HistoryBuffer::new(),
            filter_enabled,
            change_threshold_c,
            last_reported: None,
        }
    }

    /// Feed a raw reading and return the value the controller should use.
    pub fn push(&mut self, raw_c: f64) -> f64 {
        if !self.filter_enabled {
            return raw_c;
        }
        self.window.write(raw_c);
        let samples = self.window.as_slice();
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Returns `Some(value)` when `value` differs from the last reported
    /// temperature by at least the threshold, and records it as reported.
    pub fn significant_change(&mut self, value_c: f64) -> Option<f64> {
        let changed = match self.last_reported {
            None => true,
            Some(last) => (value_c - last).abs() >= self.change_threshold_c,
        };
        if changed {
            self.last_reported = Some(value_c);
            Some(value_c)
        } else {
            None
        }
    }

    /// Drop buffered samples (after a sensor fault the window is stale).
    pub fn reset(&mut self) {
        self.window = HistoryBuffer::new();
    }
}
