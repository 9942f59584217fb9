//! Discrete PID controller for the heater.
//!
//! Rate-limited: [`PidController::update`] only recomputes once more than
//! `update_interval` has passed since the previous evaluation, however often
//! the loop polls it.  A gated call returns `None`, which callers treat as
//! "keep the current heater command", not as an error.
//!
//! - The integral accumulator is clamped *before* it is scaled by the gain
//!   (anti-windup).
//! - The derivative acts on the measurement, not on the error, so a ramp
//!   or step in the setpoint does not kick the output.
//! - Output is clamped to `[output_min, output_max]` (percent) and emitted
//!   divided by 100, i.e. as a heater duty in `[0, 1]` for the default
//!   bounds.

use core::time::Duration;

use log::{debug, warn};

use crate::config::{PidConfig, PidGains};

/// Intermediate values of one evaluation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidTerms {
    pub setpoint: f64,
    pub measurement: f64,
    pub error: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    /// Clamped output in percent.
    pub output: f64,
}

/// Result of an evaluation that passed the rate gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidOutput {
    /// Normalised heater command (`output / 100`).
    pub duty: f64,
    pub terms: PidTerms,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    update_interval_secs: f64,
    output_min: f64,
    output_max: f64,
    integral_min: f64,
    integral_max: f64,

    integral: f64,
    last_measurement: Option<f64>,
    setpoint: f64,
    last_update: Duration,
    last_error: f64,
    last_output: f64,
}

impl PidController {
    pub fn new(config: &PidConfig) -> Self {
        Self {
            gains: config.gains(),
            update_interval_secs: config.update_interval_secs,
            output_min: config.output_min,
            output_max: config.output_max,
            integral_min: config.integral_min,
            integral_max: config.integral_max,
            integral: 0.0,
            last_measurement: None,
            setpoint: 0.0,
            last_update: Duration::ZERO,
            last_error: 0.0,
            last_output: 0.0,
        }
    }

    // ── Tuning ────────────────────────────────────────────────

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Replace the gains; accumulated state is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// Last clamped output in percent.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// Smallest and largest duty [`update`](Self::update) can emit.
    pub fn duty_bounds(&self) -> (f64, f64) {
        (self.output_min / 100.0, self.output_max / 100.0)
    }

    // ── Evaluation ────────────────────────────────────────────

    /// Evaluate the loop for `measurement`.
    ///
    /// A `setpoint` override replaces the stored setpoint before the error
    /// is computed.  Returns `None` while rate-limited; state is untouched
    /// in that case.
    pub fn update(
        &mut self,
        now: Duration,
        measurement: f64,
        setpoint: Option<f64>,
    ) -> Option<PidOutput> {
        let since = now.saturating_sub(self.last_update).as_secs_f64();
        if since <= self.update_interval_secs {
            return None;
        }
        let target = setpoint.unwrap_or(self.setpoint);
        if !(measurement.is_finite() && target.is_finite()) {
            warn!("PID: ignoring non-finite input (measurement={measurement}, setpoint={target})");
            return None;
        }
        self.setpoint = target;

        let error = target - measurement;

        // Proportional
        let p = self.gains.p_gain * error;

        // Integral, clamped before scaling
        self.integral = (self.integral + error).clamp(self.integral_min, self.integral_max);
        let i = self.gains.i_gain * self.integral;

        // Derivative on measurement
        let previous = self.last_measurement.unwrap_or(measurement);
        let d = self.gains.d_gain * (measurement - previous);
        self.last_measurement = Some(measurement);

        let raw = p + i - d;
        let output = if raw.is_nan() {
            self.output_min
        } else {
            raw.clamp(self.output_min, self.output_max)
        };

        self.last_error = error;
        self.last_output = output;
        self.last_update = now;

        let terms = PidTerms {
            setpoint: target,
            measurement,
            error,
            p,
            i,
            d,
            output,
        };
        debug!(
            "PID: sp={:>7.2} pv={:>7.2} err={:>7.2} P={:>7.2} I={:>7.2} D={:>7.2} out={:>7.2}",
            terms.setpoint, terms.measurement, terms.error, terms.p, terms.i, terms.d, terms.output
        );

        Some(PidOutput {
            duty: output / 100.0,
            terms,
        })
    }

    /// Clear integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_measurement = None;
        self.last_error = 0.0;
    }
}
