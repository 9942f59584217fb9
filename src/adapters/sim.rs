//! Simulated oven.
//!
//! A first-order thermal model standing in for the thermocouple amplifier
//! and the heater relay:
//!
//! ```text
//!   dT/dt = duty · heating_rate − loss · (T − ambient)
//! ```
//!
//! Time only moves when [`SimulatedOven::advance`] is called, so the run
//! loop keeps the model and the clock in lock-step.  A fault can be
//! injected to exercise the controller's sensor-failure handling.

use core::time::Duration;

use log::debug;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::sensors::{SensorFault, ThermocoupleReading};

/// Thermal parameters of the simulated oven.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvenModel {
    /// Cold-junction / room temperature (°C).
    pub ambient_c: f64,
    /// Temperature rise per second at full heater power, ignoring losses.
    pub heating_rate_c_per_sec: f64,
    /// Fraction of the excess over ambient lost per second.
    pub loss_per_sec: f64,
}

impl Default for OvenModel {
    fn default() -> Self {
        Self {
            ambient_c: 21.0,
            heating_rate_c_per_sec: 3.0,
            loss_per_sec: 0.01,
        }
    }
}

pub struct SimulatedOven {
    model: OvenModel,
    temperature_c: f64,
    heater_duty: f64,
    fault: Option<SensorFault>,
    heater_writes: u64,
}

impl SimulatedOven {
    /// An oven at ambient temperature with the heater off.
    pub fn new(model: OvenModel) -> Self {
        Self {
            temperature_c: model.ambient_c,
            model,
            heater_duty: 0.0,
            fault: None,
            heater_writes: 0,
        }
    }

    /// Integrate the model over `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let secs = dt.as_secs_f64();
        let heating = self.heater_duty * self.model.heating_rate_c_per_sec;
        let loss = self.model.loss_per_sec * (self.temperature_c - self.model.ambient_c);
        self.temperature_c += (heating - loss) * secs;
        debug!(
            "sim: T={:.2}°C duty={:.2} (+{:.2} -{:.2} °C/s)",
            self.temperature_c, self.heater_duty, heating, loss
        );
    }

    /// Make every following read fail with `fault` (or succeed again
    /// with `None`).
    pub fn inject_fault(&mut self, fault: Option<SensorFault>) {
        self.fault = fault;
    }

    pub fn temperature(&self) -> f64 {
        self.temperature_c
    }

    pub fn heater_duty(&self) -> f64 {
        self.heater_duty
    }

    pub fn heater_writes(&self) -> u64 {
        self.heater_writes
    }
}

impl SensorPort for SimulatedOven {
    fn read(&mut self) -> Result<ThermocoupleReading, SensorFault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        Ok(ThermocoupleReading {
            temperature: self.temperature_c,
            reference_temperature: self.model.ambient_c,
        })
    }
}

impl ActuatorPort for SimulatedOven {
    fn set_heater(&mut self, duty: f64) {
        self.heater_duty = duty.clamp(0.0, 1.0);
        self.heater_writes += 1;
    }
}
