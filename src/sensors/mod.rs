//! Thermocouple sensor model — readings, fault classification, tracking.
//!
//! The concrete driver (MAX31855 over SPI, a simulator, ...) lives behind
//! [`SensorPort`](crate::app::ports::SensorPort).  This module only
//! knows what a reading looks like and how to interpret a failed one.

pub mod temperature;

use thiserror::Error;

/// Granularity of the cold-junction sensor.  Reference readings are
/// quantised to this step before use.
pub const REFERENCE_RESOLUTION_C: f64 = 0.25;

/// One successful thermocouple conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermocoupleReading {
    /// Hot-junction (oven) temperature in °C.
    pub temperature: f64,
    /// Cold-junction (ambient) temperature in °C.
    pub reference_temperature: f64,
}

/// A failed sensor read.
///
/// The first four kinds are the fault bits a thermocouple amplifier
/// reports; they are transient from the controller's point of view and
/// only cost the current tick its measurement.  Anything else is
/// [`SensorFault::Unknown`] and stops the control loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorFault {
    #[error("short circuit to ground")]
    ShortToGround,
    #[error("short circuit to power")]
    ShortToPower,
    #[error("thermocouple not connected")]
    NotConnected,
    #[error("faulty reading")]
    FaultyReading,
    #[error("{0}")]
    Unknown(String),
}

impl SensorFault {
    /// Map a driver error message onto a fault kind.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_ascii_lowercase();
        if msg.contains("short circuit to ground") {
            Self::ShortToGround
        } else if msg.contains("short circuit to power") {
            Self::ShortToPower
        } else if msg.contains("faulty reading") {
            Self::FaultyReading
        } else if msg.contains("thermocouple not connected") {
            Self::NotConnected
        } else {
            Self::Unknown(message.to_owned())
        }
    }

    /// `true` for the classified probe faults the loop can ride through.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Round a raw cold-junction reading to the sensor's resolution.
pub fn quantise_reference(raw: f64) -> f64 {
    (raw / REFERENCE_RESOLUTION_C).round() * REFERENCE_RESOLUTION_C
}
