//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (thermocouple, heater, clock, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or the system clock directly.

use core::time::Duration;

use crate::config::{ConfigOverrides, ControllerConfig};
use crate::error::ConfigError;
use crate::sensors::{SensorFault, ThermocoupleReading};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one thermocouple conversion per call.
pub trait SensorPort {
    /// Read the oven and cold-junction temperatures.
    ///
    /// Probe faults the driver can name come back as the matching
    /// [`SensorFault`] kind; anything else as [`SensorFault::Unknown`].
    fn read(&mut self) -> Result<ThermocoupleReading, SensorFault>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the heater.
pub trait ActuatorPort {
    /// Set the heater duty cycle, `0.0` (off) to `1.0` (full power).
    fn set_heater(&mut self, duty: f64);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Only differences between two readings are
/// meaningful.
pub trait ClockPort {
    fn now(&self) -> Duration;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, display,
/// test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load stored settings.  [`ConfigError::NotFound`] when nothing has
    /// been stored yet.
    fn load(&self) -> Result<ConfigOverrides, ConfigError>;

    /// Validate and persist `config`.
    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}
