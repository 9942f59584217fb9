//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, redraw a display, record
//! them in a test.

use crate::fsm::StateId;
use crate::sensors::SensorFault;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The active run moved to another stage.
    StageChanged {
        profile: String,
        index: usize,
        name: String,
    },

    /// A run ended, either by running out of stages or by being stopped.
    RunFinished { profile: String, completed: bool },

    /// The heater command changed.
    HeaterChanged { duty: f64 },

    /// The oven temperature moved by at least the configured threshold.
    TemperatureChanged(f64),

    /// The thermocouple reported a fault.
    SensorFault(SensorFault),

    /// The thermocouple delivered a reading again after a fault.
    SensorRecovered,

    /// A different profile was selected.
    ProfileSelected(String),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub selected_profile: String,
    /// Name of the active stage while a run is in progress.
    pub stage: Option<String>,
    /// Seconds since the active run started.
    pub run_elapsed_secs: Option<f64>,
    pub temperature_c: Option<f64>,
    pub reference_temperature_c: Option<f64>,
    pub setpoint_c: f64,
    pub heater_duty: f64,
    pub sensor_fault: Option<SensorFault>,
}
