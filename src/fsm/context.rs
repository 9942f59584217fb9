//! Shared mutable context threaded through every FSM handler.
//!
//! `ControlContext` is the single struct that state handlers read from and
//! write to: the latest sensor snapshot, the PID loop, the profile
//! registry and the active run, and the pending heater command.  The
//! application service fills in the sensor snapshot and the clock before
//! each tick and applies the heater command afterwards.

use core::time::Duration;

use log::{error, info};

use crate::config::ControllerConfig;
use crate::control::pid::{PidController, PidTerms};
use crate::profile::builtin::CALIBRATION_ID;
use crate::profile::{Profile, ProfileRegistry};
use crate::sensors::{quantise_reference, SensorFault, ThermocoupleReading};

// ---------------------------------------------------------------------------
// Sensor snapshot (written by the application service)
// ---------------------------------------------------------------------------

/// The most recent thermocouple state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Oven temperature (°C).  `None` while the probe is faulted or
    /// before the first successful read.
    pub temperature: Option<f64>,
    /// Cold-junction temperature (°C), quantised to the sensor resolution.
    /// Kept across faults: the reference chip is still valid when the
    /// probe is not.
    pub reference_temperature: Option<f64>,
    /// Fault reported by the last read, if any.
    pub fault: Option<SensorFault>,
}

impl SensorSnapshot {
    pub fn apply_reading(&mut self, reading: ThermocoupleReading) {
        self.temperature = Some(reading.temperature);
        self.reference_temperature = Some(quantise_reference(reading.reference_temperature));
        self.fault = None;
    }

    pub fn apply_fault(&mut self, fault: SensorFault) {
        self.temperature = None;
        self.fault = Some(fault);
    }
}

// ---------------------------------------------------------------------------
// Heater command (written by state handlers, consumed by the service)
// ---------------------------------------------------------------------------

/// Last commanded heater duty plus a flag telling the service that a
/// write is due.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaterCommand {
    duty: f64,
    pending: bool,
}

impl HeaterCommand {
    /// Request `duty`, clamped to `[0, 1]`.  Non-finite requests turn the
    /// heater off.
    pub fn command(&mut self, duty: f64) {
        self.duty = if duty.is_finite() { duty.clamp(0.0, 1.0) } else { 0.0 };
        self.pending = true;
    }

    pub fn off(&mut self) {
        self.command(0.0);
    }

    /// The last commanded duty.
    pub fn duty(&self) -> f64 {
        self.duty
    }

    /// Take the pending write, if any.
    pub fn take_pending(&mut self) -> Option<f64> {
        if self.pending {
            self.pending = false;
            Some(self.duty)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

/// How a profile run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub profile_id: String,
    /// `true` if every stage ran out, `false` if the run was stopped.
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct ControlContext {
    // -- Timing --
    /// Time of the current tick, from the clock port.
    pub now: Duration,
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Sensor data --
    pub sensors: SensorSnapshot,

    // -- Control --
    pub pid: PidController,
    /// Last PID evaluation that passed the rate gate.
    pub last_terms: Option<PidTerms>,
    /// Setpoint used when neither a target nor a reference is available.
    pub fallback_temperature_c: f64,

    // -- Profiles --
    pub profiles: ProfileRegistry,
    /// Profile started by the reflow state.
    pub selected_profile: String,
    /// Running profile, present only in calibrate and reflow.
    pub run: Option<Profile>,
    /// Incremented each time a run starts.
    pub run_serial: u64,
    /// Set when a run ends; the service turns it into an event.
    pub finished_run: Option<RunSummary>,

    // -- Actuator output --
    pub heater: HeaterCommand,
}

impl ControlContext {
    pub fn new(config: &ControllerConfig, profiles: ProfileRegistry, selected_profile: String) -> Self {
        Self {
            now: Duration::ZERO,
            ticks_in_state: 0,
            total_ticks: 0,
            sensors: SensorSnapshot::default(),
            pid: PidController::new(&config.pid),
            last_terms: None,
            fallback_temperature_c: config.fallback_temperature_c,
            profiles,
            selected_profile,
            run: None,
            run_serial: 0,
            finished_run: None,
            heater: HeaterCommand::default(),
        }
    }

    /// Lowest sensible setpoint: the cold-junction reading when known,
    /// otherwise the configured fallback.
    pub fn floor_temperature(&self) -> f64 {
        self.sensors
            .reference_temperature
            .unwrap_or(self.fallback_temperature_c)
    }

    /// Set the PID setpoint.  `None` falls back to the floor temperature,
    /// so an idle loop never aims below ambient.
    pub fn set_heater_target(&mut self, target: Option<f64>) {
        let setpoint = target.unwrap_or_else(|| self.floor_temperature());
        self.pid.set_setpoint(setpoint);
    }

    /// Target of the active run at `now`, raised to the reference
    /// temperature.
    pub fn profile_target(&self) -> Option<f64> {
        let target = self.run.as_ref()?.target_at(self.now)?;
        Some(match self.sensors.reference_temperature {
            Some(reference) if target < reference => reference,
            _ => target,
        })
    }

    /// Start a fresh run of `profile_id`.  Returns `false` if the profile
    /// is not registered.
    pub fn start_run(&mut self, profile_id: &str) -> bool {
        let Some(profile) = self.profiles.get(profile_id) else {
            error!("cannot start run: profile '{profile_id}' is not registered");
            return false;
        };
        let mut run = profile.clone();
        run.start(self.now, self.floor_temperature());
        info!(
            "run started: profile '{profile_id}' ({:.0}s, floor {:.2}°C)",
            run.total_duration(),
            run.temperature_floor()
        );
        self.run = Some(run);
        self.run_serial += 1;
        self.pid.reset();
        self.last_terms = None;
        true
    }

    /// Start a run of the calibration profile.
    pub fn start_calibration(&mut self) -> bool {
        self.start_run(CALIBRATION_ID)
    }

    /// End the active run, if any, and record how it ended.
    pub fn finish_run(&mut self) {
        if let Some(run) = self.run.take() {
            let completed = run.is_finished();
            info!(
                "run {}: profile '{}'",
                if completed { "completed" } else { "stopped" },
                run.id()
            );
            self.finished_run = Some(RunSummary {
                profile_id: run.id().to_owned(),
                completed,
            });
        }
    }
}
