//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM, the shared context and the temperature
//! tracker.  It exposes a hardware-agnostic API; all I/O flows through port
//! traits injected at call sites, so the whole service runs against mock
//! adapters in tests.
//!
//! ```text
//!   SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!    ClockPort ──▶ │       AppService       │
//! ActuatorPort ◀── │  FSM · Profile · PID   │ ◀─▶ ConfigPort
//!                  └────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) is: read sensor → FSM update (setpoint,
//! PID, profile advance, transitions) → heater write → events.  The service
//! never sleeps; an outer run loop decides the tick rate.

use core::time::Duration;

use log::{error, info, warn};

use crate::config::ControllerConfig;
use crate::control::pid::PidController;
use crate::error::{ConfigError, ControllerError, Result};
use crate::fsm::context::ControlContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::profile::builtin::CALIBRATION_ID;
use crate::profile::{Profile, ProfileRegistry};
use crate::sensors::temperature::TemperatureTracker;
use crate::sensors::{SensorFault, ThermocoupleReading};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ClockPort, ConfigPort, EventSink, SensorPort};

/// Quiet period after the last settings change before an automatic save.
pub const AUTO_SAVE_DELAY: Duration = Duration::from_secs(5);

/// What the service looked like before a step, for change events.
#[derive(Clone, Copy)]
struct Marker {
    state: StateId,
    run_serial: u64,
    stage: Option<usize>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: ControlContext,
    tracker: TemperatureTracker,
    config: ControllerConfig,
    tick_count: u64,
    /// Last duty handed to the actuator port.
    written_duty: Option<f64>,
    /// Time of the first unsaved settings change.
    dirty_since: Option<Duration>,
    save_requested: bool,
}

impl AppService {
    /// Construct the service with the built-in profiles plus any profiles
    /// defined in `config`.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let mut registry = ProfileRegistry::builtin()?;
        for def in &config.profiles {
            registry.insert(def.build()?);
        }
        Self::with_registry(config, registry)
    }

    /// Construct the service around an explicit registry.
    pub fn with_registry(config: ControllerConfig, registry: ProfileRegistry) -> Result<Self> {
        config.validate()?;
        let selected = resolve_selection(config.profile.as_deref(), &registry)?;
        info!(
            "AppService: {} profiles, selected '{selected}'",
            registry.len()
        );

        let tracker = TemperatureTracker::new(
            config.filter_temperature,
            config.temperature_change_threshold_c,
        );
        let ctx = ControlContext::new(&config, registry, selected);
        let fsm = Fsm::new(build_state_table());

        Ok(Self {
            fsm,
            ctx,
            tracker,
            config,
            tick_count: 0,
            written_duty: None,
            dirty_since: None,
            save_requested: false,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter standby and write the initial (off) heater command.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, clock: &impl ClockPort, sink: &mut impl EventSink) {
        self.ctx.now = clock.now();
        self.fsm.start(StateId::Standby, &mut self.ctx);
        self.apply_heater(hw, sink);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Sensor`] for a sensor failure that could not be
    /// classified.  The heater is written off before the error returns.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.tick_count += 1;
        self.ctx.now = clock.now();
        let before = self.marker();

        // 1. Sensor
        if let Err(e) = self.read_sensor(hw, sink) {
            error!("tick {}: {e}; heater off, stopping", self.tick_count);
            self.ctx.heater.off();
            self.apply_heater(hw, sink);
            return Err(e);
        }

        // 2-4. Setpoint, PID, profile advance (inside the state handlers)
        self.fsm.tick(&mut self.ctx);

        // 5. Heater write and change events
        self.publish(before, hw, sink);
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now = clock.now();
        match cmd {
            AppCommand::StartReflow => self.switch_to_at(StateId::Reflow.name(), hw, sink),
            AppCommand::StartCalibration => self.switch_to_at(StateId::Calibrate.name(), hw, sink),
            AppCommand::Stop => self.switch_to_at(StateId::Standby.name(), hw, sink),
            AppCommand::SelectProfile(id) => self.select_profile(&id, sink),
            AppCommand::SelectNextProfile => {
                let next = self
                    .ctx
                    .profiles
                    .next_after(&self.ctx.selected_profile)
                    .map(str::to_owned)
                    .ok_or_else(|| ControllerError::UnknownProfile(String::new()))?;
                self.select_profile(&next, sink)
            }
            AppCommand::UpdateGains(gains) => {
                self.ctx.pid.set_gains(gains);
                self.config.pid = self.config.pid.with_gains(gains);
                info!(
                    "PID gains updated: P={} I={} D={}",
                    gains.p_gain, gains.i_gain, gains.d_gain
                );
                self.mark_config_dirty();
                Ok(())
            }
            AppCommand::SaveConfig => {
                self.mark_config_dirty();
                self.save_requested = true;
                info!("explicit config save requested (flushed on next auto-save check)");
                Ok(())
            }
        }
    }

    /// Switch the FSM to the state called `name` right away.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownState`] if no state has that name.
    pub fn switch_to(
        &mut self,
        name: &str,
        hw: &mut impl ActuatorPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now = clock.now();
        self.switch_to_at(name, hw, sink)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        let run = self.ctx.run.as_ref();
        TelemetryData {
            state: self.fsm.current_state(),
            selected_profile: self.ctx.selected_profile.clone(),
            stage: run.and_then(Profile::current_stage).map(|s| s.name.clone()),
            run_elapsed_secs: run.and_then(|r| r.elapsed(self.ctx.now).ok()),
            temperature_c: self.ctx.sensors.temperature,
            reference_temperature_c: self.ctx.sensors.reference_temperature,
            setpoint_c: self.ctx.pid.setpoint(),
            heater_duty: self.ctx.heater.duty(),
            sensor_fault: self.ctx.sensors.fault.clone(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn active_state_name(&self) -> &'static str {
        self.fsm.current_name()
    }

    /// Oven temperature, `None` while the probe is faulted.
    pub fn current_temperature(&self) -> Option<f64> {
        self.ctx.sensors.temperature
    }

    pub fn reference_temperature(&self) -> Option<f64> {
        self.ctx.sensors.reference_temperature
    }

    /// Last commanded heater duty in `[0, 1]`.
    pub fn heater_command(&self) -> f64 {
        self.ctx.heater.duty()
    }

    pub fn setpoint(&self) -> f64 {
        self.ctx.pid.setpoint()
    }

    pub fn selected_profile(&self) -> &str {
        &self.ctx.selected_profile
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.ctx.profiles
    }

    /// The running profile, present in calibrate and reflow.
    pub fn active_run(&self) -> Option<&Profile> {
        self.ctx.run.as_ref()
    }

    pub fn pid(&self) -> &PidController {
        &self.ctx.pid
    }

    /// Live PID instance, for tuning front-ends.
    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.ctx.pid
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The live configuration: startup config with the current selection
    /// and gains folded in.
    pub fn current_config(&self) -> ControllerConfig {
        ControllerConfig {
            profile: Some(self.ctx.selected_profile.clone()),
            pid: self.config.pid.with_gains(self.ctx.pid.gains()),
            ..self.config.clone()
        }
    }

    // ── Config persistence ────────────────────────────────────

    /// Save the live selection and gains through `storage`.
    pub fn persist_selection(&mut self, storage: &impl ConfigPort) -> core::result::Result<(), ConfigError> {
        storage.save(&self.current_config())?;
        self.dirty_since = None;
        self.save_requested = false;
        info!("selection saved: profile '{}'", self.ctx.selected_profile);
        Ok(())
    }

    /// Save if settings changed at least [`AUTO_SAVE_DELAY`] ago, or a
    /// save was requested.  Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort, clock: &impl ClockPort) -> bool {
        let Some(since) = self.dirty_since else {
            return false;
        };
        if !self.save_requested && clock.now().saturating_sub(since) < AUTO_SAVE_DELAY {
            return false;
        }
        match self.persist_selection(storage) {
            Ok(()) => true,
            Err(e) => {
                warn!("config auto-save failed: {e}");
                false
            }
        }
    }

    /// Whether the selection or gains changed since the last save.
    pub fn is_config_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    fn mark_config_dirty(&mut self) {
        if self.dirty_since.is_none() {
            self.dirty_since = Some(self.ctx.now);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn marker(&self) -> Marker {
        Marker {
            state: self.fsm.current_state(),
            run_serial: self.ctx.run_serial,
            stage: self.ctx.run.as_ref().and_then(Profile::current_index),
        }
    }

    fn switch_to_at(
        &mut self,
        name: &str,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let before = self.marker();
        self.fsm.switch_to(name, &mut self.ctx)?;
        self.publish(before, hw, sink);
        Ok(())
    }

    fn select_profile(&mut self, id: &str, sink: &mut impl EventSink) -> Result<()> {
        if id == CALIBRATION_ID || !self.ctx.profiles.contains(id) {
            warn!("cannot select profile '{id}'");
            return Err(ControllerError::UnknownProfile(id.to_owned()));
        }
        if self.ctx.selected_profile != id {
            self.ctx.selected_profile = id.to_owned();
            info!("profile selected: '{id}'");
            if self.ctx.run.is_some() {
                info!("selection applies to the next run");
            }
            self.mark_config_dirty();
            sink.emit(&AppEvent::ProfileSelected(id.to_owned()));
        }
        Ok(())
    }

    /// Read the thermocouple into the context.  Recoverable faults clear
    /// the temperature; an unclassified one is returned.  A reading that is
    /// not a finite number counts as [`SensorFault::FaultyReading`].
    fn read_sensor(&mut self, hw: &mut impl SensorPort, sink: &mut impl EventSink) -> Result<()> {
        let reading = hw.read().and_then(|r| {
            if r.temperature.is_finite() && r.reference_temperature.is_finite() {
                Ok(r)
            } else {
                Err(SensorFault::FaultyReading)
            }
        });
        match reading {
            Ok(reading) => {
                if self.ctx.sensors.fault.is_some() {
                    info!("thermocouple recovered");
                    sink.emit(&AppEvent::SensorRecovered);
                }
                let temperature = self.tracker.push(reading.temperature);
                self.ctx.sensors.apply_reading(ThermocoupleReading {
                    temperature,
                    reference_temperature: reading.reference_temperature,
                });
                if let Some(t) = self.tracker.significant_change(temperature) {
                    sink.emit(&AppEvent::TemperatureChanged(t));
                }
                Ok(())
            }
            Err(fault) => {
                let repeated = self.ctx.sensors.fault.as_ref() == Some(&fault);
                self.ctx.sensors.apply_fault(fault.clone());
                self.tracker.reset();
                if !repeated {
                    sink.emit(&AppEvent::SensorFault(fault.clone()));
                }
                if fault.is_recoverable() {
                    if !repeated {
                        warn!("thermocouple fault: {fault}; temperature unavailable");
                    }
                    Ok(())
                } else {
                    Err(ControllerError::Sensor(fault))
                }
            }
        }
    }

    /// Write a pending heater command and emit change events.
    fn publish(&mut self, before: Marker, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.apply_heater(hw, sink);

        let state = self.fsm.current_state();
        if let Some(summary) = self.ctx.finished_run.take() {
            sink.emit(&AppEvent::RunFinished {
                profile: summary.profile_id,
                completed: summary.completed,
            });
        }
        if state != before.state {
            sink.emit(&AppEvent::StateChanged {
                from: before.state,
                to: state,
            });
        }
        if let Some(run) = &self.ctx.run {
            let index = run.current_index();
            let same_stage = before.run_serial == self.ctx.run_serial && before.stage == index;
            if let (false, Some(index), Some(stage)) = (same_stage, index, run.current_stage()) {
                sink.emit(&AppEvent::StageChanged {
                    profile: run.id().to_owned(),
                    index,
                    name: stage.name.clone(),
                });
            }
        }
    }

    fn apply_heater(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let Some(duty) = self.ctx.heater.take_pending() else {
            return;
        };
        hw.set_heater(duty);
        if self.written_duty != Some(duty) {
            sink.emit(&AppEvent::HeaterChanged { duty });
        }
        self.written_duty = Some(duty);
    }
}

/// Pick the startup profile: the configured one if selectable, otherwise
/// the first selectable profile.
fn resolve_selection(configured: Option<&str>, registry: &ProfileRegistry) -> Result<String> {
    if let Some(id) = configured {
        if id != CALIBRATION_ID && registry.contains(id) {
            return Ok(id.to_owned());
        }
        warn!("configured profile '{id}' is not available, using the default");
    }
    registry
        .default_profile_id()
        .map(str::to_owned)
        .ok_or_else(|| ControllerError::UnknownProfile(configured.unwrap_or_default().to_owned()))
}
