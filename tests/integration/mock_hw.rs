//! Mock adapters for integration tests.
//!
//! Records every heater write and every emitted event so tests can assert
//! on the full history without a real thermocouple or relay.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use reflow::app::events::AppEvent;
use reflow::app::ports::{ActuatorPort, ClockPort, ConfigPort, EventSink, SensorPort};
use reflow::config::{ConfigOverrides, ControllerConfig};
use reflow::error::ConfigError;
use reflow::fsm::StateId;
use reflow::sensors::{SensorFault, ThermocoupleReading};

// ── MockOven ──────────────────────────────────────────────────

/// Thermocouple + heater stand-in.  Reads return whatever was last
/// configured; writes are recorded.
pub struct MockOven {
    pub reading: Result<ThermocoupleReading, SensorFault>,
    pub heater_writes: Vec<f64>,
}

#[allow(dead_code)]
impl MockOven {
    pub fn new() -> Self {
        Self {
            reading: Ok(ThermocoupleReading {
                temperature: 25.0,
                reference_temperature: 21.0,
            }),
            heater_writes: Vec::new(),
        }
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        let reference_temperature = match &self.reading {
            Ok(r) => r.reference_temperature,
            Err(_) => 21.0,
        };
        self.reading = Ok(ThermocoupleReading {
            temperature,
            reference_temperature,
        });
    }

    pub fn set_reading(&mut self, temperature: f64, reference_temperature: f64) {
        self.reading = Ok(ThermocoupleReading {
            temperature,
            reference_temperature,
        });
    }

    /// Fail every following read with the fault the driver message maps to.
    pub fn fail_with(&mut self, message: &str) {
        self.reading = Err(SensorFault::classify(message));
    }

    pub fn last_heater(&self) -> Option<f64> {
        self.heater_writes.last().copied()
    }

    pub fn heater_on(&self) -> bool {
        self.last_heater().is_some_and(|d| d > 0.0)
    }
}

impl Default for MockOven {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockOven {
    fn read(&mut self) -> Result<ThermocoupleReading, SensorFault> {
        self.reading.clone()
    }
}

impl ActuatorPort for MockOven {
    fn set_heater(&mut self, duty: f64) {
        self.heater_writes.push(duty);
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    now: Cell<Duration>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_secs(&self, secs: u64) {
        self.now.set(Duration::from_secs(secs));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.now.set(self.now.get() + Duration::from_secs(secs));
    }
}

impl ClockPort for MockClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn state_changes(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StageChanged { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MemoryConfig ──────────────────────────────────────────────

/// In-memory [`ConfigPort`] storing the last saved config.
#[derive(Default)]
pub struct MemoryConfig {
    pub stored: RefCell<Option<ControllerConfig>>,
    pub saves: Cell<u32>,
    pub fail_saves: bool,
}

#[allow(dead_code)]
impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn stored_profile(&self) -> Option<String> {
        self.stored.borrow().as_ref().and_then(|c| c.profile.clone())
    }
}

impl ConfigPort for MemoryConfig {
    fn load(&self) -> Result<ConfigOverrides, ConfigError> {
        let stored = self.stored.borrow();
        let config = stored.as_ref().ok_or(ConfigError::NotFound)?;
        let value = serde_json::to_value(config).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ConfigError::Corrupted(e.to_string()))
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        if self.fail_saves {
            return Err(ConfigError::Io("storage offline".into()));
        }
        config.validate()?;
        self.saves.set(self.saves.get() + 1);
        *self.stored.borrow_mut() = Some(config.clone());
        Ok(())
    }
}
