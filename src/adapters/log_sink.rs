//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade.  A display or remote-UI adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one line.
#[derive(Debug, Default)]
pub struct LogEventSink {
    /// Also log `TemperatureChanged`, which fires on every significant
    /// move of the reading.
    pub verbose: bool,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

fn fmt_temp(t: Option<f64>) -> String {
    t.map_or_else(|| "--".to_owned(), |v| format!("{v:.1}\u{00b0}C"))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={} | profile={} stage={} t={} | T={} ref={} sp={:.1}\u{00b0}C | heater={:.0}%{}",
                    t.state,
                    t.selected_profile,
                    t.stage.as_deref().unwrap_or("-"),
                    t.run_elapsed_secs
                        .map_or_else(|| "-".to_owned(), |s| format!("{s:.1}s")),
                    fmt_temp(t.temperature_c),
                    fmt_temp(t.reference_temperature_c),
                    t.setpoint_c,
                    t.heater_duty * 100.0,
                    t.sensor_fault
                        .as_ref()
                        .map_or_else(String::new, |f| format!(" | fault={f}")),
                );
            }
            AppEvent::Started(state) => info!("START | initial_state={state}"),
            AppEvent::StateChanged { from, to } => info!("STATE | {from} -> {to}"),
            AppEvent::StageChanged {
                profile,
                index,
                name,
            } => info!("STAGE | {profile} [{index}] {name}"),
            AppEvent::RunFinished { profile, completed } => info!(
                "RUN   | {profile} {}",
                if *completed { "completed" } else { "stopped" }
            ),
            AppEvent::HeaterChanged { duty } => info!("HEAT  | {:.0}%", duty * 100.0),
            AppEvent::TemperatureChanged(t) => {
                if self.verbose {
                    info!("TEMP  | {t:.2}\u{00b0}C");
                }
            }
            AppEvent::SensorFault(fault) => warn!("FAULT | thermocouple: {fault}"),
            AppEvent::SensorRecovered => info!("FAULT | thermocouple recovered"),
            AppEvent::ProfileSelected(id) => info!("SELECT| {id}"),
        }
    }
}
