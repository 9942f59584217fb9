//! Reflow controller — host run loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedOven      LogEventSink   JsonConfigFile  SimClock  │
//! │  (Sensor+Actuator)  (EventSink)    (ConfigPort)    (Clock)   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                 │    │
//! │  │  FSM · Profile · PID                                 │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs one profile against the simulated oven, either as fast as
//! possible on a simulated clock or paced in real time.

use core::time::Duration;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use reflow::adapters::config_file::JsonConfigFile;
use reflow::adapters::log_sink::LogEventSink;
use reflow::adapters::sim::{OvenModel, SimulatedOven};
use reflow::adapters::time::{MonotonicClock, SimClock};
use reflow::app::commands::AppCommand;
use reflow::app::events::AppEvent;
use reflow::app::ports::{ClockPort, EventSink};
use reflow::app::service::AppService;
use reflow::config::ControllerConfig;
use reflow::fsm::StateId;

#[derive(Parser)]
#[command(name = "reflow")]
#[command(about = "Reflow oven PID controller - runs a profile against a simulated oven", long_about = None)]
struct Cli {
    /// Profile to run (defaults to the stored or first profile)
    #[arg(short, long)]
    profile: Option<String>,
    /// JSON settings file; created on exit if the selection changed
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Run the calibration profile instead of a reflow profile
    #[arg(long)]
    calibrate: bool,
    /// List the available profiles and exit
    #[arg(long)]
    list: bool,
    /// Control tick period in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Pace the loop with the wall clock instead of a simulated clock
    #[arg(long)]
    realtime: bool,
    /// Ambient (cold-junction) temperature of the simulated oven
    #[arg(long, default_value_t = 21.0)]
    ambient: f64,
    /// Stop after this many ticks even if the profile is still running
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Emit a telemetry line every N ticks
    #[arg(long, default_value_t = 20)]
    telemetry_every: u64,
    /// Log every significant temperature change
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!("reflow controller v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let storage = cli.config.as_ref().map(JsonConfigFile::new);
    let config = match &storage {
        Some(file) => ControllerConfig::from_port(file)
            .with_context(|| format!("loading {}", file.path().display()))?,
        None => ControllerConfig::default(),
    };

    // ── 2. Application core ───────────────────────────────────
    let mut app = AppService::new(config)?;

    if cli.list {
        for id in app.profiles().user_profile_ids() {
            if let Some(profile) = app.profiles().get(id) {
                println!("{}", profile.describe());
            }
        }
        return Ok(());
    }

    // ── 3. Adapters ───────────────────────────────────────────
    let mut oven = SimulatedOven::new(OvenModel {
        ambient_c: cli.ambient,
        ..OvenModel::default()
    });
    let mut sink = if cli.verbose {
        LogEventSink::verbose()
    } else {
        LogEventSink::new()
    };
    let tick = Duration::from_millis(cli.tick_ms.max(1));

    // ── 4. Run ────────────────────────────────────────────────
    let outcome = if cli.realtime {
        let clock = MonotonicClock::new();
        run(&cli, &mut app, &mut oven, &clock, &mut sink, storage.as_ref(), || {
            std::thread::sleep(tick);
        })
    } else {
        let clock = SimClock::new();
        run(&cli, &mut app, &mut oven, &clock, &mut sink, storage.as_ref(), || {
            clock.advance(tick);
        })
    };

    // ── 5. Persist selection ──────────────────────────────────
    if let Some(file) = &storage {
        if app.is_config_dirty() {
            if let Err(e) = app.persist_selection(file) {
                warn!("could not save settings: {e}");
            }
        }
    }

    outcome
}

/// Select, start and tick until the run ends.
fn run<C: ClockPort>(
    cli: &Cli,
    app: &mut AppService,
    oven: &mut SimulatedOven,
    clock: &C,
    sink: &mut impl EventSink,
    storage: Option<&JsonConfigFile>,
    mut wait: impl FnMut(),
) -> Result<()> {
    app.start(oven, clock, sink);
    if let Some(id) = &cli.profile {
        app.handle_command(AppCommand::SelectProfile(id.clone()), oven, clock, sink)?;
    }
    let start = if cli.calibrate {
        AppCommand::StartCalibration
    } else {
        AppCommand::StartReflow
    };
    app.handle_command(start, oven, clock, sink)?;
    if let Some(profile) = app.active_run() {
        info!("\n{}", profile.describe());
    }

    let telemetry_every = cli.telemetry_every.max(1);
    let mut last = clock.now();
    let mut peak = oven.temperature();

    loop {
        wait();
        let now = clock.now();
        oven.advance(now.saturating_sub(last));
        last = now;

        app.tick(oven, clock, sink)?;
        peak = peak.max(oven.temperature());

        if app.tick_count() % telemetry_every == 0 {
            sink.emit(&AppEvent::Telemetry(app.build_telemetry()));
        }
        if let Some(file) = storage {
            app.auto_save_if_needed(file, clock);
        }
        if app.state() == StateId::Standby {
            break;
        }
        if cli.max_ticks.is_some_and(|max| app.tick_count() >= max) {
            warn!("tick limit reached, stopping the run");
            app.handle_command(AppCommand::Stop, oven, clock, sink)?;
            break;
        }
    }

    info!(
        "done after {} ticks ({:.1}s): peak {:.1}°C, now {:.1}°C",
        app.tick_count(),
        clock.now().as_secs_f64(),
        peak,
        oven.temperature()
    );
    Ok(())
}
