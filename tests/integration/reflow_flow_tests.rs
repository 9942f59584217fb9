//! Reflow runs end to end: commands → FSM → profile → PID → heater.

use reflow::app::commands::AppCommand;
use reflow::app::events::AppEvent;
use reflow::app::service::AppService;
use reflow::config::{ControllerConfig, PidGains};
use reflow::error::ControllerError;
use reflow::fsm::StateId;

use super::mock_hw::{MockClock, MockOven, RecordingSink};

/// Started service with one reading taken at t = 0.
fn setup(profile: &str) -> (AppService, MockOven, MockClock, RecordingSink) {
    let mut app = AppService::new(ControllerConfig {
        profile: Some(profile.into()),
        ..Default::default()
    })
    .unwrap();
    let mut oven = MockOven::new();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();
    app.start(&mut oven, &clock, &mut sink);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    (app, oven, clock, sink)
}

fn command(
    app: &mut AppService,
    cmd: AppCommand,
    oven: &mut MockOven,
    clock: &MockClock,
    sink: &mut RecordingSink,
) {
    app.handle_command(cmd, oven, clock, sink).unwrap();
}

/// Two 1 s ticks: the first leaves the `start` stage, the second drives
/// the heater on the preheat ramp.
fn heat_into_preheat(
    app: &mut AppService,
    oven: &mut MockOven,
    clock: &MockClock,
    sink: &mut RecordingSink,
) {
    for _ in 0..2 {
        clock.advance_secs(1);
        app.tick(oven, clock, sink).unwrap();
    }
}

#[test]
fn full_run_walks_every_stage_and_returns_to_standby() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Reflow);

    for _ in 0..40 {
        clock.advance_secs(1);
        app.tick(&mut oven, &clock, &mut sink).unwrap();
        if app.state() == StateId::Standby {
            break;
        }
    }

    assert_eq!(app.active_state_name(), "standby");
    assert_eq!(
        sink.stage_names(),
        ["start", "preheat", "soak", "reflow", "cool", "end"]
    );
    assert!(sink.contains(&AppEvent::RunFinished {
        profile: "testdev".into(),
        completed: true
    }));
    assert_eq!(
        sink.state_changes(),
        [
            (StateId::Standby, StateId::Reflow),
            (StateId::Reflow, StateId::Standby)
        ]
    );
    assert_eq!(app.heater_command(), 0.0);
    assert_eq!(oven.last_heater(), Some(0.0));
    assert!(app.active_run().is_none());
}

#[test]
fn exhausted_profile_lands_in_standby_with_heater_off() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    heat_into_preheat(&mut app, &mut oven, &clock, &mut sink);
    assert!(app.heater_command() > 0.0);

    // Far past the end: one stage per tick until the cursor runs out.
    clock.set_secs(1_000);
    let mut ticks = 0;
    while app.state() == StateId::Reflow && ticks < 10 {
        app.tick(&mut oven, &clock, &mut sink).unwrap();
        ticks += 1;
    }
    assert_eq!(ticks, 5);
    assert_eq!(app.active_state_name(), "standby");
    assert_eq!(app.heater_command(), 0.0);
    assert_eq!(oven.last_heater(), Some(0.0));
}

#[test]
fn pid_heats_a_cold_oven_toward_the_ramp() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    heat_into_preheat(&mut app, &mut oven, &clock, &mut sink);

    // Preheat ramps 21 → 150 °C over 5 s; 2 s in.
    assert!((app.setpoint() - 72.6).abs() < 1e-9);
    assert_eq!(app.heater_command(), 1.0);
    assert!(oven.heater_on());
    assert!(sink.contains(&AppEvent::HeaterChanged { duty: 1.0 }));
}

#[test]
fn updated_gains_shape_the_next_output() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    let gains = PidGains {
        p_gain: 0.5,
        i_gain: 0.0,
        d_gain: 0.0,
    };
    command(&mut app, AppCommand::UpdateGains(gains), &mut oven, &clock, &mut sink);
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    heat_into_preheat(&mut app, &mut oven, &clock, &mut sink);

    let expected = 0.5 * (72.6 - 25.0) / 100.0;
    assert!((app.heater_command() - expected).abs() < 1e-9);
}

#[test]
fn stop_aborts_the_run() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    heat_into_preheat(&mut app, &mut oven, &clock, &mut sink);
    assert!(oven.heater_on());

    command(&mut app, AppCommand::Stop, &mut oven, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Standby);
    assert_eq!(app.heater_command(), 0.0);
    assert_eq!(oven.last_heater(), Some(0.0));
    assert!(sink.contains(&AppEvent::RunFinished {
        profile: "testdev".into(),
        completed: false
    }));
    assert_eq!(
        sink.state_changes().last(),
        Some(&(StateId::Reflow, StateId::Standby))
    );
}

#[test]
fn stop_in_standby_is_idempotent() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    sink.clear();
    command(&mut app, AppCommand::Stop, &mut oven, &clock, &mut sink);
    command(&mut app, AppCommand::Stop, &mut oven, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Standby);
    assert!(sink.state_changes().is_empty());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::HeaterChanged { .. })),
        0
    );
    assert_eq!(oven.last_heater(), Some(0.0));
}

#[test]
fn switch_to_unknown_state_is_an_error() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    let err = app
        .switch_to("preheat", &mut oven, &clock, &mut sink)
        .unwrap_err();
    assert_eq!(err, ControllerError::UnknownState("preheat".into()));
    assert_eq!(app.state(), StateId::Standby);
}

#[test]
fn switch_to_by_name_runs_the_state_at_once() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    app.switch_to("reflow", &mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.state(), StateId::Reflow);
    // The immediate update already aimed at the start floor.
    assert_eq!(app.setpoint(), 21.0);
    assert_eq!(sink.stage_names(), ["start"]);
}

#[test]
fn calibration_runs_the_calibration_profile() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartCalibration, &mut oven, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Calibrate);
    assert_eq!(app.active_run().map(|p| p.id()), Some("calibration"));
    assert_eq!(app.selected_profile(), "testdev");
}

#[test]
fn selection_during_a_run_applies_to_the_next_run() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    command(
        &mut app,
        AppCommand::SelectProfile("testdev_60".into()),
        &mut oven,
        &clock,
        &mut sink,
    );
    assert_eq!(app.active_run().map(|p| p.id()), Some("testdev"));
    assert_eq!(app.selected_profile(), "testdev_60");

    command(&mut app, AppCommand::Stop, &mut oven, &clock, &mut sink);
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    assert_eq!(app.active_run().map(|p| p.id()), Some("testdev_60"));
}

#[test]
fn start_during_a_run_restarts_it() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    clock.advance_secs(3);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);

    assert_eq!(app.state(), StateId::Reflow);
    assert_eq!(app.active_run().unwrap().current_index(), Some(0));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::RunFinished { completed: false, .. })),
        1
    );
    assert_eq!(sink.state_changes().len(), 1);
}

#[test]
fn telemetry_tracks_the_run() {
    let (mut app, mut oven, clock, mut sink) = setup("testdev");
    command(&mut app, AppCommand::StartReflow, &mut oven, &clock, &mut sink);
    clock.advance_secs(7);
    app.tick(&mut oven, &clock, &mut sink).unwrap();

    let t = app.build_telemetry();
    assert_eq!(t.state, StateId::Reflow);
    assert_eq!(t.stage.as_deref(), Some("preheat"));
    assert_eq!(t.run_elapsed_secs, Some(7.0));
    assert_eq!(t.heater_duty, app.heater_command());
    assert!(t.sensor_fault.is_none());
}
