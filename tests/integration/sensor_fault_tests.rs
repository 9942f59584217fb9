//! Thermocouple faults, recovery and reading conditioning.

use reflow::app::commands::AppCommand;
use reflow::app::events::AppEvent;
use reflow::app::service::AppService;
use reflow::config::ControllerConfig;
use reflow::error::ControllerError;
use reflow::fsm::StateId;
use reflow::sensors::SensorFault;

use super::mock_hw::{MockClock, MockOven, RecordingSink};

fn setup(config: ControllerConfig) -> (AppService, MockOven, MockClock, RecordingSink) {
    let mut app = AppService::new(config).unwrap();
    let mut oven = MockOven::new();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();
    app.start(&mut oven, &clock, &mut sink);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    (app, oven, clock, sink)
}

/// Start a reflow and tick until the heater is on.
fn heating(app: &mut AppService, oven: &mut MockOven, clock: &MockClock, sink: &mut RecordingSink) {
    app.handle_command(AppCommand::StartReflow, oven, clock, sink)
        .unwrap();
    for _ in 0..2 {
        clock.advance_secs(1);
        app.tick(oven, clock, sink).unwrap();
    }
    assert!(oven.heater_on());
}

#[test]
fn disconnected_thermocouple_turns_heater_off_and_keeps_running() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    heating(&mut app, &mut oven, &clock, &mut sink);

    oven.fail_with("thermocouple not connected");
    clock.advance_secs(1);
    app.tick(&mut oven, &clock, &mut sink).unwrap();

    assert_eq!(app.current_temperature(), None);
    assert_eq!(app.heater_command(), 0.0);
    assert_eq!(oven.last_heater(), Some(0.0));
    assert_eq!(app.state(), StateId::Reflow);
    assert!(sink.contains(&AppEvent::SensorFault(SensorFault::NotConnected)));
    assert_eq!(
        app.build_telemetry().sensor_fault,
        Some(SensorFault::NotConnected)
    );
}

#[test]
fn every_classified_fault_is_recoverable() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    for message in [
        "short circuit to ground",
        "short circuit to power",
        "faulty reading",
        "thermocouple not connected",
    ] {
        oven.fail_with(message);
        clock.advance_secs(1);
        assert!(app.tick(&mut oven, &clock, &mut sink).is_ok(), "{message}");
        assert_eq!(app.current_temperature(), None);
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SensorFault(_))),
        4
    );
}

#[test]
fn unclassified_fault_stops_the_loop_with_heater_off() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    heating(&mut app, &mut oven, &clock, &mut sink);

    oven.fail_with("SPI bus timeout");
    clock.advance_secs(1);
    let err = app.tick(&mut oven, &clock, &mut sink).unwrap_err();

    assert_eq!(
        err,
        ControllerError::Sensor(SensorFault::Unknown("SPI bus timeout".into()))
    );
    assert_eq!(oven.last_heater(), Some(0.0));
    assert_eq!(app.heater_command(), 0.0);
}

#[test]
fn non_finite_reading_is_treated_as_faulty() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    heating(&mut app, &mut oven, &clock, &mut sink);
    assert_eq!(app.heater_command(), 1.0);

    oven.set_temperature(f64::NAN);
    for _ in 0..3 {
        clock.advance_secs(1);
        app.tick(&mut oven, &clock, &mut sink).unwrap();
        assert_eq!(app.current_temperature(), None);
        assert_eq!(app.heater_command(), 0.0);
        assert_eq!(oven.last_heater(), Some(0.0));
    }
    assert_eq!(app.state(), StateId::Reflow);
    assert_eq!(
        sink.count(|e| *e == AppEvent::SensorFault(SensorFault::FaultyReading)),
        1
    );

    oven.set_temperature(f64::INFINITY);
    clock.advance_secs(1);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert!(!oven.heater_on());
}

#[test]
fn heating_resumes_after_recovery() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    heating(&mut app, &mut oven, &clock, &mut sink);

    oven.fail_with("faulty reading");
    clock.advance_secs(1);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert!(!oven.heater_on());
    // The cold junction is still trusted while the probe is faulted.
    assert_eq!(app.reference_temperature(), Some(21.0));

    oven.set_reading(30.0, 21.0);
    clock.advance_secs(1);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.current_temperature(), Some(30.0));
    assert!(sink.contains(&AppEvent::SensorRecovered));
    assert!(oven.heater_on());
}

#[test]
fn reference_reading_is_quantised() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    oven.set_reading(30.0, 21.13);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.reference_temperature(), Some(21.25));
    oven.set_reading(30.0, 20.9);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.reference_temperature(), Some(21.0));
}

#[test]
fn small_moves_do_not_raise_temperature_events() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig::default());
    for t in [25.1, 25.2, 25.4, 25.5] {
        oven.set_temperature(t);
        app.tick(&mut oven, &clock, &mut sink).unwrap();
    }
    let reported: Vec<f64> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::TemperatureChanged(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(reported, [25.0, 25.4]);
}

#[test]
fn filtered_readings_are_averaged() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig {
        filter_temperature: true,
        ..Default::default()
    });
    oven.set_temperature(21.0);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.current_temperature(), Some(23.0));
}

#[test]
fn fault_clears_the_filter_window() {
    let (mut app, mut oven, clock, mut sink) = setup(ControllerConfig {
        filter_temperature: true,
        ..Default::default()
    });
    oven.fail_with("faulty reading");
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    oven.set_temperature(40.0);
    app.tick(&mut oven, &clock, &mut sink).unwrap();
    assert_eq!(app.current_temperature(), Some(40.0));
}
