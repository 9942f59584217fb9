//! Settings persistence through the config port.

use reflow::app::commands::AppCommand;
use reflow::app::service::AppService;
use reflow::config::{ControllerConfig, PidGains};
use reflow::error::{ConfigError, ControllerError, ProfileError};
use reflow::profile::{ProfileDefinition, ProfileInfo, StageSpec};

use super::mock_hw::{MemoryConfig, MockClock, MockOven, RecordingSink};

fn started(config: ControllerConfig) -> (AppService, MockOven, MockClock, RecordingSink) {
    let mut app = AppService::new(config).unwrap();
    let mut oven = MockOven::new();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();
    app.start(&mut oven, &clock, &mut sink);
    (app, oven, clock, sink)
}

#[test]
fn selection_is_auto_saved_after_the_quiet_period() {
    let (mut app, mut oven, clock, mut sink) = started(ControllerConfig::default());
    let storage = MemoryConfig::new();

    app.handle_command(
        AppCommand::SelectProfile("plastic".into()),
        &mut oven,
        &clock,
        &mut sink,
    )
    .unwrap();
    assert!(app.is_config_dirty());

    clock.set_secs(1);
    assert!(!app.auto_save_if_needed(&storage, &clock));
    clock.set_secs(5);
    assert!(app.auto_save_if_needed(&storage, &clock));
    assert_eq!(storage.stored_profile().as_deref(), Some("plastic"));
    assert!(!app.is_config_dirty());

    // Nothing new to save.
    clock.set_secs(20);
    assert!(!app.auto_save_if_needed(&storage, &clock));
    assert_eq!(storage.saves.get(), 1);
}

#[test]
fn save_command_flushes_on_the_next_check() {
    let (mut app, mut oven, clock, mut sink) = started(ControllerConfig::default());
    let storage = MemoryConfig::new();
    app.handle_command(AppCommand::SaveConfig, &mut oven, &clock, &mut sink)
        .unwrap();
    assert!(app.auto_save_if_needed(&storage, &clock));
    assert_eq!(
        storage.stored_profile().as_deref(),
        Some(app.selected_profile())
    );
}

#[test]
fn failed_save_keeps_the_change_pending() {
    let (mut app, mut oven, clock, mut sink) = started(ControllerConfig::default());
    let storage = MemoryConfig::failing();
    app.handle_command(AppCommand::SelectNextProfile, &mut oven, &clock, &mut sink)
        .unwrap();
    assert_eq!(
        app.persist_selection(&storage),
        Err(ConfigError::Io("storage offline".into()))
    );
    clock.set_secs(10);
    assert!(!app.auto_save_if_needed(&storage, &clock));
    assert!(app.is_config_dirty());
}

#[test]
fn saved_selection_and_gains_survive_a_restart() {
    let (mut app, mut oven, clock, mut sink) = started(ControllerConfig::default());
    let storage = MemoryConfig::new();
    let gains = PidGains {
        p_gain: 6.0,
        i_gain: 0.3,
        d_gain: 0.5,
    };
    app.handle_command(AppCommand::UpdateGains(gains), &mut oven, &clock, &mut sink)
        .unwrap();
    app.handle_command(
        AppCommand::SelectProfile("testdev_slow".into()),
        &mut oven,
        &clock,
        &mut sink,
    )
    .unwrap();
    app.persist_selection(&storage).unwrap();

    let restored = ControllerConfig::from_port(&storage).unwrap();
    let app = AppService::new(restored).unwrap();
    assert_eq!(app.selected_profile(), "testdev_slow");
    assert_eq!(app.pid().gains(), gains);
}

#[test]
fn nothing_stored_means_factory_defaults() {
    let storage = MemoryConfig::new();
    assert_eq!(
        ControllerConfig::from_port(&storage).unwrap(),
        ControllerConfig::default()
    );
}

#[test]
fn config_defined_profile_can_be_selected_and_run() {
    let config = ControllerConfig {
        profile: Some("custom".into()),
        profiles: vec![ProfileDefinition {
            info: ProfileInfo::new("custom"),
            stages: vec![
                StageSpec::new("warm", 10.0, 60.0),
                StageSpec::new("hold", 10.0, 60.0),
            ],
        }],
        ..Default::default()
    };
    let (mut app, mut oven, clock, mut sink) = started(config);
    assert_eq!(app.selected_profile(), "custom");
    app.handle_command(AppCommand::StartReflow, &mut oven, &clock, &mut sink)
        .unwrap();
    let run = app.active_run().unwrap();
    assert_eq!(run.id(), "custom");
    assert_eq!(run.total_duration(), 20.0);
}

#[test]
fn invalid_config_profile_is_rejected_at_startup() {
    let config = ControllerConfig {
        profiles: vec![ProfileDefinition {
            info: ProfileInfo::new("broken"),
            stages: vec![StageSpec::new("warm", -1.0, 60.0)],
        }],
        ..Default::default()
    };
    let err = AppService::new(config).err().unwrap();
    assert!(matches!(
        err,
        ControllerError::Profile(ProfileError::InvalidProfile { ref profile, .. }) if profile == "broken"
    ));
}
