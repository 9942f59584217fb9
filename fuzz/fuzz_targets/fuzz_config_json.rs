//! Fuzz target: stored settings
//!
//! Feeds arbitrary bytes through the same path a settings file takes at
//! startup: JSON overrides, merged onto the defaults, validated, then
//! handed to the service.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A config that validates either builds a service or fails with a
//!   profile error
//! - A built service starts in standby with the heater off
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use reflow::app::service::AppService;
use reflow::config::{ConfigOverrides, ControllerConfig};
use reflow::error::ControllerError;
use reflow::fsm::StateId;

fuzz_target!(|data: &[u8]| {
    let Ok(overrides) = serde_json::from_slice::<ConfigOverrides>(data) else {
        return;
    };
    let config = ControllerConfig::default().merged(&overrides);
    if config.validate().is_err() {
        return;
    }

    match AppService::new(config) {
        Ok(app) => {
            assert_eq!(app.state(), StateId::Standby);
            assert_eq!(app.heater_command(), 0.0);
            assert!(app.profiles().contains(app.selected_profile()));
        }
        Err(ControllerError::Profile(_)) => {}
        Err(e) => panic!("unexpected startup error: {e}"),
    }
});
