//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (buttons, CLI,
//! a remote UI) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::config::PidGains;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Select the profile the next reflow run uses.
    SelectProfile(String),

    /// Select the next profile in identifier order, wrapping around.
    SelectNextProfile,

    /// Start the selected profile.
    StartReflow,

    /// Run the calibration profile.
    StartCalibration,

    /// Abort any run and turn the heater off.
    Stop,

    /// Replace the PID gains at run time.
    UpdateGains(PidGains),

    /// Persist the current selection and gains immediately.
    SaveConfig,
}
