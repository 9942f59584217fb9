//! Controller configuration.
//!
//! [`ControllerConfig::default()`] holds the factory settings.  Stored
//! settings arrive as a sparse [`ConfigOverrides`] value and are merged
//! functionally: `defaults.merged(&overrides)` produces a new config and
//! never touches the defaults.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigPort;
use crate::error::ConfigError;
use crate::profile::ProfileDefinition;

// ---------------------------------------------------------------------------
// PID
// ---------------------------------------------------------------------------

/// The three loop gains, the part of the PID setup an operator may change
/// at run time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub p_gain: f64,
    pub i_gain: f64,
    pub d_gain: f64,
}

/// Full PID setup.  Output and integral bounds are in percent; the
/// controller divides its output by 100 before handing it to the heater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Minimum seconds between two controller evaluations.
    pub update_interval_secs: f64,
    pub p_gain: f64,
    pub i_gain: f64,
    pub d_gain: f64,
    pub output_min: f64,
    pub output_max: f64,
    pub integral_min: f64,
    pub integral_max: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 0.1,
            p_gain: 10.0,
            i_gain: 0.1,
            d_gain: 1.0,
            output_min: 0.0,
            output_max: 100.0,
            integral_min: 0.0,
            integral_max: 100.0,
        }
    }
}

impl PidConfig {
    pub fn gains(&self) -> PidGains {
        PidGains {
            p_gain: self.p_gain,
            i_gain: self.i_gain,
            d_gain: self.d_gain,
        }
    }

    pub fn with_gains(&self, gains: PidGains) -> Self {
        Self {
            p_gain: gains.p_gain,
            i_gain: gains.i_gain,
            d_gain: gains.d_gain,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Selected profile.  `None` picks the first selectable profile.
    pub profile: Option<String>,
    pub pid: PidConfig,
    /// Setpoint used when no explicit target and no reference reading exist.
    pub fallback_temperature_c: f64,
    /// Smooth oven readings over a short moving-average window.
    pub filter_temperature: bool,
    /// Minimum change (°C) before a `TemperatureChanged` event is emitted.
    pub temperature_change_threshold_c: f64,
    /// Extra profiles registered next to the built-in table.
    pub profiles: Vec<ProfileDefinition>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            profile: None,
            pid: PidConfig::default(),
            fallback_temperature_c: 18.0,
            filter_temperature: false,
            temperature_change_threshold_c: 0.3,
            profiles: Vec::new(),
        }
    }
}

impl ControllerConfig {
    /// Return a new config with every present override applied.
    pub fn merged(&self, overrides: &ConfigOverrides) -> Self {
        let pid = match &overrides.pid {
            Some(p) => p.apply(&self.pid),
            None => self.pid.clone(),
        };
        Self {
            profile: overrides.profile.clone().or_else(|| self.profile.clone()),
            pid,
            fallback_temperature_c: overrides
                .fallback_temperature_c
                .unwrap_or(self.fallback_temperature_c),
            filter_temperature: overrides
                .filter_temperature
                .unwrap_or(self.filter_temperature),
            temperature_change_threshold_c: overrides
                .temperature_change_threshold_c
                .unwrap_or(self.temperature_change_threshold_c),
            profiles: overrides
                .profiles
                .clone()
                .unwrap_or_else(|| self.profiles.clone()),
        }
    }

    /// Factory defaults merged with whatever `port` has stored, validated.
    /// Nothing stored yet is not an error.
    pub fn from_port(port: &impl ConfigPort) -> Result<Self, ConfigError> {
        let config = match port.load() {
            Ok(overrides) => Self::default().merged(&overrides),
            Err(ConfigError::NotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the loop unsafe or meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pid = &self.pid;
        let gains_finite = [pid.p_gain, pid.i_gain, pid.d_gain]
            .iter()
            .all(|g| g.is_finite());
        if !gains_finite {
            return Err(ConfigError::ValidationFailed("PID gains must be finite"));
        }
        if !(pid.update_interval_secs.is_finite() && pid.update_interval_secs > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "pid.update_interval_secs must be positive",
            ));
        }
        if !(pid.output_min.is_finite() && pid.output_max.is_finite())
            || pid.output_min >= pid.output_max
        {
            return Err(ConfigError::ValidationFailed(
                "pid.output_min must be below pid.output_max",
            ));
        }
        if !(pid.integral_min.is_finite() && pid.integral_max.is_finite())
            || pid.integral_min > pid.integral_max
        {
            return Err(ConfigError::ValidationFailed(
                "pid.integral_min must not exceed pid.integral_max",
            ));
        }
        if !self.fallback_temperature_c.is_finite() {
            return Err(ConfigError::ValidationFailed(
                "fallback_temperature_c must be finite",
            ));
        }
        if !(self.temperature_change_threshold_c.is_finite()
            && self.temperature_change_threshold_c >= 0.0)
        {
            return Err(ConfigError::ValidationFailed(
                "temperature_change_threshold_c must be non-negative",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sparse overrides (stored / user-supplied settings)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidOverrides {
    pub update_interval_secs: Option<f64>,
    pub p_gain: Option<f64>,
    pub i_gain: Option<f64>,
    pub d_gain: Option<f64>,
    pub output_min: Option<f64>,
    pub output_max: Option<f64>,
    pub integral_min: Option<f64>,
    pub integral_max: Option<f64>,
}

impl PidOverrides {
    fn apply(&self, base: &PidConfig) -> PidConfig {
        PidConfig {
            update_interval_secs: self
                .update_interval_secs
                .unwrap_or(base.update_interval_secs),
            p_gain: self.p_gain.unwrap_or(base.p_gain),
            i_gain: self.i_gain.unwrap_or(base.i_gain),
            d_gain: self.d_gain.unwrap_or(base.d_gain),
            output_min: self.output_min.unwrap_or(base.output_min),
            output_max: self.output_max.unwrap_or(base.output_max),
            integral_min: self.integral_min.unwrap_or(base.integral_min),
            integral_max: self.integral_max.unwrap_or(base.integral_max),
        }
    }
}

/// Every [`ControllerConfig`] field, optional.  Field names match, so a
/// saved full config reads back as a complete set of overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub profile: Option<String>,
    pub pid: Option<PidOverrides>,
    pub fallback_temperature_c: Option<f64>,
    pub filter_temperature: Option<bool>,
    pub temperature_change_threshold_c: Option<f64>,
    pub profiles: Option<Vec<ProfileDefinition>>,
}
