//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON file holding a sparse
//! [`ConfigOverrides`] object.  Saves validate first and replace the file
//! through a temporary sibling and a rename, so a crash mid-write leaves
//! the previous settings intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::{ConfigOverrides, ControllerConfig};
use crate::error::ConfigError;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<ConfigOverrides, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        let overrides = serde_json::from_str(&text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        info!("config loaded from {}", self.path.display());
        Ok(overrides)
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Io(e.to_string()))?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ConfigError::Io(e.to_string()))?;
        info!("config saved to {}", self.path.display());
        Ok(())
    }
}
