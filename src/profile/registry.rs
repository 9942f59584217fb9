//! Profile registry — identifier → built [`Profile`].
//!
//! Populated explicitly at startup, either from the built-in table or from
//! a config-supplied list of [`ProfileDefinition`]s.  Identifiers are kept
//! sorted so "select next" cycles in a stable order.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::builtin::{self, CALIBRATION_ID};
use super::{Profile, ProfileInfo, StageSpec};
use crate::error::ProfileError;

/// Serialisable description of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    #[serde(flatten)]
    pub info: ProfileInfo,
    pub stages: Vec<StageSpec>,
}

impl ProfileDefinition {
    pub fn build(&self) -> Result<Profile, ProfileError> {
        Profile::build(self.info.clone(), &self.stages)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    /// Registry holding every built-in profile.
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::from_definitions(builtin::definitions())
    }

    /// Build every definition.  A later definition replaces an earlier
    /// one with the same identifier.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = ProfileDefinition>,
    ) -> Result<Self, ProfileError> {
        let mut registry = Self::default();
        for def in defs {
            registry.insert(def.build()?);
        }
        info!("profile registry: {} profiles loaded", registry.len());
        Ok(registry)
    }

    /// Add or replace a profile; returns the replaced one.
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        let id = profile.id().to_owned();
        let previous = self.profiles.insert(id.clone(), profile);
        if previous.is_some() {
            warn!("profile '{id}' redefined; keeping the later definition");
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The internal calibration profile, if registered.
    pub fn calibration(&self) -> Option<&Profile> {
        self.get(CALIBRATION_ID)
    }

    /// Selectable identifiers, sorted, calibration excluded.
    pub fn user_profile_ids(&self) -> Vec<&str> {
        self.profiles
            .keys()
            .map(String::as_str)
            .filter(|id| *id != CALIBRATION_ID)
            .collect()
    }

    /// First selectable identifier.
    pub fn default_profile_id(&self) -> Option<&str> {
        self.user_profile_ids().first().copied()
    }

    /// The selectable identifier after `id`, wrapping around.  An unknown
    /// `id` (or the calibration profile) restarts at the first one.
    pub fn next_after(&self, id: &str) -> Option<&str> {
        let ids = self.user_profile_ids();
        let next = match ids.iter().position(|candidate| *candidate == id) {
            Some(i) => (i + 1) % ids.len(),
            None => 0,
        };
        ids.get(next).copied()
    }
}
