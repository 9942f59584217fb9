//! Reflow profiles — ordered thermal stages and the run-time cursor.
//!
//! ```text
//!  temp
//!   ▲            ┌ reflow
//!   │         ╱‾‾╲
//!   │   soak ╱    ╲
//!   │  ╱‾‾‾‾       ╲ cool
//!   │ ╱ preheat     ╲
//!   │╱               ╲
//!   └┬─────┬────┬──┬──┬──▶ time
//!  start                end      (synthetic zero-duration stages)
//! ```
//!
//! A [`Profile`] is built once from a caller-supplied stage list.  The
//! builder brackets the list with a synthetic `start` and `end` stage and
//! computes every stage's `temp_start`, `runtime_start` and `runtime_end`.
//! The computed stage sequence is shared and never mutated; the only
//! mutable part of a profile is its run cursor (start timestamp, current
//! stage index, temperature floor).
//!
//! Within a stage the setpoint is ramped linearly from `temp_start` to
//! `temp_target`, so the PID tracks a continuous curve instead of a step
//! at every boundary.

pub mod builtin;
pub mod registry;

use core::fmt::Write as _;
use core::time::Duration;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

pub use registry::{ProfileDefinition, ProfileRegistry};

/// Name of the synthetic stage inserted before the first user stage.
pub const START_STAGE: &str = "start";
/// Name of the synthetic stage appended after the last user stage.
pub const END_STAGE: &str = "end";

// ---------------------------------------------------------------------------
// Stage input / computed stage
// ---------------------------------------------------------------------------

/// One stage as written in a profile definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    /// Seconds.
    pub duration: f64,
    /// °C reached at the end of the stage.
    pub temp_target: f64,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, duration: f64, temp_target: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            temp_target,
        }
    }
}

/// A stage with its derived timing, as stored inside a built [`Profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub duration: f64,
    pub temp_target: f64,
    /// Target of the previous stage.
    pub temp_start: f64,
    /// Seconds from profile start.
    pub runtime_start: f64,
    /// `runtime_start + duration`.
    pub runtime_end: f64,
}

// ---------------------------------------------------------------------------
// Profile metadata
// ---------------------------------------------------------------------------

/// Descriptive data shown to the operator; not used by the control path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// Stable identifier used for selection and persistence.
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_short: String,
    #[serde(default)]
    pub alloy: String,
    /// °C
    #[serde(default)]
    pub melting_point: f64,
    /// Datasheet URL.
    #[serde(default)]
    pub reference: String,
}

impl ProfileInfo {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            title_short: id.clone(),
            id,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A built profile plus its run cursor.
///
/// Cloning is cheap: the stage sequence and metadata are shared, only the
/// cursor is copied.
#[derive(Debug, Clone)]
pub struct Profile {
    info: Arc<ProfileInfo>,
    stages: Arc<[Stage]>,
    started_at: Option<Duration>,
    /// `None` once the cursor has moved past the `end` stage.
    cursor: Option<usize>,
    temperature_floor: f64,
}

impl Profile {
    /// Build a profile from user stages.
    ///
    /// Fails with [`ProfileError::InvalidProfile`] if any duration is
    /// negative or not finite.
    pub fn build(info: ProfileInfo, specs: &[StageSpec]) -> Result<Self, ProfileError> {
        if let Some(bad) = specs
            .iter()
            .find(|s| !s.duration.is_finite() || s.duration < 0.0)
        {
            return Err(ProfileError::InvalidProfile {
                profile: info.id.clone(),
                stage: bad.name.clone(),
                duration: bad.duration,
            });
        }

        let mut stages = Vec::with_capacity(specs.len() + 2);
        stages.push(Stage {
            name: START_STAGE.to_owned(),
            duration: 0.0,
            temp_target: 0.0,
            temp_start: 0.0,
            runtime_start: 0.0,
            runtime_end: 0.0,
        });

        let mut runtime = 0.0;
        let mut temp_prev = 0.0;
        let bracketed = specs
            .iter()
            .cloned()
            .chain(core::iter::once(StageSpec::new(END_STAGE, 0.0, 0.0)));
        for spec in bracketed {
            let runtime_end = runtime + spec.duration;
            stages.push(Stage {
                name: spec.name,
                duration: spec.duration,
                temp_target: spec.temp_target,
                temp_start: temp_prev,
                runtime_start: runtime,
                runtime_end,
            });
            runtime = runtime_end;
            temp_prev = spec.temp_target;
        }

        Ok(Self {
            info: Arc::new(info),
            stages: stages.into(),
            started_at: None,
            cursor: None,
            temperature_floor: 0.0,
        })
    }

    // ── Static properties ─────────────────────────────────────

    pub fn info(&self) -> &ProfileInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// All stages including the synthetic `start` and `end`.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Sum of all stage durations (seconds).
    pub fn total_duration(&self) -> f64 {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest stage target (°C).
    pub fn max_temperature(&self) -> f64 {
        self.stages
            .iter()
            .map(|s| s.temp_target)
            .fold(0.0, f64::max)
    }

    // ── Run cursor ────────────────────────────────────────────

    /// Reset the cursor to the `start` stage and begin timing at `now`.
    ///
    /// `temperature_min` becomes the floor for every later setpoint, so
    /// the controller never asks for a target colder than ambient.
    pub fn start(&mut self, now: Duration, temperature_min: f64) {
        self.started_at = Some(now);
        self.cursor = Some(0);
        self.temperature_floor = temperature_min;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// `true` once [`advance_if_elapsed`](Self::advance_if_elapsed) has
    /// stepped past the `end` stage.
    pub fn is_finished(&self) -> bool {
        self.started_at.is_some() && self.cursor.is_none()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.cursor.map(|i| &self.stages[i])
    }

    pub fn temperature_floor(&self) -> f64 {
        self.temperature_floor
    }

    /// Seconds since [`start`](Self::start).
    pub fn elapsed(&self, now: Duration) -> Result<f64, ProfileError> {
        let started = self.started_at.ok_or(ProfileError::NotStarted)?;
        Ok(now.saturating_sub(started).as_secs_f64())
    }

    /// Setpoint for `now`, or `None` if the profile is not running.
    ///
    /// Zero-duration stages jump straight to their target.  Otherwise the
    /// value follows the line from the floor-clamped `temp_start` to the
    /// floor-clamped `temp_target`.  An overdue stage waiting for the next
    /// advance keeps following that line past its target.
    pub fn target_at(&self, now: Duration) -> Option<f64> {
        let elapsed = self.elapsed(now).ok()?;
        let stage = self.current_stage()?;
        let floor = self.temperature_floor;

        if stage.duration == 0.0 {
            return Some(stage.temp_target.max(floor));
        }

        let t = elapsed - stage.runtime_start;
        let fraction = (t / stage.duration).max(0.0);
        let from = stage.temp_start.max(floor);
        let to = stage.temp_target.max(floor);
        Some(from + (to - from) * fraction)
    }

    /// Move to the next stage if the current one has run out.
    ///
    /// Steps at most one stage per call, even if several boundaries were
    /// crossed since the last call.  Returns `Ok(false)` once the cursor
    /// passes the `end` stage (profile complete), `Ok(true)` otherwise.
    pub fn advance_if_elapsed(&mut self, now: Duration) -> Result<bool, ProfileError> {
        let elapsed = self.elapsed(now)?;
        let Some(index) = self.cursor else {
            return Ok(false);
        };
        if elapsed > self.stages[index].runtime_end {
            let next = index + 1;
            if next >= self.stages.len() {
                self.cursor = None;
                return Ok(false);
            }
            self.cursor = Some(next);
        }
        Ok(true)
    }

    // ── Presentation ──────────────────────────────────────────

    /// Multi-line human-readable summary including the stage table.
    pub fn describe(&self) -> String {
        let info = &self.info;
        let mut out = String::new();
        let _ = writeln!(out, "Profile: {}", info.id);
        let _ = writeln!(out, "  title          {}", info.title);
        let _ = writeln!(out, "  alloy          {}", info.alloy);
        let _ = writeln!(out, "  melting point  {:>5.0}°C", info.melting_point);
        let _ = writeln!(out, "  duration       {:>5.0}s", self.total_duration());
        let _ = writeln!(out, "  max temperature{:>5.0}°C", self.max_temperature());
        let _ = writeln!(out, "  stages:");
        for (i, s) in self.stages.iter().enumerate() {
            let _ = writeln!(
                out,
                "   [{i:>2}] {:<12} {:>5.0}°C -> {:>5.0}°C  {:>5.0}s  ({:>5.0}s .. {:>5.0}s)",
                s.name, s.temp_start, s.temp_target, s.duration, s.runtime_start, s.runtime_end
            );
        }
        out
    }
}
