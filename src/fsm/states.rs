//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers, no closures and no dynamic
//! dispatch.
//!
//! ```text
//!            ┌──[start reflow]──▶ REFLOW ───[profile done]──┐
//!  STANDBY ──┤                                               ├──▶ STANDBY
//!            └──[calibrate]────▶ CALIBRATE ─[profile done]──┘
//!
//!  Any state ──[stop]──▶ STANDBY
//! ```
//!
//! Reflow and calibrate share one update handler: they differ only in
//! which profile their `on_enter` starts.

use log::{error, info, warn};

use super::context::ControlContext;
use super::{StateId, StateNode};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateNode; StateId::COUNT] {
    [
        // Index 0 — Standby
        StateNode::new(
            StateId::Standby,
            Some(standby_enter),
            Some(standby_update),
            None,
        ),
        // Index 1 — Calibrate
        StateNode::new(
            StateId::Calibrate,
            Some(calibrate_enter),
            Some(profile_update),
            Some(run_leave),
        ),
        // Index 2 — Reflow
        StateNode::new(
            StateId::Reflow,
            Some(reflow_enter),
            Some(profile_update),
            Some(run_leave),
        ),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  STANDBY state
// ═══════════════════════════════════════════════════════════════════════════

fn standby_enter(ctx: &mut ControlContext) {
    ctx.set_heater_target(None);
    ctx.heater.off();
    info!("STANDBY: heater off");
}

fn standby_update(ctx: &mut ControlContext) -> Option<StateId> {
    if ctx.heater.duty() != 0.0 {
        warn!("STANDBY: heater was commanded on, forcing off");
        ctx.heater.off();
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CALIBRATE / REFLOW — profile-driven heating
// ═══════════════════════════════════════════════════════════════════════════

fn calibrate_enter(ctx: &mut ControlContext) {
    if ctx.start_calibration() {
        info!("CALIBRATE: calibration profile started");
    }
}

fn reflow_enter(ctx: &mut ControlContext) {
    let profile = ctx.selected_profile.clone();
    if ctx.start_run(&profile) {
        info!("REFLOW: profile '{profile}' started");
    }
}

fn run_leave(ctx: &mut ControlContext) {
    ctx.finish_run();
}

/// One control step of the active run.
///
/// 1. Compute the profile target for `now` and hand it to the PID loop.
/// 2. With a finite measurement and target, let the PID update the heater
///    command (a rate-gated `None` keeps the current command).  Otherwise
///    the heater goes off.
/// 3. Advance the profile cursor; a finished profile returns to standby.
fn profile_update(ctx: &mut ControlContext) -> Option<StateId> {
    if ctx.run.is_none() {
        error!("no active profile run, returning to standby");
        return Some(StateId::Standby);
    }

    let target = ctx.profile_target();
    ctx.set_heater_target(target);

    match (ctx.sensors.temperature, target) {
        (Some(measurement), Some(target)) if measurement.is_finite() && target.is_finite() => {
            if let Some(out) = ctx.pid.update(ctx.now, measurement, None) {
                ctx.heater.command(out.duty);
                ctx.last_terms = Some(out.terms);
            }
        }
        _ => ctx.heater.off(),
    }

    let now = ctx.now;
    let run = ctx.run.as_mut()?;
    let before = run.current_index();
    match run.advance_if_elapsed(now) {
        Ok(true) => {
            if run.current_index() != before {
                if let Some(stage) = run.current_stage() {
                    info!("stage -> '{}' ({:.0}°C)", stage.name, stage.temp_target);
                }
            }
            None
        }
        Ok(false) => {
            info!("profile '{}' finished", run.id());
            Some(StateId::Standby)
        }
        Err(e) => {
            error!("profile step failed: {e}");
            Some(StateId::Standby)
        }
    }
}
