//! Fuzz target: `Profile` construction and run cursor
//!
//! Builds a profile from fuzz-chosen stages and walks it with fuzz-chosen
//! time steps.
//!
//! Invariants checked:
//! - No panics for any duration or target, including NaN and infinities
//! - While a stage is on time its setpoint is at or above the start floor
//! - The cursor moves at most one stage per advance and never restarts
//!
//! cargo fuzz run fuzz_profile

#![no_main]

use core::time::Duration;

use libfuzzer_sys::fuzz_target;
use reflow::profile::{Profile, ProfileInfo, StageSpec};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (head, rest) = data.split_at(1);
    let stage_count = usize::from(head[0] % 8);

    let mut chunks = rest.chunks_exact(8);
    let specs: Vec<StageSpec> = chunks
        .by_ref()
        .take(stage_count)
        .enumerate()
        .map(|(i, c)| {
            let duration = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
            let target = f32::from_le_bytes([c[4], c[5], c[6], c[7]]);
            StageSpec::new(format!("s{i}"), f64::from(duration), f64::from(target))
        })
        .collect();

    let Ok(mut profile) = Profile::build(ProfileInfo::new("fuzz"), &specs) else {
        return;
    };
    let floor = 20.0;
    profile.start(Duration::ZERO, floor);

    let mut now = Duration::ZERO;
    for step in chunks.remainder().iter().chain(rest.iter()).take(64) {
        now += Duration::from_millis(u64::from(*step) * 250);
        let on_time = profile
            .current_stage()
            .is_some_and(|s| now.as_secs_f64() <= s.runtime_end);
        if let (true, Some(target)) = (on_time, profile.target_at(now)) {
            assert!(!target.is_finite() || target >= floor - 1e-6, "target {target} below floor");
        }
        let before = profile.current_index();
        let _ = profile.advance_if_elapsed(now);
        match (before, profile.current_index()) {
            (Some(b), Some(a)) => assert!(a == b || a == b + 1),
            (None, Some(_)) => panic!("finished cursor restarted"),
            _ => {}
        }
    }
});
