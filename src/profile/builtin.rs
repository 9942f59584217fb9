//! Built-in profile table.
//!
//! Profiles are plain data: a metadata row plus a `(stage, seconds, °C)`
//! list.  The registry builds them once at startup; adding a profile means
//! adding a row here (or supplying a [`ProfileDefinition`] from config).

use super::registry::ProfileDefinition;
use super::{ProfileInfo, StageSpec};

/// Identifier of the internal calibration profile.  Never offered as a
/// user selection.
pub const CALIBRATION_ID: &str = "calibration";

type StageRow = (&'static str, f64, f64);

struct BuiltinProfile {
    id: &'static str,
    title: &'static str,
    title_short: &'static str,
    alloy: &'static str,
    melting_point: f64,
    reference: &'static str,
    stages: &'static [StageRow],
}

const FELDER_DATASHEET: &str = "https://www.felder.de/files/felder/pdf/DE_23-Clear.pdf";
const HOT_PLATE_NOTES: &str = "https://blog.s-light.eu/hot-plate-smd-soldering/";
const SAC305: &str = "Sn96,5Ag3,0Cu0,5";

const BUILTIN: &[BuiltinProfile] = &[
    BuiltinProfile {
        id: "felder_iso_cream_clear",
        title: "Felder ISO-Cream 'Clear' (no-clean)",
        title_short: "Felder ISO-Cream",
        alloy: SAC305,
        melting_point: 220.0,
        reference: FELDER_DATASHEET,
        stages: &[
            ("preheat", 210.0, 150.0),
            ("soak", 90.0, 200.0),
            ("reflow", 40.0, 245.0),
            ("cool", 70.0, 0.0),
        ],
    },
    BuiltinProfile {
        id: "felder_iso_cream_clear_fast",
        title: "Felder ISO-Cream 'Clear' (no-clean) FAST",
        title_short: "Felder ISO-Cream FAST",
        alloy: SAC305,
        melting_point: 220.0,
        reference: FELDER_DATASHEET,
        stages: &[
            ("preheat", 120.0, 150.0),
            ("soak", 50.0, 200.0),
            ("reflow", 30.0, 248.0),
            ("cool", 120.0, 0.0),
        ],
    },
    BuiltinProfile {
        id: "felder_iso_cream_clear_slow",
        title: "Felder ISO-Cream 'Clear' (no-clean) SLOW",
        title_short: "Felder ISO-Cream SLOW",
        alloy: SAC305,
        melting_point: 220.0,
        reference: FELDER_DATASHEET,
        stages: &[
            ("preheat", 210.0, 150.0),
            ("soak", 120.0, 200.0),
            ("reflow", 50.0, 240.0),
            ("cool", 130.0, 0.0),
        ],
    },
    BuiltinProfile {
        id: "plastic",
        title: "Plastic 59°C",
        title_short: "Plastic 59°C",
        alloy: "42",
        melting_point: 59.0,
        reference: HOT_PLATE_NOTES,
        stages: &[("prepare", 3.0, 59.0), ("reflow", 30.0 * 60.0, 59.0)],
    },
    BuiltinProfile {
        id: "plastic_hot",
        title: "PlasticHot 70°C",
        title_short: "PlasticHot 70°C",
        alloy: "42",
        melting_point: 70.0,
        reference: HOT_PLATE_NOTES,
        stages: &[("prepare", 3.0, 70.0), ("reflow", 30.0 * 60.0, 70.0)],
    },
    BuiltinProfile {
        id: "test_step_time",
        title: "Test StepTime",
        title_short: "Test StepTime",
        alloy: "-",
        melting_point: 220.0,
        reference: "-",
        stages: &[("set40", 0.0, 40.0), ("hold40", 120.0, 40.0)],
    },
    BuiltinProfile {
        id: "testdev",
        title: "TestDev Profile",
        title_short: "TestDev Profil",
        alloy: SAC305,
        melting_point: 220.0,
        reference: FELDER_DATASHEET,
        stages: &[
            ("preheat", 5.0, 150.0),
            ("soak", 5.0, 200.0),
            ("reflow", 5.0, 245.0),
            ("cool", 5.0, 0.0),
        ],
    },
    BuiltinProfile {
        id: "testdev_60",
        title: "TestDev Profile 60°C",
        title_short: "TestDev 60°C",
        alloy: "42",
        melting_point: 60.0,
        reference: HOT_PLATE_NOTES,
        stages: &[
            ("prepare30", 40.0, 30.0),
            ("wait30", 40.0, 30.0),
            ("soak40", 30.0, 40.0),
            ("wait40", 30.0, 40.0),
            ("reflow", 30.0, 60.0),
            ("cool_set", 0.0, 25.0),
            ("cool", 230.0, 25.0),
        ],
    },
    BuiltinProfile {
        id: "testdev_slow",
        title: "TestDev Profile Slow",
        title_short: "TestDev Profile Slow",
        alloy: "42",
        melting_point: 120.0,
        reference: "-",
        stages: &[
            ("preheat", 20.0, 40.0),
            ("soak", 20.0, 60.0),
            ("reflow", 30.0, 120.0),
            ("cool", 180.0, 0.0),
        ],
    },
    BuiltinProfile {
        id: CALIBRATION_ID,
        title: "Calibration Profile",
        title_short: "Calibration Profil",
        alloy: "-",
        melting_point: 220.0,
        reference: "-",
        stages: &[
            ("prepare", 5.0, 20.0),
            ("hold1", 5.0, 20.0),
            ("heatup100", 10.0, 100.0),
            ("hold100", 10.0, 100.0),
            ("cool", 5.0, 0.0),
        ],
    },
];

/// Definitions for every built-in profile, calibration included.
pub fn definitions() -> Vec<ProfileDefinition> {
    BUILTIN
        .iter()
        .map(|b| ProfileDefinition {
            info: ProfileInfo {
                id: b.id.to_owned(),
                title: b.title.to_owned(),
                title_short: b.title_short.to_owned(),
                alloy: b.alloy.to_owned(),
                melting_point: b.melting_point,
                reference: b.reference.to_owned(),
            },
            stages: b
                .stages
                .iter()
                .map(|&(name, duration, temp)| StageSpec::new(name, duration, temp))
                .collect(),
        })
        .collect()
}
