//! Third-party corner-landmarks dataset import (spec §4.5, §6).

use std::collections::HashMap;

use model::CornerType;
use serde::{Deserialize, Serialize};

/// One named corner as published by the landmarks dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkCorner {
    pub name: String,
    pub distance_start_m: f64,
    pub distance_end_m: f64,
    #[serde(default)]
    pub corner_type: Option<CornerType>,
}

/// A snapshot of the third-party landmarks dataset: simulator-specific
/// track keys (native and alternate-sim) mapped to an ordered corner list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LandmarksDataset {
    pub tracks: HashMap<String, Vec<LandmarkCorner>>,
}

impl LandmarksDataset {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// A trimmed vendored snapshot covering the tracks this core ships
    /// fixtures for. A full refresh is an operator action (spec §4.5, §6)
    /// that replaces this with a larger document via `from_json`.
    pub fn built_in() -> Self {
        Self::from_json(BUILT_IN_SNAPSHOT).expect("built-in landmarks snapshot is valid JSON")
    }
}

/// Direct map: dataset key -> native track identifier. At least 21 entries
/// (spec §4.5).
pub const DIRECT_MAP: &[(&str, &str)] = &[
    ("bathurst", "219"),
    ("spa", "523"),
    ("silverstone", "101"),
    ("nurburgring_gp", "102"),
    ("monza", "103"),
    ("brands_hatch_gp", "104"),
    ("suzuka", "105"),
    ("watkins_glen", "106"),
    ("road_america", "107"),
    ("laguna_seca", "108"),
    ("sebring", "109"),
    ("daytona_road", "110"),
    ("imola", "111"),
    ("zandvoort", "112"),
    ("hungaroring", "113"),
    ("cota", "114"),
    ("mount_panorama", "219"),
    ("donington_park_gp", "115"),
    ("oulton_park_international", "116"),
    ("okayama", "117"),
    ("fuji_gp", "118"),
    ("interlagos", "119"),
    ("paul_ricard_gp", "120"),
];

/// Alternate-sim keys -> canonical `xsim_`-prefixed key, resolved to a
/// native id in a second pass via `DIRECT_MAP` if one exists there (spec
/// §4.5). Entries with no such second-pass hit remain reachable only by
/// cross-sim key and stay unresolved (spec §9 Open Questions).
pub const CROSS_SIM_MAP: &[(&str, &str)] = &[
    ("pcars_brands_hatch_gp", "xsim_brands_gp"),
    ("ac_brands_hatch_gp", "xsim_brands_gp"),
    ("rf1_brands_hatch_gp", "xsim_brands_gp"),
    ("pcars_suzuka", "xsim_suzuka"),
    ("ac_suzuka", "xsim_suzuka"),
    ("pcars_spa", "xsim_spa"),
    ("ac_spa", "xsim_spa"),
    ("rf1_spa", "xsim_spa"),
    ("pcars_bathurst", "xsim_bathurst"),
    ("ac_mount_panorama", "xsim_bathurst"),
];

/// `xsim_` canonical keys that do resolve to a native id (the "second
/// pass" of cross-sim resolution).
pub const XSIM_NATIVE_MAP: &[(&str, &str)] = &[("xsim_brands_gp", "104"), ("xsim_suzuka", "105"), ("xsim_spa", "523"), ("xsim_bathurst", "219")];

/// Resolves a dataset track key to a native track id. Direct match wins if
/// present; cross-sim resolution is the fallback (spec §9 Open Questions
/// decision).
pub fn resolve_native_track_id(key: &str) -> Option<String> {
    if let Some((_, native)) = DIRECT_MAP.iter().find(|(k, _)| *k == key) {
        return Some((*native).to_string());
    }
    if let Some((_, xsim_key)) = CROSS_SIM_MAP.iter().find(|(k, _)| *k == key) {
        if let Some((_, native)) = XSIM_NATIVE_MAP.iter().find(|(k, _)| k == xsim_key) {
            return Some((*native).to_string());
        }
    }
    None
}

/// Proper-name overrides for corners whose dataset key is a
/// machine-generated `snake_case` slug (spec §4.5, ~40 entries).
const NAME_OVERRIDES: &[(&str, &str)] = &[
    ("eau_rouge", "Eau Rouge"),
    ("raidillon", "Raidillon"),
    ("tertre_rouge", "Tertre Rouge"),
    ("craner_curves", "Craner Curves"),
    ("130r", "130R"),
    ("paddock_hill_bend", "Paddock Hill Bend"),
    ("mcphillamy_park", "McPhillamy Park"),
    ("the_chase", "The Chase"),
    ("druids", "Druids"),
    ("graham_hill_bend", "Graham Hill Bend"),
    ("surtees", "Surtees"),
    ("clearways", "Clearways"),
    ("copse", "Copse"),
    ("maggotts", "Maggotts"),
    ("becketts", "Becketts"),
    ("chapel", "Chapel"),
    ("stowe", "Stowe"),
    ("vale", "Vale"),
    ("club", "Club"),
    ("degner", "Degner"),
    ("spoon_curve", "Spoon Curve"),
    ("130r_chicane", "130R Chicane"),
    ("casio_triangle", "Casio Triangle"),
    ("parabolica", "Parabolica"),
    ("lesmo", "Lesmo"),
    ("ascari", "Ascari"),
    ("variante_del_rettifilo", "Variante del Rettifilo"),
    ("tamburello", "Tamburello"),
    ("rivazza", "Rivazza"),
    ("the_corkscrew", "The Corkscrew"),
    ("andretti_hairpin", "Andretti Hairpin"),
    ("turn_1", "Turn 1"),
    ("mountain_straight", "Mountain Straight"),
    ("conrod_straight", "Conrod Straight"),
    ("skyline", "Skyline"),
    ("the_dipper", "The Dipper"),
    ("forrest_elbow", "Forrest's Elbow"),
    ("murrays_corner", "Murray's Corner"),
    ("hell_corner", "Hell Corner"),
    ("reid_park", "Reid Park"),
];

/// Turns a raw (possibly `snake_case`) dataset name into display form,
/// preferring the override table (spec §4.5).
pub fn normalize_name(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    if let Some((_, display)) = NAME_OVERRIDES.iter().find(|(k, _)| *k == key) {
        return (*display).to_string();
    }
    raw.split(|c: char| c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

const BUILT_IN_SNAPSHOT: &str = r#"{
  "tracks": {
    "bathurst": [
      {"name": "hell_corner", "distance_start_m": 60, "distance_end_m": 220},
      {"name": "mcphillamy_park", "distance_start_m": 2150, "distance_end_m": 2320},
      {"name": "the_chase", "distance_start_m": 3740, "distance_end_m": 3920},
      {"name": "murrays_corner", "distance_start_m": 5980, "distance_end_m": 6150}
    ],
    "spa": [
      {"name": "eau_rouge", "distance_start_m": 980, "distance_end_m": 1260, "corner_type": "sweeper"},
      {"name": "raidillon", "distance_start_m": 1260, "distance_end_m": 1420, "corner_type": "sweeper"},
      {"name": "les_combes", "distance_start_m": 1800, "distance_end_m": 1980}
    ],
    "xsim_spa": [
      {"name": "eau_rouge", "distance_start_m": 980, "distance_end_m": 1260, "corner_type": "sweeper"},
      {"name": "raidillon", "distance_start_m": 1260, "distance_end_m": 1420, "corner_type": "sweeper"}
    ]
  }
}"#;
