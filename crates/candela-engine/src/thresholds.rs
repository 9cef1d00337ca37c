//! Hand-tuned thresholds for the formulation engine.
//!
//! Every cut-off the profile, rules, ledger matcher, synthesizer and batch
//! analyzer compare against lives here. Percentages are percent by mass of
//! the fragrance; temperatures are °C.

// ============================================================================
// Profile Aggregation
// ============================================================================

/// Below this flash point a substance is very volatile.
pub const VERY_VOLATILE_FLASH_C: f64 = 55.0;

/// Below this flash point a substance is volatile.
pub const VOLATILE_FLASH_C: f64 = 85.0;

/// Below this flash point a substance is medium; at or above, heavy.
pub const MEDIUM_FLASH_C: f64 = 110.0;

/// A very volatile substance above this share raises the danger-flash alert.
pub const DANGER_FLASH_MIN_PCT: f64 = 1.0;

/// A single substance above this share dominates the fragrance.
pub const DOMINANT_MOLECULE_PCT: f64 = 20.0;

/// Allergens at or below this share are not reported.
pub const ALLERGEN_MIN_PCT: f64 = 0.1;

/// IFRA-declared allergens tracked by the profile.
pub const ALLERGEN_IDS: &[&str] = &[
    "78-70-6",   // linalool
    "5989-27-5", // d-limonene
    "5392-40-5", // citral
    "97-53-0",   // eugenol
    "104-55-2",  // cinnamaldehyde
    "106-22-9",  // citronellol
    "106-24-1",  // geraniol
    "127-51-5",  // alpha-isomethyl ionone
];

pub const COMBUSTION_INDEX_MIN: i32 = -100;
pub const COMBUSTION_INDEX_MAX: i32 = 100;
pub const DIFFUSION_INDEX_MIN: i32 = 0;
pub const DIFFUSION_INDEX_MAX: i32 = 100;

// ============================================================================
// Correlation Rules
// ============================================================================

pub const RULE_VERY_VOLATILE_PCT: f64 = 15.0;
pub const RULE_HEAVY_PCT: f64 = 15.0;
pub const RULE_HEAVY_COMBUSTION_INDEX: i32 = -20;
pub const RULE_TERPENES_PCT: f64 = 30.0;
pub const RULE_SESQUITERPENES_PCT: f64 = 10.0;
pub const RULE_ALDEHYDES_PCT: f64 = 5.0;
pub const RULE_ALCOHOLS_PCT: f64 = 10.0;

/// The balanced-profile rule needs `-10 < combustion_index < 10`.
pub const RULE_BALANCED_COMBUSTION_SPAN: i32 = 10;

// ============================================================================
// Flash-Point Safety
// ============================================================================

/// Below this reported flash point the fragrance is a danger.
pub const DANGER_FLASH_C: f64 = 55.0;

/// Below this reported flash point the fragrance needs watching.
pub const WARNING_FLASH_C: f64 = 70.0;

/// Addition ceiling is this far below a dangerous flash point...
pub const DANGER_ADDITION_MARGIN_C: f64 = 15.0;

/// ...but never below this.
pub const ADDITION_FLOOR_C: f64 = 35.0;

/// Addition ceiling margin for a warning-band flash point.
pub const WARNING_ADDITION_MARGIN_C: f64 = 10.0;

/// Highest safe fragrance-addition temperature for a dangerous flash point.
pub fn safe_addition_ceiling(flash_point_c: f64) -> f64 {
    (flash_point_c - DANGER_ADDITION_MARGIN_C).max(ADDITION_FLOOR_C)
}

// ============================================================================
// Recipe Prediction
// ============================================================================

/// Musk + fixative share calling for the reinforced recipe.
pub const REINFORCED_HEAVY_PCT: f64 = 20.0;

/// Musk + fixative share calling for the inverted recipe.
pub const INVERTED_HEAVY_PCT: f64 = 10.0;

/// Below this combustion index, drop the 6213 wax.
pub const MUSK_FREE_COMBUSTION_INDEX: i32 = -20;

/// The standard recipe is a confident call only above this index.
pub const STANDARD_CONFIDENT_COMBUSTION_INDEX: i32 = -5;

/// Wick base size by container diameter (mm): first breakpoint above wins.
pub const WICK_BREAKPOINTS_MM: &[(f64, &str)] = &[
    (60.0, "LX 14"),
    (70.0, "LX 16"),
    (80.0, "LX 18"),
    (90.0, "LX 20"),
];

/// Wick for containers at or above the last breakpoint.
pub const WICK_LARGEST: &str = "LX 22";

pub const WICK_VERY_VOLATILE_PCT: f64 = 15.0;
pub const WICK_HEAVY_PCT: f64 = 15.0;
pub const WICK_HIGH_LOAD_PCT: f64 = 10.0;

// ============================================================================
// Summary Labels
// ============================================================================

pub const SUMMARY_VERY_VOLATILE_PCT: f64 = 10.0;
pub const SUMMARY_HEAVY_PCT: f64 = 20.0;
pub const SUMMARY_FAMILY_PCT: f64 = 5.0;
pub const SUMMARY_COMBUSTION_DIFFICULT: i32 = -20;
pub const SUMMARY_COMBUSTION_CAUTION: i32 = -5;
pub const SUMMARY_DIFFUSION_STRONG: i32 = 30;
pub const SUMMARY_DIFFUSION_MEDIUM: i32 = 15;

// ============================================================================
// Ledger Matching
// ============================================================================

/// A data-sheet component whose upper bound exceeds this is flagged.
pub const SHEET_DOMINANT_PCT: f64 = 20.0;

/// Heavy short-list substances count above this average.
pub const HEAVY_MARKER_MIN_PCT: f64 = 5.0;

/// Heavy short-list total calling for the reinforced recipe.
pub const HEAVY_MARKER_TOTAL_PCT: f64 = 15.0;

/// Volatile short-list substances are flagged above this average.
pub const VOLATILE_MARKER_MIN_PCT: f64 = 3.0;

/// Flash contributors are listed above this upper bound...
pub const FLASH_CONTRIBUTOR_MIN_PCT: f64 = 2.0;

/// ...when their own flash point is below reported flash + this margin.
pub const FLASH_CONTRIBUTOR_MARGIN_C: f64 = 10.0;

/// Fragrance load assumed when the caller gives none.
pub const DEFAULT_FRAGRANCE_LOAD_PCT: f64 = 10.0;

/// Defaults for dynamic ledger rows missing a field.
pub const DYNAMIC_DEFAULT_CLIENT: &str = "DB";
pub const DYNAMIC_DEFAULT_MASS_G: f64 = 200.0;
pub const DYNAMIC_DEFAULT_NOTES: &str = "imported from database";

// ============================================================================
// Batch Correlation
// ============================================================================

/// Recipe groups need at least this many profiles to report means.
pub const MIN_PROFILES_PER_RECIPE: usize = 2;

// ============================================================================
// Olfactory Analysis
// ============================================================================

/// Substances below this detection threshold (ppm) are off-note suspects.
pub const OFF_NOTE_THRESHOLD_PPM: f64 = 0.01;

/// A sweet suspect above this share needs a supplier reformulation.
pub const SWEET_REFORMULATION_PCT: f64 = 5.0;
