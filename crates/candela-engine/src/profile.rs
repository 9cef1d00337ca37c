//! Molecular profile aggregation
//!
//! Folds a composition list into a [`MolecularProfile`]: volatility bands,
//! chemical-family totals, combustion and diffusion indices, flash-point
//! statistics and alerts.
//!
//! ```text
//! entries ──► skip avg ≤ 0 ──► reference lookup ──┬─► known:   bands, families, indices
//!                                                 └─► unknown: nb_unknown, pct_unknown
//! ```
//!
//! Weighted means are normalized by the total of *all* examined entries,
//! known and unknown, so fragrances rich in unknown substances show an
//! understated weighted flash point.

use crate::thresholds::*;
use candela_chem::{
    ChemicalReference, ChemicalReferenceEntry, CompositionEntry, DiffusionImpact,
    VolatilityClass, EXCLUDED_CARRIER_ID,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Profile Types
// ============================================================================

/// One examined composition entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetail {
    pub registry_id: String,
    pub name: String,
    pub concentration_min: f64,
    pub concentration_max: f64,
    pub concentration_avg: f64,
    pub known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ChemicalReferenceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantMolecule {
    pub registry_id: String,
    pub name: String,
    pub pct: f64,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergen {
    pub registry_id: String,
    pub name: String,
    pub pct: f64,
}

/// Derived description of a fragrance's chemistry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MolecularProfile {
    // Volatility bands (known entries only, mutually exclusive)
    pub pct_very_volatile: f64,
    pub pct_volatile: f64,
    pub pct_medium: f64,
    pub pct_heavy: f64,
    /// Fixative diffusion or very-low volatility, across bands
    pub pct_fixative: f64,

    // Chemical families
    pub pct_terpenes: f64,
    pub pct_sesquiterpenes: f64,
    pub pct_aldehydes: f64,
    pub pct_musks: f64,
    /// Esters and lactones
    pub pct_esters: f64,
    pub pct_alcohols: f64,
    pub pct_phenols: f64,
    pub pct_glycols: f64,
    pub pct_unknown: f64,

    /// -100 (blocks the wick) to +100 (burns easily)
    pub combustion_index: i32,
    /// 0 (no throw) to 100 (excellent throw)
    pub diffusion_index: i32,
    pub flash_point_min: Option<f64>,
    pub flash_point_weighted: f64,
    pub molecular_weight_weighted: f64,

    // Alerts
    pub has_excluded_carrier: bool,
    pub has_danger_flash: bool,
    pub dominant_molecule: Option<DominantMolecule>,
    pub allergens: Vec<Allergen>,

    pub nb_known: usize,
    pub nb_unknown: usize,
    pub nb_total: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDetail>,
}

impl MolecularProfile {
    /// Musks plus fixatives: the "heavy load" the recipe cascade keys on
    pub fn heavy_load(&self) -> f64 {
        self.pct_musks + self.pct_fixative
    }

    /// Total of the four volatility bands
    pub fn band_total(&self) -> f64 {
        self.pct_very_volatile + self.pct_volatile + self.pct_medium + self.pct_heavy
    }

    /// Copy without the per-entry detail list
    pub fn light(&self) -> Self {
        Self {
            components: Vec::new(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolatilityBand {
    VeryVolatile,
    Volatile,
    Medium,
    Heavy,
}

fn volatility_band(entry: &ChemicalReferenceEntry) -> VolatilityBand {
    let below = |limit: f64| entry.flash_point_c.map_or(false, |fp| fp < limit);

    if below(VERY_VOLATILE_FLASH_C) || entry.volatility == VolatilityClass::VeryHigh {
        VolatilityBand::VeryVolatile
    } else if below(VOLATILE_FLASH_C) || entry.volatility == VolatilityClass::High {
        VolatilityBand::Volatile
    } else if below(MEDIUM_FLASH_C) || entry.volatility == VolatilityClass::Medium {
        VolatilityBand::Medium
    } else {
        VolatilityBand::Heavy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FamilyBucket {
    Terpene,
    Sesquiterpene,
    Aldehyde,
    Musk,
    Ester,
    Alcohol,
    Phenol,
    Glycol,
}

/// First matching tag wins, so `terpene-alcohol` counts as a terpene.
fn family_bucket(family: &str) -> Option<FamilyBucket> {
    let family = family.to_ascii_lowercase();
    let bucket = if family.contains("terpene") && !family.contains("sesqui") {
        FamilyBucket::Terpene
    } else if family.contains("sesquiterpene") {
        FamilyBucket::Sesquiterpene
    } else if family.contains("aldehyde") {
        FamilyBucket::Aldehyde
    } else if family.contains("musk") {
        FamilyBucket::Musk
    } else if family.contains("ester") || family.contains("lactone") {
        FamilyBucket::Ester
    } else if family.contains("alcohol") {
        FamilyBucket::Alcohol
    } else if family.contains("phenol") {
        FamilyBucket::Phenol
    } else if family.contains("glycol") {
        FamilyBucket::Glycol
    } else {
        return None;
    };
    Some(bucket)
}

fn is_fixative(entry: &ChemicalReferenceEntry) -> bool {
    entry.diffusion == DiffusionImpact::Fixative || entry.volatility == VolatilityClass::VeryLow
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Aggregation
// ============================================================================

/// Aggregate a composition into a molecular profile. Pure and deterministic.
pub fn compute_profile<R>(reference: &R, entries: &[CompositionEntry]) -> MolecularProfile
where
    R: ChemicalReference + ?Sized,
{
    let mut profile = MolecularProfile {
        // the carrier is refused at any concentration
        has_excluded_carrier: entries
            .iter()
            .any(|e| e.registry_id.trim() == EXCLUDED_CARRIER_ID),
        ..MolecularProfile::default()
    };

    let mut total_pct = 0.0;
    let mut flash_weighted_sum = 0.0;
    let mut mw_weighted_sum = 0.0;
    let mut combustion = 0.0;
    let mut diffusion = 0.0;

    for entry in entries {
        let avg = entry.average();
        if !(avg > 0.0) {
            continue;
        }
        total_pct += avg;
        profile.nb_total += 1;

        let registry_id = entry.registry_id.trim();
        let known = reference.get(registry_id);

        profile.components.push(ComponentDetail {
            registry_id: registry_id.to_string(),
            name: entry.name.clone(),
            concentration_min: entry.concentration_min,
            concentration_max: entry.concentration_max,
            concentration_avg: avg,
            known: known.is_some(),
            reference: known.cloned(),
        });

        let Some(known) = known else {
            profile.nb_unknown += 1;
            profile.pct_unknown += avg;
            continue;
        };
        profile.nb_known += 1;

        if let Some(fp) = known.flash_point_c {
            flash_weighted_sum += fp * avg;
            profile.flash_point_min = Some(profile.flash_point_min.map_or(fp, |min| min.min(fp)));
            if fp < VERY_VOLATILE_FLASH_C && avg > DANGER_FLASH_MIN_PCT {
                profile.has_danger_flash = true;
            }
        }
        if let Some(mw) = known.molecular_weight {
            mw_weighted_sum += mw * avg;
        }

        match volatility_band(known) {
            VolatilityBand::VeryVolatile => profile.pct_very_volatile += avg,
            VolatilityBand::Volatile => profile.pct_volatile += avg,
            VolatilityBand::Medium => profile.pct_medium += avg,
            VolatilityBand::Heavy => profile.pct_heavy += avg,
        }

        if is_fixative(known) {
            profile.pct_fixative += avg;
        }

        match family_bucket(&known.family) {
            Some(FamilyBucket::Terpene) => profile.pct_terpenes += avg,
            Some(FamilyBucket::Sesquiterpene) => profile.pct_sesquiterpenes += avg,
            Some(FamilyBucket::Aldehyde) => profile.pct_aldehydes += avg,
            Some(FamilyBucket::Musk) => profile.pct_musks += avg,
            Some(FamilyBucket::Ester) => profile.pct_esters += avg,
            Some(FamilyBucket::Alcohol) => profile.pct_alcohols += avg,
            Some(FamilyBucket::Phenol) => profile.pct_phenols += avg,
            Some(FamilyBucket::Glycol) => profile.pct_glycols += avg,
            None => {}
        }

        combustion += known.combustion.weight() * (avg / 10.0);
        diffusion += known.diffusion.weight() * (avg / 10.0);

        if ALLERGEN_IDS.contains(&registry_id) && avg > ALLERGEN_MIN_PCT {
            profile.allergens.push(Allergen {
                registry_id: registry_id.to_string(),
                name: known.name.clone(),
                pct: avg,
            });
        }
    }

    // Running best: a later entry replaces the best only when strictly greater
    profile.dominant_molecule = profile
        .components
        .iter()
        .filter(|c| c.concentration_avg > DOMINANT_MOLECULE_PCT)
        .filter_map(|c| c.reference.as_ref().map(|r| (c, r)))
        .fold(None, |best: Option<DominantMolecule>, (c, r)| match best {
            Some(best) if c.concentration_avg <= best.pct => Some(best),
            _ => Some(DominantMolecule {
                registry_id: c.registry_id.clone(),
                name: r.name.clone(),
                pct: c.concentration_avg,
                family: r.family.clone(),
            }),
        });

    if total_pct > 0.0 {
        profile.flash_point_weighted = flash_weighted_sum / total_pct;
        profile.molecular_weight_weighted = mw_weighted_sum / total_pct;
    }

    profile.combustion_index =
        (combustion.round() as i32).clamp(COMBUSTION_INDEX_MIN, COMBUSTION_INDEX_MAX);
    profile.diffusion_index =
        (diffusion.round() as i32).clamp(DIFFUSION_INDEX_MIN, DIFFUSION_INDEX_MAX);

    for pct in [
        &mut profile.pct_very_volatile,
        &mut profile.pct_volatile,
        &mut profile.pct_medium,
        &mut profile.pct_heavy,
        &mut profile.pct_fixative,
        &mut profile.pct_terpenes,
        &mut profile.pct_sesquiterpenes,
        &mut profile.pct_aldehydes,
        &mut profile.pct_musks,
        &mut profile.pct_esters,
        &mut profile.pct_alcohols,
        &mut profile.pct_phenols,
        &mut profile.pct_glycols,
        &mut profile.pct_unknown,
    ] {
        *pct = round2(*pct);
    }

    profile
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use candela_chem::{CombustionImpact, ReferenceTable, WaxSolubility};

    fn reference_entry(
        id: &str,
        family: &str,
        flash: f64,
        volatility: VolatilityClass,
        combustion: CombustionImpact,
        diffusion: DiffusionImpact,
    ) -> ChemicalReferenceEntry {
        ChemicalReferenceEntry {
            registry_id: id.to_string(),
            name: format!("molecule {id}"),
            family: family.to_string(),
            molecular_weight: Some(150.0),
            flash_point_c: Some(flash),
            volatility,
            combustion,
            diffusion,
            wax_solubility: WaxSolubility::Good,
            notes: String::new(),
            odor: None,
        }
    }

    fn test_reference() -> ReferenceTable {
        ReferenceTable::from_entries(vec![
            reference_entry(
                "A",
                "terpene",
                45.0,
                VolatilityClass::VeryHigh,
                CombustionImpact::Risk,
                DiffusionImpact::Boost,
            ),
            reference_entry(
                "B",
                "musk-polycyclic",
                140.0,
                VolatilityClass::VeryLow,
                CombustionImpact::Brake,
                DiffusionImpact::Fixative,
            ),
            reference_entry(
                "C",
                "ester",
                100.0,
                VolatilityClass::Low,
                CombustionImpact::Neutral,
                DiffusionImpact::Support,
            ),
            reference_entry(
                EXCLUDED_CARRIER_ID,
                "glycol",
                75.0,
                VolatilityClass::Low,
                CombustionImpact::Blocking,
                DiffusionImpact::Negative,
            ),
        ])
        .unwrap()
    }

    fn entry(id: &str, min: f64, max: f64) -> CompositionEntry {
        CompositionEntry::new(id, id, min, max)
    }

    #[test]
    fn test_family_bucket_order() {
        assert_eq!(family_bucket("terpene-alcohol"), Some(FamilyBucket::Terpene));
        assert_eq!(family_bucket("sesquiterpene-alcohol"), Some(FamilyBucket::Sesquiterpene));
        assert_eq!(family_bucket("aldehyde-terpenic"), Some(FamilyBucket::Aldehyde));
        assert_eq!(family_bucket("ester-terpenic"), Some(FamilyBucket::Ester));
        assert_eq!(family_bucket("lactone-aromatic"), Some(FamilyBucket::Ester));
        assert_eq!(family_bucket("alcohol-aromatic"), Some(FamilyBucket::Alcohol));
        assert_eq!(family_bucket("ketone-woody"), None);
    }

    #[test]
    fn test_empty_composition() {
        let profile = compute_profile(&test_reference(), &[]);
        assert_eq!(profile.nb_total, 0);
        assert_eq!(profile.combustion_index, 0);
        assert_eq!(profile.flash_point_min, None);
        assert_eq!(profile.flash_point_weighted, 0.0);
        assert!(profile.dominant_molecule.is_none());
    }

    #[test]
    fn test_zero_concentration_skipped() {
        let profile = compute_profile(&test_reference(), &[entry("A", 0.0, 0.0)]);
        assert_eq!(profile.nb_total, 0);
        assert!(profile.components.is_empty());
    }

    #[test]
    fn test_unknown_entry_counts_only_as_unknown() {
        let profile = compute_profile(&test_reference(), &[entry("999-99-9", 50.0, 50.0)]);
        assert_eq!(profile.nb_unknown, 1);
        assert_eq!(profile.nb_known, 0);
        assert_relative_eq!(profile.pct_unknown, 50.0);
        assert_relative_eq!(profile.band_total(), 0.0);
        assert_eq!(profile.combustion_index, 0);
        assert_eq!(profile.diffusion_index, 0);
        assert_eq!(profile.flash_point_min, None);
        assert!(!profile.components[0].known);
    }

    #[test]
    fn test_weighted_means_include_unknowns() {
        let profile = compute_profile(
            &test_reference(),
            &[entry("C", 10.0, 10.0), entry("999-99-9", 10.0, 10.0)],
        );
        // only C has a flash point, but the divisor covers both entries
        assert_relative_eq!(profile.flash_point_weighted, 50.0);
        assert_relative_eq!(profile.molecular_weight_weighted, 75.0);
    }

    #[test]
    fn test_indices_clamped() {
        let profile = compute_profile(&test_reference(), &[entry(EXCLUDED_CARRIER_ID, 90.0, 90.0)]);
        assert_eq!(profile.combustion_index, -100);
        assert_eq!(profile.diffusion_index, 0);
        assert!(profile.has_excluded_carrier);
        assert_relative_eq!(profile.pct_glycols, 90.0);
    }

    #[test]
    fn test_excluded_carrier_at_zero_concentration() {
        let profile = compute_profile(&test_reference(), &[entry(EXCLUDED_CARRIER_ID, 0.0, 0.0)]);
        assert!(profile.has_excluded_carrier);
        assert_eq!(profile.nb_total, 0);
    }

    #[test]
    fn test_danger_flash_needs_more_than_one_percent() {
        let trace = compute_profile(&test_reference(), &[entry("A", 0.5, 1.5)]);
        assert!(!trace.has_danger_flash);
        assert_eq!(trace.flash_point_min, Some(45.0));

        let real = compute_profile(&test_reference(), &[entry("A", 1.0, 2.0)]);
        assert!(real.has_danger_flash);
    }

    #[test]
    fn test_dominant_molecule_first_wins_on_tie() {
        let reference = ReferenceTable::from_entries(vec![
            reference_entry(
                "X",
                "ester",
                120.0,
                VolatilityClass::Low,
                CombustionImpact::Neutral,
                DiffusionImpact::Support,
            ),
            reference_entry(
                "Y",
                "ester",
                120.0,
                VolatilityClass::Low,
                CombustionImpact::Neutral,
                DiffusionImpact::Support,
            ),
            reference_entry(
                "Z",
                "ester",
                120.0,
                VolatilityClass::Low,
                CombustionImpact::Neutral,
                DiffusionImpact::Support,
            ),
        ])
        .unwrap();

        let tie = compute_profile(&reference, &[entry("X", 25.0, 25.0), entry("Y", 25.0, 25.0)]);
        assert_eq!(tie.dominant_molecule.unwrap().registry_id, "X");

        let higher = compute_profile(
            &reference,
            &[
                entry("X", 25.0, 25.0),
                entry("Y", 30.0, 30.0),
                entry("Z", 28.0, 28.0),
            ],
        );
        let dominant = higher.dominant_molecule.unwrap();
        assert_eq!(dominant.registry_id, "Y");
        assert_relative_eq!(dominant.pct, 30.0);
    }

    #[test]
    fn test_unknown_entry_never_dominates() {
        let profile = compute_profile(&test_reference(), &[entry("999-99-9", 60.0, 60.0)]);
        assert!(profile.dominant_molecule.is_none());
    }

    #[test]
    fn test_allergens_from_bundled_reference() {
        let reference = ReferenceTable::bundled().unwrap();
        let profile = compute_profile(
            &reference,
            &[
                entry("78-70-6", 1.0, 5.0),
                entry("5989-27-5", 0.05, 0.1),
                entry("1222-05-5", 5.0, 10.0),
            ],
        );
        assert_eq!(profile.allergens.len(), 1);
        assert_eq!(profile.allergens[0].registry_id, "78-70-6");
    }

    #[test]
    fn test_pct_rounded_to_two_decimals() {
        let profile = compute_profile(&test_reference(), &[entry("C", 1.0, 1.2468)]);
        assert_relative_eq!(profile.pct_medium, 1.12);
        assert_relative_eq!(profile.pct_esters, 1.12);
    }

    #[test]
    fn test_duplicates_are_independent() {
        let profile = compute_profile(&test_reference(), &[entry("C", 5.0, 5.0), entry("C", 5.0, 5.0)]);
        assert_eq!(profile.nb_known, 2);
        assert_relative_eq!(profile.pct_esters, 10.0);
    }

    #[test]
    fn test_light_profile_drops_components() {
        let profile = compute_profile(&test_reference(), &[entry("C", 5.0, 5.0)]);
        assert_eq!(profile.components.len(), 1);
        let light = profile.light();
        assert!(light.components.is_empty());
        assert_eq!(light.nb_known, 1);
    }
}
