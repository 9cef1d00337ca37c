//! Property-Based Tests for the formulation engine
//!
//! 1. Indices always stay within their ranges
//! 2. Volatility bands account for every known percent
//! 3. Profiles are deterministic
//! 4. The excluded carrier forces a reformulation everywhere
//! 5. Ledger matching and range parsing never panic

use candela_chem::{ChemicalReference, CompositionEntry, ConcentrationRange, ReferenceTable};
use candela_engine::crossref::{cross_reference, CrossReferenceParams, SafetyDataSheet, SheetComponent};
use candela_engine::ledger::{name_matches, Ledger};
use candela_engine::profile::compute_profile;
use candela_engine::recipes::REFORMULATION;
use candela_engine::rules::evaluate_rules;
use candela_engine::synthesis::predict_recipe;
use proptest::prelude::*;
use std::sync::OnceLock;

fn reference() -> &'static ReferenceTable {
    static REFERENCE: OnceLock<ReferenceTable> = OnceLock::new();
    REFERENCE.get_or_init(|| ReferenceTable::bundled().unwrap())
}

// ============================================================================
// Strategies
// ============================================================================

/// Registry ids: mostly known, some unknown, the excluded carrier now and then
fn registry_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("78-70-6".to_string()),
        Just("5989-27-5".to_string()),
        Just("80-56-8".to_string()),
        Just("1222-05-5".to_string()),
        Just("21145-77-7".to_string()),
        Just("121-33-5".to_string()),
        Just("104-55-2".to_string()),
        Just("77-53-2".to_string()),
        Just("118-58-1".to_string()),
        Just("142-82-5".to_string()),
        Just("999-99-9".to_string()),
        Just("000-00-0".to_string()),
    ]
}

fn entry_strategy() -> impl Strategy<Value = CompositionEntry> {
    (registry_id_strategy(), 0.0f64..30.0, 0.0f64..30.0)
        .prop_map(|(id, low, high)| CompositionEntry::new(id.clone(), id, low, high))
}

fn composition_strategy() -> impl Strategy<Value = Vec<CompositionEntry>> {
    prop::collection::vec(entry_strategy(), 0..25)
}

fn total_of(entries: &[CompositionEntry], known: bool) -> f64 {
    entries
        .iter()
        .filter(|e| e.average() > 0.0)
        .filter(|e| reference().get(&e.registry_id).is_some() == known)
        .map(|e| e.average())
        .sum()
}

// ============================================================================
// Profile Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn indices_always_in_range(entries in composition_strategy()) {
        let profile = compute_profile(reference(), &entries);
        prop_assert!((-100..=100).contains(&profile.combustion_index));
        prop_assert!((0..=100).contains(&profile.diffusion_index));
    }

    #[test]
    fn bands_account_for_known_total(entries in composition_strategy()) {
        let profile = compute_profile(reference(), &entries);
        // four bands, each rounded to 2 decimals
        prop_assert!((profile.band_total() - total_of(&entries, true)).abs() < 0.021);
        prop_assert!((profile.pct_unknown - total_of(&entries, false)).abs() < 0.006);
        prop_assert_eq!(profile.nb_known + profile.nb_unknown, profile.nb_total);
    }

    #[test]
    fn profile_is_deterministic(entries in composition_strategy()) {
        let first = serde_json::to_string(&compute_profile(reference(), &entries)).unwrap();
        let second = serde_json::to_string(&compute_profile(reference(), &entries)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn dominant_molecule_is_known_and_above_threshold(entries in composition_strategy()) {
        let profile = compute_profile(reference(), &entries);
        if let Some(dominant) = profile.dominant_molecule {
            prop_assert!(dominant.pct > 20.0);
            prop_assert!(reference().get(&dominant.registry_id).is_some());
        }
    }

    #[test]
    fn excluded_carrier_forces_reformulation(
        mut entries in composition_strategy(),
        position in 0usize..25,
        carrier_pct in 0.0f64..5.0,
    ) {
        let at = position.min(entries.len());
        entries.insert(at, CompositionEntry::new("34590-94-8", "DPG", carrier_pct, carrier_pct));

        let profile = compute_profile(reference(), &entries);
        prop_assert!(profile.has_excluded_carrier);
        prop_assert_eq!(predict_recipe(&profile).recipe_code, REFORMULATION);
        prop_assert!(evaluate_rules(&profile).iter().any(|r| r.id == "R03"));

        let sheet = SafetyDataSheet {
            fragrance_name: Some("Dita".to_string()),
            composition: vec![SheetComponent::new("34590-94-8", format!("{carrier_pct}"))],
            ..SafetyDataSheet::default()
        };
        let result = cross_reference(
            &Ledger::bundled().unwrap(),
            &sheet,
            &CrossReferenceParams::default(),
            &[],
            &[],
        );
        prop_assert_eq!(result.recommendation.recipe_code, REFORMULATION);
    }
}

// ============================================================================
// Text Handling
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn range_parse_never_panics(text in ".{0,20}") {
        let range = ConcentrationRange::parse(&text);
        prop_assert!(!range.low.is_nan());
        prop_assert!(!range.high.is_nan());
    }

    #[test]
    fn plain_range_parses(low in 1u32..50, span in 0u32..50) {
        let high = low + span;
        let range = ConcentrationRange::parse(&format!("{low}-{high}"));
        prop_assert_eq!(range.low, f64::from(low));
        prop_assert_eq!(range.high, f64::from(high));
    }

    #[test]
    fn name_matching_is_symmetric(a in "[A-Za-z ]{0,12}", b in "[A-Za-z ]{0,12}") {
        prop_assert_eq!(name_matches(&a, &b), name_matches(&b, &a));
    }
}
