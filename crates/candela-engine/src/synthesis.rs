//! Recommendation synthesis: profile + fired rules → recipe, wick, summary
//!
//! The recipe call here uses the profile alone; the ledger matcher in
//! [`crate::crossref`] is the one that knows production history.

use crate::profile::{compute_profile, MolecularProfile};
use crate::recipes::{MFC_A, MFC_B, MFC_C, MFC_G, REFORMULATION};
use crate::recommendation::{Confidence, Recommendation, RecommendationKind};
use crate::rules::{RuleEngine, TriggeredRule};
use crate::thresholds::*;
use candela_chem::{ChemicalReference, CompositionEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub fragrance_name: Option<String>,
    /// Container diameter; without it, or at zero, no wick is predicted
    #[serde(default)]
    pub diameter_mm: Option<f64>,
    #[serde(default)]
    pub fragrance_load_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WickPrediction {
    pub base: String,
    /// Size-up hints, in the order they were found
    pub adjustments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragranceAnalysis {
    /// Echoed from the options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragrance_name: Option<String>,
    pub profile: MolecularProfile,
    pub triggered_rules: Vec<TriggeredRule>,
    pub prediction: Recommendation,
    pub wick: Option<WickPrediction>,
    pub summary: String,
}

/// Profile, rules, recipe, wick and summary with the standard rule set
pub fn analyze_fragrance_profile<R>(
    reference: &R,
    entries: &[CompositionEntry],
    options: &AnalysisOptions,
) -> FragranceAnalysis
where
    R: ChemicalReference + ?Sized,
{
    analyze_with_rules(reference, &RuleEngine::default(), entries, options)
}

pub fn analyze_with_rules<R>(
    reference: &R,
    rules: &RuleEngine,
    entries: &[CompositionEntry],
    options: &AnalysisOptions,
) -> FragranceAnalysis
where
    R: ChemicalReference + ?Sized,
{
    let profile = compute_profile(reference, entries);
    let triggered_rules = rules.evaluate(&profile);
    let prediction = predict_recipe(&profile);
    let wick = options
        .diameter_mm
        .filter(|d| *d > 0.0)
        .map(|d| predict_wick(&profile, d, options.fragrance_load_pct));
    let summary = generate_summary(&profile);

    FragranceAnalysis {
        fragrance_name: options.fragrance_name.clone(),
        profile,
        triggered_rules,
        prediction,
        wick,
        summary,
    }
}

/// Profile-only recipe cascade; first branch that applies wins
pub fn predict_recipe(profile: &MolecularProfile) -> Recommendation {
    let heavy = profile.heavy_load();

    if profile.has_excluded_carrier {
        return Recommendation::new(
            RecommendationKind::Exclusion,
            REFORMULATION,
            Confidence::High,
            "Excluded carrier present: reformulation required",
        )
        .because("DPG detected: reformulation is mandatory");
    }

    if heavy > REINFORCED_HEAVY_PCT {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_C,
            Confidence::High,
            "Reinforced tripartite for a heavy fragrance",
        )
        .because(format!("Heavy fragrance ({heavy:.0}% fixatives): reinforced 6213"));
    }

    if heavy > INVERTED_HEAVY_PCT {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_G,
            Confidence::Medium,
            "Inverted tripartite for scent fidelity",
        )
        .because(format!(
            "Moderate fixatives ({heavy:.0}%): inverted for scent fidelity"
        ));
    }

    if profile.combustion_index < MUSK_FREE_COMBUSTION_INDEX {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_B,
            Confidence::Medium,
            "Bipartite without 6213",
        )
        .because(format!(
            "Negative combustion index ({}): no 6213 to avoid blocking",
            profile.combustion_index
        ));
    }

    let confidence = if profile.combustion_index > STANDARD_CONFIDENT_COMBUSTION_INDEX {
        Confidence::High
    } else {
        Confidence::Medium
    };
    Recommendation::new(
        RecommendationKind::Default,
        MFC_A,
        confidence,
        "Standard tripartite",
    )
    .because("Profile compatible with the standard tripartite")
}

/// Wick from the container diameter, annotated for the fragrance
pub fn predict_wick(
    profile: &MolecularProfile,
    diameter_mm: f64,
    fragrance_load_pct: Option<f64>,
) -> WickPrediction {
    let base = WICK_BREAKPOINTS_MM
        .iter()
        .find(|(limit, _)| diameter_mm < *limit)
        .map_or(WICK_LARGEST, |(_, wick)| *wick);

    let mut adjustments = Vec::new();
    if profile.pct_very_volatile > WICK_VERY_VOLATILE_PCT {
        adjustments.push("+1 size: volatile terpenes".to_string());
    }
    if profile.heavy_load() > WICK_HEAVY_PCT {
        adjustments.push("+1 size: heavy fragrance".to_string());
    }
    if fragrance_load_pct.map_or(false, |pct| pct > WICK_HIGH_LOAD_PCT) {
        adjustments.push("+1 if fragrance load above 10%".to_string());
    }

    WickPrediction {
        base: base.to_string(),
        adjustments,
    }
}

fn combustion_label(index: i32) -> &'static str {
    if index < SUMMARY_COMBUSTION_DIFFICULT {
        "🔴 Difficult"
    } else if index < SUMMARY_COMBUSTION_CAUTION {
        "🟡 Caution"
    } else {
        "🟢 OK"
    }
}

fn diffusion_label(index: i32) -> &'static str {
    if index > SUMMARY_DIFFUSION_STRONG {
        "🟢 Strong"
    } else if index > SUMMARY_DIFFUSION_MEDIUM {
        "🟡 Medium"
    } else {
        "🔴 Weak"
    }
}

/// Human-readable multi-line summary. Deterministic for a given profile.
pub fn generate_summary(profile: &MolecularProfile) -> String {
    let mut lines = Vec::new();

    if profile.pct_very_volatile > SUMMARY_VERY_VOLATILE_PCT {
        lines.push(format!("⚡ Very volatile ({:.0}%)", profile.pct_very_volatile));
    }
    if profile.pct_heavy > SUMMARY_HEAVY_PCT {
        lines.push(format!("🪨 Heavy/fixative ({:.0}%)", profile.pct_heavy));
    }

    let mut families: Vec<(&str, f64)> = [
        ("Terpenes", profile.pct_terpenes),
        ("Sesquiterpenes", profile.pct_sesquiterpenes),
        ("Alcohols", profile.pct_alcohols),
        ("Aldehydes", profile.pct_aldehydes),
        ("Musks", profile.pct_musks),
        ("Esters", profile.pct_esters),
    ]
    .into_iter()
    .filter(|(_, pct)| *pct > SUMMARY_FAMILY_PCT)
    .collect();
    // stable: equal shares keep the listing order
    families.sort_by(|a, b| b.1.total_cmp(&a.1));
    if !families.is_empty() {
        let listed: Vec<String> = families
            .iter()
            .map(|(label, pct)| format!("{label} {pct:.0}%"))
            .collect();
        lines.push(format!("Families: {}", listed.join(", ")));
    }

    lines.push(format!(
        "Combustion: {} ({}) | Diffusion: {} ({})",
        combustion_label(profile.combustion_index),
        profile.combustion_index,
        diffusion_label(profile.diffusion_index),
        profile.diffusion_index
    ));

    if let Some(fp) = profile.flash_point_min {
        let marker = if fp < DANGER_FLASH_C {
            "🔴"
        } else if fp < WARNING_FLASH_C {
            "🟡"
        } else {
            "🟢"
        };
        lines.push(format!("{marker} Flash min: {fp} °C"));
    }

    if profile.has_excluded_carrier {
        lines.push("⛔ DPG DETECTED: EXCLUDED".to_string());
    }
    if let Some(dominant) = &profile.dominant_molecule {
        lines.push(format!("📌 Dominant: {} ({:.0}%)", dominant.name, dominant.pct));
    }
    if !profile.allergens.is_empty() {
        lines.push(format!("⚠️ {} IFRA allergen(s)", profile.allergens.len()));
    }

    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
