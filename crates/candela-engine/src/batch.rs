//! Batch correlation across every stored fragrance
//!
//! ```text
//! store.list_fragrances() ──► list_components(id) per fragrance (sequential)
//!                                   │  failures: logged, skipped
//!                                   ▼
//!               analyze each fragrance (rayon, order preserved)
//!                                   │
//!                    ledger name matches per fragrance
//!                                   │
//!            ┌──────────────────────┴───────────────────────┐
//!            ▼                                              ▼
//!   per-recipe profile means (≥ 2)              failure vs success contrast
//! ```

use crate::ledger::{find_by_name, ValidatedFormulationRecord};
use crate::profile::MolecularProfile;
use crate::recipes::{is_sentinel, FAILURE};
use crate::recommendation::Recommendation;
use crate::rules::RuleEngine;
use crate::synthesis::{analyze_with_rules, AnalysisOptions};
use crate::thresholds::MIN_PROFILES_PER_RECIPE;
use candela_chem::{ChemicalReference, CompositionEntry};
use candela_store::{FragranceId, FragranceStore, FragranceSummary, StoreError};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Report Types
// ============================================================================

/// How a ledger row used this fragrance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedUse {
    pub recipe_code: String,
    pub fragrance_load_pct: f64,
    pub wick_reference: String,
    pub client: String,
    pub notes: String,
}

impl From<&ValidatedFormulationRecord> for ValidatedUse {
    fn from(record: &ValidatedFormulationRecord) -> Self {
        Self {
            recipe_code: record.recipe_code.clone(),
            fragrance_load_pct: record.fragrance_load_pct,
            wick_reference: record.wick_reference.clone(),
            client: record.client.clone(),
            notes: record.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProfile {
    pub id: FragranceId,
    pub name: String,
    pub reference: Option<String>,
    pub supplier: Option<String>,
    pub flash_point: Option<f64>,
    /// Without the per-component detail
    pub profile: MolecularProfile,
    pub prediction: Recommendation,
    pub summary: String,
    pub nb_components: usize,
    pub nb_known: usize,
    pub triggered_rules: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validated_with: Vec<ValidatedUse>,
}

/// Mean profile of the fragrances validated with one recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCorrelation {
    pub count: usize,
    pub avg_pct_very_volatile: f64,
    pub avg_pct_heavy: f64,
    pub avg_combustion_index: i64,
    pub avg_diffusion_index: i64,
    pub avg_molecular_weight: i64,
    pub avg_flash_weighted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRule {
    pub rule_type: String,
    pub detail: String,
}

pub const FAILURE_VS_SUCCESS: &str = "failure_vs_success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub fragrances_total: usize,
    pub fragrances_with_components: usize,
    pub profiles: Vec<BatchProfile>,
    pub recipe_correlations: BTreeMap<String, RecipeCorrelation>,
    pub rules_discovered: Vec<DiscoveredRule>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Batch Analysis
// ============================================================================

/// Analyze every stored fragrance that has components and correlate the
/// resulting profiles with the ledger.
///
/// Only the initial listing can fail the batch; a fragrance whose components
/// cannot be read is logged and left out.
pub async fn batch_cross_analysis<S, R>(
    store: &S,
    reference: &R,
    rules: &RuleEngine,
    ledger: &[ValidatedFormulationRecord],
    parallel: bool,
) -> Result<BatchReport, StoreError>
where
    S: FragranceStore + ?Sized,
    R: ChemicalReference + ?Sized,
{
    let fragrances = store.list_fragrances().await?;
    let fragrances_total = fragrances.len();

    let mut loaded = Vec::with_capacity(fragrances_total);
    for fragrance in fragrances {
        match store.list_components(fragrance.id).await {
            Ok(components) if components.is_empty() => {}
            Ok(components) => loaded.push((fragrance, components)),
            Err(err) => {
                tracing::warn!(
                    fragrance_id = fragrance.id,
                    name = %fragrance.name,
                    error = %err,
                    "skipping fragrance: components unavailable"
                );
            }
        }
    }

    let analyze = |(fragrance, components): &(FragranceSummary, Vec<CompositionEntry>)| {
        analyze_one(reference, rules, ledger, fragrance, components)
    };
    let profiles: Vec<BatchProfile> = if parallel {
        loaded.par_iter().map(analyze).collect()
    } else {
        loaded.iter().map(analyze).collect()
    };

    let recipe_correlations = correlate_recipes(&profiles);
    let rules_discovered = discover_rules(&profiles).into_iter().collect::<Vec<_>>();

    tracing::info!(
        fragrances = fragrances_total,
        analyzed = profiles.len(),
        recipes = recipe_correlations.len(),
        discovered = rules_discovered.len(),
        "batch correlation complete"
    );

    Ok(BatchReport {
        fragrances_total,
        fragrances_with_components: loaded.len(),
        profiles,
        recipe_correlations,
        rules_discovered,
        generated_at: Utc::now(),
    })
}

fn analyze_one<R>(
    reference: &R,
    rules: &RuleEngine,
    ledger: &[ValidatedFormulationRecord],
    fragrance: &FragranceSummary,
    components: &[CompositionEntry],
) -> BatchProfile
where
    R: ChemicalReference + ?Sized,
{
    let options = AnalysisOptions {
        fragrance_name: Some(fragrance.name.clone()),
        ..AnalysisOptions::default()
    };
    let analysis = analyze_with_rules(reference, rules, components, &options);

    BatchProfile {
        id: fragrance.id,
        name: fragrance.name.clone(),
        reference: fragrance.reference.clone(),
        supplier: fragrance.supplier.clone(),
        flash_point: fragrance.flash_point,
        profile: analysis.profile.light(),
        prediction: analysis.prediction,
        summary: analysis.summary,
        nb_components: components.len(),
        nb_known: analysis.profile.nb_known,
        triggered_rules: analysis.triggered_rules.len(),
        validated_with: find_by_name(ledger, &fragrance.name)
            .map(ValidatedUse::from)
            .collect(),
    }
}

fn mean(profiles: &[&MolecularProfile], field: impl Fn(&MolecularProfile) -> f64) -> f64 {
    if profiles.is_empty() {
        return 0.0;
    }
    profiles.iter().map(|p| field(*p)).sum::<f64>() / profiles.len() as f64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn correlate_recipes(profiles: &[BatchProfile]) -> BTreeMap<String, RecipeCorrelation> {
    let mut by_recipe: BTreeMap<&str, Vec<&MolecularProfile>> = BTreeMap::new();
    for profile in profiles {
        for used in &profile.validated_with {
            by_recipe
                .entry(used.recipe_code.as_str())
                .or_default()
                .push(&profile.profile);
        }
    }

    by_recipe
        .into_iter()
        .filter(|(_, group)| group.len() >= MIN_PROFILES_PER_RECIPE)
        .map(|(recipe, group)| {
            let correlation = RecipeCorrelation {
                count: group.len(),
                avg_pct_very_volatile: round1(mean(&group, |p| p.pct_very_volatile)),
                avg_pct_heavy: round1(mean(&group, |p| p.pct_heavy)),
                avg_combustion_index: mean(&group, |p| f64::from(p.combustion_index)).round() as i64,
                avg_diffusion_index: mean(&group, |p| f64::from(p.diffusion_index)).round() as i64,
                avg_molecular_weight: mean(&group, |p| p.molecular_weight_weighted).round() as i64,
                avg_flash_weighted: mean(&group, |p| p.flash_point_weighted).round() as i64,
            };
            (recipe.to_string(), correlation)
        })
        .collect()
}

fn describe_group(group: &[&MolecularProfile]) -> String {
    format!(
        "mean combustion {}, volatile {:.1}%, heavy {:.1}%",
        mean(group, |p| f64::from(p.combustion_index)).round() as i64,
        mean(group, |p| p.pct_very_volatile),
        mean(group, |p| p.pct_heavy)
    )
}

/// Contrast fragrances that failed in production with ones that succeeded
fn discover_rules(profiles: &[BatchProfile]) -> Option<DiscoveredRule> {
    let failures: Vec<&MolecularProfile> = profiles
        .iter()
        .filter(|p| p.validated_with.iter().any(|v| v.recipe_code == FAILURE))
        .map(|p| &p.profile)
        .collect();
    let successes: Vec<&MolecularProfile> = profiles
        .iter()
        .filter(|p| p.validated_with.iter().any(|v| !is_sentinel(&v.recipe_code)))
        .map(|p| &p.profile)
        .collect();

    if failures.is_empty() || successes.is_empty() {
        return None;
    }

    Some(DiscoveredRule {
        rule_type: FAILURE_VS_SUCCESS.to_string(),
        detail: format!(
            "Across {} failure(s) vs {} success(es): failures: {} | successes: {}",
            failures.len(),
            successes.len(),
            describe_group(&failures),
            describe_group(&successes)
        ),
    })
}

// ============================================================================
// Tests
// ============================================================================
