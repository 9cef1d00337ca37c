//! Correlation rules: fragrance profile → recipe hints
//!
//! Each rule is an independent predicate over a [`MolecularProfile`] plus an
//! impact template. Every applicable rule fires; no rule suppresses another,
//! and the engine returns the full evidence set rather than one decision.

use crate::profile::MolecularProfile;
use crate::recipes::{MFC_A, REFORMULATION};
use crate::thresholds::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Rule Types
// ============================================================================

/// Severity of a fired rule, least to most serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    /// Good to know
    Info,
    /// Favourable signal
    Positive,
    Warning,
    /// Should change the recipe choice
    Important,
    /// Process safety
    Safety,
    /// Fragrance cannot be used as is
    Blocking,
}

/// An impact field: fixed, or computed from the profile
#[derive(Clone)]
pub enum Template<T> {
    Constant(T),
    Computed(fn(&MolecularProfile) -> T),
}

impl<T: Clone> Template<T> {
    pub fn materialize(&self, profile: &MolecularProfile) -> T {
        match self {
            Template::Constant(value) => value.clone(),
            Template::Computed(compute) => compute(profile),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Template<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Template::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// What a rule contributes when it fires
#[derive(Debug, Clone)]
pub struct Impact {
    pub recipe: Option<&'static str>,
    pub wick_adjustment: Option<&'static str>,
    pub rationale: Template<String>,
    pub temperature_ceiling_c: Option<Template<f64>>,
}

impl Impact {
    fn explain(rationale: fn(&MolecularProfile) -> String) -> Self {
        Self {
            recipe: None,
            wick_adjustment: None,
            rationale: Template::Computed(rationale),
            temperature_ceiling_c: None,
        }
    }

    fn recipe(mut self, recipe: &'static str) -> Self {
        self.recipe = Some(recipe);
        self
    }

    fn wick(mut self, adjustment: &'static str) -> Self {
        self.wick_adjustment = Some(adjustment);
        self
    }
}

/// A hand-authored correlation rule
#[derive(Clone)]
pub struct CorrelationRule {
    pub id: &'static str,
    pub label: &'static str,
    pub severity: RuleSeverity,
    pub predicate: fn(&MolecularProfile) -> bool,
    pub impact: Impact,
}

impl fmt::Debug for CorrelationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationRule")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("severity", &self.severity)
            .field("impact", &self.impact)
            .finish_non_exhaustive()
    }
}

impl CorrelationRule {
    pub fn applies(&self, profile: &MolecularProfile) -> bool {
        (self.predicate)(profile)
    }

    /// Materialize the impact template against a profile
    pub fn fire(&self, profile: &MolecularProfile) -> TriggeredRule {
        TriggeredRule {
            id: self.id.to_string(),
            label: self.label.to_string(),
            severity: self.severity,
            rationale: self.impact.rationale.materialize(profile),
            recipe: self.impact.recipe.map(str::to_string),
            wick_adjustment: self.impact.wick_adjustment.map(str::to_string),
            temperature_ceiling_c: self
                .impact
                .temperature_ceiling_c
                .as_ref()
                .map(|t| t.materialize(profile)),
        }
    }
}

/// A rule that fired, with its impact materialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub id: String,
    pub label: String,
    pub severity: RuleSeverity,
    pub rationale: String,
    pub recipe: Option<String>,
    pub wick_adjustment: Option<String>,
    pub temperature_ceiling_c: Option<f64>,
}

// ============================================================================
// Rule Engine
// ============================================================================

/// Evaluates a rule list against profiles
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<CorrelationRule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<CorrelationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CorrelationRule] {
        &self.rules
    }

    /// All rules whose predicate holds, in rule order
    pub fn evaluate(&self, profile: &MolecularProfile) -> Vec<TriggeredRule> {
        self.rules
            .iter()
            .filter(|rule| rule.applies(profile))
            .map(|rule| {
                tracing::debug!(rule = rule.id, severity = ?rule.severity, "correlation rule fired");
                rule.fire(profile)
            })
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(correlation_rules())
    }
}

/// Evaluate the standard rule set
pub fn evaluate_rules(profile: &MolecularProfile) -> Vec<TriggeredRule> {
    RuleEngine::default().evaluate(profile)
}

// ============================================================================
// Standard Rules
// ============================================================================

/// The lab's correlation rules R01 to R10
pub fn correlation_rules() -> Vec<CorrelationRule> {
    vec![
        CorrelationRule {
            id: "R01",
            label: "Very volatile fragrance: watch combustion",
            severity: RuleSeverity::Warning,
            predicate: |p| p.pct_very_volatile > RULE_VERY_VOLATILE_PCT,
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% very volatile molecules (flash < 55 °C). Light terpenes evaporate \
                     before they burn and the pool thins out: raise the wick one size.",
                    p.pct_very_volatile
                )
            })
            .recipe(MFC_A)
            .wick("+1"),
        },
        CorrelationRule {
            id: "R02",
            label: "Heavy fragrance (musks + fixatives): reinforced 6213",
            severity: RuleSeverity::Important,
            predicate: |p| {
                p.heavy_load() > RULE_HEAVY_PCT || p.combustion_index < RULE_HEAVY_COMBUSTION_INDEX
            },
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% heavy musks/fixatives, combustion index {}. High molecular weight \
                     slows evaporation from the pool. MFC-C (6213 at 38%) or MFC-G (inverted, \
                     49%) for better capillarity and throw.",
                    p.heavy_load(),
                    p.combustion_index
                )
            })
            .recipe("MFC-C or MFC-G")
            .wick("standard"),
        },
        CorrelationRule {
            id: "R03",
            label: "Excluded carrier detected: reformulation required",
            severity: RuleSeverity::Blocking,
            predicate: |p| p.has_excluded_carrier,
            impact: Impact {
                recipe: Some(REFORMULATION),
                wick_adjustment: Some("N/A"),
                rationale: Template::Constant(
                    "DPG (dipropylene glycol) detected. Excluded: DPG clogs the wick by \
                     capillarity but does not burn cleanly. Ask the supplier for an IPM or \
                     ester base."
                        .to_string(),
                ),
                temperature_ceiling_c: None,
            },
        },
        CorrelationRule {
            id: "R04",
            label: "Very low flash point: adapted process",
            severity: RuleSeverity::Safety,
            predicate: |p| p.flash_point_min.map_or(false, |fp| fp < VERY_VOLATILE_FLASH_C),
            impact: Impact {
                temperature_ceiling_c: Some(Template::Computed(|p| {
                    p.flash_point_min
                        .map_or(ADDITION_FLOOR_C, safe_addition_ceiling)
                })),
                ..Impact::explain(|p| {
                    let fp = p.flash_point_min.unwrap_or_default();
                    format!(
                        "Minimum flash point detected: {fp} °C. Maximum fragrance addition \
                         temperature: {} °C. Add to warm wax, not molten wax. Workshop \
                         ventilation required.",
                        safe_addition_ceiling(fp)
                    )
                })
            },
        },
        CorrelationRule {
            id: "R05",
            label: "Terpene-dominant: excellent throw, watch soot",
            severity: RuleSeverity::Info,
            predicate: |p| p.pct_terpenes > RULE_TERPENES_PCT,
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% terpenes: excellent hot throw. Terpenes are pure hydrocarbons and \
                     soot under an oversized wick. Test the standard wick or one size down.",
                    p.pct_terpenes
                )
            })
            .recipe(MFC_A)
            .wick("standard or -1"),
        },
        CorrelationRule {
            id: "R06",
            label: "High sesquiterpenes: good hold, easy burn",
            severity: RuleSeverity::Positive,
            predicate: |p| p.pct_sesquiterpenes > RULE_SESQUITERPENES_PCT,
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% sesquiterpenes (cedrenes, caryophyllene). Mid molecular weight \
                     (~200), excellent wax solubility, clean burn. Compatible with every recipe.",
                    p.pct_sesquiterpenes
                )
            })
            .recipe("MFC-A or MFC-F"),
        },
        CorrelationRule {
            id: "R07",
            label: "Dominant molecule above 20%: single profile",
            severity: RuleSeverity::Warning,
            predicate: |p| {
                p.dominant_molecule
                    .as_ref()
                    .map_or(false, |m| m.pct > DOMINANT_MOLECULE_PCT)
            },
            impact: Impact::explain(|p| match &p.dominant_molecule {
                Some(m) => format!(
                    "{} at {:.0}% dominates the fragrance ({}). Single-profile fragrance: burn \
                     behaviour follows this molecule. Test its reaction with each wax base.",
                    m.name, m.pct, m.family
                ),
                None => String::new(),
            }),
        },
        CorrelationRule {
            id: "R08",
            label: "High aldehydes: chemical reactivity",
            severity: RuleSeverity::Warning,
            predicate: |p| p.pct_aldehydes > RULE_ALDEHYDES_PCT,
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% aldehydes. Reactive molecules: they can polymerise in hot wax and \
                     discolour it (vanillin yellowing). Limit time at high temperature. Long \
                     cure recommended (96 h).",
                    p.pct_aldehydes
                )
            }),
        },
        CorrelationRule {
            id: "R09",
            label: "Balanced fragrance: standard recipe",
            severity: RuleSeverity::Positive,
            predicate: |p| {
                p.combustion_index > -RULE_BALANCED_COMBUSTION_SPAN
                    && p.combustion_index < RULE_BALANCED_COMBUSTION_SPAN
                    && !p.has_excluded_carrier
                    && !p.has_danger_flash
            },
            impact: Impact::explain(|p| {
                format!(
                    "Balanced profile (combustion {}, diffusion {}). Compatible with the \
                     standard MFC-A recipe (tripartite 49/36/5). Standard wick for the diameter.",
                    p.combustion_index, p.diffusion_index
                )
            })
            .recipe(MFC_A)
            .wick("standard"),
        },
        CorrelationRule {
            id: "R10",
            label: "Strong alcohol fraction: good throw",
            severity: RuleSeverity::Positive,
            predicate: |p| p.pct_alcohols > RULE_ALCOHOLS_PCT,
            impact: Impact::explain(|p| {
                format!(
                    "{:.1}% terpenic/aromatic alcohols. Good throw carriers: alcohols \
                     evaporate cleanly and carry the scent. Expected hot throw: high.",
                    p.pct_alcohols
                )
            }),
        },
    ]
}

// ============================================================================
// Tests
// ============================================================================
