//! Safety data sheet × formulation ledger cross-reference
//!
//! Given a supplier's safety data sheet and the intended candle, find prior
//! validated formulations, flag molecules that matter for the wax, band the
//! flash point, and settle on one recipe:
//!
//! ```text
//! excluded carrier ──► REFORMULATION                          (high)
//!   └─ else validated by name ──► that recipe, load and wick  (high)
//!        └─ else pillar ──► MFC-H                             (high)
//!             └─ else vegetal ──► MFC-I                       (high)
//!                  └─ else heavy markers > 15 % ──► MFC-C     (medium)
//!                       └─ else MFC-A at the requested load   (medium)
//! ```
//!
//! Cross-referencing never fails: bad numbers read as zero, bad ledger rows
//! and rule payloads are dropped.

use crate::ledger::{
    decode_learned_rule, find_by_name, LearnedRule, Ledger, MatchKind,
    ValidatedFormulationRecord,
};
use crate::recipes::{is_sentinel, MFC_A, MFC_C, MFC_H, MFC_I, REFORMULATION};
use crate::recommendation::{Confidence, Recommendation, RecommendationKind};
use crate::thresholds::*;
use candela_chem::composition::{lenient_codes, lenient_number};
use candela_chem::{ConcentrationRange, EXCLUDED_CARRIER_ID};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Inputs
// ============================================================================

/// The parts of a safety data sheet the matcher reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyDataSheet {
    #[serde(default, alias = "nom")]
    pub fragrance_name: Option<String>,
    #[serde(default, alias = "fournisseur")]
    pub supplier: Option<String>,
    /// As reported; text that is not a number reads as unknown
    #[serde(default, alias = "flash_point", deserialize_with = "lenient_number")]
    pub flash_point_c: Option<f64>,
    #[serde(default)]
    pub composition: Vec<SheetComponent>,
}

/// A composition line as printed on the sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetComponent {
    #[serde(default, alias = "cas", alias = "cas_number")]
    pub registry_id: String,
    #[serde(default, alias = "nom_chimique")]
    pub name: Option<String>,
    /// Range text such as `"5-10"` or `"10"`
    #[serde(default, deserialize_with = "lenient_text")]
    pub concentration: String,
    #[serde(default, alias = "h_codes", deserialize_with = "lenient_codes")]
    pub hazard_codes: Vec<String>,
}

impl SheetComponent {
    pub fn new(registry_id: impl Into<String>, concentration: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            concentration: concentration.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_hazard_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hazard_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    fn range(&self) -> ConcentrationRange {
        ConcentrationRange::parse(&self.concentration)
    }

    fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.registry_id.clone())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleType {
    #[default]
    Container,
    #[serde(alias = "pilier")]
    Pillar,
    #[serde(alias = "végétal", alias = "vegetale")]
    Vegetal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceParams {
    /// Overrides the name printed on the sheet
    #[serde(default)]
    pub fragrance_name: Option<String>,
    #[serde(default)]
    pub candle_type: CandleType,
    #[serde(default)]
    pub vegetal: bool,
    #[serde(default)]
    pub fragrance_load_pct: Option<f64>,
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Ok,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactKind {
    Combustion,
    Diffusion,
    FlashPoint,
    Exclusion,
    Safety,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeImpact {
    pub kind: ImpactKind,
    pub severity: FindingSeverity,
    pub message: String,
}

/// A sheet component with at least one impact on the formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeFinding {
    pub name: String,
    pub registry_id: String,
    pub concentration: String,
    pub avg_pct: f64,
    pub impacts: Vec<MoleculeImpact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub rule: String,
    pub detail: String,
    pub severity: FindingSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashBand {
    Danger,
    Warning,
    Ok,
    /// No usable flash point on the sheet
    Unknown,
}

/// A volatile molecule pulling the flash point down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashContributor {
    pub name: String,
    pub registry_id: String,
    pub concentration: String,
    pub flash_point_c: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashSafety {
    pub reported_flash_c: Option<f64>,
    pub band: FlashBand,
    pub message: String,
    pub detail: String,
    /// Highest temperature at which the fragrance may be added to the wax
    pub safe_addition_ceiling_c: Option<f64>,
    pub contributors: Vec<FlashContributor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStats {
    pub count: usize,
    /// Distinct, in first-seen order
    pub clients: Vec<String>,
    pub fragrances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceResult {
    pub validated_matches: Vec<ValidatedFormulationRecord>,
    pub recipe_stats: BTreeMap<String, RecipeStats>,
    pub learned_insights: Vec<LearnedRule>,
    pub insights: Vec<Insight>,
    pub molecule_analysis: Vec<MoleculeFinding>,
    pub flash_safety: FlashSafety,
    pub recommendation: Recommendation,
}

// ============================================================================
// Marker Molecules
// ============================================================================

struct HeavyMarker {
    registry_id: &'static str,
    label: &'static str,
}

/// Dense molecules that call for more 6213 wax
const HEAVY_MARKERS: &[HeavyMarker] = &[
    HeavyMarker {
        registry_id: "1222-05-5",
        label: "Galaxolide (synthetic musk), heavy fragrance",
    },
    HeavyMarker {
        registry_id: "54464-57-2",
        label: "Iso E Super, heavy ambery wood",
    },
    HeavyMarker {
        registry_id: "33704-61-9",
        label: "Cashmeran, heavy woody musk",
    },
    HeavyMarker {
        registry_id: "127-51-5",
        label: "Alpha-isomethyl ionone, long-lasting floral",
    },
];

struct VolatileMarker {
    registry_id: &'static str,
    name: &'static str,
    flash_point_c: f64,
    /// Listed among flash-point contributors
    lowers_flash: bool,
}

const VOLATILE_MARKERS: &[VolatileMarker] = &[
    VolatileMarker {
        registry_id: "78-70-6",
        name: "Linalool",
        flash_point_c: 76.0,
        lowers_flash: true,
    },
    VolatileMarker {
        registry_id: "5989-27-5",
        name: "D-Limonene",
        flash_point_c: 48.0,
        lowers_flash: true,
    },
    VolatileMarker {
        registry_id: "127-91-3",
        name: "Beta-pinene",
        flash_point_c: 47.0,
        lowers_flash: true,
    },
    VolatileMarker {
        registry_id: "80-56-8",
        name: "Alpha-pinene",
        flash_point_c: 33.0,
        lowers_flash: true,
    },
    VolatileMarker {
        registry_id: "98-55-5",
        name: "Alpha-terpineol",
        flash_point_c: 90.0,
        lowers_flash: false,
    },
];

const ASPIRATION_HAZARD: &str = "H304";

fn heavy_marker(registry_id: &str) -> Option<&'static HeavyMarker> {
    HEAVY_MARKERS.iter().find(|m| m.registry_id == registry_id)
}

fn volatile_marker(registry_id: &str) -> Option<&'static VolatileMarker> {
    VOLATILE_MARKERS.iter().find(|m| m.registry_id == registry_id)
}

// ============================================================================
// Cross Reference
// ============================================================================

/// Cross-reference a safety data sheet with the ledger plus dynamic rows and
/// learned-rule payloads supplied by the caller.
pub fn cross_reference(
    ledger: &Ledger,
    sheet: &SafetyDataSheet,
    params: &CrossReferenceParams,
    dynamic_ledger: &[Value],
    dynamic_rules: &[Value],
) -> CrossReferenceResult {
    let formulations = ledger.union_with(dynamic_ledger);
    let learned_insights: Vec<LearnedRule> =
        dynamic_rules.iter().filter_map(decode_learned_rule).collect();

    let query = params
        .fragrance_name
        .as_deref()
        .or(sheet.fragrance_name.as_deref())
        .unwrap_or_default();
    let validated_matches = match_ledger(&formulations, query, sheet.supplier.as_deref());
    let recipe_stats = recipe_stats(&formulations);

    let molecules = analyze_molecules(&sheet.composition);
    let flash_safety = flash_safety(sheet);

    let mut insights = Vec::new();
    if molecules.heavy_total > HEAVY_MARKER_TOTAL_PCT {
        insights.push(Insight {
            rule: "Heavy fragrance (dense molecules > 15%)".to_string(),
            detail: format!(
                "{:.0}% heavy molecules: recipe MFC-C (6213 reinforced at 38%) or MFC-G \
                 (inverted at 49%) for better scent rendering",
                molecules.heavy_total
            ),
            severity: FindingSeverity::Warning,
        });
    }
    if molecules.dominant {
        insights.push(Insight {
            rule: "Dominant molecule detected".to_string(),
            detail: "A molecule above 20% can change how the wax pool behaves. Test \
                     combustion first."
                .to_string(),
            severity: FindingSeverity::Warning,
        });
    }
    if molecules.excluded_carrier {
        insights.push(Insight {
            rule: "DPG detected: excluded".to_string(),
            detail: "Ask the supplier for a reformulation without DPG, on an IPM or ester base."
                .to_string(),
            severity: FindingSeverity::Danger,
        });
    }

    let recommendation = recommend(
        &validated_matches,
        params,
        molecules.excluded_carrier,
        molecules.heavy_total,
    );

    CrossReferenceResult {
        validated_matches,
        recipe_stats,
        learned_insights,
        insights,
        molecule_analysis: molecules.findings,
        flash_safety,
        recommendation,
    }
}

/// Name matches in ledger order; supplier matches only when no name hit
fn match_ledger(
    formulations: &[ValidatedFormulationRecord],
    query: &str,
    supplier: Option<&str>,
) -> Vec<ValidatedFormulationRecord> {
    let mut matches: Vec<ValidatedFormulationRecord> = find_by_name(formulations, query)
        .map(|record| record.matched(MatchKind::Name))
        .collect();
    if !matches.is_empty() {
        return matches;
    }

    let supplier = supplier.unwrap_or_default().trim().to_lowercase();
    if supplier.is_empty() {
        return matches;
    }
    for record in formulations {
        if !record.notes.to_lowercase().contains(&supplier) {
            continue;
        }
        if matches
            .iter()
            .any(|m| m.fragrance_name == record.fragrance_name)
        {
            continue;
        }
        matches.push(record.matched(MatchKind::Supplier));
    }
    matches
}

fn recipe_stats(formulations: &[ValidatedFormulationRecord]) -> BTreeMap<String, RecipeStats> {
    let mut stats: BTreeMap<String, RecipeStats> = BTreeMap::new();
    for record in formulations.iter().filter(|r| !is_sentinel(&r.recipe_code)) {
        let entry = stats.entry(record.recipe_code.clone()).or_default();
        entry.count += 1;
        if !entry.clients.contains(&record.client) {
            entry.clients.push(record.client.clone());
        }
        entry.fragrances.push(record.fragrance_name.clone());
    }
    stats
}

struct MoleculeScan {
    findings: Vec<MoleculeFinding>,
    heavy_total: f64,
    dominant: bool,
    excluded_carrier: bool,
}

fn analyze_molecules(composition: &[SheetComponent]) -> MoleculeScan {
    let mut scan = MoleculeScan {
        findings: Vec::new(),
        heavy_total: 0.0,
        dominant: false,
        excluded_carrier: false,
    };

    for component in composition {
        let range = component.range();
        let avg = range.average();
        let registry_id = component.registry_id.trim();
        let concentration = &component.concentration;
        let mut impacts = Vec::new();

        if range.high > SHEET_DOMINANT_PCT {
            scan.dominant = true;
            impacts.push(MoleculeImpact {
                kind: ImpactKind::Combustion,
                severity: FindingSeverity::Warning,
                message: format!(
                    "High concentration ({concentration}%): can change wax pool viscosity \
                     and combustion"
                ),
            });
        }

        if let Some(marker) = heavy_marker(registry_id) {
            if avg > HEAVY_MARKER_MIN_PCT {
                scan.heavy_total += avg;
                impacts.push(MoleculeImpact {
                    kind: ImpactKind::Diffusion,
                    severity: FindingSeverity::Info,
                    message: format!(
                        "{} at {concentration}%: favour a recipe with reinforced 6213 \
                         (MFC-C/G) for diffusion",
                        marker.label
                    ),
                });
            }
        }

        if let Some(marker) = volatile_marker(registry_id) {
            if avg > VOLATILE_MARKER_MIN_PCT {
                impacts.push(MoleculeImpact {
                    kind: ImpactKind::FlashPoint,
                    severity: if marker.flash_point_c < DANGER_FLASH_C {
                        FindingSeverity::Danger
                    } else {
                        FindingSeverity::Warning
                    },
                    message: format!(
                        "{} (flash {} °C) at {concentration}%: lowers the fragrance's overall \
                         flash point",
                        marker.name, marker.flash_point_c
                    ),
                });
            }
        }

        if registry_id == EXCLUDED_CARRIER_ID {
            scan.excluded_carrier = true;
            impacts.push(MoleculeImpact {
                kind: ImpactKind::Exclusion,
                severity: FindingSeverity::Danger,
                message: "DPG (dipropylene glycol): excluded. Ask for a reformulation on an IPM \
                          or ester base."
                    .to_string(),
            });
        }

        if component
            .hazard_codes
            .iter()
            .any(|code| code.trim().eq_ignore_ascii_case(ASPIRATION_HAZARD))
        {
            impacts.push(MoleculeImpact {
                kind: ImpactKind::Safety,
                severity: FindingSeverity::Info,
                message: "Aspiration hazard (H304): handle with care".to_string(),
            });
        }

        if !impacts.is_empty() {
            scan.findings.push(MoleculeFinding {
                name: component.display_name(),
                registry_id: registry_id.to_string(),
                concentration: concentration.clone(),
                avg_pct: avg,
                impacts,
            });
        }
    }

    scan
}

fn flash_safety(sheet: &SafetyDataSheet) -> FlashSafety {
    let Some(fp) = sheet.flash_point_c else {
        return FlashSafety {
            reported_flash_c: None,
            band: FlashBand::Unknown,
            message: "No usable flash point on the data sheet".to_string(),
            detail: "Check the flash point with the supplier before production.".to_string(),
            safe_addition_ceiling_c: None,
            contributors: Vec::new(),
        };
    };

    let (band, message, detail, ceiling) = if fp < DANGER_FLASH_C {
        let ceiling = safe_addition_ceiling(fp);
        (
            FlashBand::Danger,
            format!("Very low flash point: {fp} °C"),
            format!(
                "Maximum fragrance addition temperature: {ceiling} °C. Add to warm wax, NOT \
                 molten wax."
            ),
            Some(ceiling),
        )
    } else if fp < WARNING_FLASH_C {
        let ceiling = fp - WARNING_ADDITION_MARGIN_C;
        (
            FlashBand::Warning,
            format!("Low flash point: {fp} °C"),
            format!(
                "Maximum fragrance addition temperature: {ceiling} °C. Watch the tank \
                 temperature."
            ),
            Some(ceiling),
        )
    } else {
        (
            FlashBand::Ok,
            format!("Flash point fine: {fp} °C"),
            "Add fragrance following the standard procedure.".to_string(),
            None,
        )
    };

    let contributors = sheet
        .composition
        .iter()
        .filter_map(|component| {
            let marker = volatile_marker(component.registry_id.trim())?;
            let lowers = marker.lowers_flash
                && component.range().high > FLASH_CONTRIBUTOR_MIN_PCT
                && marker.flash_point_c < fp + FLASH_CONTRIBUTOR_MARGIN_C;
            lowers.then(|| FlashContributor {
                name: marker.name.to_string(),
                registry_id: marker.registry_id.to_string(),
                concentration: component.concentration.clone(),
                flash_point_c: marker.flash_point_c,
                message: format!(
                    "{} ({}%): flash {} °C, lowers the overall flash point",
                    marker.name, component.concentration, marker.flash_point_c
                ),
            })
        })
        .collect();

    FlashSafety {
        reported_flash_c: Some(fp),
        band,
        message,
        detail,
        safe_addition_ceiling_c: ceiling,
        contributors,
    }
}

fn recommend(
    matches: &[ValidatedFormulationRecord],
    params: &CrossReferenceParams,
    excluded_carrier: bool,
    heavy_total: f64,
) -> Recommendation {
    if excluded_carrier {
        return Recommendation::new(
            RecommendationKind::Exclusion,
            REFORMULATION,
            Confidence::High,
            "DPG detected: the supplier must reformulate without DPG (IPM or ester base)",
        );
    }

    // only the best-ranked row counts; a recorded failure there is not a match
    let validated = matches
        .first()
        .filter(|m| !is_sentinel(&m.recipe_code))
        .and_then(|m| m.match_kind.filter(|k| *k == MatchKind::Name).map(|k| (m, k)));
    if let Some((best, kind)) = validated {
        return Recommendation::new(
            RecommendationKind::DirectMatch,
            best.recipe_code.clone(),
            kind.confidence(),
            format!(
                "This fragrance was already validated with recipe {} for {}",
                best.recipe_code, best.client
            ),
        )
        .with_load(best.fragrance_load_pct)
        .with_wick(best.wick_reference.clone());
    }

    if params.candle_type == CandleType::Pillar {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_H,
            Confidence::High,
            "Pillar: MFC-H (paraffin 6670/DUB/Vybar), the only validated pillar recipe",
        );
    }

    if params.vegetal || params.candle_type == CandleType::Vegetal {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_I,
            Confidence::High,
            "Vegetal: MFC-I (soy/Nafol/DUB), the universal base validated with La Bruket and \
             Monrose",
        );
    }

    if heavy_total > HEAVY_MARKER_TOTAL_PCT {
        return Recommendation::new(
            RecommendationKind::Rule,
            MFC_C,
            Confidence::Medium,
            "Heavy fragrance: MFC-C (reinforced) or MFC-G (inverted) for better diffusion",
        );
    }

    Recommendation::new(
        RecommendationKind::Default,
        MFC_A,
        Confidence::Medium,
        "Recipe MFC-A recommended (validated on 90+ formulations, every fragrance type)",
    )
    .with_load(params.fragrance_load_pct.unwrap_or(DEFAULT_FRAGRANCE_LOAD_PCT))
}

// ============================================================================
// Tests
// ============================================================================
