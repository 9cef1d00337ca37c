//! Formulation ledger: validated production formulations and learned rules
//!
//! ```text
//! bundled ledger.json ──► curated rows ─┐
//!                                       ├─► union (dedup on name + recipe,
//! dynamic JSON rows ──► decode ─────────┘    first occurrence wins)
//!
//! dynamic rule payloads ──► decode ──► LearnedRule (undecodable: dropped)
//! ```
//!
//! Dynamic rows come from whatever database the lab keeps next to the ledger
//! and use either the historical French column names or the newer English
//! ones, so decoding works on loose [`serde_json::Value`]s.

use crate::error::LedgerError;
use crate::recommendation::Confidence;
use crate::thresholds::{
    DEFAULT_FRAGRANCE_LOAD_PCT, DYNAMIC_DEFAULT_CLIENT, DYNAMIC_DEFAULT_MASS_G,
    DYNAMIC_DEFAULT_NOTES,
};
use candela_chem::parse_leading_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_LEDGER: &str = include_str!("../data/ledger.json");

/// Placeholder for a dynamic row field that is missing
const UNKNOWN_FIELD: &str = "?";

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Shipped with the ledger asset
    #[default]
    Curated,
    /// Supplied by the caller at run time
    Dynamic,
}

/// How a ledger row was matched to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Name,
    Supplier,
}

impl MatchKind {
    pub fn confidence(self) -> Confidence {
        match self {
            MatchKind::Name => Confidence::High,
            MatchKind::Supplier => Confidence::Low,
        }
    }
}

/// One formulation validated (or failed) in production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedFormulationRecord {
    pub fragrance_name: String,
    pub client: String,
    /// Recipe code, or one of the `ECHEC` / `SPECIAL` markers
    pub recipe_code: String,
    pub fragrance_load_pct: f64,
    pub wick_reference: String,
    pub container: String,
    pub total_mass_g: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
}

impl ValidatedFormulationRecord {
    fn dedup_key(&self) -> (String, String) {
        (self.fragrance_name.to_lowercase(), self.recipe_code.clone())
    }

    pub fn matched(&self, kind: MatchKind) -> Self {
        Self {
            match_kind: Some(kind),
            ..self.clone()
        }
    }
}

/// A hand-authored lesson recorded alongside the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedRule {
    pub condition: String,
    pub effect: String,
    pub recommendation: String,
    pub source: String,
}

/// A rule produced by the lab's self-learning process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedRule {
    pub rule_type: Option<String>,
    pub confidence: Option<String>,
    pub condition: Value,
    pub recommendation: Value,
    pub source: String,
}

pub const LEARNED_RULE_SOURCE: &str = "self-learning";

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug, Deserialize)]
struct LedgerAsset {
    formulations: Vec<ValidatedFormulationRecord>,
    #[serde(default)]
    rules: Vec<CuratedRule>,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    formulations: Vec<ValidatedFormulationRecord>,
    curated_rules: Vec<CuratedRule>,
}

impl Ledger {
    pub fn new(
        formulations: Vec<ValidatedFormulationRecord>,
        curated_rules: Vec<CuratedRule>,
    ) -> Self {
        Self {
            formulations: union_ledger(&formulations, Vec::new()),
            curated_rules,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LedgerError> {
        let asset: LedgerAsset = serde_json::from_str(json)?;
        Ok(Self::new(asset.formulations, asset.rules))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let ledger = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            formulations = ledger.formulations.len(),
            "loaded formulation ledger"
        );
        Ok(ledger)
    }

    /// The ledger shipped with this crate
    pub fn bundled() -> Result<Self, LedgerError> {
        Self::from_json_str(BUNDLED_LEDGER)
    }

    pub fn formulations(&self) -> &[ValidatedFormulationRecord] {
        &self.formulations
    }

    pub fn curated_rules(&self) -> &[CuratedRule] {
        &self.curated_rules
    }

    /// This ledger's rows followed by decoded dynamic rows, deduplicated
    pub fn union_with(&self, dynamic_rows: &[Value]) -> Vec<ValidatedFormulationRecord> {
        union_ledger(
            &self.formulations,
            dynamic_rows.iter().filter_map(decode_dynamic_row),
        )
    }

    /// Fold dynamic rows into the ledger for every later query
    pub fn extend_dynamic(&mut self, dynamic_rows: &[Value]) {
        self.formulations = self.union_with(dynamic_rows);
    }
}

// ============================================================================
// Union & Matching
// ============================================================================

/// Concatenate and deduplicate on (lowercased name, recipe code).
///
/// The first occurrence wins, so curated rows shadow dynamic ones.
pub fn union_ledger<I>(
    curated: &[ValidatedFormulationRecord],
    dynamic: I,
) -> Vec<ValidatedFormulationRecord>
where
    I: IntoIterator<Item = ValidatedFormulationRecord>,
{
    let mut seen = HashSet::new();
    curated
        .iter()
        .cloned()
        .chain(dynamic)
        .filter(|record| seen.insert(record.dedup_key()))
        .collect()
}

/// Case-insensitive containment in either direction. Empty names match nothing.
pub fn name_matches(query: &str, candidate: &str) -> bool {
    let query = query.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    candidate.contains(&query) || query.contains(&candidate)
}

/// Every record whose name matches, in ledger order
pub fn find_by_name<'a>(
    records: &'a [ValidatedFormulationRecord],
    name: &str,
) -> impl Iterator<Item = &'a ValidatedFormulationRecord> + 'a {
    let name = name.to_string();
    records
        .iter()
        .filter(move |record| name_matches(&name, &record.fragrance_name))
}

// ============================================================================
// Dynamic Decoding
// ============================================================================

fn text_field(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Zero counts as missing
fn number_field(row: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = match row.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_leading_number(s),
            _ => None,
        };
        value.filter(|v| *v != 0.0)
    })
}

/// Decode a loosely-typed ledger row. Rows that are not objects, or carry no
/// fragrance name, are dropped.
pub fn decode_dynamic_row(row: &Value) -> Option<ValidatedFormulationRecord> {
    let Some(obj) = row.as_object() else {
        tracing::warn!(row = %row, "dropping dynamic ledger row: not an object");
        return None;
    };
    let Some(fragrance_name) = text_field(obj, &["parfum", "fragrance_name"]) else {
        tracing::warn!(row = %row, "dropping dynamic ledger row: no fragrance name");
        return None;
    };

    Some(ValidatedFormulationRecord {
        fragrance_name,
        client: text_field(obj, &["client", "client_name"])
            .unwrap_or_else(|| DYNAMIC_DEFAULT_CLIENT.to_string()),
        recipe_code: text_field(obj, &["recette", "recipe_code"])
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        fragrance_load_pct: number_field(obj, &["pct_parfum", "fragrance_percentage"])
            .unwrap_or(DEFAULT_FRAGRANCE_LOAD_PCT),
        wick_reference: text_field(obj, &["meche", "wick_reference"])
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        container: text_field(obj, &["contenant", "container_type"])
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        total_mass_g: number_field(obj, &["masse", "total_mass"]).unwrap_or(DYNAMIC_DEFAULT_MASS_G),
        notes: text_field(obj, &["notes"]).unwrap_or_else(|| DYNAMIC_DEFAULT_NOTES.to_string()),
        provenance: Provenance::Dynamic,
        match_kind: None,
    })
}

fn decode_payload(value: Option<&Value>) -> Result<Value, serde_json::Error> {
    match value {
        Some(Value::String(encoded)) => serde_json::from_str(encoded),
        Some(inline) => Ok(inline.clone()),
        None => Ok(Value::Null),
    }
}

/// Decode a learned-rule row whose condition and recommendation are either
/// JSON-encoded strings or inline JSON.
pub fn decode_learned_rule(row: &Value) -> Option<LearnedRule> {
    let Some(obj) = row.as_object() else {
        tracing::debug!(row = %row, "dropping learned rule: not an object");
        return None;
    };

    let decoded = decode_payload(obj.get("condition"))
        .and_then(|condition| Ok((condition, decode_payload(obj.get("recommendation"))?)));
    let (condition, recommendation) = match decoded {
        Ok(pair) => pair,
        Err(err) => {
            tracing::debug!(error = %err, "dropping learned rule: undecodable payload");
            return None;
        }
    };

    Some(LearnedRule {
        rule_type: text_field(obj, &["rule_type"]),
        confidence: text_field(obj, &["confidence"]),
        condition,
        recommendation,
        source: LEARNED_RULE_SOURCE.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::{is_sentinel, FAILURE, MFC_A, MFC_H, MFC_I};
    use serde_json::json;

    #[test]
    fn test_bundled_ledger() {
        let ledger = Ledger::bundled().unwrap();
        assert_eq!(ledger.formulations().len(), 55);
        assert_eq!(ledger.curated_rules().len(), 14);
        assert!(ledger
            .formulations()
            .iter()
            .all(|r| r.provenance == Provenance::Curated && r.match_kind.is_none()));
        assert_eq!(
            ledger
                .formulations()
                .iter()
                .filter(|r| r.recipe_code == FAILURE)
                .count(),
            3
        );
        assert!(ledger.formulations().iter().any(|r| r.recipe_code == MFC_H));
        assert!(ledger.formulations().iter().any(|r| r.recipe_code == MFC_I));
    }

    #[test]
    fn test_name_matching_is_bidirectional() {
        assert!(name_matches("dita", "Dita"));
        assert!(name_matches("Dita Eau Forte", "Dita"));
        assert!(name_matches("ambre", "Ambre Délice"));
        assert!(!name_matches("", "Dita"));
        assert!(!name_matches("Dita", "  "));
        assert!(!name_matches("Vetiver", "Dita"));
    }

    #[test]
    fn test_find_by_name_keeps_ledger_order() {
        let ledger = Ledger::bundled().unwrap();
        let hits: Vec<_> = find_by_name(ledger.formulations(), "ambre délice").collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].recipe_code, MFC_A);
        assert_eq!(hits[1].recipe_code, FAILURE);
        assert!(!is_sentinel(&hits[0].recipe_code));
    }

    #[test]
    fn test_decode_dynamic_row_aliases_and_defaults() {
        let french = decode_dynamic_row(&json!({
            "parfum": "Figue Noire",
            "recette": "MFC-C",
            "pct_parfum": "12",
            "meche": "LX22",
        }))
        .unwrap();
        assert_eq!(french.fragrance_name, "Figue Noire");
        assert_eq!(french.client, "DB");
        assert_eq!(french.recipe_code, "MFC-C");
        assert_eq!(french.fragrance_load_pct, 12.0);
        assert_eq!(french.container, "?");
        assert_eq!(french.total_mass_g, 200.0);
        assert_eq!(french.notes, "imported from database");
        assert_eq!(french.provenance, Provenance::Dynamic);

        let english = decode_dynamic_row(&json!({
            "fragrance_name": "Oud Royal",
            "client_name": "Maison X",
            "recipe_code": "MFC-G",
            "fragrance_percentage": 0,
            "container_type": "Stockholm 27",
            "total_mass": 180,
            "notes": "",
        }))
        .unwrap();
        assert_eq!(english.client, "Maison X");
        assert_eq!(english.fragrance_load_pct, 10.0);
        assert_eq!(english.total_mass_g, 180.0);
        assert_eq!(english.notes, "imported from database");
    }

    #[test]
    fn test_decode_dynamic_row_drops_nameless_and_non_objects() {
        assert!(decode_dynamic_row(&json!({"recette": "MFC-A"})).is_none());
        assert!(decode_dynamic_row(&json!({"parfum": "   "})).is_none());
        assert!(decode_dynamic_row(&json!("Dita")).is_none());
        assert!(decode_dynamic_row(&json!(null)).is_none());
    }

    #[test]
    fn test_union_dedups_and_curated_wins() {
        let ledger = Ledger::bundled().unwrap();
        let union = ledger.union_with(&[
            json!({"parfum": "DITA", "recette": "MFC-C", "client": "Shadow"}),
            json!({"parfum": "Dita", "recette": "MFC-G"}),
            json!({"parfum": "Dita", "recette": "MFC-G", "client": "Later"}),
        ]);
        assert_eq!(union.len(), 56);

        let dita: Vec<_> = union.iter().filter(|r| r.fragrance_name.eq_ignore_ascii_case("dita")).collect();
        assert_eq!(dita.len(), 2);
        assert_eq!(dita[0].client, "MFC");
        assert_eq!(dita[0].provenance, Provenance::Curated);
        assert_eq!(dita[1].recipe_code, "MFC-G");
        assert_eq!(dita[1].client, "DB");
    }

    #[test]
    fn test_extend_dynamic_persists() {
        let mut ledger = Ledger::bundled().unwrap();
        ledger.extend_dynamic(&[json!({"parfum": "Figue Noire", "recette": "MFC-C"})]);
        assert_eq!(ledger.formulations().len(), 56);
        assert_eq!(find_by_name(ledger.formulations(), "figue").count(), 1);
    }

    #[test]
    fn test_decode_learned_rule_string_and_inline() {
        let encoded = decode_learned_rule(&json!({
            "rule_type": "wick",
            "confidence": 0.8,
            "condition": "{\"diameter_min\": 80}",
            "recommendation": "{\"wick\": \"LX22\"}",
        }))
        .unwrap();
        assert_eq!(encoded.rule_type.as_deref(), Some("wick"));
        assert_eq!(encoded.confidence.as_deref(), Some("0.8"));
        assert_eq!(encoded.condition, json!({"diameter_min": 80}));
        assert_eq!(encoded.recommendation, json!({"wick": "LX22"}));
        assert_eq!(encoded.source, LEARNED_RULE_SOURCE);

        let inline = decode_learned_rule(&json!({
            "rule_type": "recipe",
            "condition": {"heavy": true},
            "recommendation": {"recipe": "MFC-C"},
        }))
        .unwrap();
        assert_eq!(inline.condition, json!({"heavy": true}));
        assert!(inline.confidence.is_none());
    }

    #[test]
    fn test_decode_learned_rule_drops_garbage() {
        assert!(decode_learned_rule(&json!({"condition": "{not json"})).is_none());
        assert!(decode_learned_rule(&json!({"condition": "{}", "recommendation": "]"})).is_none());
        assert!(decode_learned_rule(&json!(42)).is_none());
    }

    #[test]
    fn test_supplier_confidence_is_low() {
        assert_eq!(MatchKind::Name.confidence(), Confidence::High);
        assert_eq!(MatchKind::Supplier.confidence(), Confidence::Low);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(
            &path,
            r#"{"formulations":[{"fragrance_name":"Test","client":"Lab","recipe_code":"MFC-A",
                "fragrance_load_pct":10,"wick_reference":"LX20","container":"Jar",
                "total_mass_g":200}]}"#,
        )
        .unwrap();
        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.formulations().len(), 1);
        assert!(ledger.curated_rules().is_empty());
        assert!(matches!(
            Ledger::load(dir.path().join("missing.json")),
            Err(LedgerError::Io(_))
        ));
    }
}
