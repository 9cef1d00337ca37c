//! Composition input types
//!
//! Fragrance compositions arrive from safety data sheets and from older
//! database exports, so decoding is deliberately forgiving: several
//! historical field names are accepted, numbers may be encoded as strings,
//! and anything that does not parse as a number becomes `0` instead of an
//! error.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

// ============================================================================
// Numeric Parsing
// ============================================================================

fn number_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("number prefix pattern is valid")
    })
}

/// Parse the longest numeric prefix of `text`.
///
/// `"12.5 %"` gives `12.5`, `"5,5"` gives `5`, `"<1"` gives `None`.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    number_prefix()
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// A concentration range as written on a data sheet (`"5-10"`, `"10"`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationRange {
    pub low: f64,
    pub high: f64,
}

impl ConcentrationRange {
    /// Split on `-`: the first piece is the low bound, the last piece the
    /// high bound. An unparseable or zero low bound is `0`; an unparseable
    /// or zero high bound falls back to the low bound.
    pub fn parse(text: &str) -> Self {
        let first = text.split('-').next().unwrap_or_default();
        let last = text.rsplit('-').next().unwrap_or_default();

        let low = parse_leading_number(first)
            .filter(|v| *v != 0.0)
            .unwrap_or(0.0);
        let high = parse_leading_number(last)
            .filter(|v| *v != 0.0)
            .unwrap_or(low);

        Self { low, high }
    }

    pub fn average(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

// ============================================================================
// Composition Entries
// ============================================================================

/// One ingredient of a fragrance, reported as a concentration range in
/// percent by mass. Duplicated registry ids are independent entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCompositionEntry")]
pub struct CompositionEntry {
    pub registry_id: String,
    pub name: String,
    pub concentration_min: f64,
    pub concentration_max: f64,
    pub hazard_codes: Vec<String>,
}

impl CompositionEntry {
    pub fn new(
        registry_id: impl Into<String>,
        name: impl Into<String>,
        concentration_min: f64,
        concentration_max: f64,
    ) -> Self {
        Self {
            registry_id: registry_id.into(),
            name: name.into(),
            concentration_min,
            concentration_max,
            hazard_codes: Vec::new(),
        }
    }

    pub fn with_hazard_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hazard_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Working value used by every computation
    pub fn average(&self) -> f64 {
        (self.concentration_min + self.concentration_max) / 2.0
    }

    /// Upper bound, or the lower bound when no upper bound was reported
    pub fn peak(&self) -> f64 {
        if self.concentration_max != 0.0 {
            self.concentration_max
        } else {
            self.concentration_min
        }
    }

    pub fn has_hazard_code(&self, code: &str) -> bool {
        self.hazard_codes.iter().any(|c| c.eq_ignore_ascii_case(code))
    }
}

/// Wire shape accepted for [`CompositionEntry`]
#[derive(Debug, Deserialize)]
struct RawCompositionEntry {
    #[serde(default, alias = "cas_number", alias = "cas")]
    registry_id: Option<String>,
    #[serde(default, alias = "nom", alias = "nom_chimique")]
    name: Option<String>,
    #[serde(
        default,
        alias = "percentage_min",
        alias = "pourcentage_min",
        deserialize_with = "lenient_number"
    )]
    concentration_min: Option<f64>,
    #[serde(
        default,
        alias = "percentage_max",
        alias = "pourcentage_max",
        deserialize_with = "lenient_number"
    )]
    concentration_max: Option<f64>,
    #[serde(default, alias = "h_codes", deserialize_with = "lenient_codes")]
    hazard_codes: Vec<String>,
}

impl From<RawCompositionEntry> for CompositionEntry {
    fn from(raw: RawCompositionEntry) -> Self {
        let concentration_min = raw.concentration_min.unwrap_or(0.0);
        let concentration_max = raw
            .concentration_max
            .filter(|v| *v != 0.0)
            .unwrap_or(concentration_min);

        Self {
            registry_id: raw.registry_id.unwrap_or_default().trim().to_string(),
            name: raw.name.unwrap_or_default(),
            concentration_min,
            concentration_max,
            hazard_codes: raw.hazard_codes,
        }
    }
}

/// Serde helper: numbers, numeric strings and garbage (`None`) all decode
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(&s),
        _ => None,
    }))
}

/// Serde helper: hazard codes as a list or as one delimited string
pub fn lenient_codes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let codes = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Ok(codes)
}

// ============================================================================
// Tests
// ============================================================================
