//! The final recipe call shared by the ledger matcher and the synthesizer.

use crate::recipes::describe;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Which branch of a cascade produced the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Exclusion,
    DirectMatch,
    Rule,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
    /// A recipe code, or `REFORMULATION`
    pub recipe_code: String,
    /// Catalogue description of the recipe, when the code is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_description: Option<String>,
    pub confidence: Confidence,
    /// One line per cascade branch taken
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rationale: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragrance_load_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wick_reference: Option<String>,
}

impl Recommendation {
    pub fn new(
        kind: RecommendationKind,
        recipe_code: impl Into<String>,
        confidence: Confidence,
        message: impl Into<String>,
    ) -> Self {
        let recipe_code = recipe_code.into();
        Self {
            kind,
            message: message.into(),
            recipe_description: describe(&recipe_code).map(str::to_string),
            recipe_code,
            confidence,
            rationale: Vec::new(),
            fragrance_load_pct: None,
            wick_reference: None,
        }
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.rationale.push(reason.into());
        self
    }

    pub fn with_load(mut self, pct: f64) -> Self {
        self.fragrance_load_pct = Some(pct);
        self
    }

    pub fn with_wick(mut self, wick: impl Into<String>) -> Self {
        self.wick_reference = Some(wick.into());
        self
    }
}
