//! Chemical reference table
//!
//! Maps a chemical registry id to the attributes the formulation engine
//! reasons about: flash point, molecular weight, a volatility class and the
//! qualitative combustion/diffusion impact observed in wax.
//!
//! The table is data, not code. A curated sample is bundled with the crate;
//! a larger table can be loaded from any JSON file with the same layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUNDLED_REFERENCE: &str = include_str!("../data/chemical_reference.json");

// ============================================================================
// Attribute Classes
// ============================================================================

/// Volatility class, ordered from least to most volatile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityClass {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Observed effect of a substance on wick combustion, worst first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombustionImpact {
    /// Stops capillary feed entirely
    Blocking,
    /// Unsafe at working temperatures
    Danger,
    Risk,
    /// Slows the burn
    Brake,
    Neutral,
    Positive,
}

impl CombustionImpact {
    /// Contribution per 10 % of concentration to the combustion index
    pub fn weight(self) -> f64 {
        match self {
            CombustionImpact::Blocking => -50.0,
            CombustionImpact::Danger => -30.0,
            CombustionImpact::Risk => -15.0,
            CombustionImpact::Brake => -10.0,
            CombustionImpact::Neutral => 0.0,
            CombustionImpact::Positive => 10.0,
        }
    }
}

/// Observed effect of a substance on hot throw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionImpact {
    Boost,
    Support,
    Moderate,
    Fixative,
    Negative,
    /// Flashes off before it can diffuse
    Flash,
}

impl DiffusionImpact {
    /// Contribution per 10 % of concentration to the diffusion index
    pub fn weight(self) -> f64 {
        match self {
            DiffusionImpact::Boost => 15.0,
            DiffusionImpact::Support => 5.0,
            DiffusionImpact::Moderate => 0.0,
            DiffusionImpact::Fixative => 3.0,
            DiffusionImpact::Negative => -20.0,
            DiffusionImpact::Flash => -5.0,
        }
    }
}

/// Solubility in paraffin/microcrystalline blends, ordered poor to excellent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaxSolubility {
    Poor,
    Partial,
    Limited,
    Medium,
    Good,
    Excellent,
}

/// Position in the olfactory pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotePosition {
    Top,
    Heart,
    Base,
}

/// Odor descriptors, cold (in the jar) and hot (while burning)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdorProfile {
    pub cold: String,
    #[serde(default)]
    pub hot: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub notes: Vec<NotePosition>,
    /// Detection threshold in ppm
    #[serde(default)]
    pub threshold_ppm: Option<f64>,
}

// ============================================================================
// Reference Entries
// ============================================================================

/// One substance of the chemical reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalReferenceEntry {
    pub registry_id: String,
    pub name: String,
    /// Free-form family tag such as `terpene-alcohol` or `musk-polycyclic`
    pub family: String,
    #[serde(default)]
    pub molecular_weight: Option<f64>,
    #[serde(default)]
    pub flash_point_c: Option<f64>,
    pub volatility: VolatilityClass,
    pub combustion: CombustionImpact,
    pub diffusion: DiffusionImpact,
    pub wax_solubility: WaxSolubility,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub odor: Option<OdorProfile>,
}

/// Read-only lookup by registry id
pub trait ChemicalReference: Send + Sync {
    fn get(&self, registry_id: &str) -> Option<&ChemicalReferenceEntry>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid reference JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate registry id in reference table: {0}")]
    DuplicateRegistryId(String),
}

// ============================================================================
// Reference Table
// ============================================================================

/// In-memory reference table keyed by registry id
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: BTreeMap<String, ChemicalReferenceEntry>,
}

impl ReferenceTable {
    /// Build a table, rejecting duplicate registry ids
    pub fn from_entries(
        entries: impl IntoIterator<Item = ChemicalReferenceEntry>,
    ) -> Result<Self, ReferenceError> {
        let mut table = BTreeMap::new();
        for entry in entries {
            let id = entry.registry_id.trim().to_string();
            if table.contains_key(&id) {
                return Err(ReferenceError::DuplicateRegistryId(id));
            }
            table.insert(id, entry);
        }
        Ok(Self { entries: table })
    }

    /// Parse a JSON array of entries
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceError> {
        let entries: Vec<ChemicalReferenceEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load a JSON reference file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&contents)?;
        tracing::debug!(path = %path.display(), entries = table.len(), "loaded chemical reference");
        Ok(table)
    }

    /// The curated sample shipped with the crate
    pub fn bundled() -> Result<Self, ReferenceError> {
        Self::from_json_str(BUNDLED_REFERENCE)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChemicalReferenceEntry> {
        self.entries.values()
    }
}

impl ChemicalReference for ReferenceTable {
    fn get(&self, registry_id: &str) -> Option<&ChemicalReferenceEntry> {
        self.entries.get(registry_id.trim())
    }
}

// ============================================================================
// Tests
// ============================================================================
