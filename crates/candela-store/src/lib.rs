//! Candela Fragrance Store
//!
//! The collaborator the batch analyzer reads from:
//!
//! ```text
//! ┌──────────────────┐  list_fragrances()   ┌──────────────────────┐
//! │ batch analyzer   │─────────────────────►│   FragranceStore     │
//! │ (candela-engine) │  list_components(id) │  ┌────────────────┐  │
//! │                  │─────────────────────►│  │ InMemoryStore  │  │
//! └──────────────────┘                      │  ├────────────────┤  │
//!                                           │  │ JsonFileStore  │  │
//!                                           │  └────────────────┘  │
//!                                           └──────────────────────┘
//! ```
//!
//! Both backends keep their records behind a `parking_lot::RwLock` and
//! return fragrances in insertion order.

pub mod file;
pub mod memory;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use candela_chem::CompositionEntry;
use serde::{Deserialize, Serialize};

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of a stored fragrance
pub type FragranceId = u64;

/// What `list_fragrances` reports for each fragrance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragranceSummary {
    pub id: FragranceId,
    pub name: String,
    /// Supplier's product reference
    #[serde(default)]
    pub reference: Option<String>,
    /// Flash point reported on the safety data sheet, in °C
    #[serde(default)]
    pub flash_point: Option<f64>,
    #[serde(default)]
    pub supplier: Option<String>,
}

/// A stored fragrance with its composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragranceRecord {
    #[serde(flatten)]
    pub summary: FragranceSummary,
    #[serde(default)]
    pub components: Vec<CompositionEntry>,
}

impl FragranceRecord {
    pub fn new(id: FragranceId, name: impl Into<String>) -> Self {
        Self {
            summary: FragranceSummary {
                id,
                name: name.into(),
                reference: None,
                flash_point: None,
                supplier: None,
            },
            components: Vec::new(),
        }
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.summary.supplier = Some(supplier.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.summary.reference = Some(reference.into());
        self
    }

    pub fn with_flash_point(mut self, flash_point: f64) -> Self {
        self.summary.flash_point = Some(flash_point);
        self
    }

    pub fn with_components(mut self, components: Vec<CompositionEntry>) -> Self {
        self.components = components;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid store JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown fragrance: {0}")]
    UnknownFragrance(FragranceId),
    #[error("Store backend error: {0}")]
    Backend(String),
}

// ============================================================================
// Store Interface
// ============================================================================

/// Read access to stored fragrances and their compositions
#[async_trait]
pub trait FragranceStore: Send + Sync {
    /// All fragrances, in store order
    async fn list_fragrances(&self) -> Result<Vec<FragranceSummary>, StoreError>;

    /// Composition of one fragrance
    async fn list_components(
        &self,
        fragrance_id: FragranceId,
    ) -> Result<Vec<CompositionEntry>, StoreError>;
}

/// Replace the record with the same id, or append a new one
pub(crate) fn upsert(records: &mut Vec<FragranceRecord>, record: FragranceRecord) {
    match records
        .iter_mut()
        .find(|r| r.summary.id == record.summary.id)
    {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

pub(crate) fn components_of(
    records: &[FragranceRecord],
    fragrance_id: FragranceId,
) -> Result<Vec<CompositionEntry>, StoreError> {
    records
        .iter()
        .find(|r| r.summary.id == fragrance_id)
        .map(|r| r.components.clone())
        .ok_or(StoreError::UnknownFragrance(fragrance_id))
}
