//! In-memory fragrance store

use crate::{
    components_of, upsert, FragranceId, FragranceRecord, FragranceStore, FragranceSummary,
    StoreError,
};
use async_trait::async_trait;
use candela_chem::CompositionEntry;
use parking_lot::RwLock;
use std::sync::Arc;

/// Fragrance store held entirely in memory. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<FragranceRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<FragranceRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace a fragrance
    pub fn insert(&self, record: FragranceRecord) {
        upsert(&mut self.records.write(), record);
    }

    pub fn remove(&self, fragrance_id: FragranceId) -> Option<FragranceRecord> {
        let mut records = self.records.write();
        let index = records.iter().position(|r| r.summary.id == fragrance_id)?;
        Some(records.remove(index))
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl FragranceStore for InMemoryStore {
    async fn list_fragrances(&self) -> Result<Vec<FragranceSummary>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|r| r.summary.clone())
            .collect())
    }

    async fn list_components(
        &self,
        fragrance_id: FragranceId,
    ) -> Result<Vec<CompositionEntry>, StoreError> {
        components_of(&self.records.read(), fragrance_id)
    }
}
