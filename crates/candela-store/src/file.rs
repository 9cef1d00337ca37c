//! JSON-file-backed fragrance store
//!
//! File layout:
//!
//! ```json
//! { "fragrances": [ { "id": 1, "name": "...", "components": [ ... ] } ] }
//! ```

use crate::{
    components_of, upsert, FragranceId, FragranceRecord, FragranceStore, FragranceSummary,
    StoreError,
};
use async_trait::async_trait;
use candela_chem::CompositionEntry;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    fragrances: Vec<FragranceRecord>,
}

/// Fragrance store persisted as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Arc<RwLock<Vec<FragranceRecord>>>,
}

impl JsonFileStore {
    /// Open a store file. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = Self::read_records(&path).await?;
        tracing::debug!(path = %path.display(), fragrances = records.len(), "opened fragrance store");
        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    async fn read_records(path: &Path) -> Result<Vec<FragranceRecord>, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(Vec::new());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        let file: StoreFile = serde_json::from_str(&contents)?;
        Ok(file.fragrances)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a fragrance in memory; call [`save`](Self::save) to persist
    pub fn insert(&self, record: FragranceRecord) {
        upsert(&mut self.records.write(), record);
    }

    /// Write all records back to the file
    pub async fn save(&self) -> Result<(), StoreError> {
        let file = StoreFile {
            fragrances: self.records.read().clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Discard in-memory changes and re-read the file
    pub async fn reload(&self) -> Result<(), StoreError> {
        let records = Self::read_records(&self.path).await?;
        *self.records.write() = records;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl FragranceStore for JsonFileStore {
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
