//! Engine configuration
//!
//! Both data assets ship with the crates; a deployment may point at its own
//! reference table or ledger instead.
//!
//! | Variable                 | Field            | Default       |
//! |--------------------------|------------------|---------------|
//! | `CANDELA_REFERENCE_PATH` | `reference_path` | bundled asset |
//! | `CANDELA_LEDGER_PATH`    | `ledger_path`    | bundled asset |
//! | `CANDELA_PARALLEL_BATCH` | `parallel_batch` | `true`        |

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const REFERENCE_PATH_VAR: &str = "CANDELA_REFERENCE_PATH";
pub const LEDGER_PATH_VAR: &str = "CANDELA_LEDGER_PATH";
pub const PARALLEL_BATCH_VAR: &str = "CANDELA_PARALLEL_BATCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chemical reference JSON; `None` uses the bundled table
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
    /// Formulation ledger JSON; `None` uses the bundled ledger
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    /// Fan batch analysis out on the rayon pool
    #[serde(default = "default_parallel_batch")]
    pub parallel_batch: bool,
}

fn default_parallel_batch() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_path: None,
            ledger_path: None,
            parallel_batch: default_parallel_batch(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let parallel_batch = match var(PARALLEL_BATCH_VAR) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::Invalid(format!("{PARALLEL_BATCH_VAR} must be a boolean, got {raw:?}"))
            })?,
            None => default_parallel_batch(),
        };

        Ok(Self {
            reference_path: var(REFERENCE_PATH_VAR).map(PathBuf::from),
            ledger_path: var(LEDGER_PATH_VAR).map(PathBuf::from),
            parallel_batch,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.parallel_batch);
    }

    #[test]
    fn test_paths_and_switch() {
        let config = EngineConfig::from_lookup(lookup(&[
            (REFERENCE_PATH_VAR, "/srv/candela/reference.json"),
            (LEDGER_PATH_VAR, "/srv/candela/ledger.json"),
            (PARALLEL_BATCH_VAR, "off"),
        ]))
        .unwrap();
        assert_eq!(
            config.reference_path.as_deref(),
            Some(Path::new("/srv/candela/reference.json"))
        );
        assert_eq!(config.ledger_path.as_deref(), Some(Path::new("/srv/candela/ledger.json")));
        assert!(!config.parallel_batch);
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = EngineConfig::from_lookup(lookup(&[(REFERENCE_PATH_VAR, "  ")])).unwrap();
        assert!(config.reference_path.is_none());
    }

    #[test]
    fn test_invalid_switch_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(PARALLEL_BATCH_VAR, "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candela.json");
        std::fs::write(&path, r#"{"ledger_path":"ledger.json"}"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.ledger_path.as_deref(), Some(Path::new("ledger.json")));
        assert!(config.parallel_batch);
        assert!(config.reference_path.is_none());
    }
}
