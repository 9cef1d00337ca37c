//! Errors at the engine's asset and configuration boundaries.
//!
//! Pipeline computation itself never fails; only loading data assets and
//! configuration can.

use candela_chem::ReferenceError;

/// Failure loading a formulation ledger asset
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("chemical reference: {0}")]
    Reference(#[from] ReferenceError),

    #[error("formulation ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}
