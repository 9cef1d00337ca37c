//! Candela Chemistry Layer
//!
//! The leaf of the formulation pipeline:
//!
//! ```text
//! ┌──────────────────────┐      ┌───────────────────────┐
//! │  Composition entries │      │  Chemical reference   │
//! │  (registry id, range)│      │  (registry id → attrs)│
//! └──────────┬───────────┘      └───────────┬───────────┘
//!            │                              │
//!            └──────────────┬───────────────┘
//!                           ▼
//!                  candela-engine profile
//! ```
//!
//! - [`reference`]: the read-only [`ChemicalReference`] seam and a JSON-backed
//!   [`ReferenceTable`] (a curated sample ships with the crate).
//! - [`composition`]: the tolerant [`CompositionEntry`] input type and the
//!   concentration-range parser used for safety-data-sheet text.

pub mod composition;
pub mod reference;

pub use composition::{parse_leading_number, CompositionEntry, ConcentrationRange};
pub use reference::{
    ChemicalReference, ChemicalReferenceEntry, CombustionImpact, DiffusionImpact, NotePosition,
    OdorProfile, ReferenceError, ReferenceTable, VolatilityClass, WaxSolubility,
};

/// Registry id of dipropylene glycol, the carrier solvent the lab refuses.
pub const EXCLUDED_CARRIER_ID: &str = "34590-94-8";
