//! Candela Formulation Engine
//!
//! Predicts a wax-blend recipe, wick size and processing precautions for a
//! fragrance from its chemical composition.
//!
//! ```text
//!  composition ──► profile ──► correlation rules ──► synthesis ──► recipe + wick
//!                    │                                               + summary
//!                    │
//!  safety data ──────┼──► crossref ◄── ledger (curated + dynamic rows)
//!  sheet             │       └──► validated matches, flash safety, recipe
//!                    │
//!  FragranceStore ───┴──► batch ──► per-recipe means, failure contrast
//! ```
//!
//! ## Modules
//!
//! - [`profile`]: composition → [`MolecularProfile`]
//! - [`rules`]: the R01–R10 correlation rules and [`RuleEngine`]
//! - [`ledger`]: validated formulations, curated and learned rules
//! - [`crossref`]: safety data sheet × ledger cross-reference
//! - [`synthesis`]: profile-only recipe, wick and summary
//! - [`batch`]: correlation across a [`candela_store::FragranceStore`]
//! - [`olfactory`]: odor families, note pyramid, issue diagnosis
//! - [`engine`]: [`FormulationEngine`], the handle most callers want
//!
//! Every computation except asset loading and store access is pure and
//! infallible.

pub mod batch;
pub mod config;
pub mod crossref;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod olfactory;
pub mod profile;
pub mod recipes;
pub mod recommendation;
pub mod rules;
pub mod synthesis;
pub mod thresholds;

pub use batch::{
    batch_cross_analysis, BatchProfile, BatchReport, DiscoveredRule, RecipeCorrelation,
    ValidatedUse,
};
pub use config::EngineConfig;
pub use crossref::{
    cross_reference, CandleType, CrossReferenceParams, CrossReferenceResult, FindingSeverity,
    FlashBand, FlashSafety, Insight, MoleculeFinding, SafetyDataSheet, SheetComponent,
};
pub use engine::FormulationEngine;
pub use error::{ConfigError, EngineError, LedgerError};
pub use ledger::{
    CuratedRule, LearnedRule, Ledger, MatchKind, Provenance, ValidatedFormulationRecord,
};
pub use olfactory::{
    analyze_olfactory_profile, diagnose_olfactory_issue, OlfactoryAnalysis, OlfactoryDiagnosis,
    OlfactoryIssue,
};
pub use profile::{compute_profile, MolecularProfile};
pub use recommendation::{Confidence, Recommendation, RecommendationKind};
pub use rules::{correlation_rules, evaluate_rules, CorrelationRule, RuleEngine, RuleSeverity, TriggeredRule};
pub use synthesis::{analyze_fragrance_profile, AnalysisOptions, FragranceAnalysis, WickPrediction};
