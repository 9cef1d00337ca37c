//! `FormulationEngine`: one handle over reference, rules and ledger

use crate::batch::{batch_cross_analysis, BatchReport};
use crate::config::EngineConfig;
use crate::crossref::{cross_reference, CrossReferenceParams, CrossReferenceResult, SafetyDataSheet};
use crate::error::EngineError;
use crate::ledger::{CuratedRule, Ledger};
use crate::olfactory::{
    analyze_olfactory_profile, diagnose_olfactory_issue, OlfactoryAnalysis, OlfactoryDiagnosis,
    OlfactoryIssue,
};
use crate::profile::{compute_profile, MolecularProfile};
use crate::rules::{RuleEngine, TriggeredRule};
use crate::synthesis::{analyze_with_rules, AnalysisOptions, FragranceAnalysis};
use candela_chem::{CompositionEntry, ReferenceTable};
use candela_store::{FragranceStore, StoreError};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FormulationEngine {
    reference: ReferenceTable,
    rules: RuleEngine,
    ledger: Ledger,
    config: EngineConfig,
}

impl FormulationEngine {
    /// Load the assets named in `config`, falling back to the bundled ones
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let reference = match &config.reference_path {
            Some(path) => ReferenceTable::load(path)?,
            None => ReferenceTable::bundled()?,
        };
        let ledger = match &config.ledger_path {
            Some(path) => Ledger::load(path)?,
            None => Ledger::bundled()?,
        };
        tracing::debug!(
            reference_entries = reference.len(),
            formulations = ledger.formulations().len(),
            "formulation engine ready"
        );
        Ok(Self::from_parts(reference, ledger, config))
    }

    pub fn bundled() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    pub fn from_env() -> Result<Self, EngineError> {
        Self::new(EngineConfig::from_env()?)
    }

    pub fn from_parts(reference: ReferenceTable, ledger: Ledger, config: EngineConfig) -> Self {
        Self {
            reference,
            rules: RuleEngine::default(),
            ledger,
            config,
        }
    }

    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Fold loosely-typed ledger rows into the engine's ledger
    pub fn with_dynamic_formulations(mut self, rows: &[Value]) -> Self {
        self.ledger.extend_dynamic(rows);
        self
    }

    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn curated_rules(&self) -> &[CuratedRule] {
        self.ledger.curated_rules()
    }

    pub fn compute_profile(&self, entries: &[CompositionEntry]) -> MolecularProfile {
        compute_profile(&self.reference, entries)
    }

    pub fn evaluate_rules(&self, profile: &MolecularProfile) -> Vec<TriggeredRule> {
        self.rules.evaluate(profile)
    }

    pub fn analyze(&self, entries: &[CompositionEntry], options: &AnalysisOptions) -> FragranceAnalysis {
        analyze_with_rules(&self.reference, &self.rules, entries, options)
    }

    pub fn cross_reference(
        &self,
        sheet: &SafetyDataSheet,
        params: &CrossReferenceParams,
        dynamic_ledger: &[Value],
        dynamic_rules: &[Value],
    ) -> CrossReferenceResult {
        cross_reference(&self.ledger, sheet, params, dynamic_ledger, dynamic_rules)
    }

    pub async fn batch_cross_analysis<S>(&self, store: &S) -> Result<BatchReport, StoreError>
    where
        S: FragranceStore + ?Sized,
    {
        batch_cross_analysis(
            store,
            &self.reference,
            &self.rules,
            self.ledger.formulations(),
            self.config.parallel_batch,
        )
        .await
    }

    pub fn analyze_olfactory(&self, entries: &[CompositionEntry]) -> OlfactoryAnalysis {
        analyze_olfactory_profile(&self.reference, entries)
    }

    pub fn diagnose_olfactory_issue(
        &self,
        entries: &[CompositionEntry],
        issue: OlfactoryIssue,
    ) -> OlfactoryDiagnosis {
        diagnose_olfactory_issue(&self.reference, entries, issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::REFORMULATION;
    use serde_json::json;

    #[test]
    fn test_bundled_engine() {
        let engine = FormulationEngine::bundled().unwrap();
        assert!(!engine.reference().is_empty());
        assert_eq!(engine.ledger().formulations().len(), 55);
        assert_eq!(engine.curated_rules().len(), 14);
        assert!(engine.config().parallel_batch);
        assert_eq!(engine.rules().rules().len(), 10);
    }

    #[test]
    fn test_missing_asset_path_fails() {
        let config = EngineConfig {
            ledger_path: Some("/nonexistent/candela/ledger.json".into()),
            ..EngineConfig::default()
        };
        assert!(matches!(FormulationEngine::new(config), Err(EngineError::Ledger(_))));
    }

    #[test]
    fn test_custom_reference_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        std::fs::write(&path, "[]").unwrap();
        let engine = FormulationEngine::new(EngineConfig {
            reference_path: Some(path),
            ..EngineConfig::default()
        })
        .unwrap();
        assert!(engine.reference().is_empty());
        let profile = engine.compute_profile(&[CompositionEntry::new("78-70-6", "Linalool", 5.0, 5.0)]);
        assert_eq!(profile.nb_unknown, 1);
    }

    #[test]
    fn test_dynamic_formulations_reach_cross_reference() {
        let engine = FormulationEngine::bundled()
            .unwrap()
            .with_dynamic_formulations(&[json!({"parfum": "Figue Noire", "recette": "MFC-G"})]);
        let sheet = SafetyDataSheet {
            fragrance_name: Some("Figue Noire".to_string()),
            ..SafetyDataSheet::default()
        };
        let result = engine.cross_reference(&sheet, &CrossReferenceParams::default(), &[], &[]);
        assert_eq!(result.recommendation.recipe_code, "MFC-G");
    }

    #[test]
    fn test_custom_rules_used_by_analyze() {
        let engine = FormulationEngine::bundled()
            .unwrap()
            .with_rules(RuleEngine::new(Vec::new()));
        let analysis = engine.analyze(
            &[CompositionEntry::new("34590-94-8", "DPG", 10.0, 20.0)],
            &AnalysisOptions::default(),
        );
        assert!(analysis.triggered_rules.is_empty());
        assert_eq!(analysis.prediction.recipe_code, REFORMULATION);
    }
}
