//! Batch Correlation Demo
//!
//! Demonstrates the full pipeline:
//! 1. A small fragrance store
//! 2. Single-fragrance analysis and data sheet cross-reference
//! 3. Batch correlation against the ledger
//!
//! Run with: RUST_LOG=candela_engine=debug cargo run --example batch_demo

use anyhow::Result;
use candela_chem::CompositionEntry;
use candela_engine::{
    AnalysisOptions, CrossReferenceParams, FormulationEngine, OlfactoryIssue, SafetyDataSheet,
    SheetComponent,
};
use candela_store::{FragranceRecord, InMemoryStore};
use tracing_subscriber::EnvFilter;

fn sample_store() -> InMemoryStore {
    let musky = vec![
        CompositionEntry::new("1222-05-5", "Galaxolide", 10.0, 20.0),
        CompositionEntry::new("21145-77-7", "Tonalide", 5.0, 10.0),
        CompositionEntry::new("78-70-6", "Linalool", 1.0, 5.0),
    ];
    let citrus = vec![
        CompositionEntry::new("5989-27-5", "d-Limonene", 20.0, 30.0),
        CompositionEntry::new("78-70-6", "Linalool", 5.0, 10.0),
        CompositionEntry::new("5392-40-5", "Citral", 1.0, 5.0),
    ];

    InMemoryStore::from_records(vec![
        FragranceRecord::new(1, "Dita")
            .with_supplier("Givaudan")
            .with_components(musky.clone()),
        FragranceRecord::new(2, "Sole Nero").with_components(musky),
        FragranceRecord::new(3, "Ambre Délice Chambre52").with_components(citrus.clone()),
        FragranceRecord::new(4, "Verveine Menthe").with_components(citrus),
        FragranceRecord::new(5, "Sample awaiting data sheet"),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           CANDELA BATCH CORRELATION DEMO                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let engine = FormulationEngine::from_env()?;

    // ========================================================================
    // Step 1: Analyze one fragrance
    // ========================================================================

    println!("━━━ Step 1: Profile analysis ━━━");
    println!();

    let composition = vec![
        CompositionEntry::new("5989-27-5", "d-Limonene", 20.0, 30.0),
        CompositionEntry::new("80-56-8", "alpha-Pinene", 5.0, 10.0),
        CompositionEntry::new("121-33-5", "Vanillin", 2.0, 5.0),
    ];
    let analysis = engine.analyze(
        &composition,
        &AnalysisOptions {
            fragrance_name: Some("Citrus draft".to_string()),
            diameter_mm: Some(80.0),
            fragrance_load_pct: Some(11.0),
        },
    );
    println!("{}", analysis.summary);
    println!(
        "  → {} ({:?}): {}",
        analysis.prediction.recipe_code, analysis.prediction.confidence, analysis.prediction.message
    );
    if let Some(wick) = &analysis.wick {
        println!("  → wick {} {}", wick.base, wick.adjustments.join(", "));
    }
    for rule in &analysis.triggered_rules {
        println!("    • [{}] {}", rule.id, rule.label);
    }

    let diagnosis = engine.diagnose_olfactory_issue(&composition, OlfactoryIssue::SweetWhenHot);
    println!("  Olfactory: {}", diagnosis.summary);
    println!();

    // ========================================================================
    // Step 2: Cross-reference a data sheet
    // ========================================================================

    println!("━━━ Step 2: Data sheet cross-reference ━━━");
    println!();

    let sheet = SafetyDataSheet {
        fragrance_name: Some("Sole Nero".to_string()),
        supplier: Some("Givaudan".to_string()),
        flash_point_c: Some(62.0),
        composition: vec![
            SheetComponent::new("1222-05-5", "10-20").named("Galaxolide"),
            SheetComponent::new("5989-27-5", "1-5").named("d-Limonene"),
        ],
    };
    let result = engine.cross_reference(&sheet, &CrossReferenceParams::default(), &[], &[]);
    println!(
        "  {} validated match(es) → {} ({:?})",
        result.validated_matches.len(),
        result.recommendation.recipe_code,
        result.recommendation.confidence
    );
    println!("  {}: {}", result.flash_safety.message, result.flash_safety.detail);
    println!();

    // ========================================================================
    // Step 3: Batch correlation
    // ========================================================================

    println!("━━━ Step 3: Batch correlation ━━━");
    println!();

    let report = engine.batch_cross_analysis(&sample_store()).await?;
    println!("{}", serde_json::to_string_pretty(&report.recipe_correlations)?);
    for rule in &report.rules_discovered {
        println!("  💡 {}", rule.detail);
    }

    Ok(())
}
