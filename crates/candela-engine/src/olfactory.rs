//! Olfactory analysis from reference odor descriptors
//!
//! Answers "what will this smell like while burning" and, when a customer
//! reports a problem, "which molecules are to blame". Concentrations here are
//! the reported upper bound, falling back to the lower bound.

use crate::thresholds::{OFF_NOTE_THRESHOLD_PPM, SWEET_REFORMULATION_PCT};
use candela_chem::{ChemicalReference, CompositionEntry, NotePosition};
use serde::{Deserialize, Serialize};

const HOT_KEYWORDS: &[&str] = &["intense", "strong", "burning"];
const SWEET_KEYWORDS: &[&str] = &["sweet", "caramel", "vanilla", "honey", "candy floss"];
const GREEN_KEYWORDS: &[&str] = &["green", "grass", "leaf"];

/// Family for molecules the reference leaves unclassified
const OTHER_FAMILY: &str = "other";

// ============================================================================
// Types
// ============================================================================

/// A composition entry with odor data in the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdorMolecule {
    pub name: String,
    pub registry_id: String,
    pub pct: f64,
    pub cold: String,
    pub hot: Option<String>,
    pub family: Option<String>,
    pub threshold_ppm: Option<f64>,
    pub notes: Vec<NotePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdorFamilyShare {
    pub family: String,
    pub pct: f64,
    pub molecules: Vec<OdorMolecule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePyramid {
    pub top: Vec<OdorMolecule>,
    pub heart: Vec<OdorMolecule>,
    pub base: Vec<OdorMolecule>,
}

impl NotePyramid {
    /// Every listed tier; no listed tier means heart
    fn place(&mut self, molecule: &OdorMolecule) {
        if molecule.notes.is_empty() {
            self.heart.push(molecule.clone());
        }
        for note in &molecule.notes {
            let tier = match note {
                NotePosition::Top => &mut self.top,
                NotePosition::Heart => &mut self.heart,
                NotePosition::Base => &mut self.base,
            };
            tier.push(molecule.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlfactoryAnalysis {
    /// Largest share first
    pub families: Vec<OdorFamilyShare>,
    pub pyramid: NotePyramid,
    /// Molecules whose hot odor turns intense
    pub hot_alerts: Vec<OdorMolecule>,
    pub sweet_molecules: Vec<OdorMolecule>,
    pub green_molecules: Vec<OdorMolecule>,
    /// Entries with odor data
    pub coverage: usize,
    pub total: usize,
}

/// Problems customers report with a burning candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OlfactoryIssue {
    #[serde(alias = "sweet_hot")]
    SweetWhenHot,
    #[serde(alias = "green_strong")]
    GreenTooStrong,
    WeakThrow,
    OffNote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspect {
    pub molecule: OdorMolecule,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlfactoryDiagnosis {
    pub issue: OlfactoryIssue,
    pub suspects: Vec<Suspect>,
    pub remediations: Vec<String>,
    pub summary: String,
}

// ============================================================================
// Analysis
// ============================================================================

fn mentions(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

fn by_pct_desc(molecules: &mut [OdorMolecule]) {
    molecules.sort_by(|a, b| b.pct.total_cmp(&a.pct));
}

fn odor_molecules<'a, R>(
    reference: &'a R,
    entries: &'a [CompositionEntry],
) -> impl Iterator<Item = OdorMolecule> + 'a
where
    R: ChemicalReference + ?Sized,
{
    entries.iter().filter_map(move |entry| {
        let known = reference.get(entry.registry_id.trim())?;
        let odor = known.odor.as_ref()?;
        let name = if known.name.is_empty() {
            entry.name.clone()
        } else {
            known.name.clone()
        };
        Some(OdorMolecule {
            name,
            registry_id: known.registry_id.clone(),
            pct: entry.peak(),
            cold: odor.cold.clone(),
            hot: odor.hot.clone(),
            family: odor.family.clone(),
            threshold_ppm: odor.threshold_ppm,
            notes: odor.notes.clone(),
        })
    })
}

pub fn analyze_olfactory_profile<R>(reference: &R, entries: &[CompositionEntry]) -> OlfactoryAnalysis
where
    R: ChemicalReference + ?Sized,
{
    let mut families: Vec<OdorFamilyShare> = Vec::new();
    let mut pyramid = NotePyramid::default();
    let mut hot_alerts = Vec::new();
    let mut sweet_molecules = Vec::new();
    let mut green_molecules = Vec::new();
    let mut coverage = 0;

    for molecule in odor_molecules(reference, entries) {
        coverage += 1;

        let family = molecule
            .family
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| OTHER_FAMILY.to_string());
        match families.iter_mut().find(|share| share.family == family) {
            Some(share) => {
                share.pct += molecule.pct;
                share.molecules.push(molecule.clone());
            }
            None => families.push(OdorFamilyShare {
                family,
                pct: molecule.pct,
                molecules: vec![molecule.clone()],
            }),
        }

        pyramid.place(&molecule);

        if molecule.hot.as_deref().map_or(false, |hot| mentions(hot, HOT_KEYWORDS)) {
            hot_alerts.push(molecule.clone());
        }
        if mentions(&molecule.cold, SWEET_KEYWORDS) {
            sweet_molecules.push(molecule.clone());
        }
        if mentions(&molecule.cold, GREEN_KEYWORDS) {
            green_molecules.push(molecule);
        }
    }

    families.sort_by(|a, b| b.pct.total_cmp(&a.pct));
    by_pct_desc(&mut hot_alerts);
    by_pct_desc(&mut sweet_molecules);
    by_pct_desc(&mut green_molecules);

    OlfactoryAnalysis {
        families,
        pyramid,
        hot_alerts,
        sweet_molecules,
        green_molecules,
        coverage,
        total: entries.len(),
    }
}

// ============================================================================
// Diagnosis
// ============================================================================

fn cold_to_hot(molecule: OdorMolecule) -> Suspect {
    let explanation = format!(
        "{} ({}%): cold \"{}\" → hot \"{}\"",
        molecule.name,
        molecule.pct,
        molecule.cold,
        molecule.hot.as_deref().unwrap_or("n/a")
    );
    Suspect {
        molecule,
        explanation,
    }
}

fn total_pct(suspects: &[Suspect]) -> f64 {
    suspects.iter().map(|s| s.molecule.pct).sum()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn diagnose_olfactory_issue<R>(
    reference: &R,
    entries: &[CompositionEntry],
    issue: OlfactoryIssue,
) -> OlfactoryDiagnosis
where
    R: ChemicalReference + ?Sized,
{
    let analysis = analyze_olfactory_profile(reference, entries);

    let (suspects, remediations, summary) = match issue {
        OlfactoryIssue::SweetWhenHot => {
            let suspects: Vec<Suspect> =
                analysis.sweet_molecules.into_iter().map(cold_to_hot).collect();
            let mut remediations = lines(&[
                "Drop the wick one size: the wax pool runs about 5 °C cooler and sweet notes \
                 volatilise less",
                "Use a harder wax (higher melting point) to slow gourmand diffusion",
                "Lower the fragrance load by 0.5 to 1%",
            ]);
            if suspects.iter().any(|s| s.molecule.pct > SWEET_REFORMULATION_PCT) {
                remediations.push(
                    "A sweet molecule is above 5%: hard to correct without a supplier \
                     reformulation"
                        .to_string(),
                );
            }
            let summary = format!(
                "{} sweet molecule(s) detected, totalling {:.1}% of the composition",
                suspects.len(),
                total_pct(&suspects)
            );
            (suspects, remediations, summary)
        }
        OlfactoryIssue::GreenTooStrong => {
            let suspects: Vec<Suspect> =
                analysis.green_molecules.into_iter().map(cold_to_hot).collect();
            let remediations = lines(&[
                "Raise the wick one size: green top notes dissipate faster at higher temperature",
                "Increase the musk and fixative share to mask the green notes",
                "Add a touch of vanillin to balance green with sweet",
            ]);
            let summary = format!(
                "{} green molecule(s), {:.1}% of the composition",
                suspects.len(),
                total_pct(&suspects)
            );
            (suspects, remediations, summary)
        }
        OlfactoryIssue::WeakThrow => {
            let suspects: Vec<Suspect> = odor_molecules(reference, entries)
                .filter(|m| m.notes.contains(&NotePosition::Base))
                .map(|molecule| Suspect {
                    molecule,
                    explanation: "Heavy base note: diffuses little at room temperature"
                        .to_string(),
                })
                .collect();
            let remediations = lines(&[
                "Raise the wick: more heat volatilises base notes better",
                "Use a wax with a lower melting point for a hotter pool and better diffusion",
                "Raise the fragrance load by 0.5 to 1% to make up for heavy notes",
            ]);
            let summary = format!(
                "{:.1}% heavy base notes: can limit throw",
                total_pct(&suspects)
            );
            (suspects, remediations, summary)
        }
        OlfactoryIssue::OffNote => {
            let mut suspects: Vec<Suspect> = odor_molecules(reference, entries)
                .filter_map(|molecule| {
                    let threshold = molecule.threshold_ppm.filter(|t| *t > 0.0)?;
                    (threshold < OFF_NOTE_THRESHOLD_PPM).then(|| Suspect {
                        explanation: format!(
                            "Very low detection threshold ({threshold} ppm): noticeable even \
                             in traces"
                        ),
                        molecule,
                    })
                })
                .collect();
            suspects.sort_by(|a, b| {
                let ta = a.molecule.threshold_ppm.unwrap_or_default();
                let tb = b.molecule.threshold_ppm.unwrap_or_default();
                ta.total_cmp(&tb)
            });
            let remediations = lines(&[
                "Identify the off-note you perceive and cross it with the suspects above",
                "Molecules below 0.01 ppm can dominate even under 1% of the composition",
                "Ask the supplier to reformulate with less of the identified molecule",
            ]);
            let summary = format!(
                "{} very-low-threshold molecule(s) detected",
                suspects.len()
            );
            (suspects, remediations, summary)
        }
    };

    OlfactoryDiagnosis {
        issue,
        suspects,
        remediations,
        summary,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use candela_chem::ReferenceTable;

    fn entry(id: &str, min: f64, max: f64) -> CompositionEntry {
        CompositionEntry::new(id, "", min, max)
    }

    fn composition() -> Vec<CompositionEntry> {
        vec![
            entry("78-70-6", 5.0, 10.0),    // linalool: floral, top/heart, hot intense
            entry("121-33-5", 2.0, 0.0),    // vanillin: sweet, base
            entry("3338-55-4", 1.0, 3.0),   // ocimene: green, top, hot intense
            entry("1222-05-5", 10.0, 15.0), // galaxolide: musk, sweet, base
            entry("101-86-0", 1.0, 2.0),    // no odor data
            entry("999-99-9", 1.0, 2.0),    // unknown
        ]
    }

    #[test]
    fn test_families_and_coverage() {
        let reference = ReferenceTable::bundled().unwrap();
        let analysis = analyze_olfactory_profile(&reference, &composition());
        assert_eq!(analysis.coverage, 4);
        assert_eq!(analysis.total, 6);
        let families: Vec<&str> = analysis.families.iter().map(|f| f.family.as_str()).collect();
        assert_eq!(families, vec!["musk", "floral", "green", "gourmand"]);
        assert_eq!(analysis.families[0].pct, 15.0);
    }

    #[test]
    fn test_pyramid_tiers() {
        let reference = ReferenceTable::bundled().unwrap();
        let analysis = analyze_olfactory_profile(&reference, &composition());
        assert_eq!(analysis.pyramid.top.len(), 2);
        assert_eq!(analysis.pyramid.heart.len(), 1);
        assert_eq!(analysis.pyramid.base.len(), 2);
    }

    #[test]
    fn test_unplaced_notes_default_to_heart() {
        let reference = ReferenceTable::bundled().unwrap();
        // heptane and DPG carry odor data without a pyramid position
        let entries = vec![entry("142-82-5", 1.0, 2.0), entry("34590-94-8", 3.0, 5.0)];
        let analysis = analyze_olfactory_profile(&reference, &entries);
        assert_eq!(analysis.coverage, 2);
        assert!(analysis.pyramid.top.is_empty());
        assert!(analysis.pyramid.base.is_empty());
        let heart: Vec<&str> = analysis
            .pyramid
            .heart
            .iter()
            .map(|m| m.registry_id.as_str())
            .collect();
        assert_eq!(heart, vec!["142-82-5", "34590-94-8"]);
    }

    #[test]
    fn test_keyword_lists_sorted() {
        let reference = ReferenceTable::bundled().unwrap();
        let analysis = analyze_olfactory_profile(&reference, &composition());
        let hot: Vec<&str> = analysis.hot_alerts.iter().map(|m| m.registry_id.as_str()).collect();
        assert_eq!(hot, vec!["78-70-6", "3338-55-4"]);
        let sweet: Vec<f64> = analysis.sweet_molecules.iter().map(|m| m.pct).collect();
        // galaxolide at its max, vanillin at its min
        assert_eq!(sweet, vec![15.0, 2.0]);
        assert_eq!(analysis.green_molecules.len(), 1);
    }

    #[test]
    fn test_sweet_diagnosis_escalates() {
        let reference = ReferenceTable::bundled().unwrap();
        let diagnosis =
            diagnose_olfactory_issue(&reference, &composition(), OlfactoryIssue::SweetWhenHot);
        assert_eq!(diagnosis.suspects.len(), 2);
        assert_eq!(diagnosis.remediations.len(), 4);
        assert_eq!(
            diagnosis.summary,
            "2 sweet molecule(s) detected, totalling 17.0% of the composition"
        );
        assert!(diagnosis.suspects[0].explanation.contains("→ hot"));
    }

    #[test]
    fn test_weak_throw_lists_base_notes() {
        let reference = ReferenceTable::bundled().unwrap();
        let diagnosis =
            diagnose_olfactory_issue(&reference, &composition(), OlfactoryIssue::WeakThrow);
        assert_eq!(diagnosis.suspects.len(), 2);
        assert_eq!(diagnosis.summary, "17.0% heavy base notes: can limit throw");
    }

    #[test]
    fn test_off_note_sorted_by_threshold() {
        let reference = ReferenceTable::bundled().unwrap();
        let entries = vec![
            entry("78-70-6", 1.0, 1.0),     // 0.006
            entry("23696-85-7", 0.1, 0.1),  // 0.000002
            entry("5989-27-5", 1.0, 1.0),   // 0.01, not below
        ];
        let diagnosis = diagnose_olfactory_issue(&reference, &entries, OlfactoryIssue::OffNote);
        let ids: Vec<&str> = diagnosis
            .suspects
            .iter()
            .map(|s| s.molecule.registry_id.as_str())
            .collect();
        assert_eq!(ids, vec!["23696-85-7", "78-70-6"]);
        assert_eq!(diagnosis.summary, "2 very-low-threshold molecule(s) detected");
    }

    #[test]
    fn test_issue_aliases() {
        let issue: OlfactoryIssue = serde_json::from_str("\"sweet_hot\"").unwrap();
        assert_eq!(issue, OlfactoryIssue::SweetWhenHot);
        let issue: OlfactoryIssue = serde_json::from_str("\"off_note\"").unwrap();
        assert_eq!(issue, OlfactoryIssue::OffNote);
    }
}
