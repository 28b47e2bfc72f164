//! Score estimator — turns a resolved product into the 5-facet breakdown the
//! view renders.
//!
//! Priority 1 reads an authoritative `detailed_scores` object embedded in the
//! product's preserved raw record. Priority 2 synthesizes a plausible-looking
//! breakdown around the known overall score so the view is never degenerate;
//! the result is flagged as synthesized and is never ground truth.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::product::Product;

/// Half-width of the symmetric jitter band used for synthesized facet scores.
pub const SYNTHESIS_JITTER: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProvenance {
    /// Read verbatim from an embedded detailed-score object.
    Authoritative,
    /// Estimated around the overall score; display must frame it as such.
    Synthesized,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub packaging_score: u32,
    pub nutrition_score: u32,
    pub environmental_score: u32,
    pub sustainability_score: u32,
    pub overall_score: u32,
    pub provenance: ScoreProvenance,
}

#[derive(Debug, Deserialize)]
struct DetailedScores {
    packaging_score: i64,
    nutrition_score: i64,
    environmental_score: i64,
    sustainability_score: i64,
    overall_score: i64,
}

fn clamp_facet(score: i64) -> u32 {
    score.clamp(0, 100) as u32
}

fn authoritative_scores(raw_data: &str) -> Option<ScoreBreakdown> {
    let record: serde_json::Value = serde_json::from_str(raw_data).ok()?;
    let detailed = record.get("detailed_scores")?;
    let parsed: DetailedScores = serde_json::from_value(detailed.clone()).ok()?;
    Some(ScoreBreakdown {
        packaging_score: clamp_facet(parsed.packaging_score),
        nutrition_score: clamp_facet(parsed.nutrition_score),
        environmental_score: clamp_facet(parsed.environmental_score),
        sustainability_score: clamp_facet(parsed.sustainability_score),
        overall_score: clamp_facet(parsed.overall_score),
        provenance: ScoreProvenance::Authoritative,
    })
}

/// Derives the score breakdown for a product. Parse failures on the raw
/// record are swallowed; they only mean the authoritative path is
/// unavailable.
pub fn derive_scores(product: &Product) -> ScoreBreakdown {
    if let Some(breakdown) = product.raw_data.as_deref().and_then(authoritative_scores) {
        return breakdown;
    }

    let base = product.green_score.unwrap_or(50.0).round() as i32;
    let mut rng = rand::thread_rng();
    let mut facet = || {
        let jitter = rng.gen_range(-SYNTHESIS_JITTER..=SYNTHESIS_JITTER);
        (base + jitter).clamp(0, 100) as u32
    };
    ScoreBreakdown {
        packaging_score: facet(),
        nutrition_score: facet(),
        environmental_score: facet(),
        sustainability_score: facet(),
        // the overall score is what we actually know; it is never jittered
        overall_score: base.clamp(0, 100) as u32,
        provenance: ScoreProvenance::Synthesized,
    }
}

// ── Grade derivation ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        };
        f.write_str(letter)
    }
}

/// Maps a 0–100 score to a letter grade. The thresholds are fixed and exact.
pub fn grade(score: u32) -> Grade {
    if score >= 80 {
        Grade::A
    } else if score >= 70 {
        Grade::B
    } else if score >= 60 {
        Grade::C
    } else if score >= 50 {
        Grade::D
    } else {
        Grade::E
    }
}

pub fn impact_band(overall_score: u32) -> &'static str {
    if overall_score >= 80 {
        "Low Impact"
    } else if overall_score >= 60 {
        "Medium Impact"
    } else {
        "High Impact"
    }
}

pub fn score_analysis(score: u32) -> &'static str {
    if score >= 80 {
        "Excellent performance, leading sustainability practices"
    } else if score >= 70 {
        "Good performance with minor improvements possible"
    } else if score >= 60 {
        "Average performance, moderate improvements needed"
    } else if score >= 50 {
        "Below average performance, consider improvements"
    } else {
        "Poor performance, significant improvements needed"
    }
}
