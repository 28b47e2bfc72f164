use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of a resolved product record. Determines trust level and display
/// framing. Anything outside these two values is a data error and must be
/// rejected at normalization time, not papered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    OpenFoodFacts,
    Gpt4,
}

impl Source {
    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "openfoodfacts" => Some(Source::OpenFoodFacts),
            "gpt4" => Some(Source::Gpt4),
            _ => None,
        }
    }

    /// Display framing for the score breakdown footer.
    pub fn label(&self) -> &'static str {
        match self {
            Source::OpenFoodFacts => "Official Database",
            Source::Gpt4 => "AI Analysis",
        }
    }
}

/// The canonical product record all scoring and display logic operates on.
///
/// Created by a source adapter at resolution time and never mutated afterwards
/// within a single resolution; a fresh resolution creates a new record.
/// Persistence to the backend is an async side effect, never a precondition
/// of display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub barcode: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// Overall green score in [0,100], clamped at ingest. `None` means unknown.
    pub green_score: Option<f64>,
    pub nutrition_grade: Option<String>,
    pub ecoscore_grade: Option<String>,
    pub packaging_info: Option<String>,
    pub ingredients_text: Option<String>,
    pub source: Source,
    /// Opaque serialized original record, preserved so detailed scores can be
    /// re-derived later without another upstream call.
    pub raw_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Product {}", self.barcode),
        }
    }
}

/// Clamps an upstream score into the [0,100] invariant range.
pub fn clamp_score(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}
