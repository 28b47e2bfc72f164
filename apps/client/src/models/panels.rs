//! Payloads for the three independent sub-resource panels of a product view.
//!
//! These are deserialized from backend responses with defaults everywhere a
//! field may be missing — a half-filled panel payload must degrade to an
//! emptier panel, never to a deserialization failure.

use serde::Deserialize;

/// A product from our own database offered as a better-scoring alternative.
/// Deliberately loose: records come back in whatever shape the backend stored.
#[derive(Debug, Clone, Deserialize)]
pub struct AlternativeProduct {
    pub barcode: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub green_score: Option<f64>,
}

/// An AI-suggested alternative product.
#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub why_better: String,
    #[serde(default)]
    pub estimated_green_score: f64,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default)]
    pub where_to_find: String,
    #[serde(default)]
    pub price_comparison: String,
    #[serde(default)]
    pub certifications: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationData {
    #[serde(default)]
    pub database_products: Vec<AlternativeProduct>,
    #[serde(default)]
    pub ai_suggestions: Vec<Recommendation>,
    #[serde(default)]
    pub current_score: f64,
    #[serde(default)]
    pub improvement_tips: Vec<String>,
}

/// Macro-nutrient profile of a product.
#[derive(Debug, Clone, Deserialize)]
pub struct Macros {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Unit basis the values refer to, e.g. "100g" or "serving".
    #[serde(default)]
    pub per: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

impl Macros {
    pub fn unit_basis(&self) -> &str {
        self.per.as_deref().filter(|p| !p.is_empty()).unwrap_or("100g")
    }

    /// Percentage split for a stacked bar visualization. All facets are 0%
    /// when the gram sum is zero.
    pub fn split(&self) -> MacroSplit {
        let total = self.protein_g + self.carbs_g + self.fat_g;
        if total <= 0.0 {
            return MacroSplit {
                protein_pct: 0.0,
                carbs_pct: 0.0,
                fat_pct: 0.0,
            };
        }
        MacroSplit {
            protein_pct: self.protein_g / total * 100.0,
            carbs_pct: self.carbs_g / total * 100.0,
            fat_pct: self.fat_g / total * 100.0,
        }
    }
}

/// A recipe using the scanned product. Either list may be missing upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub time_minutes: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}
