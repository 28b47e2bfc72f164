//! Adapter for the Open Food Facts product database (read-only, keyed by
//! barcode). Absence is signaled by a `status` flag in the JSON body, not by
//! an HTTP error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::product::{clamp_score, Product, Source};
use crate::sources::{first_num, first_str, ProductSource, SourceOutcome};

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

#[derive(Debug, Deserialize)]
struct OffEnvelope {
    #[serde(default)]
    status: u8,
    #[serde(default)]
    product: Option<Value>,
}

pub struct OpenFoodFactsSource {
    client: Client,
    base_url: String,
}

impl OpenFoodFactsSource {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        OpenFoodFactsSource {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Maps a raw Open Food Facts record to the canonical product. Field priority
/// per attribute, first non-empty wins:
///   name          ← product_name, generic_name
///   image_url     ← image_url, image_small_url
///   brand         ← brands
///   green_score   ← ecoscore_score (default 50 only when a grade exists)
///   grades        ← nutrition_grades / nutrition_grade_fr, ecoscore_grade
fn normalize(barcode: &str, record: &Value) -> Product {
    let ecoscore_grade = first_str(record, &["ecoscore_grade"]);
    let green_score = match first_num(record, &["ecoscore_score"]) {
        Some(score) => Some(clamp_score(score)),
        None if ecoscore_grade.is_some() => Some(50.0),
        None => None,
    };
    let now = Utc::now();
    Product {
        barcode: barcode.to_string(),
        name: first_str(record, &["product_name", "generic_name"]),
        brand: first_str(record, &["brands"]),
        image_url: first_str(record, &["image_url", "image_small_url"]),
        green_score,
        nutrition_grade: first_str(record, &["nutrition_grades", "nutrition_grade_fr"]),
        ecoscore_grade,
        packaging_info: first_str(record, &["packaging"]),
        ingredients_text: first_str(record, &["ingredients_text"]),
        source: Source::OpenFoodFacts,
        raw_data: serde_json::to_string(record).ok(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsSource {
    fn name(&self) -> &'static str {
        "openfoodfacts"
    }

    async fn resolve(&self, barcode: &str) -> SourceOutcome {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Open Food Facts unreachable: {e}");
                return SourceOutcome::Unreachable;
            }
        };
        if !response.status().is_success() {
            debug!("Open Food Facts returned {} for {barcode}", response.status());
            return SourceOutcome::NotFound;
        }
        let envelope: OffEnvelope = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("malformed Open Food Facts response for {barcode}: {e}");
                return SourceOutcome::NotFound;
            }
        };
        match envelope.product {
            Some(record) if envelope.status == 1 => {
                SourceOutcome::Found(normalize(barcode, &record))
            }
            _ => SourceOutcome::NotFound,
        }
    }
}
