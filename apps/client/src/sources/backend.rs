//! Adapter over our own backend's product store. Second in the resolver's
//! priority order; its records are loosely shaped (snake_case and PascalCase
//! synonyms coexist), so normalization works over raw JSON with explicit
//! field-priority lists.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::BackendApi;
use crate::models::product::{clamp_score, Product, Source};
use crate::sources::{first_num, first_str, ProductSource, SourceOutcome};

pub struct BackendSource {
    api: Arc<dyn BackendApi>,
}

impl BackendSource {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        BackendSource { api }
    }
}

/// Maps a raw backend record to the canonical product, or `None` when the
/// record is unusable. Field priority per attribute, first non-empty wins:
///   name         ← name, Name, product_name, productName
///   green_score  ← green_score, ecoScore, EcoScore (default 50)
///   image_url    ← image_url, image_small_url, image
///   brand        ← brand, brands
/// A `source` value outside the known provenances is a data error: the whole
/// record is rejected rather than mislabeled. A missing `source` defaults to
/// `gpt4` since backend-only records are AI-derived.
pub(crate) fn normalize_record(barcode: &str, record: &Value) -> Option<Product> {
    let source = match record.get("source").and_then(Value::as_str) {
        Some(tag) => match Source::parse(tag) {
            Some(source) => source,
            None => {
                warn!("rejecting backend record for {barcode}: unknown source {tag:?}");
                return None;
            }
        },
        None => Source::Gpt4,
    };
    let green_score = clamp_score(
        first_num(record, &["green_score", "ecoScore", "EcoScore"]).unwrap_or(50.0),
    );
    let raw_data = match record.get("raw_data").and_then(Value::as_str) {
        Some(existing) if !existing.is_empty() => Some(existing.to_string()),
        _ => serde_json::to_string(record).ok(),
    };
    let now = Utc::now();
    Some(Product {
        barcode: barcode.to_string(),
        name: first_str(record, &["name", "Name", "product_name", "productName"]),
        brand: first_str(record, &["brand", "brands"]),
        image_url: first_str(record, &["image_url", "image_small_url", "image"]),
        green_score: Some(green_score),
        nutrition_grade: first_str(record, &["nutrition_grade"]),
        ecoscore_grade: first_str(record, &["ecoscore_grade"]),
        packaging_info: first_str(record, &["packaging_info", "packaging"]),
        ingredients_text: first_str(record, &["ingredients_text"]),
        source,
        raw_data,
        created_at: parse_timestamp(record, "created_at").unwrap_or(now),
        updated_at: parse_timestamp(record, "updated_at").unwrap_or(now),
    })
}

fn parse_timestamp(record: &Value, key: &str) -> Option<DateTime<Utc>> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl ProductSource for BackendSource {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn resolve(&self, barcode: &str) -> SourceOutcome {
        match self.api.product(barcode).await {
            Ok(Some(product)) => SourceOutcome::Found(product),
            Ok(None) => SourceOutcome::NotFound,
            Err(e) if e.is_transport() => {
                warn!("backend unreachable: {e}");
                SourceOutcome::Unreachable
            }
            Err(e) => {
                debug!("backend lookup for {barcode} failed: {e}");
                SourceOutcome::NotFound
            }
        }
    }
}
