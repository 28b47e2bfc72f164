//! Source adapters — one per upstream data shape, each translating its raw
//! records into the canonical [`Product`](crate::models::product::Product).
//!
//! Adapters never fail the resolution: a malformed payload or a non-success
//! status means "this source has nothing", and a transport failure means
//! "this source was unreachable". The resolver decides what either means.

pub mod backend;
pub mod openfoodfacts;

use async_trait::async_trait;

use crate::models::product::Product;

#[derive(Debug)]
pub enum SourceOutcome {
    Found(Product),
    NotFound,
    Unreachable,
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn resolve(&self, barcode: &str) -> SourceOutcome;
}

/// First non-empty string among the given keys, in priority order.
pub(crate) fn first_str(record: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First numeric value among the given keys; numeric strings are accepted
/// because upstream records are inconsistent about it.
pub(crate) fn first_num(record: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|key| record.get(key)).find_map(|v| {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    })
}
