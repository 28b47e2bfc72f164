//! Basket analyzer — aggregates a set of barcodes into combined carbon and
//! health metrics, then backfills missing per-item display metadata through
//! secondary lookups.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::backend::BackendApi;
use crate::errors::AppError;
use crate::models::basket::{BasketItem, BasketResult};
use crate::models::product::Product;

/// Collects the barcodes for one analysis. Deduplicates on add, preserving
/// first-added order.
#[derive(Debug, Default)]
pub struct BasketBuilder {
    barcodes: Vec<String>,
}

impl BasketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a barcode. A duplicate or empty code is silently ignored and the
    /// existing entry keeps its original position. Returns whether the code
    /// was actually added.
    pub fn add(&mut self, barcode: &str) -> bool {
        let code = barcode.trim();
        if code.is_empty() || self.barcodes.iter().any(|b| b == code) {
            return false;
        }
        self.barcodes.push(code.to_string());
        true
    }

    pub fn remove(&mut self, barcode: &str) {
        self.barcodes.retain(|b| b != barcode);
    }

    pub fn barcodes(&self) -> &[String] {
        &self.barcodes
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

pub struct BasketAnalyzer {
    backend: Arc<dyn BackendApi>,
}

impl BasketAnalyzer {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        BasketAnalyzer { backend }
    }

    /// Analyzes a basket. An empty list is a no-op: `Ok(None)` without any
    /// request. After the aggregate comes back, items missing a display name
    /// are enriched concurrently, and the result is appended to the basket
    /// ledger best-effort.
    pub async fn analyze(&self, barcodes: &[String]) -> Result<Option<BasketResult>, AppError> {
        if barcodes.is_empty() {
            return Ok(None);
        }

        let mut result = self.backend.analyze_basket(barcodes).await?;
        self.backfill(&mut result).await;

        // best-effort: a failed save never invalidates the displayed result
        if let Err(e) = self.backend.save_basket(barcodes).await {
            warn!("failed to save basket: {e}");
        }

        Ok(Some(result))
    }

    /// Looks up every item that lacks a display name and merges the findings
    /// back in, keyed by exact barcode equality. Lookups run concurrently;
    /// arrival order cannot matter because the merge is per-item and
    /// idempotent. Failed lookups leave their item unchanged.
    async fn backfill(&self, result: &mut BasketResult) {
        let missing: Vec<String> = result
            .items
            .iter()
            .filter(|item| needs_name(item))
            .map(|item| item.barcode.clone())
            .collect();
        if missing.is_empty() {
            return;
        }

        let mut lookups = JoinSet::new();
        for barcode in missing {
            let backend = Arc::clone(&self.backend);
            lookups.spawn(async move {
                let found = match backend.product(&barcode).await {
                    Ok(found) => found,
                    Err(e) => {
                        debug!("backfill lookup for {barcode} failed: {e}");
                        None
                    }
                };
                (barcode, found)
            });
        }

        let mut found: HashMap<String, Product> = HashMap::new();
        while let Some(joined) = lookups.join_next().await {
            if let Ok((barcode, Some(product))) = joined {
                found.insert(barcode, product);
            }
        }

        for item in result.items.iter_mut() {
            if let Some(product) = found.get(&item.barcode) {
                merge_lookup(item, product);
            }
        }
    }
}

fn needs_name(item: &BasketItem) -> bool {
    item.product_name
        .as_deref()
        .map(|name| name.trim().is_empty())
        .unwrap_or(true)
}

/// Non-destructive merge of display metadata into a basket item: only fills
/// fields the analysis left empty, and never touches carbon or health_score.
pub fn merge_lookup(item: &mut BasketItem, product: &Product) {
    if needs_name(item) && product.name.is_some() {
        item.product_name = product.name.clone();
    }
    if item.image_url.is_none() {
        item.image_url = product.image_url.clone();
    }
    if item.brand.is_none() {
        item.brand = product.brand.clone();
    }
}
