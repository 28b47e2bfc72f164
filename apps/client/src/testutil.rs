//! Shared fixtures and an in-memory backend fake for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::backend::{BackendApi, BackendError};
use crate::models::basket::{BasketItem, BasketResult, SavedBasket};
use crate::models::history::HistoryEntry;
use crate::models::impact::{Badge, ImpactStats, NewGoal};
use crate::models::panels::{Macros, Recipe, RecommendationData};
use crate::models::product::{Product, Source};

pub fn make_product(barcode: &str, name: Option<&str>) -> Product {
    let now = Utc::now();
    Product {
        barcode: barcode.to_string(),
        name: name.map(str::to_string),
        brand: None,
        image_url: None,
        green_score: None,
        nutrition_grade: None,
        ecoscore_grade: None,
        packaging_info: None,
        ingredients_text: None,
        source: Source::OpenFoodFacts,
        raw_data: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_macros(calories_kcal: f64) -> Macros {
    Macros {
        calories_kcal,
        protein_g: 10.0,
        carbs_g: 20.0,
        fat_g: 5.0,
        per: None,
    }
}

pub fn make_recipe(title: &str) -> Recipe {
    Recipe {
        title: title.to_string(),
        time_minutes: Some(15),
        ingredients: vec![],
        steps: vec![],
    }
}

pub fn make_item(barcode: &str, product_name: Option<&str>, carbon: f64, health_score: u32) -> BasketItem {
    BasketItem {
        barcode: barcode.to_string(),
        product_name: product_name.map(str::to_string),
        carbon,
        health_score,
        image_url: None,
        brand: None,
    }
}

/// In-memory [`BackendApi`] double. Reads come from the public maps, writes
/// land in the public vecs, and the atomic flags switch whole categories of
/// calls into failure mode.
#[derive(Default)]
pub struct MockBackend {
    pub products: Mutex<HashMap<String, Product>>,
    pub recommendations: Mutex<HashMap<String, RecommendationData>>,
    pub macros: Mutex<HashMap<String, Macros>>,
    pub recipes: Mutex<HashMap<String, Vec<Recipe>>>,
    pub basket_result: Mutex<Option<BasketResult>>,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub upserts: Mutex<Vec<Product>>,
    pub saved_baskets: Mutex<Vec<SavedBasket>>,
    pub goals: Mutex<Vec<NewGoal>>,
    /// Artificial per-barcode latency for barcode-keyed reads.
    pub delays: Mutex<HashMap<String, Duration>>,
    pub product_lookups: Mutex<Vec<String>>,
    pub basket_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MockBackend {
    async fn delay_for(&self, barcode: &str) {
        // copy the duration out before awaiting; the guard is not Send
        let delay = self.delays.lock().unwrap().get(barcode).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_read(&self) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("read disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("write disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn product(&self, barcode: &str) -> Result<Option<Product>, BackendError> {
        self.product_lookups.lock().unwrap().push(barcode.to_string());
        self.delay_for(barcode).await;
        self.check_read()?;
        Ok(self.products.lock().unwrap().get(barcode).cloned())
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), BackendError> {
        self.check_write()?;
        self.upserts.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        self.check_read()?;
        Ok(self.history.lock().unwrap().clone())
    }

    async fn record_search(&self, entry: &HistoryEntry) -> Result<(), BackendError> {
        self.check_write()?;
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn clear_history(&self) -> Result<(), BackendError> {
        self.check_write()?;
        self.history.lock().unwrap().clear();
        Ok(())
    }

    async fn recommendations(
        &self,
        barcode: &str,
    ) -> Result<Option<RecommendationData>, BackendError> {
        self.delay_for(barcode).await;
        self.check_read()?;
        Ok(self.recommendations.lock().unwrap().get(barcode).cloned())
    }

    async fn macros(&self, barcode: &str) -> Result<Option<Macros>, BackendError> {
        self.delay_for(barcode).await;
        self.check_read()?;
        Ok(self.macros.lock().unwrap().get(barcode).cloned())
    }

    async fn recipes(&self, barcode: &str, _count: u32) -> Result<Vec<Recipe>, BackendError> {
        self.delay_for(barcode).await;
        self.check_read()?;
        Ok(self
            .recipes
            .lock()
            .unwrap()
            .get(barcode)
            .cloned()
            .unwrap_or_default())
    }

    async fn analyze_basket(&self, _barcodes: &[String]) -> Result<BasketResult, BackendError> {
        self.basket_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        self.basket_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::Rejected("no basket configured".to_string()))
    }

    async fn save_basket(&self, _barcodes: &[String]) -> Result<SavedBasket, BackendError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let result = self
            .basket_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| BasketResult::from_items(vec![]));
        let saved = SavedBasket {
            id: Some(self.save_calls.load(Ordering::SeqCst) as i64),
            result,
            created_at: Some(Utc::now()),
        };
        self.saved_baskets.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn saved_baskets(&self) -> Result<Vec<SavedBasket>, BackendError> {
        self.check_read()?;
        Ok(self.saved_baskets.lock().unwrap().clone())
    }

    async fn impact_stats(&self) -> Result<Option<ImpactStats>, BackendError> {
        self.check_read()?;
        Ok(None)
    }

    async fn badges(&self) -> Result<Vec<Badge>, BackendError> {
        self.check_read()?;
        Ok(vec![])
    }

    async fn create_goal(&self, goal: &NewGoal) -> Result<(), BackendError> {
        self.check_write()?;
        self.goals.lock().unwrap().push(goal.clone());
        Ok(())
    }
}
