//! Internal backend API client — the single point of entry for every call to
//! our own service.
//!
//! Every response carries a `success: boolean` envelope. A `success: false`
//! body and a non-2xx status are treated identically: "the backend has no
//! data", never an exception. Only transport-level failures surface as
//! `BackendError::Http`; that distinction is what lets the resolver tell a
//! negative lookup from an unreachable service.
//!
//! There is deliberately no retry logic anywhere in this client: the user
//! re-triggers failed operations explicitly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::basket::{BasketResult, SavedBasket};
use crate::models::history::HistoryEntry;
use crate::models::impact::{Badge, ImpactStats, NewGoal};
use crate::models::panels::{Macros, Recipe, RecommendationData};
use crate::models::product::Product;
use crate::sources::backend::normalize_record;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

impl BackendError {
    /// True for network-level failures (the service could not be reached at
    /// all), as opposed to the service answering negatively.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Http(_))
    }
}

/// The backend surface the client core consumes, one method per endpoint.
/// Carried as `Arc<dyn BackendApi>` so tests can substitute in-memory fakes.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn product(&self, barcode: &str) -> Result<Option<Product>, BackendError>;
    async fn upsert_product(&self, product: &Product) -> Result<(), BackendError>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError>;
    async fn record_search(&self, entry: &HistoryEntry) -> Result<(), BackendError>;
    async fn clear_history(&self) -> Result<(), BackendError>;

    async fn recommendations(
        &self,
        barcode: &str,
    ) -> Result<Option<RecommendationData>, BackendError>;
    async fn macros(&self, barcode: &str) -> Result<Option<Macros>, BackendError>;
    async fn recipes(&self, barcode: &str, count: u32) -> Result<Vec<Recipe>, BackendError>;

    async fn analyze_basket(&self, barcodes: &[String]) -> Result<BasketResult, BackendError>;
    async fn save_basket(&self, barcodes: &[String]) -> Result<SavedBasket, BackendError>;
    async fn saved_baskets(&self) -> Result<Vec<SavedBasket>, BackendError>;

    async fn impact_stats(&self) -> Result<Option<ImpactStats>, BackendError>;
    async fn badges(&self) -> Result<Vec<Badge>, BackendError>;
    async fn create_goal(&self, goal: &NewGoal) -> Result<(), BackendError>;
}

// ── Response envelopes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    product: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    recommendations: Option<RecommendationData>,
}

#[derive(Debug, Deserialize)]
struct MacrosResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    macros: Option<Macros>,
}

#[derive(Debug, Deserialize)]
struct RecipesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

#[derive(Debug, Deserialize)]
struct BasketResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    basket: Option<BasketResult>,
}

#[derive(Debug, Deserialize)]
struct SaveBasketResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    basket: Option<SavedBasket>,
}

#[derive(Debug, Deserialize)]
struct BasketsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    baskets: Vec<SavedBasket>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stats: Option<ImpactStats>,
}

#[derive(Debug, Deserialize)]
struct BadgesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    badges: Vec<Badge>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Serialize)]
struct BarcodesBody<'a> {
    barcodes: &'a [String],
}

// ── HTTP implementation ─────────────────────────────────────────────────────

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        BackendClient {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET returning the parsed envelope, or `None` for non-2xx / malformed
    /// bodies. Transport failures bubble up.
    async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BackendError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("backend returned {status} for {path}");
            return Ok(None);
        }
        match response.json::<T>().await {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!("malformed backend response for {path}: {e}");
                Ok(None)
            }
        }
    }

    /// POST returning the parsed envelope under the same absence rules.
    async fn post_envelope<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, BackendError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("backend returned {status} for {path}");
            return Ok(None);
        }
        match response.json::<T>().await {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!("malformed backend response for {path}: {e}");
                Ok(None)
            }
        }
    }

    fn acknowledged(response: Option<AckResponse>, what: &str) -> Result<(), BackendError> {
        match response {
            Some(ack) if ack.success => Ok(()),
            _ => Err(BackendError::Rejected(what.to_string())),
        }
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn product(&self, barcode: &str) -> Result<Option<Product>, BackendError> {
        let response: Option<ProductResponse> =
            self.get_envelope(&format!("/api/product/{barcode}")).await?;
        Ok(response
            .filter(|r| r.success)
            .and_then(|r| r.product)
            .and_then(|raw| normalize_record(barcode, &raw)))
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), BackendError> {
        let response: Option<AckResponse> =
            self.post_envelope("/api/products/add", product).await?;
        Self::acknowledged(response, "product upsert")
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        let response: Option<HistoryResponse> = self.get_envelope("/history").await?;
        Ok(response.filter(|r| r.success).map(|r| r.history).unwrap_or_default())
    }

    async fn record_search(&self, entry: &HistoryEntry) -> Result<(), BackendError> {
        let response: Option<AckResponse> = self.post_envelope("/history", entry).await?;
        Self::acknowledged(response, "history append")
    }

    async fn clear_history(&self) -> Result<(), BackendError> {
        let response = self.client.delete(self.url("/history/clear")).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Rejected("history clear".to_string()));
        }
        let ack: Option<AckResponse> = response.json().await.ok();
        Self::acknowledged(ack, "history clear")
    }

    async fn recommendations(
        &self,
        barcode: &str,
    ) -> Result<Option<RecommendationData>, BackendError> {
        let response: Option<RecommendationsResponse> = self
            .get_envelope(&format!("/api/product/{barcode}/recommendations"))
            .await?;
        Ok(response.filter(|r| r.success).and_then(|r| r.recommendations))
    }

    async fn macros(&self, barcode: &str) -> Result<Option<Macros>, BackendError> {
        let response: Option<MacrosResponse> = self
            .get_envelope(&format!("/api/product/{barcode}/macros"))
            .await?;
        Ok(response.filter(|r| r.success).and_then(|r| r.macros))
    }

    async fn recipes(&self, barcode: &str, count: u32) -> Result<Vec<Recipe>, BackendError> {
        let response: Option<RecipesResponse> = self
            .get_envelope(&format!("/api/product/{barcode}/recipes?count={count}"))
            .await?;
        Ok(response.filter(|r| r.success).map(|r| r.recipes).unwrap_or_default())
    }

    async fn analyze_basket(&self, barcodes: &[String]) -> Result<BasketResult, BackendError> {
        let response: Option<BasketResponse> = self
            .post_envelope("/api/basket", &BarcodesBody { barcodes })
            .await?;
        response
            .filter(|r| r.success)
            .and_then(|r| r.basket)
            .ok_or_else(|| BackendError::Rejected("basket analysis".to_string()))
    }

    async fn save_basket(&self, barcodes: &[String]) -> Result<SavedBasket, BackendError> {
        let response: Option<SaveBasketResponse> = self
            .post_envelope("/api/basket/save", &BarcodesBody { barcodes })
            .await?;
        response
            .filter(|r| r.success)
            .and_then(|r| r.basket)
            .ok_or_else(|| BackendError::Rejected("basket save".to_string()))
    }

    async fn saved_baskets(&self) -> Result<Vec<SavedBasket>, BackendError> {
        let response: Option<BasketsResponse> = self.get_envelope("/api/baskets").await?;
        Ok(response.filter(|r| r.success).map(|r| r.baskets).unwrap_or_default())
    }

    async fn impact_stats(&self) -> Result<Option<ImpactStats>, BackendError> {
        let response: Option<StatsResponse> = self.get_envelope("/api/impact/stats").await?;
        Ok(response.filter(|r| r.success).and_then(|r| r.stats))
    }

    async fn badges(&self) -> Result<Vec<Badge>, BackendError> {
        let response: Option<BadgesResponse> = self.get_envelope("/api/badges").await?;
        Ok(response.filter(|r| r.success).map(|r| r.badges).unwrap_or_default())
    }

    async fn create_goal(&self, goal: &NewGoal) -> Result<(), BackendError> {
        let response: Option<AckResponse> = self.post_envelope("/api/goals", goal).await?;
        Self::acknowledged(response, "goal creation")
    }
}
