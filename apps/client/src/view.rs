//! Aggregate view assembler — fans out the three independent sub-resource
//! fetches (recommendations, macros, recipes) for a resolved product.
//!
//! This is deliberately a fan-out with no join barrier: each panel owns its
//! slot in the view model, settles on its own schedule, and a panel failure
//! never blocks, blanks, or errors the product view. A generation counter
//! keys every in-flight fetch to the view it was started for, so a slow
//! response for a superseded barcode is discarded instead of clobbering the
//! newer view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::backend::BackendApi;
use crate::models::panels::{Macros, Recipe, RecommendationData};
use crate::models::product::Product;
use crate::scoring::{derive_scores, ScoreBreakdown};

/// How many recipes a product view requests.
pub const RECIPE_COUNT: u32 = 2;

/// Score at or above which an empty alternatives list is presented as an
/// affirmation instead of nothing.
pub const EXCELLENT_SCORE: f64 = 80.0;

#[derive(Debug, Clone)]
pub enum Panel<T> {
    Loading,
    Ready(T),
    /// The fetch failed or had nothing to show; the panel is simply absent,
    /// never an error banner.
    Absent,
}

impl<T> Panel<T> {
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Panel::Absent)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }
}

#[derive(Debug, Clone)]
pub enum RecommendationsPanel {
    Alternatives(RecommendationData),
    /// The product is already excellent and there is nothing better to offer.
    Excellent { score: f64, tips: Vec<String> },
}

/// Decides how a recommendations payload is presented. `None` suppresses the
/// panel entirely. `current_score` is the resolved product's own score; the
/// payload's copy of it is display metadata, not the decision input.
pub fn classify_recommendations(
    data: RecommendationData,
    current_score: f64,
) -> Option<RecommendationsPanel> {
    let has_alternatives =
        !data.database_products.is_empty() || !data.ai_suggestions.is_empty();
    if has_alternatives {
        return Some(RecommendationsPanel::Alternatives(data));
    }
    if current_score >= EXCELLENT_SCORE {
        return Some(RecommendationsPanel::Excellent {
            score: current_score,
            tips: data.improvement_tips,
        });
    }
    None
}

/// The single current view model. Replaced atomically on each presentation;
/// panel tasks only ever write their own slot, and only while the generation
/// still matches.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub generation: u64,
    pub product: Product,
    pub breakdown: ScoreBreakdown,
    pub recommendations: Panel<RecommendationsPanel>,
    pub macros: Panel<Macros>,
    pub recipes: Panel<Vec<Recipe>>,
}

pub struct ViewAssembler {
    backend: Arc<dyn BackendApi>,
    view: Arc<Mutex<Option<ProductView>>>,
    generation: AtomicU64,
}

impl ViewAssembler {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        ViewAssembler {
            backend,
            view: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> Option<ProductView> {
        self.view.lock().expect("view lock poisoned").clone()
    }

    /// Replaces the current view with the given product (breakdown derived
    /// synchronously) and spawns the three panel fetches. The returned
    /// handles may be awaited to wait until every panel has settled; dropping
    /// them changes nothing, since each task writes the shared view directly.
    pub fn present(&self, product: Product) -> Vec<JoinHandle<()>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let breakdown = derive_scores(&product);
        let barcode = product.barcode.clone();
        let current_score = product.green_score.unwrap_or(0.0);

        {
            let mut slot = self.view.lock().expect("view lock poisoned");
            *slot = Some(ProductView {
                generation,
                product,
                breakdown,
                recommendations: Panel::Loading,
                macros: Panel::Loading,
                recipes: Panel::Loading,
            });
        }

        let recommendations = {
            let backend = Arc::clone(&self.backend);
            let view = Arc::clone(&self.view);
            let barcode = barcode.clone();
            tokio::spawn(async move {
                let panel = match backend.recommendations(&barcode).await {
                    Ok(Some(data)) => match classify_recommendations(data, current_score) {
                        Some(presented) => Panel::Ready(presented),
                        None => Panel::Absent,
                    },
                    Ok(None) => Panel::Absent,
                    Err(e) => {
                        debug!("recommendations fetch for {barcode} failed: {e}");
                        Panel::Absent
                    }
                };
                apply(&view, generation, &barcode, |v| v.recommendations = panel);
            })
        };

        let macros = {
            let backend = Arc::clone(&self.backend);
            let view = Arc::clone(&self.view);
            let barcode = barcode.clone();
            tokio::spawn(async move {
                let panel = match backend.macros(&barcode).await {
                    Ok(Some(macros)) => Panel::Ready(macros),
                    Ok(None) => Panel::Absent,
                    Err(e) => {
                        debug!("macros fetch for {barcode} failed: {e}");
                        Panel::Absent
                    }
                };
                apply(&view, generation, &barcode, |v| v.macros = panel);
            })
        };

        let recipes = {
            let backend = Arc::clone(&self.backend);
            let view = Arc::clone(&self.view);
            tokio::spawn(async move {
                let panel = match backend.recipes(&barcode, RECIPE_COUNT).await {
                    Ok(recipes) if !recipes.is_empty() => Panel::Ready(recipes),
                    Ok(_) => Panel::Absent,
                    Err(e) => {
                        debug!("recipes fetch for {barcode} failed: {e}");
                        Panel::Absent
                    }
                };
                apply(&view, generation, &barcode, |v| v.recipes = panel);
            })
        };

        vec![recommendations, macros, recipes]
    }
}

/// Writes one panel slot, unless the view has moved on to a newer generation,
/// in which case the late result is discarded.
fn apply<F>(view: &Arc<Mutex<Option<ProductView>>>, generation: u64, barcode: &str, write: F)
where
    F: FnOnce(&mut ProductView),
{
    let mut slot = view.lock().expect("view lock poisoned");
    match slot.as_mut() {
        Some(current) if current.generation == generation => write(current),
        _ => debug!("discarding stale panel result for {barcode}"),
    }
}
