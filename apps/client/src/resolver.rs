//! Product resolver — tries source adapters strictly in priority order and
//! short-circuits on the first hit. Partial results are never merged across
//! adapters.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::BackendApi;
use crate::errors::AppError;
use crate::models::history::HistoryEntry;
use crate::models::product::Product;
use crate::sources::{ProductSource, SourceOutcome};

pub struct ProductResolver {
    sources: Vec<Arc<dyn ProductSource>>,
    backend: Arc<dyn BackendApi>,
}

impl ProductResolver {
    pub fn new(sources: Vec<Arc<dyn ProductSource>>, backend: Arc<dyn BackendApi>) -> Self {
        ProductResolver { sources, backend }
    }

    /// Resolves a barcode to the canonical product.
    ///
    /// `NotFound` means at least one source answered and none knew the
    /// barcode; `Connectivity` means zero sources were reachable and a retry
    /// may help. An empty barcode fails fast without any network call.
    pub async fn resolve(&self, barcode: &str) -> Result<Product, AppError> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(AppError::Validation("barcode must not be empty".to_string()));
        }

        let mut reachable = 0usize;
        for source in &self.sources {
            match source.resolve(barcode).await {
                SourceOutcome::Found(product) => {
                    info!("resolved {barcode} via {}", source.name());
                    self.record_resolution(&product);
                    return Ok(product);
                }
                SourceOutcome::NotFound => {
                    debug!("{} has no product for {barcode}", source.name());
                    reachable += 1;
                }
                SourceOutcome::Unreachable => {
                    warn!("{} unreachable while resolving {barcode}", source.name());
                }
            }
        }

        if reachable == 0 {
            Err(AppError::Connectivity(
                "no product source reachable".to_string(),
            ))
        } else {
            Err(AppError::NotFound(barcode.to_string()))
        }
    }

    /// Fire-and-forget history append and product upsert. Persistence is a
    /// side effect of resolution, never a precondition of display; failures
    /// are logged and swallowed.
    fn record_resolution(&self, product: &Product) {
        let backend = Arc::clone(&self.backend);
        let product = product.clone();
        tokio::spawn(async move {
            let entry = HistoryEntry {
                barcode: product.barcode.clone(),
                product_name: product.name.clone(),
                searched_at: Utc::now(),
            };
            if let Err(e) = backend.record_search(&entry).await {
                warn!("failed to record search history: {e}");
            }
            if let Err(e) = backend.upsert_product(&product).await {
                warn!("failed to persist product: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_product, MockBackend};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted source that logs every invocation into a shared journal.
    struct ScriptedSource {
        name: &'static str,
        outcome: fn(&str) -> SourceOutcome,
        journal: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ProductSource for ScriptedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn resolve(&self, barcode: &str) -> SourceOutcome {
            self.journal.lock().unwrap().push(self.name);
            (self.outcome)(barcode)
        }
    }

    fn scripted(
        name: &'static str,
        outcome: fn(&str) -> SourceOutcome,
        journal: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn ProductSource> {
        Arc::new(ScriptedSource {
            name,
            outcome,
            journal: Arc::clone(journal),
        })
    }

    fn resolver(
        sources: Vec<Arc<dyn ProductSource>>,
    ) -> (ProductResolver, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::default());
        (
            ProductResolver::new(sources, backend.clone() as Arc<dyn BackendApi>),
            backend,
        )
    }

    #[tokio::test]
    async fn test_fallback_order_first_miss_second_hit() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![
            scripted("first", |_| SourceOutcome::NotFound, &journal),
            scripted(
                "second",
                |code| SourceOutcome::Found(make_product(code, Some("From second"))),
                &journal,
            ),
        ]);

        let product = resolver.resolve("123").await.unwrap();
        assert_eq!(product.name.as_deref(), Some("From second"));
        // both sequencing and order, not just the result
        assert_eq!(*journal.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_first_hit_short_circuits() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![
            scripted(
                "first",
                |code| SourceOutcome::Found(make_product(code, Some("From first"))),
                &journal,
            ),
            scripted("second", |_| SourceOutcome::NotFound, &journal),
        ]);

        let product = resolver.resolve("123").await.unwrap();
        assert_eq!(product.name.as_deref(), Some("From first"));
        assert_eq!(*journal.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_all_miss_is_not_found() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![
            scripted("first", |_| SourceOutcome::NotFound, &journal),
            scripted("second", |_| SourceOutcome::NotFound, &journal),
        ]);

        assert!(matches!(
            resolver.resolve("123").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_all_unreachable_is_connectivity() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![
            scripted("first", |_| SourceOutcome::Unreachable, &journal),
            scripted("second", |_| SourceOutcome::Unreachable, &journal),
        ]);

        assert!(matches!(
            resolver.resolve("123").await,
            Err(AppError::Connectivity(_))
        ));
    }

    #[tokio::test]
    async fn test_mixed_miss_and_unreachable_is_not_found() {
        // one source genuinely answered "unknown barcode", so this is not a
        // connectivity problem
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![
            scripted("first", |_| SourceOutcome::NotFound, &journal),
            scripted("second", |_| SourceOutcome::Unreachable, &journal),
        ]);

        assert!(matches!(
            resolver.resolve("123").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_barcode_fails_fast_without_source_calls() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![scripted(
            "first",
            |_| SourceOutcome::NotFound,
            &journal,
        )]);

        assert!(matches!(
            resolver.resolve("   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_barcode_is_trimmed_before_lookup() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, _) = resolver(vec![scripted(
            "first",
            |code| {
                assert_eq!(code, "123");
                SourceOutcome::Found(make_product(code, None))
            },
            &journal,
        )]);

        let product = resolver.resolve("  123  ").await.unwrap();
        assert_eq!(product.barcode, "123");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_records_history_and_upserts() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, backend) = resolver(vec![scripted(
            "first",
            |code| SourceOutcome::Found(make_product(code, Some("Oat Drink"))),
            &journal,
        )]);

        resolver.resolve("123").await.unwrap();
        // the side effect is spawned; give the task queue a turn
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let history = backend.history.lock().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].barcode, "123");
        assert_eq!(history[0].product_name.as_deref(), Some("Oat Drink"));
        assert_eq!(backend.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_never_surfaces() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let (resolver, backend) = resolver(vec![scripted(
            "first",
            |code| SourceOutcome::Found(make_product(code, None)),
            &journal,
        )]);
        backend.fail_writes.store(true, std::sync::atomic::Ordering::SeqCst);

        let resolved = resolver.resolve("123").await;
        assert!(resolved.is_ok());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
