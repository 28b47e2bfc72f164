//! Scan history and saved-basket ledger, kept server-side and read back
//! newest-first.

use std::sync::Arc;

use crate::backend::BackendApi;
use crate::errors::AppError;
use crate::models::basket::SavedBasket;
use crate::models::history::HistoryEntry;

pub struct Ledger {
    backend: Arc<dyn BackendApi>,
}

impl Ledger {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Ledger { backend }
    }

    pub async fn append(&self, barcode: &str, product_name: Option<&str>) -> Result<(), AppError> {
        let entry = HistoryEntry {
            barcode: barcode.to_string(),
            product_name: product_name.map(str::to_string),
            searched_at: chrono::Utc::now(),
        };
        self.backend.record_search(&entry).await?;
        Ok(())
    }

    /// Scan history, most recent first.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        let mut entries = self.backend.history().await?;
        entries.sort_by(|a, b| b.searched_at.cmp(&a.searched_at));
        Ok(entries)
    }

    /// Erases the whole scan history. Destructive; call sites must confirm
    /// with the user before invoking.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.backend.clear_history().await?;
        Ok(())
    }

    /// Previously analyzed baskets, most recent first.
    pub async fn recent_baskets(&self) -> Result<Vec<SavedBasket>, AppError> {
        let mut baskets = self.backend.saved_baskets().await?;
        baskets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(baskets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBackend;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_history_is_listed_newest_first() {
        let backend = Arc::new(MockBackend::default());
        let now = Utc::now();
        *backend.history.lock().unwrap() = vec![
            HistoryEntry {
                barcode: "old".to_string(),
                product_name: None,
                searched_at: now - Duration::hours(2),
            },
            HistoryEntry {
                barcode: "new".to_string(),
                product_name: None,
                searched_at: now,
            },
            HistoryEntry {
                barcode: "middle".to_string(),
                product_name: None,
                searched_at: now - Duration::hours(1),
            },
        ];
        let ledger = Ledger::new(backend);

        let entries = ledger.list().await.unwrap();
        let order: Vec<&str> = entries.iter().map(|e| e.barcode.as_str()).collect();
        assert_eq!(order, ["new", "middle", "old"]);
    }

    #[tokio::test]
    async fn test_append_records_the_search() {
        let backend = Arc::new(MockBackend::default());
        let ledger = Ledger::new(backend.clone());

        ledger.append("123", Some("Oat Milk")).await.unwrap();
        let history = backend.history.lock().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].barcode, "123");
        assert_eq!(history[0].product_name.as_deref(), Some("Oat Milk"));
    }

    #[tokio::test]
    async fn test_clear_empties_the_history() {
        let backend = Arc::new(MockBackend::default());
        let ledger = Ledger::new(backend.clone());
        ledger.append("123", None).await.unwrap();

        ledger.clear().await.unwrap();
        assert!(backend.history.lock().unwrap().is_empty());
    }
}
