use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One analyzed item in a basket. Carbon and health score come from the
/// analysis itself; name/image/brand may be backfilled after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketItem {
    pub barcode: String,
    #[serde(default)]
    pub product_name: Option<String>,
    /// kg CO2-equivalent, ≥ 0.
    pub carbon: f64,
    /// 0..=100.
    pub health_score: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Read-only aggregate over N products looked up by barcode. Does not own
/// product identity; item order is the input barcode order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketResult {
    pub total_items: usize,
    pub total_carbon: f64,
    pub avg_health_score: f64,
    pub items: Vec<BasketItem>,
}

impl BasketResult {
    /// Builds an aggregate holding the arithmetic invariants:
    /// `total_items == items.len()`, `total_carbon == Σ carbon`,
    /// `avg_health_score == mean(health_score)` (0 for an empty basket).
    pub fn from_items(items: Vec<BasketItem>) -> Self {
        let total_carbon = items.iter().map(|i| i.carbon).sum();
        let avg_health_score = if items.is_empty() {
            0.0
        } else {
            items.iter().map(|i| f64::from(i.health_score)).sum::<f64>() / items.len() as f64
        };
        BasketResult {
            total_items: items.len(),
            total_carbon,
            avg_health_score,
            items,
        }
    }
}

/// A basket analysis persisted to the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedBasket {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub result: BasketResult,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(barcode: &str, carbon: f64, health_score: u32) -> BasketItem {
        BasketItem {
            barcode: barcode.to_string(),
            product_name: None,
            carbon,
            health_score,
            image_url: None,
            brand: None,
        }
    }

    #[test]
    fn test_aggregate_arithmetic() {
        let result = BasketResult::from_items(vec![item("1", 1.0, 80), item("2", 2.5, 40)]);
        assert_eq!(result.total_items, 2);
        assert!((result.total_carbon - 3.5).abs() < 1e-9);
        assert!((result.avg_health_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_basket_aggregates_to_zero() {
        let result = BasketResult::from_items(vec![]);
        assert_eq!(result.total_items, 0);
        assert_eq!(result.total_carbon, 0.0);
        assert_eq!(result.avg_health_score, 0.0);
    }

    #[test]
    fn test_items_preserve_input_order() {
        let result = BasketResult::from_items(vec![item("b", 0.1, 10), item("a", 0.2, 20)]);
        let order: Vec<&str> = result.items.iter().map(|i| i.barcode.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
