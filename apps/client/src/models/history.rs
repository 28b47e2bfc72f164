use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One past lookup. References a product by barcode only; the full record is
/// never embedded (relation + lookup, not ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub barcode: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub searched_at: DateTime<Utc>,
}
