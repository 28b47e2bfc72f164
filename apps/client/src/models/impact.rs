use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated impact figures across saved baskets.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactStats {
    #[serde(default)]
    pub total_carbon_saved: f64,
    #[serde(default)]
    pub weekly_report: String,
    #[serde(default)]
    pub active_goals: Vec<Goal>,
    #[serde(default)]
    pub total_baskets: Option<u64>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub total_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Goal {
    pub id: i64,
    #[serde(rename = "type")]
    pub goal_type: String,
    pub description: String,
    pub target_value: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGoal {
    #[serde(rename = "type")]
    pub goal_type: String,
    pub description: String,
    pub target_value: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Badge {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
}

impl Default for NewGoal {
    fn default() -> Self {
        NewGoal {
            goal_type: "carbon_reduction".to_string(),
            description: "Reduce carbon footprint by 10%".to_string(),
            target_value: 10.0,
            progress: 0.0,
        }
    }
}
