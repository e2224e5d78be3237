use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::time_limit::TimeLimit;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<TimeLimit>, // "HH:MM:SS" on the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_public() -> bool {
    true
}

impl Quiz {
    /// Countdown length for an attempt, `None` when the quiz is untimed.
    pub fn countdown_secs(&self) -> Option<u64> {
        self.time_limit
            .filter(|limit| !limit.is_zero())
            .map(|limit| limit.as_secs())
    }
}
