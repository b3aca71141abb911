//! Review types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An expert's evaluation of a thesis.
///
/// A review with no score is an assignment placeholder: it was created by
/// the batch assignment operation and is completed later when the reviewer
/// submits a score through the scoring endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub thesis_id: i64,
    pub reviewer_id: i64,
    pub score: Option<i64>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Whether the reviewer has actually submitted a score yet
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}

/// A review joined with its reviewer's username, as served by the thesis
/// detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub score: Option<i64>,
    pub comments: Option<String>,
    pub reviewer: String,
    pub created_at: DateTime<Utc>,
}
