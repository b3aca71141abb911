//! Thesis types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a thesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThesisStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for ThesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThesisStatus::Pending => write!(f, "pending"),
            ThesisStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A submitted thesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: ThesisStatus,
    /// Stored name of the uploaded document, if any
    pub file_path: Option<String>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A thesis as served by the listing endpoint: the row itself plus the
/// author's username and the mean over its scored reviews (0 when none).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: ThesisStatus,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub average_score: f64,
}

/// Aggregate thesis counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThesisCounts {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ThesisStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert_eq!(
            serde_json::to_value(ThesisStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
    }

    #[test]
    fn test_status_display_matches_serialization() {
        assert_eq!(ThesisStatus::Pending.to_string(), "pending");
        assert_eq!(ThesisStatus::Completed.to_string(), "completed");
    }
}
