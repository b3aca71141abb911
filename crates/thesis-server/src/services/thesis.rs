//! Thesis submission, listing and statistics

use std::sync::Arc;
use tracing::info;

use crate::storage::{Database, ThesisFilter};
use thesis_core::{Result, ReviewEntry, ThesisCounts, ThesisError, ThesisStatus, ThesisSummary};

pub struct ThesisService {
    db: Arc<Database>,
}

impl ThesisService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, author_id: i64, title: &str, content: &str, file_path: Option<&str>) -> Result<i64> {
        let id = self.db.create_thesis(title, content, author_id, file_path).await?;
        info!("Created thesis {} ({:?}) by account {}", id, title, author_id);
        Ok(id)
    }

    /// List theses visible to the given viewer. Experts only see theses
    /// they hold a review slot on; authors and everyone else see all.
    pub async fn list(&self, viewer_id: i64, viewer_is_expert: bool, search: &str, status: &str) -> Result<Vec<ThesisSummary>> {
        let filter = ThesisFilter {
            search: search.to_string(),
            status: if status.is_empty() { "all".to_string() } else { status.to_string() },
            assigned_to: viewer_is_expert.then_some(viewer_id),
        };

        Ok(self.db.list_theses(&filter).await?)
    }

    /// Thesis detail: the summary plus every review with reviewer names
    pub async fn detail(&self, thesis_id: i64) -> Result<(ThesisSummary, Vec<ReviewEntry>)> {
        let summary = self
            .db
            .get_thesis_summary(thesis_id)
            .await?
            .ok_or(ThesisError::ThesisNotFound(thesis_id))?;
        let reviews = self.db.list_reviews_for_thesis(thesis_id).await?;

        Ok((summary, reviews))
    }

    pub async fn stats(&self) -> Result<ThesisCounts> {
        Ok(ThesisCounts {
            total: self.db.count_theses().await?,
            completed: self.db.count_theses_with_status(ThesisStatus::Completed).await?,
            pending: self.db.count_theses_with_status(ThesisStatus::Pending).await?,
        })
    }
}
