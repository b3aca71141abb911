//! Review scoring

use std::sync::Arc;
use tracing::info;

use crate::storage::Database;
use thesis_core::{Result, ThesisError, ThesisStatus};

/// Number of scored reviews at which a thesis counts as fully reviewed
pub const REQUIRED_REVIEWS: i64 = 3;

pub struct ReviewService {
    db: Arc<Database>,
}

impl ReviewService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a reviewer's score for a thesis.
    ///
    /// An unscored slot created by assignment is completed in place; a
    /// second scored submission from the same reviewer is a duplicate.
    /// Once the scored count reaches [`REQUIRED_REVIEWS`] the thesis
    /// flips to completed.
    pub async fn submit(&self, thesis_id: i64, reviewer_id: i64, score: i64, comments: &str) -> Result<()> {
        let thesis = self
            .db
            .get_thesis(thesis_id)
            .await?
            .ok_or(ThesisError::ThesisNotFound(thesis_id))?;

        match self.db.find_review(thesis_id, reviewer_id).await? {
            Some(review) if review.is_scored() => return Err(ThesisError::AlreadyReviewed),
            Some(review) => self.db.complete_review(review.id, score, comments).await?,
            None => {
                self.db
                    .create_review(thesis_id, reviewer_id, Some(score), Some(comments))
                    .await?;
            }
        }

        let scored = self.db.count_scored_reviews_for_thesis(thesis_id).await?;
        if scored >= REQUIRED_REVIEWS && thesis.status == ThesisStatus::Pending {
            info!("Thesis {} reached {} scored reviews, marking completed", thesis_id, scored);
            self.db.update_thesis_status(thesis_id, ThesisStatus::Completed).await?;
        }

        Ok(())
    }
}
