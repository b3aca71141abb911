//! Reviewer assignment
//!
//! Distributes pending theses across the expert pool by creating
//! unscored review slots that the scoring endpoint later fills in.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

use crate::storage::Database;
use thesis_core::{Account, Result};

/// Reviewers wanted per thesis
pub const REVIEWERS_PER_THESIS: usize = 3;
/// Ceiling on any single expert's total review load
pub const MAX_REVIEWS_PER_EXPERT: i64 = 10;

pub struct AssignmentService {
    db: Arc<Database>,
}

impl AssignmentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Assign experts to every pending thesis that still has open slots.
    ///
    /// Safe to run repeatedly: a thesis already holding
    /// [`REVIEWERS_PER_THESIS`] review rows is skipped, and an expert is
    /// never assigned the same thesis twice. The caller supplies the
    /// random source so tests can seed it. Returns the number of review
    /// slots created.
    pub async fn assign_pending<R: Rng>(&self, rng: &mut R) -> Result<u64> {
        let experts = self.db.list_experts().await?;
        let pending = self.db.list_pending_theses().await?;
        info!("Assigning reviewers: {} experts, {} pending theses", experts.len(), pending.len());

        let mut created = 0u64;
        for thesis in &pending {
            let existing = self.db.list_reviewer_ids_for_thesis(thesis.id).await?;
            if existing.len() >= REVIEWERS_PER_THESIS {
                continue;
            }

            let candidates: Vec<&Account> = experts
                .iter()
                .filter(|e| !existing.contains(&e.id))
                .collect();
            let needed = (REVIEWERS_PER_THESIS - existing.len()).min(candidates.len());

            // The load cap is checked after sampling, so a fully loaded
            // expert consumes one of the sampled slots without receiving
            // an assignment.
            for expert in candidates.choose_multiple(rng, needed) {
                let load = self.db.count_reviews_by_reviewer(expert.id).await?;
                if load < MAX_REVIEWS_PER_EXPERT {
                    self.db.create_review(thesis.id, expert.id, None, None).await?;
                    created += 1;
                }
            }
        }

        info!("Assignment created {} review slots", created);
        Ok(created)
    }
}
