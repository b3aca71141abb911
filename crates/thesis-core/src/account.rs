//! Account types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Experts are eligible to receive review
/// assignments; everyone can submit theses.
///
/// The password hash never leaves the storage layer, so this type is safe
/// to serialize into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub is_expert: bool,
    pub created_at: DateTime<Utc>,
}
