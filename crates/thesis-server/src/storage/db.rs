//! SQLite database operations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use thesis_core::{Account, Review, ReviewEntry, Thesis, ThesisStatus, ThesisSummary};
use tracing::info;

/// Filters applied by the thesis listing query
#[derive(Debug, Clone)]
pub struct ThesisFilter {
    /// Case-insensitive title substring; empty matches everything
    pub search: String,
    /// Status filter; "all" disables it, unknown values match nothing
    pub status: String,
    /// Restrict to theses that have a review row for this account
    pub assigned_to: Option<i64>,
}

impl Default for ThesisFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: "all".to_string(),
            assigned_to: None,
        }
    }
}

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Open (creating if necessary) the database at the given path
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = Path::new(database_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {database_path}"))?;

        Self::run_migrations(&pool).await?;
        info!("Database ready at {}", database_path);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// In-memory database for tests. A `:memory:` database exists per
    /// connection, so the pool is pinned to a single connection.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_expert BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create accounts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS theses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                file_path TEXT,
                author_id INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create theses table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thesis_id INTEGER NOT NULL,
                reviewer_id INTEGER NOT NULL,
                score INTEGER,
                comments TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create reviews table")?;

        Ok(())
    }

    // ===== Account operations =====

    pub async fn create_account(&self, username: &str, password_hash: &str, is_expert: bool) -> Result<i64> {
        let result = sqlx::query("INSERT INTO accounts (username, password_hash, is_expert) VALUES (?1, ?2, ?3)")
            .bind(username)
            .bind(password_hash)
            .bind(is_expert)
            .execute(&*self.pool)
            .await
            .context("Failed to create account")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, is_expert, created_at FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to get account")?;

        Ok(row.map(Account::from))
    }

    /// Look up an account together with its stored password hash
    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<(Account, String)>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, password_hash, is_expert, created_at FROM accounts WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to get account by username")?;

        Ok(row.map(|r| {
            let account = Account {
                id: r.id,
                username: r.username,
                is_expert: r.is_expert,
                created_at: r.created_at,
            };
            (account, r.password_hash)
        }))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE username = ?1")
            .bind(username)
            .fetch_one(&*self.pool)
            .await
            .context("Failed to check username")?;

        Ok(count > 0)
    }

    pub async fn list_experts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, is_expert, created_at FROM accounts WHERE is_expert = 1 ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .context("Failed to list experts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    // ===== Thesis operations =====

    pub async fn create_thesis(&self, title: &str, content: &str, author_id: i64, file_path: Option<&str>) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO theses (title, content, author_id, file_path) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .bind(file_path)
        .execute(&*self.pool)
        .await
        .context("Failed to create thesis")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_thesis(&self, id: i64) -> Result<Option<Thesis>> {
        let row = sqlx::query_as::<_, ThesisRow>(
            "SELECT id, title, content, status, file_path, author_id, created_at FROM theses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to get thesis")?;

        Ok(row.map(Thesis::from))
    }

    /// Listing rows enriched with the author name and the average of the
    /// scored reviews (0 when nothing is scored yet), newest first.
    pub async fn list_theses(&self, filter: &ThesisFilter) -> Result<Vec<ThesisSummary>> {
        let rows = sqlx::query_as::<_, ThesisSummaryRow>(
            r#"
            SELECT t.id, t.title, t.content, t.status, t.file_path, t.created_at,
                   a.username AS author,
                   COALESCE((SELECT AVG(r.score) FROM reviews r WHERE r.thesis_id = t.id), 0.0) AS average_score
            FROM theses t
            JOIN accounts a ON a.id = t.author_id
            WHERE (?1 IS NULL OR EXISTS (
                      SELECT 1 FROM reviews r WHERE r.thesis_id = t.id AND r.reviewer_id = ?1))
              AND (?2 = '' OR LOWER(t.title) LIKE '%' || LOWER(?2) || '%')
              AND (?3 = 'all' OR t.status = ?3)
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(filter.assigned_to)
        .bind(&filter.search)
        .bind(&filter.status)
        .fetch_all(&*self.pool)
        .await
        .context("Failed to list theses")?;

        Ok(rows.into_iter().map(ThesisSummary::from).collect())
    }

    pub async fn get_thesis_summary(&self, id: i64) -> Result<Option<ThesisSummary>> {
        let row = sqlx::query_as::<_, ThesisSummaryRow>(
            r#"
            SELECT t.id, t.title, t.content, t.status, t.file_path, t.created_at,
                   a.username AS author,
                   COALESCE((SELECT AVG(r.score) FROM reviews r WHERE r.thesis_id = t.id), 0.0) AS average_score
            FROM theses t
            JOIN accounts a ON a.id = t.author_id
            WHERE t.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to get thesis summary")?;

        Ok(row.map(ThesisSummary::from))
    }

    pub async fn update_thesis_status(&self, id: i64, status: ThesisStatus) -> Result<()> {
        sqlx::query("UPDATE theses SET status = ?1 WHERE id = ?2")
            .bind(status.to_string())
            .bind(id)
            .execute(&*self.pool)
            .await
            .context("Failed to update thesis status")?;

        Ok(())
    }

    pub async fn list_pending_theses(&self) -> Result<Vec<Thesis>> {
        let rows = sqlx::query_as::<_, ThesisRow>(
            "SELECT id, title, content, status, file_path, author_id, created_at FROM theses WHERE status = 'pending' ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .context("Failed to list pending theses")?;

        Ok(rows.into_iter().map(Thesis::from).collect())
    }

    pub async fn count_theses(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM theses")
            .fetch_one(&*self.pool)
            .await
            .context("Failed to count theses")?;

        Ok(count)
    }

    pub async fn count_theses_with_status(&self, status: ThesisStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM theses WHERE status = ?1")
            .bind(status.to_string())
            .fetch_one(&*self.pool)
            .await
            .context("Failed to count theses by status")?;

        Ok(count)
    }

    // ===== Review operations =====

    /// Insert a review row. Assignment passes `None` for the score to
    /// record an open slot; scoring passes the actual values.
    pub async fn create_review(&self, thesis_id: i64, reviewer_id: i64, score: Option<i64>, comments: Option<&str>) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO reviews (thesis_id, reviewer_id, score, comments) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(thesis_id)
        .bind(reviewer_id)
        .bind(score)
        .bind(comments)
        .execute(&*self.pool)
        .await
        .context("Failed to create review")?;

        Ok(result.last_insert_rowid())
    }

    /// Fill in the score and comments of an assigned review slot
    pub async fn complete_review(&self, review_id: i64, score: i64, comments: &str) -> Result<()> {
        sqlx::query("UPDATE reviews SET score = ?1, comments = ?2 WHERE id = ?3")
            .bind(score)
            .bind(comments)
            .bind(review_id)
            .execute(&*self.pool)
            .await
            .context("Failed to complete review")?;

        Ok(())
    }

    pub async fn find_review(&self, thesis_id: i64, reviewer_id: i64) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, thesis_id, reviewer_id, score, comments, created_at FROM reviews WHERE thesis_id = ?1 AND reviewer_id = ?2",
        )
        .bind(thesis_id)
        .bind(reviewer_id)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to find review")?;

        Ok(row.map(Review::from))
    }

    pub async fn list_reviews_for_thesis(&self, thesis_id: i64) -> Result<Vec<ReviewEntry>> {
        let rows = sqlx::query_as::<_, ReviewEntryRow>(
            r#"
            SELECT r.score, r.comments, a.username AS reviewer, r.created_at
            FROM reviews r
            JOIN accounts a ON a.id = r.reviewer_id
            WHERE r.thesis_id = ?1
            ORDER BY r.id
            "#,
        )
        .bind(thesis_id)
        .fetch_all(&*self.pool)
        .await
        .context("Failed to list reviews")?;

        Ok(rows.into_iter().map(ReviewEntry::from).collect())
    }

    pub async fn count_scored_reviews_for_thesis(&self, thesis_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE thesis_id = ?1 AND score IS NOT NULL",
        )
        .bind(thesis_id)
        .fetch_one(&*self.pool)
        .await
        .context("Failed to count scored reviews")?;

        Ok(count)
    }

    pub async fn count_reviews_by_reviewer(&self, reviewer_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE reviewer_id = ?1")
            .bind(reviewer_id)
            .fetch_one(&*self.pool)
            .await
            .context("Failed to count reviewer load")?;

        Ok(count)
    }

    pub async fn list_reviewer_ids_for_thesis(&self, thesis_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT reviewer_id FROM reviews WHERE thesis_id = ?1 ORDER BY id")
            .bind(thesis_id)
            .fetch_all(&*self.pool)
            .await
            .context("Failed to list reviewers")?;

        Ok(ids)
    }
}

// ===== Row types =====

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    is_expert: bool,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            is_expert: row.is_expert,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    password_hash: String,
    is_expert: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ThesisRow {
    id: i64,
    title: String,
    content: String,
    status: String,
    file_path: Option<String>,
    author_id: i64,
    created_at: DateTime<Utc>,
}

impl From<ThesisRow> for Thesis {
    fn from(row: ThesisRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            status: parse_thesis_status(&row.status),
            file_path: row.file_path,
            author_id: row.author_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ThesisSummaryRow {
    id: i64,
    title: String,
    content: String,
    status: String,
    file_path: Option<String>,
    created_at: DateTime<Utc>,
    author: String,
    average_score: f64,
}

impl From<ThesisSummaryRow> for ThesisSummary {
    fn from(row: ThesisSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            status: parse_thesis_status(&row.status),
            file_path: row.file_path,
            created_at: row.created_at,
            author: row.author,
            average_score: row.average_score,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    thesis_id: i64,
    reviewer_id: i64,
    score: Option<i64>,
    comments: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            thesis_id: row.thesis_id,
            reviewer_id: row.reviewer_id,
            score: row.score,
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewEntryRow {
    score: Option<i64>,
    comments: Option<String>,
    reviewer: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewEntryRow> for ReviewEntry {
    fn from(row: ReviewEntryRow) -> Self {
        Self {
            score: row.score,
            comments: row.comments,
            reviewer: row.reviewer,
            created_at: row.created_at,
        }
    }
}

fn parse_thesis_status(s: &str) -> ThesisStatus {
    match s {
        "completed" => ThesisStatus::Completed,
        _ => ThesisStatus::Pending,
    }
}
