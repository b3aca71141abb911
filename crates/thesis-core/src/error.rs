//! Error types for Thesis Review

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThesisError>;

/// Failure taxonomy for the review system. The `Display` strings are the
/// user-facing messages the API returns; the server maps each variant to
/// an HTTP status.
#[derive(Error, Debug)]
pub enum ThesisError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("account not found")]
    AccountNotFound,

    #[error("thesis not found")]
    ThesisNotFound(i64),

    #[error("you have already reviewed this thesis")]
    AlreadyReviewed,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("storage error: {0}")]
    Database(#[from] anyhow::Error),
}
