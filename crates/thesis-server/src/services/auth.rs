//! Authentication service
//!
//! Passwords are hashed with Argon2 before they reach the database, and
//! logins hand out signed JWT bearer tokens.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::storage::Database;
use thesis_core::{Account, Result, ThesisError};

/// Tokens stay valid for a day; the frontend keeps one until logout
const TOKEN_TTL_HOURS: i64 = 24;

pub struct AuthService {
    db: Arc<Database>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: Arc<Database>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    /// Hash the password and create the account. Uniqueness and
    /// confirmation checks happen before this is called.
    pub async fn register(&self, username: &str, password: &str, is_expert: bool) -> Result<i64> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ThesisError::Database(anyhow::anyhow!("Failed to hash password: {e}")))?
            .to_string();

        let account_id = self.db.create_account(username, &password_hash, is_expert).await?;
        info!("Registered account {} (expert: {})", username, is_expert);
        Ok(account_id)
    }

    /// Verify credentials and issue a bearer token. Unknown usernames and
    /// wrong passwords produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, Account)> {
        if let Some((account, password_hash)) = self.db.get_account_by_username(username).await? {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| ThesisError::Database(anyhow::anyhow!("Stored hash is invalid: {e}")))?;

            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
            {
                let token = self.issue_token(account.id)?;
                return Ok((token, account));
            }
        }

        Err(ThesisError::InvalidCredentials)
    }

    /// Decode a bearer token back to the account id it was issued for
    pub fn validate_token(&self, token: &str) -> Result<i64> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ThesisError::InvalidToken(e.to_string()))?;

        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| ThesisError::InvalidToken("malformed subject".to_string()))
    }

    fn issue_token(&self, account_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ThesisError::Database(anyhow::anyhow!("Failed to sign token: {e}")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // account id
    exp: i64,    // expiration time
    iat: i64,    // issued at
}
