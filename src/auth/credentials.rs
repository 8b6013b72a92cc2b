use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use super::password::{hash_password, verify_password};
use super::token::TokenService;
use crate::errors::AppError;
use crate::models::user::{Identity, UserRow};
use crate::store::UserStore;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Same message for unknown user and wrong password, so logins can't be used
/// to probe which usernames exist.
const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Verified against when the username is unknown, so both failure paths pay for argon2.
const DUMMY_PASSWORD: &str = "loan-tracker-dummy-password";

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub username: String,
}

/// Registration and login on top of a [`UserStore`] and the [`TokenService`].
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self {
            users,
            tokens,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<UserRow, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("username is required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = hash_blocking(password.to_string()).await?;

        match self.users.create_user(username, &hash).await? {
            Some(user) => {
                tracing::info!(username = %user.username, user_id = %user.id, "user registered");
                Ok(user)
            }
            None => {
                tracing::debug!(username = %username, "registration rejected: username taken");
                Err(AppError::Conflict("username already taken".into()))
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.users.find_user_by_username(username.trim()).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_blocking(DUMMY_PASSWORD.to_string()))
                .await?
                .clone();
            verify_blocking(password.to_string(), dummy).await?;
            tracing::debug!("login failed: unknown username");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
        };

        let matches = verify_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !matches {
            tracing::debug!(username = %user.username, "login failed: wrong password");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
        }

        let identity = Identity::from(&user);
        let token = self
            .tokens
            .issue(&identity)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        tracing::info!(username = %user.username, "login succeeded");

        Ok(LoginOutcome {
            token,
            username: user.username,
        })
    }
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}
