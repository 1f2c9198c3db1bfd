//! Store-backed OAuth token management.
//!
//! This module provides the [`TokenManager`] struct which supplies a valid
//! bearer token for Helix calls. The current access token lives in the shared
//! key-value store so that every invocation of the bot sees the same token;
//! the configuration-supplied bootstrap token is only used until the first
//! refresh has been persisted.

use std::fmt;

use log::{debug, error, info};
use reqwest::Client;

use crate::config::Twitch;
use crate::store::{KvStore, StoreError};
use crate::twitch::response_structs::TokenResponse;

/// Store key holding the current access token.
pub const ACCESS_TOKEN_KEY: &str = "twitch_access_token";
/// Store key holding the current refresh token.
pub const REFRESH_TOKEN_KEY: &str = "twitch_refresh_token";

/// Errors that can occur while obtaining or refreshing an access token.
///
/// # Variants
///
/// * `Refresh` - The token endpoint answered with a non-success status.
///   Fatal for the current invocation; no further retry is attempted.
/// * `Transport` - The token endpoint could not be reached or answered with
///   an unreadable body.
/// * `Store` - The key-value store failed while reading or persisting tokens.
#[derive(Debug)]
pub enum TokenError {
    /// The refresh-token exchange was rejected with this HTTP status.
    Refresh(u16),
    /// HTTP transport failure while talking to the token endpoint.
    Transport(reqwest::Error),
    /// Store failure while reading or persisting tokens.
    Store(StoreError),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Refresh(status) => {
                write!(f, "token refresh rejected with status {}", status)
            }
            TokenError::Transport(error) => write!(f, "token endpoint unreachable: {}", error),
            TokenError::Store(error) => write!(f, "token store failure: {}", error),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<reqwest::Error> for TokenError {
    fn from(error: reqwest::Error) -> Self {
        TokenError::Transport(error)
    }
}

impl From<StoreError> for TokenError {
    fn from(error: StoreError) -> Self {
        TokenError::Store(error)
    }
}

/// Supplies and refreshes the OAuth access token for Helix calls.
///
/// Stateless apart from the shared store: concurrent invocations that refresh
/// at the same time simply overwrite each other with equally valid tokens.
///
/// # Examples
///
/// ```no_run
/// # use shoutbot::store::RedisStore;
/// # use shoutbot::twitch::TokenManager;
/// # async fn example(store: RedisStore, config: shoutbot::config::Twitch) {
/// let tokens = TokenManager::new(store, reqwest::Client::new(), &config);
/// let bearer = tokens.get_token().await.unwrap();
/// # }
/// ```
pub struct TokenManager<S: KvStore> {
    /// Shared key-value store holding the current tokens
    store: S,
    /// HTTP client for the token endpoint
    client: Client,
    /// OAuth token endpoint URL
    auth_url: String,
    /// Twitch application client id
    client_id: String,
    /// Twitch application client secret
    client_secret: String,
    /// Access token used until the store holds a refreshed one
    bootstrap_access_token: String,
    /// Refresh token used until Twitch rotates it
    bootstrap_refresh_token: String,
}

impl<S: KvStore> TokenManager<S> {
    /// Creates a new [`TokenManager`].
    ///
    /// # Arguments
    ///
    /// * `store` - Shared key-value store.
    /// * `client` - HTTP client used for the token endpoint.
    /// * `twitch` - Twitch configuration section with credentials and the
    ///   token endpoint URL.
    pub fn new(store: S, client: Client, twitch: &Twitch) -> Self {
        TokenManager {
            store,
            client,
            auth_url: twitch.auth_url.clone(),
            client_id: twitch.client_id.clone(),
            client_secret: twitch.client_secret.clone(),
            bootstrap_access_token: twitch.access_token.clone(),
            bootstrap_refresh_token: twitch.refresh_token.clone(),
        }
    }

    /// Returns the current access token.
    ///
    /// Reads the token from the store and falls back to the bootstrap token
    /// from the configuration when the store has never been written.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        let stored = self.store.get(ACCESS_TOKEN_KEY).await?;
        Ok(stored.unwrap_or_else(|| self.bootstrap_access_token.clone()))
    }

    /// Exchanges the refresh token for a new access token and persists it.
    ///
    /// When Twitch rotates the refresh token during the exchange, the rotated
    /// value is persisted as well so later refreshes keep working.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Refresh`] when the token endpoint answers with a
    /// non-success status. This is fatal for the calling request.
    pub async fn refresh_token(&self) -> Result<String, TokenError> {
        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .await?
            .unwrap_or_else(|| self.bootstrap_refresh_token.clone());

        info!("refreshing twitch access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&self.auth_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("failed to refresh twitch access token, status {}", status);
            return Err(TokenError::Refresh(status.as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        self.store.set(ACCESS_TOKEN_KEY, &token.access_token).await?;
        if let Some(rotated) = &token.refresh_token {
            debug!("twitch rotated the refresh token");
            self.store.set(REFRESH_TOKEN_KEY, rotated).await?;
        }

        Ok(token.access_token)
    }
}
