//! HTTP client for the Twitch Helix API.
//!
//! This module provides the [`HelixRequester`] struct for the three Helix
//! operations the shoutout coordinator needs: resolving a login to a user,
//! checking whether a channel is live, and posting a shoutout.

use std::fmt;

use log::{debug, info, warn};
use mockall::automock;
use reqwest::{Client, StatusCode};

use crate::config::Twitch;
use crate::store::KvStore;
use crate::twitch::response_structs::{HelixUser, StreamsResponse, UsersResponse};
use crate::twitch::tokens::{TokenError, TokenManager};

/// Header carrying the Twitch application client id.
const CLIENT_ID_HEADER: &str = "Client-ID";

/// Errors that can occur while talking to the Helix API.
///
/// # Variants
///
/// * `Transport` - The API could not be reached or answered with an
///   unreadable body.
/// * `Token` - No valid bearer token could be obtained.
#[derive(Debug)]
pub enum HelixError {
    /// HTTP transport failure
    Transport(reqwest::Error),
    /// Token acquisition or refresh failure
    Token(TokenError),
}

impl fmt::Display for HelixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelixError::Transport(error) => write!(f, "helix api unreachable: {}", error),
            HelixError::Token(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for HelixError {}

impl From<reqwest::Error> for HelixError {
    fn from(error: reqwest::Error) -> Self {
        HelixError::Transport(error)
    }
}

impl From<TokenError> for HelixError {
    fn from(error: TokenError) -> Self {
        HelixError::Token(error)
    }
}

/// Trait for the Helix operations used by the shoutout coordinator.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
pub trait Requester {
    /// Resolves a login name to a Helix user, `None` when unknown.
    async fn get_user(&self, login: &str) -> Result<Option<HelixUser>, HelixError>;
    /// Checks whether the channel of `user_id` is currently live.
    async fn is_live(&self, user_id: &str) -> Result<bool, HelixError>;
    /// Posts a shoutout to `to_broadcaster_id`, `true` iff Twitch answered 2xx.
    async fn send_shoutout(&self, to_broadcaster_id: &str) -> Result<bool, HelixError>;
}

/// HTTP client for the Helix endpoints the bot relies on.
///
/// All calls are authenticated through the [`TokenManager`]: the bearer token
/// is attached to every request, and a 401 answer triggers exactly one token
/// refresh followed by one retry. The response of the retry is returned
/// untouched, whatever its status.
pub struct HelixRequester<S: KvStore> {
    /// Token manager supplying the bearer token
    tokens: TokenManager<S>,
    /// HTTP client
    client: Client,
    /// Base URL of the Helix API
    helix_url: String,
    /// Twitch application client id
    client_id: String,
    /// Broadcaster the shoutouts are sent from
    broadcaster_id: String,
    /// Moderator account performing the shoutout
    moderator_id: String,
}

impl<S: KvStore> HelixRequester<S> {
    /// Creates a new [`HelixRequester`].
    ///
    /// # Arguments
    ///
    /// * `tokens` - Token manager supplying and refreshing the bearer token.
    /// * `client` - HTTP client used for all Helix calls.
    /// * `twitch` - Twitch configuration section.
    pub fn new(tokens: TokenManager<S>, client: Client, twitch: &Twitch) -> Self {
        HelixRequester {
            tokens,
            client,
            helix_url: twitch.helix_url.clone(),
            client_id: twitch.client_id.clone(),
            broadcaster_id: twitch.broadcaster_id.clone(),
            moderator_id: twitch.moderator_id.clone(),
        }
    }

    /// Sends a request with the current bearer token attached.
    ///
    /// On a 401 answer the token is refreshed once and the request is rebuilt
    /// and retried with the new token. The second response is returned as-is.
    async fn send_with_refresh<F>(&self, build: F) -> Result<reqwest::Response, HelixError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let token = self.tokens.get_token().await?;
        let response = build()
            .header(CLIENT_ID_HEADER, &self.client_id)
            .bearer_auth(&token)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("helix answered 401, refreshing token and retrying once");
        let token = self.tokens.refresh_token().await?;
        Ok(build()
            .header(CLIENT_ID_HEADER, &self.client_id)
            .bearer_auth(&token)
            .send()
            .await?)
    }
}

impl<S: KvStore> Requester for HelixRequester<S> {
    /// Request `GET /users?login={login}` to resolve a login name.
    ///
    /// An unknown login yields an empty `data` array, which maps to `None`.
    /// Non-success statuses are treated as unresolvable as well.
    async fn get_user(&self, login: &str) -> Result<Option<HelixUser>, HelixError> {
        let url = format!("{}/users", &self.helix_url);
        info!("resolve twitch login {}", login);

        let response = self
            .send_with_refresh(|| self.client.get(&url).query(&[("login", login)]))
            .await?;
        if !response.status().is_success() {
            warn!(
                "user lookup for {} answered status {}",
                login,
                response.status()
            );
            return Ok(None);
        }

        let users: UsersResponse = response.json().await?;
        debug!("response from {}?login={} -> {:?}", &url, login, &users);

        Ok(users.data.into_iter().next())
    }

    /// Request `GET /streams?user_id={user_id}` to check liveness.
    ///
    /// The channel is live iff the `data` array is non-empty.
    async fn is_live(&self, user_id: &str) -> Result<bool, HelixError> {
        let url = format!("{}/streams", &self.helix_url);
        info!("check live status of channel {}", user_id);

        let response = self
            .send_with_refresh(|| self.client.get(&url).query(&[("user_id", user_id)]))
            .await?;
        if !response.status().is_success() {
            warn!(
                "stream lookup for {} answered status {}",
                user_id,
                response.status()
            );
            return Ok(false);
        }

        let streams: StreamsResponse = response.json().await?;
        debug!("response from {}?user_id={} -> {:?}", &url, user_id, &streams);

        Ok(!streams.data.is_empty())
    }

    /// Request `POST /chat/shoutouts` to send the shoutout.
    ///
    /// Succeeds iff Twitch answers with a 2xx status; any other status is a
    /// failed execution, reported as `Ok(false)` so the caller can apply its
    /// re-enqueue policy.
    async fn send_shoutout(&self, to_broadcaster_id: &str) -> Result<bool, HelixError> {
        let url = format!("{}/chat/shoutouts", &self.helix_url);
        info!(
            "send shoutout from {} to {}",
            &self.broadcaster_id, to_broadcaster_id
        );

        let body = serde_json::json!({
            "from_broadcaster_id": &self.broadcaster_id,
            "to_broadcaster_id": to_broadcaster_id,
            "moderator_id": &self.moderator_id,
        });
        let response = self
            .send_with_refresh(|| self.client.post(&url).json(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("shoutout to {} answered status {}", to_broadcaster_id, status);
        }
        Ok(status.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::twitch::tokens::ACCESS_TOKEN_KEY;

    fn twitch_config(base_url: &str) -> Twitch {
        Twitch {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            broadcaster_id: "111".to_string(),
            moderator_id: "222".to_string(),
            access_token: "bootstrap-access".to_string(),
            refresh_token: "bootstrap-refresh".to_string(),
            helix_url: base_url.to_string(),
            auth_url: format!("{}/oauth2/token", base_url),
        }
    }

    async fn requester_with_token(base_url: &str, token: &str) -> HelixRequester<MemoryStore> {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, token).await.unwrap();
        let config = twitch_config(base_url);
        let tokens = TokenManager::new(store, Client::new(), &config);
        HelixRequester::new(tokens, Client::new(), &config)
    }

    #[tokio::test]
    async fn test_get_user_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::UrlEncoded(
                "login".to_owned(),
                "somebody".to_owned(),
            ))
            .match_header("authorization", "Bearer stored-token")
            .match_header("client-id", "client-id")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"id": "42", "login": "somebody"}]}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stored-token").await;
        let user = requester.get_user("somebody").await.unwrap().unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.login, "somebody");
    }

    #[tokio::test]
    async fn test_get_user_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stored-token").await;
        assert!(requester.get_user("doesnotexist123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_is_live() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/streams")
            .match_query(mockito::Matcher::UrlEncoded(
                "user_id".to_owned(),
                "111".to_owned(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"id": "stream1"}]}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stored-token").await;
        assert!(requester.is_live("111").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_live_offline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/streams")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stored-token").await;
        assert!(!requester.is_live("111").await.unwrap());
    }

    #[tokio::test]
    async fn test_send_shoutout() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/shoutouts")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "from_broadcaster_id": "111",
                "to_broadcaster_id": "42",
                "moderator_id": "222",
            })))
            .with_status(204)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stored-token").await;
        assert!(requester.send_shoutout("42").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_and_retry_on_401() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer stale-token")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "fresh-token"}"#)
            .create_async()
            .await;
        let retry = server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer fresh-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"id": "42", "login": "somebody"}]}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stale-token").await;
        let user = requester.get_user("somebody").await.unwrap();
        assert_eq!(user.unwrap().id, "42");
        retry.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_401_surfaces_as_failure() {
        let mut server = mockito::Server::new_async().await;
        // Both attempts are rejected, the second response is surfaced untouched
        let rejected = server
            .mock("POST", "/chat/shoutouts")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "fresh-token"}"#)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stale-token").await;
        assert!(!requester.send_shoutout("42").await.unwrap());
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/streams")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(400)
            .create_async()
            .await;

        let requester = requester_with_token(&server.url(), "stale-token").await;
        match requester.is_live("111").await {
            Err(HelixError::Token(TokenError::Refresh(status))) => assert_eq!(status, 400),
            other => panic!("expected token error, got {:?}", other),
        }
    }
}
