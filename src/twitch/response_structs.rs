//! Internal data structures for Twitch API responses.
//!
//! Only the fields the bot actually consumes are modeled; serde ignores the
//! rest of each payload.

use serde::Deserialize;

/// Response of the OAuth token endpoint for the refresh-token grant.
///
/// Twitch may rotate the refresh token during the exchange, in which case the
/// new one must replace the stored value.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Freshly minted access token
    pub access_token: String,
    /// Rotated refresh token, when Twitch decided to rotate it
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A single user entry from `GET /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    /// Numeric user id, as a string
    pub id: String,
    /// Lowercase login name
    pub login: String,
}

/// Response of `GET /users?login=X`.
///
/// An unknown login yields an empty `data` array rather than an error status.
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub data: Vec<HelixUser>,
}

/// A single stream entry from `GET /streams`.
#[derive(Debug, Deserialize)]
pub struct StreamEntry {
    /// Stream id
    pub id: String,
}

/// Response of `GET /streams?user_id=X`.
///
/// The channel is live iff `data` is non-empty.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    pub data: Vec<StreamEntry>,
}
