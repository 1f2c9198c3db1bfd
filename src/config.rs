//! Configuration file structures for the shoutbot service.
//!
//! This module defines the configuration file format using YAML. The
//! configuration is split into three sections: HTTP server settings, Twitch
//! credentials, and the Redis store location.
//!
//! # Configuration File Format
//!
//! ```yaml
//! server:
//!   # Address the HTTP surface listens on
//!   listen: "0.0.0.0:8080"
//!   # Seconds between queue-drain runs, 0 disables the internal timer
//!   drain_interval: 60
//!
//! twitch:
//!   client_id: "your-client-id"
//!   client_secret: "your-client-secret"
//!   broadcaster_id: "12345678"
//!   moderator_id: "12345678"
//!   # Bootstrap tokens, used until the store holds refreshed ones
//!   access_token: "initial-access-token"
//!   refresh_token: "initial-refresh-token"
//!
//! redis:
//!   url: "redis://127.0.0.1/"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any value using environment variables with the `SHOUTBOT_` prefix
//! and `__` as the section separator:
//!
//! ```bash
//! export SHOUTBOT_TWITCH__CLIENT_SECRET="secret-from-env"
//! export SHOUTBOT_REDIS__URL="redis://redis.internal/"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Root configuration structure for the shoutbot service.
///
/// # Structure
///
/// The configuration is divided into three sections:
/// - [`Server`] - HTTP listen address and queue-drain schedule
/// - [`Twitch`] - Twitch application credentials and identities
/// - [`Redis`] - Key-value store connection settings
#[derive(Deserialize)]
pub struct Config {
    /// HTTP server and scheduling configuration
    #[serde(default)]
    pub server: Server,
    /// Twitch credentials and identities
    pub twitch: Twitch,
    /// Redis store configuration
    pub redis: Redis,
}

impl Config {
    /// Loads the configuration from a YAML file, applying `SHOUTBOT_`-prefixed
    /// environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or a required
    /// field is missing after merging all providers.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SHOUTBOT_").split("__"))
            .extract()
    }
}

/// HTTP server and scheduling configuration.
///
/// # YAML Section
///
/// ```yaml
/// server:
///   listen: "0.0.0.0:8080"
///   drain_interval: 60
/// ```
#[derive(Deserialize)]
pub struct Server {
    /// Socket address the HTTP surface listens on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Seconds between internal queue-drain runs.
    ///
    /// Set to `0` to disable the internal timer and drive the drain through
    /// the `/api/process-shoutout-queue` endpoint from an external scheduler
    /// instead.
    #[serde(default = "default_drain_interval")]
    pub drain_interval: u64,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            listen: default_listen(),
            drain_interval: default_drain_interval(),
        }
    }
}

/// Twitch application credentials and identities.
///
/// # YAML Section
///
/// ```yaml
/// twitch:
///   client_id: "your-client-id"
///   client_secret: "your-client-secret"
///   broadcaster_id: "12345678"
///   moderator_id: "12345678"
///   access_token: "initial-access-token"
///   refresh_token: "initial-refresh-token"
/// ```
#[derive(Deserialize)]
pub struct Twitch {
    /// Twitch application client id, sent as the `Client-ID` header.
    pub client_id: String,

    /// Twitch application client secret, used for the refresh-token grant.
    pub client_secret: String,

    /// User id of the broadcaster whose channel shoutouts are sent from.
    pub broadcaster_id: String,

    /// User id of the moderator account performing the shoutout.
    pub moderator_id: String,

    /// Bootstrap OAuth access token.
    ///
    /// Used until a refreshed token has been persisted to the store. After the
    /// first refresh the store value always wins.
    pub access_token: String,

    /// Bootstrap OAuth refresh token.
    ///
    /// Replaced in the store whenever Twitch rotates it during a refresh.
    pub refresh_token: String,

    /// Base URL of the Helix API.
    #[serde(default = "default_helix_url")]
    pub helix_url: String,

    /// URL of the OAuth token endpoint.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

/// Key-value store configuration.
///
/// # YAML Section
///
/// ```yaml
/// redis:
///   url: "redis://127.0.0.1/"
/// ```
#[derive(Deserialize)]
pub struct Redis {
    /// Redis connection string.
    pub url: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_drain_interval() -> u64 {
    60
}

fn default_helix_url() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_auth_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}
