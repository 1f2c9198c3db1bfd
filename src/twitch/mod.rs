//! Twitch Helix API integration.
//!
//! This module provides the OAuth token management and the Helix API client
//! used by the shoutout coordinator.
//!
//! # Modules
//!
//! - `requester` - HTTP client for the Helix endpoints the bot relies on
//! - `response_structs` - Internal data structures for API responses
//! - `tokens` - Store-backed OAuth access token management with refresh
//!
//! Every Helix call is authenticated with the current access token. When
//! Twitch answers with HTTP 401, the token is refreshed once through the
//! refresh-token grant and the call is retried exactly once; whatever the
//! second attempt returns is handed back to the caller untouched.

mod requester;
mod response_structs;
mod tokens;

pub use crate::twitch::requester::{HelixError, HelixRequester, Requester};
#[cfg(test)]
pub use crate::twitch::requester::MockRequester;
pub use crate::twitch::response_structs::HelixUser;
pub use crate::twitch::tokens::{TokenError, TokenManager};
