//! Shoutout scheduling and cooldown coordination.
//!
//! This module decides, for each shoutout request, whether to execute the
//! Helix shoutout immediately, defer it to a durable FIFO queue, or drop it.
//! All decision state (cooldown timestamps, the queue) lives in the shared
//! key-value store so concurrent invocations and the recurring queue drain
//! cooperate on the same values.
//!
//! # Decision flow
//!
//! ```text
//! request(login)
//!      │
//!      ├── login unknown on Twitch ──────────► UnknownTarget
//!      ├── broadcaster not live ─────────────► NotLive (hard gate, not queued)
//!      ├── global or per-target cooldown ────► Queued (tail, deduplicated)
//!      ├── shoutout call succeeded ──────────► Executed (timestamps updated)
//!      └── shoutout call failed ─────────────► Failed (queued for the drain)
//! ```
//!
//! The queue drain processes one entry per run and re-inserts deferred
//! entries at the head so the queue stays strictly FIFO.
//!
//! # Cooldowns
//!
//! Twitch enforces a global cooldown between shoutouts and a much longer
//! per-target cooldown. Both timestamps are only advanced after a confirmed
//! successful shoutout, so they never move backwards.

mod coordinator;

pub use crate::shoutout::coordinator::Coordinator;

use std::fmt;

use crate::store::StoreError;
use crate::twitch::HelixError;

/// Minimum elapsed time between any two shoutouts, in milliseconds.
pub const GLOBAL_COOLDOWN_MS: i64 = 2 * 60 * 1000 + 15 * 1000; // 2 min 15 sec
/// Minimum elapsed time between two shoutouts for the same target, in milliseconds.
pub const USER_COOLDOWN_MS: i64 = 60 * 60 * 1000;

/// Outcome of a chat-triggered shoutout request.
///
/// Whatever the outcome, the chat-facing acknowledgement message is produced
/// for every resolved target; the outcome only describes what happened to the
/// backend shoutout action.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The shoutout was sent and both cooldown timestamps were updated
    Executed,
    /// A cooldown is active, the target was appended to the queue
    Queued,
    /// The broadcaster is not live, the request was dropped
    NotLive,
    /// The shoutout call failed, the target was queued for the drain to retry
    Failed,
    /// The login does not resolve on Twitch
    UnknownTarget,
}

/// Outcome of one queue-drain run.
///
/// Each variant carries the login that was popped from the queue head.
#[derive(Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue was empty
    Idle,
    /// A cooldown is still active, the entry went back to the queue head
    Cooldown(String),
    /// The login no longer resolves on Twitch and was dropped
    Invalid(String),
    /// The broadcaster is not live, the entry went back to the queue head
    NotLive(String),
    /// The shoutout was sent and both cooldown timestamps were updated
    Executed(String),
    /// The shoutout call failed, the entry went back to the queue head
    Failed(String),
}

/// Errors that abort a shoutout decision.
///
/// Both variants are fatal for the current invocation: without the store the
/// cooldown state is unknown, and without Helix the target cannot be
/// resolved. Failures of the shoutout action itself are not errors; they are
/// reported through the outcome enums and drive the re-enqueue policy.
#[derive(Debug)]
pub enum ShoutoutError {
    /// The key-value store is unreachable
    Store(StoreError),
    /// A Helix lookup or the token refresh failed
    Helix(HelixError),
}

impl fmt::Display for ShoutoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShoutoutError::Store(error) => write!(f, "{}", error),
            ShoutoutError::Helix(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for ShoutoutError {}

impl From<StoreError> for ShoutoutError {
    fn from(error: StoreError) -> Self {
        ShoutoutError::Store(error)
    }
}

impl From<HelixError> for ShoutoutError {
    fn from(error: HelixError) -> Self {
        ShoutoutError::Helix(error)
    }
}
