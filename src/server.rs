//! Plain-text HTTP surface for chat-bot commands.
//!
//! Chat integrations (StreamElements and friends) call these endpoints with a
//! query parameter and post the returned body verbatim into chat. All
//! user-facing outcomes answer HTTP 200 so the integration always has a line
//! to post; only a missing parameter (400) and internal failures (500) leave
//! the 200 path.
//!
//! # Endpoints
//!
//! - `GET /api/shoutout?user=<login>` - chat-triggered shoutout request
//! - `GET /api/process-shoutout-queue` - queue-drain trigger for an external
//!   scheduler, processing one queued entry per call

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use log::{debug, error};
use serde::Deserialize;

use crate::shoutout::{Coordinator, DrainOutcome, RequestOutcome};
use crate::store::RedisStore;
use crate::twitch::HelixRequester;

/// The coordinator as wired in production.
pub type AppCoordinator = Coordinator<HelixRequester<RedisStore>, RedisStore>;

/// Builds the router for the chat-facing endpoints.
pub fn router(coordinator: Arc<AppCoordinator>) -> Router {
    Router::new()
        .route("/api/shoutout", get(handle_shoutout))
        .route("/api/process-shoutout-queue", get(handle_process_queue))
        .with_state(coordinator)
}

/// Query parameters of the shoutout endpoint.
#[derive(Deserialize)]
struct ShoutoutParams {
    /// Target login, as typed in chat
    user: Option<String>,
}

/// Handles `GET /api/shoutout?user=<login>`.
///
/// The acknowledgement text is a courtesy message for chat and does not
/// depend on whether the backend shoutout actually executed; rate limiting
/// stays invisible to viewers.
async fn handle_shoutout(
    State(coordinator): State<Arc<AppCoordinator>>,
    Query(params): Query<ShoutoutParams>,
) -> (StatusCode, String) {
    let login = normalize_login(params.user.as_deref().unwrap_or(""));
    if login.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing user parameter".to_string());
    }

    match coordinator.request_shoutout(&login).await {
        Ok(outcome) => {
            debug!("shoutout outcome for {}: {:?}", login, outcome);
            request_response(&login, outcome)
        }
        Err(error) => {
            error!("shoutout decision failed for {}: {}", login, error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Shoutout service unavailable.".to_string(),
            )
        }
    }
}

/// Handles `GET /api/process-shoutout-queue`.
async fn handle_process_queue(
    State(coordinator): State<Arc<AppCoordinator>>,
) -> (StatusCode, String) {
    match coordinator.drain_queue().await {
        Ok(outcome) => {
            debug!("queue drain outcome: {:?}", outcome);
            drain_response(outcome)
        }
        Err(error) => {
            error!("queue drain failed: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Queue processing failed.".to_string(),
            )
        }
    }
}

/// Normalizes a login as typed in chat: strips the leading `@`, trims
/// whitespace and lowercases.
fn normalize_login(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_lowercase()
}

/// Maps a request outcome to the chat-facing response.
fn request_response(login: &str, outcome: RequestOutcome) -> (StatusCode, String) {
    match outcome {
        RequestOutcome::UnknownTarget => {
            (StatusCode::OK, "Invalid channel specified.".to_string())
        }
        // Executed, queued, dropped or failed: chat always gets the same
        // acknowledgement for a resolved target
        _ => (
            StatusCode::OK,
            format!(
                "Go follow {} at https://twitch.tv/{} ! Do it now!",
                login, login
            ),
        ),
    }
}

/// Maps a drain outcome to the scheduler-facing response.
fn drain_response(outcome: DrainOutcome) -> (StatusCode, String) {
    match outcome {
        DrainOutcome::Idle => (StatusCode::OK, "No users in shoutout queue.".to_string()),
        DrainOutcome::Cooldown(login) => (
            StatusCode::OK,
            format!("Cooldown active. {} re-queued.", login),
        ),
        DrainOutcome::Invalid(login) => (
            StatusCode::OK,
            format!("User {} invalid, skipping.", login),
        ),
        DrainOutcome::NotLive(login) => (
            StatusCode::OK,
            format!("Broadcaster not live. {} re-queued.", login),
        ),
        DrainOutcome::Executed(login) => {
            (StatusCode::OK, format!("Shoutout sent for {}.", login))
        }
        DrainOutcome::Failed(login) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to shoutout {}, re-queued.", login),
        ),
    }
}
