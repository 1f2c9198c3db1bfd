//! Shoutout decision logic.
//!
//! This module provides the [`Coordinator`] struct implementing the
//! per-request decision flow and the recurring queue drain described in the
//! [`shoutout`](crate::shoutout) module documentation.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::shoutout::{
    DrainOutcome, GLOBAL_COOLDOWN_MS, RequestOutcome, ShoutoutError, USER_COOLDOWN_MS,
};
use crate::store::KvStore;
use crate::twitch::{HelixError, Requester};

/// Store key of the FIFO queue of deferred shoutout targets.
const QUEUE_KEY: &str = "shoutout_queue";
/// Store key of the timestamp of the last successful shoutout, any target.
const GLOBAL_COOLDOWN_KEY: &str = "shoutout_last_global";

/// Store key of the timestamp of the last successful shoutout for `login`.
fn target_cooldown_key(login: &str) -> String {
    format!("shoutout_last_{}", login)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}

/// Coordinates shoutout execution across concurrent invocations.
///
/// The coordinator itself is stateless; every decision reads the cooldown
/// timestamps and the queue from the shared store. Reading and then updating
/// a timestamp is not atomic, so two racing invocations can both observe an
/// expired cooldown and both execute. The store offers no compare-and-set,
/// and Twitch tolerates the occasional double shoutout, so this race is
/// accepted.
pub struct Coordinator<R: Requester, S: KvStore> {
    /// Helix client used for lookups and the shoutout action
    requester: R,
    /// Shared key-value store holding cooldowns and the queue
    store: S,
    /// User id of the broadcaster whose liveness gates execution
    broadcaster_id: String,
}

impl<R: Requester, S: KvStore> Coordinator<R, S> {
    /// Creates a new [`Coordinator`].
    ///
    /// # Arguments
    ///
    /// * `requester` - An implementation of the [`Requester`] trait.
    /// * `store` - Shared key-value store.
    /// * `broadcaster_id` - User id of the acting broadcaster.
    pub fn new(requester: R, store: S, broadcaster_id: &str) -> Self {
        Coordinator {
            requester,
            store,
            broadcaster_id: broadcaster_id.to_string(),
        }
    }

    /// Decides and executes a chat-triggered shoutout request.
    ///
    /// The flow is: resolve the login, gate on the broadcaster being live,
    /// gate on both cooldowns, then execute. A cooldown defers the target to
    /// the queue tail; a failed execution does too, so the drain retries it.
    /// A not-live broadcaster drops the request instead of queueing it, since
    /// the viewer raid the shoutout reacts to only makes sense during a
    /// stream.
    ///
    /// # Errors
    ///
    /// Fails with [`ShoutoutError`] when the store is unreachable or a Helix
    /// lookup (including the token refresh) fails; the decision cannot be
    /// made safely in either case.
    pub async fn request_shoutout(&self, login: &str) -> Result<RequestOutcome, ShoutoutError> {
        let Some(user) = self.requester.get_user(login).await? else {
            info!("shoutout target {} does not resolve on twitch", login);
            return Ok(RequestOutcome::UnknownTarget);
        };

        if !self.requester.is_live(&self.broadcaster_id).await? {
            info!("broadcaster not live, dropping shoutout for {}", login);
            return Ok(RequestOutcome::NotLive);
        }

        let now = now_millis();
        if self.cooldown_active(login, now).await? {
            info!("cooldown active, queueing shoutout for {}", login);
            self.enqueue(login).await?;
            return Ok(RequestOutcome::Queued);
        }

        match self.requester.send_shoutout(&user.id).await {
            Ok(true) => {
                self.mark_executed(login, now).await?;
                info!("shoutout executed for {}", login);
                Ok(RequestOutcome::Executed)
            }
            Ok(false) => {
                warn!("shoutout for {} rejected, queueing for retry", login);
                self.enqueue(login).await?;
                Ok(RequestOutcome::Failed)
            }
            Err(HelixError::Token(error)) => Err(HelixError::Token(error).into()),
            Err(error) => {
                warn!("shoutout for {} failed ({}), queueing for retry", login, error);
                self.enqueue(login).await?;
                Ok(RequestOutcome::Failed)
            }
        }
    }

    /// Processes one entry of the shoutout queue.
    ///
    /// Invoked on a recurring schedule, independent of chat requests. Pops
    /// the queue head and applies the same gates as a chat request, in the
    /// order the queued entry cares about them: cooldowns first (the common
    /// reason the entry was deferred), then resolution, then liveness.
    /// Deferred entries go back to the queue head so the order stays FIFO;
    /// only an unresolvable login is dropped.
    pub async fn drain_queue(&self) -> Result<DrainOutcome, ShoutoutError> {
        let Some(login) = self.store.list_pop_head(QUEUE_KEY).await? else {
            debug!("shoutout queue is empty");
            return Ok(DrainOutcome::Idle);
        };

        let now = now_millis();
        if self.cooldown_active(&login, now).await? {
            debug!("cooldown still active, re-queueing {}", login);
            self.store.list_push_head(QUEUE_KEY, &login).await?;
            return Ok(DrainOutcome::Cooldown(login));
        }

        let user = match self.requester.get_user(&login).await? {
            Some(user) => user,
            None => {
                info!("queued target {} no longer resolves, dropping", login);
                return Ok(DrainOutcome::Invalid(login));
            }
        };

        if !self.requester.is_live(&self.broadcaster_id).await? {
            debug!("broadcaster not live, re-queueing {}", login);
            self.store.list_push_head(QUEUE_KEY, &login).await?;
            return Ok(DrainOutcome::NotLive(login));
        }

        match self.requester.send_shoutout(&user.id).await {
            Ok(true) => {
                self.mark_executed(&login, now).await?;
                info!("queued shoutout executed for {}", login);
                Ok(DrainOutcome::Executed(login))
            }
            Err(HelixError::Token(error)) => Err(HelixError::Token(error).into()),
            Ok(false) | Err(_) => {
                warn!("queued shoutout for {} failed, re-queueing", login);
                self.store.list_push_head(QUEUE_KEY, &login).await?;
                Ok(DrainOutcome::Failed(login))
            }
        }
    }

    /// Checks whether the global or the per-target cooldown is still active.
    async fn cooldown_active(&self, login: &str, now: i64) -> Result<bool, ShoutoutError> {
        let last_global = self.read_timestamp(GLOBAL_COOLDOWN_KEY).await?;
        let last_target = self.read_timestamp(&target_cooldown_key(login)).await?;
        Ok(now - last_global < GLOBAL_COOLDOWN_MS || now - last_target < USER_COOLDOWN_MS)
    }

    /// Reads an epoch-millis timestamp from the store, `0` when unset.
    async fn read_timestamp(&self, key: &str) -> Result<i64, ShoutoutError> {
        let value = self.store.get(key).await?;
        Ok(value.and_then(|raw| raw.parse().ok()).unwrap_or(0))
    }

    /// Appends `login` to the queue tail unless it is already queued.
    ///
    /// The existence check and the push are two separate store calls, so two
    /// racing invocations can still enqueue the same login twice. The drain
    /// tolerates duplicates, the second one just resolves to a re-queue or an
    /// execution an hour later.
    async fn enqueue(&self, login: &str) -> Result<(), ShoutoutError> {
        let queued = self.store.list_range(QUEUE_KEY).await?;
        if queued.iter().any(|entry| entry == login) {
            debug!("{} already queued, skipping", login);
            return Ok(());
        }
        self.store.list_push_tail(QUEUE_KEY, login).await?;
        Ok(())
    }

    /// Records a successful execution at `now` for both cooldown scopes.
    async fn mark_executed(&self, login: &str, now: i64) -> Result<(), ShoutoutError> {
        self.store
            .set(GLOBAL_COOLDOWN_KEY, &now.to_string())
            .await?;
        self.store
            .set(&target_cooldown_key(login), &now.to_string())
            .await?;
        Ok(())
    }
}
