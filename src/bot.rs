//! Bot module wiring the store, the Twitch client and the coordinator.
//!
//! This module provides the main [`Bot`] implementation. It connects the
//! Redis store with the Helix client and the shoutout coordinator, then runs
//! two concurrent pieces:
//!
//! 1. **Queue-drain task**: a recurring task popping one queued shoutout per
//!    cycle and retrying it against the current cooldown and live status.
//! 2. **HTTP surface**: the chat-facing endpoints served with axum.
//!
//! The drain can also be driven by an external scheduler through the
//! `/api/process-shoutout-queue` endpoint; setting `server.drain_interval` to
//! `0` disables the internal task for that setup.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use reqwest::Client;
use tokio::time;

use crate::{
    config::Config,
    server::{self, AppCoordinator},
    shoutout::Coordinator,
    store::RedisStore,
    twitch::{HelixRequester, TokenManager},
};

/// Timeout applied to every upstream HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Main bot structure tying the store, the Helix client and the coordinator
/// together.
///
/// # Examples
///
/// ```no_run
/// # use shoutbot::bot::Bot;
/// # use shoutbot::config::Config;
/// # async fn run() -> Result<(), anyhow::Error> {
/// let config = Config::load("config.yaml")?;
/// let bot = Bot::new(config).await?;
/// bot.start().await?; // Runs until process termination
/// # Ok(())
/// # }
/// ```
pub struct Bot {
    /// Shoutout coordinator shared by the HTTP handlers and the drain task
    coordinator: Arc<AppCoordinator>,
    /// Socket address the HTTP surface listens on
    listen: String,
    /// Seconds between queue-drain runs, 0 disables the internal task
    drain_interval: u64,
}

impl Bot {
    /// Creates a new Bot instance from the loaded configuration.
    ///
    /// Connects to Redis and builds the token manager, the Helix requester
    /// and the coordinator around that shared store.
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis connection cannot be established or the
    /// HTTP client cannot be built.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let store = RedisStore::connect(&config.redis.url).await?;
        info!("connected to redis at {}", &config.redis.url);

        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let tokens = TokenManager::new(store.clone(), client.clone(), &config.twitch);
        let requester = HelixRequester::new(tokens, client, &config.twitch);
        let coordinator = Arc::new(Coordinator::new(
            requester,
            store,
            &config.twitch.broadcaster_id,
        ));

        Ok(Bot {
            coordinator,
            listen: config.server.listen,
            drain_interval: config.server.drain_interval,
        })
    }

    /// Starts the bot and serves the chat-facing endpoints.
    ///
    /// Spawns the queue-drain task when an interval is configured, then binds
    /// the HTTP surface and serves it until the process terminates.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        if self.drain_interval > 0 {
            self.start_drain_task();
        } else {
            info!("internal queue drain disabled, expecting an external scheduler");
        }

        let router = server::router(Arc::clone(&self.coordinator));
        info!("listening on {}", &self.listen);
        let listener = tokio::net::TcpListener::bind(&self.listen).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Starts the queue-drain task in the background.
    ///
    /// Each cycle processes at most one queued shoutout, so a burst of queued
    /// targets spreads out across cycles instead of tripping the global
    /// cooldown repeatedly. Drain failures are logged and retried on the next
    /// cycle.
    fn start_drain_task(&self) {
        let coordinator = Arc::clone(&self.coordinator);
        let drain_interval = self.drain_interval;

        tokio::spawn(async move {
            info!(
                "draining the shoutout queue every {} seconds",
                drain_interval
            );
            let mut interval = time::interval(Duration::from_secs(drain_interval));

            loop {
                interval.tick().await;
                match coordinator.drain_queue().await {
                    Ok(outcome) => debug!("queue drain outcome: {:?}", outcome),
                    Err(error) => error!("queue drain failed: {}", error),
                }
            }
        });
    }
}
