//! Shoutbot - a Twitch shoutout coordinator for chat-bot commands.
//!
//! This is the main entry point for shoutbot, which backs a `!so <channel>`
//! chat command with the Twitch Helix shoutout API while honoring the
//! cooldowns Twitch enforces on that endpoint.
//!
//! # Overview
//!
//! Chat integrations call the shoutout endpoint with a target channel. The
//! bot resolves the channel on Twitch, checks that the broadcaster is live,
//! and then either sends the Helix shoutout immediately or defers it to a
//! FIFO queue when a cooldown is active. A recurring drain retries one queued
//! target per cycle. Whatever happens backstage, chat always receives the
//! same acknowledgement line for a valid channel.
//!
//! All mutable state (OAuth tokens, cooldown timestamps, the queue) lives in
//! Redis, so several instances can serve requests against the same state.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! twitch:
//!   client_id: "your-client-id"
//!   client_secret: "your-client-secret"
//!   broadcaster_id: "12345678"
//!   moderator_id: "12345678"
//!   access_token: "initial-access-token"
//!   refresh_token: "initial-refresh-token"
//!
//! redis:
//!   url: "redis://127.0.0.1/"
//! ```
//!
//! Any value can be overridden with a `SHOUTBOT_`-prefixed environment
//! variable, e.g. `SHOUTBOT_TWITCH__CLIENT_SECRET`.
//!
//! # Usage
//!
//! ```bash
//! shoutbot --config config.yaml
//! ```
//!
//! # Endpoints
//!
//! - `GET /api/shoutout?user=<login>` - decide and acknowledge a shoutout
//! - `GET /api/process-shoutout-queue` - process one queued shoutout
//!
//! # Architecture
//!
//! - [`bot`] - Service wiring and the recurring queue-drain task
//! - [`config`] - YAML configuration with environment variable support
//! - [`server`] - Plain-text HTTP surface for chat integrations
//! - [`shoutout`] - Cooldown gating, queueing and drain decision logic
//! - [`store`] - Shared key-value store abstraction and Redis implementation
//! - [`twitch`] - Helix API client and OAuth token management
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod bot;
mod config;
mod server;
mod shoutout;
mod store;
mod twitch;

/// Command-line arguments for shoutbot.
///
/// Most configuration is done through the YAML file (see [`config::Config`]);
/// the command line only locates it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// Values can be overridden with `SHOUTBOT_`-prefixed environment
    /// variables, e.g. `SHOUTBOT_TWITCH__CLIENT_SECRET`.
    #[arg(short, long)]
    config: String,
}

/// Main entry point for shoutbot.
///
/// Initializes logging, loads the configuration, wires the bot and serves
/// until the process is terminated. Configuration and wiring errors are
/// logged and end the process without a panic.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting shoutbot {}...", env!("CARGO_PKG_VERSION"));

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration from YAML file with environment variable overrides
    let mut config: Config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    // Normalize the Helix URL by removing a trailing slash if present
    if config.twitch.helix_url.ends_with('/') {
        config.twitch.helix_url.pop();
    }

    // Launch bot
    let bot = match Bot::new(config).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {}", e);
            return;
        }
    };
    if let Err(e) = bot.start().await {
        error!("Server terminated: {}", e);
    }
}
