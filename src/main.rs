//! Hex Action Client - replay runner
//!
//! Feeds a recorded server session through the full client:
//! - Replay task decoding one JSON frame per line into the transport
//! - Writer task logging every frame the client sends back
//! - Fixed-rate tick loop driving router, grid and entity queues
//! - Optional seeded wandering player exercising prediction

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hex_action_client::config::Config;
use hex_action_client::hex::HexDirection;
use hex_action_client::map::NullRenderer;
use hex_action_client::net::{decode_frame, encode_frame, ChannelTransport, ServerEndpoint};
use hex_action_client::protocol::MessageToClient;
use hex_action_client::util::time::tick_interval;
use hex_action_client::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Hex Action Client");
    info!("Replay file: {}", config.replay_path.display());
    info!("Tick rate: {}/s", config.tick_rate);

    let (transport, server) = ChannelTransport::pair();
    let ServerEndpoint {
        to_client,
        mut from_client,
    } = server;

    let replay = tokio::spawn(replay_session(
        config.replay_path.clone(),
        Duration::from_millis(config.replay_interval_ms),
        to_client,
    ));

    tokio::spawn(async move {
        while let Some(message) = from_client.recv().await {
            match encode_frame(&message) {
                Ok(frame) => info!(frame = %frame, "Outbound"),
                Err(e) => warn!(error = %e, "Failed to encode outbound message"),
            }
        }
    });

    let mut client = Client::new(Box::new(transport), Box::new(NullRenderer::default()))
        .with_action_expiration(config.action_expiration_secs);
    client.attach_scene();

    tokio::select! {
        result = run(&mut client, &config, replay) => result?,
        _ = shutdown_signal() => {}
    }

    info!(report = %client.bug_report(), "Client state at exit");
    info!("Client shutdown complete");
    Ok(())
}

/// Stream a recorded session into the client, one frame per line
async fn replay_session(
    path: PathBuf,
    delay: Duration,
    to_client: mpsc::Sender<MessageToClient>,
) -> anyhow::Result<usize> {
    let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("Failed to open replay {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let mut sent = 0usize;
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode_frame(line) {
            Ok(message) => {
                trace!(line = line_no, message_type = message.message_type(), "Replaying frame");
                if to_client.send(message).await.is_err() {
                    warn!("Client went away, stopping replay");
                    break;
                }
                sent += 1;
            }
            Err(e) => warn!(line = line_no, error = %e, "Skipping malformed frame"),
        }
        tokio::time::sleep(delay).await;
    }

    info!(frames = sent, "Replay finished");
    Ok(sent)
}

/// Tick until the replay is over and every entity has come to rest
async fn run(
    client: &mut Client,
    config: &Config,
    mut replay: JoinHandle<anyhow::Result<usize>>,
) -> anyhow::Result<()> {
    let mut wander = config.wander_seed.map(ChaCha8Rng::seed_from_u64);
    let mut ticker = interval(tick_interval(config.tick_rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut replay_done = false;
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut replay, if !replay_done => {
                result??;
                replay_done = true;
            }
        }

        let now = Utc::now();
        client.tick(now);
        tick += 1;

        if !replay_done {
            if let Some(rng) = wander.as_mut() {
                wander_step(client, rng, now);
            }
        }

        if tick % u64::from(config.tick_rate) == 0 {
            log_states(client);
        }

        if replay_done && !client.router().is_connected() && client.is_idle() {
            log_states(client);
            return Ok(());
        }
    }
}

/// Occasionally try a random step
fn wander_step(client: &mut Client, rng: &mut ChaCha8Rng, now: DateTime<Utc>) {
    if !rng.gen_bool(0.2) {
        return;
    }
    let direction = HexDirection::from_index(rng.gen_range(0..6));
    if client.try_move(direction, now) {
        debug!(?direction, "Wander step");
    }
}

fn log_states(client: &Client) {
    if let Some(state) = client.player_state() {
        debug!(
            player_id = ?client.router().player_id(),
            x = state.position.x,
            z = state.position.z,
            heading = state.heading_degrees,
            animation = ?state.animation,
            "Player"
        );
    }
    for (id, state) in client.entity_states() {
        debug!(
            entity_id = id,
            x = state.position.x,
            z = state.position.z,
            heading = state.heading_degrees,
            opacity = state.opacity,
            "Entity"
        );
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
