//! Application entry point — talk to a voice agent from the terminal.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Open the speaker ([`CpalOutput`]) and build the playback scheduler.
//! 4. Open the microphone (playback-only when unavailable).
//! 5. Connect to the agent and perform the `setup` handshake.
//! 6. Run the session loop until the connection closes or Ctrl-C.

use anyhow::{bail, Context};
use tokio::sync::mpsc;

use voice_agent_client::{
    agent,
    audio::{AudioStreamPlayer, CpalOutput, MicCapture},
    config::{AppConfig, AppPaths},
    session::run_session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-agent client starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    if config.agent.agent_id.is_empty() || config.agent.api_key.is_empty() {
        bail!(
            "agent_id and api_key must be set in {}",
            AppPaths::new().settings_file.display()
        );
    }

    // 3. Speaker + playback scheduler
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let output = CpalOutput::new(config.agent.output_sample_rate, output_tx)
        .context("failed to open audio output device")?;
    let player = AudioStreamPlayer::new(Box::new(output), config.agent.output_sample_rate);
    log::info!("audio output ready ({} Hz mono)", config.agent.output_sample_rate);

    // 4. Microphone — missing hardware degrades to playback-only.
    let (mic_tx, mic_rx) = mpsc::unbounded_channel();
    let mut mic_sample_rate = 0;
    let _capture_handle = match MicCapture::open() {
        Ok(capture) => match capture.start(mic_tx) {
            Ok(handle) => {
                mic_sample_rate = capture.sample_rate();
                log::info!("microphone capture started ({mic_sample_rate} Hz)");
                Some(handle)
            }
            Err(e) => {
                log::warn!("Failed to start microphone stream: {e}");
                None
            }
        },
        Err(e) => {
            log::warn!("Microphone unavailable ({e}); running playback-only");
            None
        }
    };

    // 5. Agent connection
    let (handle, agent_events) = agent::connect(&config.agent)
        .await
        .context("failed to connect to the agent service")?;

    // 6. Session loop, raced against Ctrl-C.
    tokio::select! {
        _ = run_session(
            player,
            handle,
            agent_events,
            output_rx,
            mic_rx,
            mic_sample_rate,
            config.audio.input_sample_rate,
        ) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted; shutting down");
        }
    }

    Ok(())
}
