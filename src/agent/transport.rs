//! Websocket transport to the voice-agent service.
//!
//! [`connect`] opens the socket, performs the `setup` handshake, and spawns
//! two tasks: a reader that turns server frames into [`AgentEvent`]s, and a
//! writer that drains an outgoing channel into the socket.  The rest of the
//! crate only ever touches channels, so the session loop and its tests
//! never see a socket.
//!
//! Connection lifecycle is deliberately simple: no reconnect, no retry.
//! When the socket closes (either side), the reader emits
//! [`AgentEvent::Closed`] and both tasks wind down.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::AgentConfig;

use super::messages::{ClientMessage, ServerMessage};

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Errors raised while establishing the agent connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP/TLS/websocket handshake failed.
    #[error("websocket connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be serialised (effectively unreachable — our
    /// message types always serialise).
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// AgentEvent
// ---------------------------------------------------------------------------

/// Session-relevant events decoded from the server stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A playback chunk arrived (base64 WAV payload).
    Audio(String),
    /// The server reported a failure.
    Error(String),
    /// The connection ended (close frame, socket error, or EOF).
    Closed,
}

// ---------------------------------------------------------------------------
// AgentHandle
// ---------------------------------------------------------------------------

/// Write half of the agent connection.
///
/// Cheap to clone; all clones feed the same writer task.  Dropping every
/// clone closes the outgoing channel, which ends the writer task and closes
/// the socket.
#[derive(Clone)]
pub struct AgentHandle {
    outgoing: UnboundedSender<ClientMessage>,
}

impl AgentHandle {
    pub(crate) fn new(outgoing: UnboundedSender<ClientMessage>) -> Self {
        Self { outgoing }
    }

    /// Queue one microphone chunk for delivery.
    ///
    /// Errors after the connection has closed are logged and swallowed —
    /// the session learns about the closure through [`AgentEvent::Closed`].
    pub fn send_audio(&self, data: String) {
        if self
            .outgoing
            .send(ClientMessage::AudioIn { data })
            .is_err()
        {
            log::debug!("dropping mic chunk: agent connection is closed");
        }
    }
}

// ---------------------------------------------------------------------------
// connect
// ---------------------------------------------------------------------------

/// Connect to the agent service and perform the `setup` handshake.
///
/// The websocket URL is `{base_url}/{agent_id}`.  On success, returns the
/// write handle and the event stream; the caller owns both and the session
/// ends when [`AgentEvent::Closed`] is received.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] when the handshake fails (bad URL,
/// DNS, TLS, HTTP upgrade rejection).
pub async fn connect(
    config: &AgentConfig,
) -> Result<(AgentHandle, UnboundedReceiver<AgentEvent>), TransportError> {
    let url = format!("{}/{}", config.base_url.trim_end_matches('/'), config.agent_id);
    log::info!("connecting to agent at {url}");

    let (socket, response) = connect_async(url.as_str()).await?;
    log::debug!("websocket established (HTTP {})", response.status());

    let (mut write, mut read) = socket.split();

    // Handshake before anything else; the server ignores audio sent earlier.
    let setup = ClientMessage::setup(&config.api_key, config.output_sample_rate);
    write
        .send(Message::Text(serde_json::to_string(&setup)?))
        .await?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<ClientMessage>();

    // Reader task: server frames → AgentEvents.
    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::AudioStream { data }) => {
                        if event_tx.send(AgentEvent::Audio(data)).is_err() {
                            break;
                        }
                    }
                    Ok(ServerMessage::Error { message }) => {
                        if event_tx.send(AgentEvent::Error(message)).is_err() {
                            break;
                        }
                    }
                    Ok(ServerMessage::Unknown) => {
                        log::trace!("ignoring unhandled frame: {text}");
                    }
                    Err(e) => {
                        log::warn!("unparseable agent frame ({e}): {text}");
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // ping/pong/binary — nothing to do
                Err(e) => {
                    log::warn!("websocket read error: {e}");
                    break;
                }
            }
        }
        let _ = event_tx.send(AgentEvent::Closed);
    });

    // Writer task: outgoing channel → socket.
    tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    log::error!("failed to encode outgoing frame: {e}");
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(text)).await {
                log::warn!("websocket write error: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    Ok((AgentHandle::new(outgoing_tx), event_rx))
}
