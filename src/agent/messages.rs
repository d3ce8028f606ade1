//! Wire messages for the voice-agent websocket protocol.
//!
//! Frames are JSON objects discriminated by a `type` field.  The client
//! sends a `setup` frame once after connecting, then `audioIn` frames with
//! base64 microphone chunks; the server streams `audioStream` frames with
//! base64 WAV playback chunks.  Unknown server frame types are tolerated
//! and ignored so protocol additions don't break the client.

use serde::{Deserialize, Serialize};

/// Output container format requested in the `setup` frame.  The chunk
/// decoder assumes this exact format (44-byte header contract).
pub const OUTPUT_FORMAT: &str = "wav";

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Frames sent from the client to the agent service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Session handshake: authenticates and picks the audio format the
    /// server should stream back.
    #[serde(rename = "setup", rename_all = "camelCase")]
    Setup {
        api_key: String,
        output_format: String,
        output_sample_rate: u32,
    },

    /// One microphone chunk (base64 WAV payload).
    #[serde(rename = "audioIn")]
    AudioIn { data: String },
}

impl ClientMessage {
    /// Build the handshake frame for `api_key`, requesting WAV output at
    /// `output_sample_rate` Hz.
    pub fn setup(api_key: &str, output_sample_rate: u32) -> Self {
        Self::Setup {
            api_key: api_key.to_string(),
            output_format: OUTPUT_FORMAT.to_string(),
            output_sample_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Frames received from the agent service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// One playback chunk (base64 WAV payload).
    #[serde(rename = "audioStream")]
    AudioStream { data: String },

    /// Server-side failure report.
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },

    /// Any frame type this client does not handle.
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
