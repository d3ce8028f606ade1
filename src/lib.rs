//! Voice-agent demo client.
//!
//! Connects to a realtime voice-agent service over a websocket, streams
//! microphone audio up, and plays the agent's streamed WAV chunks back
//! gaplessly through the system output device.
//!
//! # Architecture
//!
//! ```text
//! agent ws ──AgentEvent──▶ session loop ──enqueue──▶ AudioStreamPlayer
//!    ▲                        │   ▲                    │ schedule
//!    │ audioIn                │   └──BufferEnded───  CpalOutput
//!    └────encode_wav_chunk────┘
//!               ▲
//!          MicCapture
//! ```
//!
//! The playback core ([`audio::AudioStreamPlayer`]) is transport-agnostic:
//! it consumes base64 chunks and an [`audio::AudioOutput`] device, nothing
//! else.  One player and one session loop exist per websocket conversation.

pub mod agent;
pub mod audio;
pub mod config;
pub mod session;
