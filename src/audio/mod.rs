//! Audio pipeline — agent chunks in, microphone chunks out.
//!
//! # Playback path
//!
//! ```text
//! agent audioStream (base64 WAV) → decode_chunk → AudioStreamPlayer
//!                                                 └─▶ AudioOutput (CpalOutput)
//! ```
//!
//! # Capture path
//!
//! ```text
//! Microphone → cpal callback → mono chunk → resample → encode_wav_chunk
//!                                                      └─▶ agent audioIn
//! ```

pub mod capture;
pub mod decode;
pub mod encode;
pub mod output;
pub mod playback;
pub mod player;

pub use capture::{CaptureError, CaptureHandle, MicCapture};
pub use decode::{decode_chunk, DecodeError};
pub use encode::{encode_wav_chunk, resample, EncodeError};
pub use output::{AudioOutput, OutputError, OutputEvent};
pub use playback::CpalOutput;
pub use player::{AudioStreamPlayer, PlayerError};
