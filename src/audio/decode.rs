//! Decoding of streamed agent audio chunks.
//!
//! The agent delivers each chunk as a base64 string wrapping a complete,
//! self-contained WAV container: a fixed 44-byte header followed by 16-bit
//! little-endian PCM mono samples.  Chunks are **not** slices of one
//! continuous stream — every chunk carries its own header and must be
//! decoded independently.
//!
//! The 44-byte header length is a fixed contract with the agent service
//! (`outputFormat: "wav"`), not a general WAV parser.  A container with
//! extra metadata chunks would not be decoded correctly and is not expected
//! on this connection.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Fixed container header size: RIFF (12) + fmt (24) + data chunk header (8).
const WAV_HEADER_LEN: usize = 44;

/// Optional data-URL scheme marker some senders prepend to the payload.
const DATA_URL_PREFIX: &str = "data:audio/wav;base64,";

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding an agent audio chunk.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid base64.
    #[error("chunk is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ---------------------------------------------------------------------------
// decode_chunk
// ---------------------------------------------------------------------------

/// Decode one base64 audio chunk into normalized `f32` samples.
///
/// Steps:
/// 1. Strip the `data:audio/wav;base64,` prefix if present.
/// 2. Base64-decode to raw bytes.
/// 3. Skip the 44-byte container header.
/// 4. Read the rest as 16-bit signed little-endian PCM, normalized to
///    `[-1.0, 1.0]` by dividing by 32768.
///
/// A payload of 44 bytes or fewer (header only, or truncated) yields an
/// empty buffer rather than an error — the caller simply has nothing to
/// play.  A trailing odd byte after the header is ignored.
///
/// # Errors
///
/// Returns [`DecodeError::Base64`] when the payload is not valid base64.
///
/// # Example
///
/// ```rust
/// use base64::{engine::general_purpose::STANDARD, Engine};
/// use voice_agent_client::audio::decode_chunk;
///
/// // 44 zero header bytes + one sample (16384 = 0x4000 LE)
/// let mut raw = vec![0u8; 44];
/// raw.extend_from_slice(&16384i16.to_le_bytes());
/// let samples = decode_chunk(&STANDARD.encode(&raw)).unwrap();
/// assert_eq!(samples.len(), 1);
/// assert!((samples[0] - 0.5).abs() < 1e-6);
/// ```
pub fn decode_chunk(data: &str) -> Result<Vec<f32>, DecodeError> {
    let clean = data.strip_prefix(DATA_URL_PREFIX).unwrap_or(data);
    let bytes = STANDARD.decode(clean)?;

    if bytes.len() <= WAV_HEADER_LEN {
        return Ok(Vec::new());
    }

    let samples = bytes[WAV_HEADER_LEN..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(samples)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
