//! Encoding of microphone audio for the agent connection.
//!
//! The agent accepts `audioIn` frames carrying base64 WAV payloads — the
//! same self-contained container it streams back: 44-byte header, 16-bit
//! little-endian PCM, mono.  [`encode_wav_chunk`] builds one such payload
//! with `hound` writing into an in-memory cursor.
//!
//! [`resample`] converts from the microphone's native rate to the agent's
//! input rate with linear interpolation, which is plenty for speech sent to
//! an ASR front-end.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

// ---------------------------------------------------------------------------
// EncodeError
// ---------------------------------------------------------------------------

/// Errors that can occur while building a WAV chunk.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The WAV writer rejected the stream (in-memory I/O, effectively
    /// unreachable in practice).
    #[error("failed to write WAV container: {0}")]
    Wav(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// Same-rate input is cloned unchanged; empty input yields empty output.
/// The output length is approximately `samples.len() * target / source`.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// encode_wav_chunk
// ---------------------------------------------------------------------------

/// Encode normalized mono samples as a base64 WAV chunk at `sample_rate` Hz.
///
/// Samples are clamped to `[-1.0, 1.0]` and quantised to 16-bit PCM.  The
/// resulting container has the standard 44-byte header the decoder on the
/// other side of the connection skips.
///
/// # Errors
///
/// Returns [`EncodeError::Wav`] if the container cannot be written — not
/// expected for in-memory output.
pub fn encode_wav_chunk(samples: &[f32], sample_rate: u32) -> Result<String, EncodeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            let quantised = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            writer.write_sample(quantised)?;
        }
        writer.finalize()?;
    }

    Ok(STANDARD.encode(cursor.into_inner()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
