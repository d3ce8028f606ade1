//! Microphone capture via `cpal`.
//!
//! [`MicCapture`] opens the default input device and forwards mono `f32`
//! chunks over a tokio channel.  Downmixing happens right in the cpal
//! callback so the session loop only ever sees mono audio at the device's
//! native rate; resampling to the agent's input rate is done later, off the
//! audio thread (see [`crate::audio::encode`]).
//!
//! The returned [`CaptureHandle`] is a RAII guard — dropping it stops the
//! underlying cpal stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the microphone stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// CaptureHandle
// ---------------------------------------------------------------------------

/// RAII guard keeping the microphone stream alive.
pub struct CaptureHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// MicCapture
// ---------------------------------------------------------------------------

/// Default-device microphone capture producing mono `f32` chunks.
pub struct MicCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Channels delivered by the hardware; downmixed away before sending.
    channels: u16,
}

impl MicCapture {
    /// Open the system default input device with its preferred
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no microphone is available,
    /// or [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.
    pub fn open() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;

        Ok(Self {
            device,
            config: supported.into(),
            sample_rate,
            channels,
        })
    }

    /// Start recording; each hardware buffer is downmixed to mono and sent
    /// over `tx`.
    ///
    /// Send errors (receiver dropped during session teardown) are ignored
    /// so the audio thread never panics.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(&self, tx: UnboundedSender<Vec<f32>>) -> Result<CaptureHandle, CaptureError> {
        let channels = self.channels as usize;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = downmix(data, channels);
                let _ = tx.send(mono);
            },
            |err: cpal::StreamError| {
                log::error!("cpal input stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(CaptureHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Average interleaved frames down to one channel.
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => samples
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
