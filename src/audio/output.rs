//! Output device boundary.
//!
//! [`AudioOutput`] is the capability set the playback scheduler needs from a
//! host audio API: a clock, absolute-time scheduling of mono sample buffers,
//! and end-of-playback notification.  Any backend offering these is
//! interchangeable — the production implementation is
//! [`CpalOutput`](crate::audio::CpalOutput); tests drive the scheduler with
//! a fake backend and a manually advanced clock.

use thiserror::Error;

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

/// Errors surfaced by an audio output backend.
#[derive(Debug, Error)]
pub enum OutputError {
    /// No output device is available on the default audio host.
    #[error("no output device found on the default audio host")]
    NoDevice,

    /// The device rejected the requested stream configuration.
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// The output stream could not be started.
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The backend rejected a scheduling request.
    #[error("failed to schedule buffer: {0}")]
    Schedule(String),
}

// ---------------------------------------------------------------------------
// OutputEvent
// ---------------------------------------------------------------------------

/// Notifications emitted by an output backend.
///
/// Backends send these over the `tokio::sync::mpsc` sender supplied at
/// construction.  The session loop reacts to [`OutputEvent::BufferEnded`] by
/// advancing the playback scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// A scheduled buffer finished playing.
    BufferEnded,
}

// ---------------------------------------------------------------------------
// AudioOutput trait
// ---------------------------------------------------------------------------

/// Abstraction over a single shared audio output device.
///
/// Contract expected by [`AudioStreamPlayer`](crate::audio::AudioStreamPlayer):
///
/// * [`current_time`](Self::current_time) is monotonically non-decreasing
///   and measured in seconds on the device's own clock.
/// * [`schedule`](Self::schedule) submits one mono buffer to start at the
///   given absolute device time.  The scheduler never submits overlapping
///   buffers; a start time already in the past means "start immediately".
/// * Exactly one [`OutputEvent::BufferEnded`] is emitted per scheduled
///   buffer, after its last sample has been played.
/// * [`clear`](Self::clear) drops all pending scheduled audio.  Buffers
///   dropped by `clear` emit no end notification.
///
/// No `Send` bound: `cpal::Stream` is `!Send`, so backends (and the player
/// owning them) stay on the thread that created them.  The session loop
/// runs on the runtime's main task, which never migrates the player.
pub trait AudioOutput {
    /// Current device clock time in seconds.
    fn current_time(&self) -> f64;

    /// Schedule `samples` (mono, normalized `f32`) to start at `start_time`
    /// seconds on the device clock.
    fn schedule(&mut self, samples: Vec<f32>, start_time: f64) -> Result<(), OutputError>;

    /// Drop all scheduled audio, including a buffer currently playing.
    fn clear(&mut self);
}
