//! Gapless streaming playback scheduler.
//!
//! [`AudioStreamPlayer`] receives base64 audio chunks from the agent,
//! decodes them, and schedules back-to-back playback on an
//! [`AudioOutput`].  The core correctness property: buffers reach the
//! device in arrival order, each starting exactly where the previous one
//! ends, regardless of arrival-timing jitter.
//!
//! # Scheduling chain
//!
//! ```text
//! enqueue_chunk ──▶ decode ──▶ queue (FIFO)
//!                               │  idle? cursor = now, start chain
//!                               ▼
//! advance: pop head ──▶ schedule at max(now, cursor)
//!                       cursor = start + duration
//!          (empty queue ──▶ is_playing = false)
//! ```
//!
//! The chain is strictly sequential — at most one buffer is in flight on
//! the device at a time.  [`advance`](AudioStreamPlayer::advance) is called
//! by the session loop on every [`OutputEvent::BufferEnded`] notification;
//! there is no callback recursion and no second consumer.
//!
//! One player is constructed per voice session and dropped with it.  All
//! state lives on the instance, so concurrent sessions cannot leak audio
//! into each other.

use std::collections::VecDeque;

use thiserror::Error;

use super::decode::{decode_chunk, DecodeError};
use super::output::{AudioOutput, OutputError};

// ---------------------------------------------------------------------------
// PlayerError
// ---------------------------------------------------------------------------

/// Errors surfaced by the playback scheduler.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The incoming chunk could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The output backend rejected a scheduling request.
    #[error(transparent)]
    Output(#[from] OutputError),
}

// ---------------------------------------------------------------------------
// AudioStreamPlayer
// ---------------------------------------------------------------------------

/// FIFO playback queue with a gapless scheduling cursor.
///
/// Invariants:
///
/// * the queue holds only buffers that have not started playing;
/// * buffers are scheduled in exact arrival order;
/// * scheduled start times are monotonically non-decreasing, and each start
///   equals the previous buffer's end unless playback fell behind real time
///   (then the start is clamped to the device's current time).
pub struct AudioStreamPlayer {
    output: Box<dyn AudioOutput>,
    queue: VecDeque<Vec<f32>>,
    sample_rate: u32,
    /// Absolute device time at which the next buffer should begin.
    next_start_time: f64,
    /// True while a scheduling chain is active (a buffer is in flight).
    is_playing: bool,
}

impl AudioStreamPlayer {
    /// Create a player that schedules mono buffers at `sample_rate` Hz onto
    /// `output`.
    pub fn new(output: Box<dyn AudioOutput>, sample_rate: u32) -> Self {
        Self {
            output,
            queue: VecDeque::new(),
            sample_rate,
            next_start_time: 0.0,
            is_playing: false,
        }
    }

    /// Decode a base64 chunk and append it to the playback queue.
    ///
    /// If no chain is active, the cursor is re-anchored to the device's
    /// current time and the chain is started — so after the queue drains and
    /// goes idle, the next chunk plays immediately rather than at the stale
    /// cursor position.
    ///
    /// Chunks that decode to zero samples (header-only payloads) are dropped
    /// without touching playback state.
    ///
    /// # Errors
    ///
    /// Decode faults and output scheduling faults propagate; the player
    /// itself performs no retry.  A failed chunk is not enqueued, and the
    /// chain keeps running for subsequent chunks.
    pub fn enqueue_chunk(&mut self, data: &str) -> Result<(), PlayerError> {
        let samples = decode_chunk(data)?;
        if samples.is_empty() {
            log::debug!("dropping degenerate chunk ({} chars of base64)", data.len());
            return Ok(());
        }

        log::trace!("enqueue {} samples (queue depth {})", samples.len(), self.queue.len());
        self.queue.push_back(samples);

        if !self.is_playing {
            self.is_playing = true;
            self.next_start_time = self.output.current_time();
            self.advance()?;
        }
        Ok(())
    }

    /// Schedule the next queued buffer, or go idle when the queue is empty.
    ///
    /// Called once per [`OutputEvent::BufferEnded`](super::OutputEvent)
    /// notification.  The start time is clamped to the device's current
    /// time so a chunk arriving after a long gap never gets scheduled in
    /// the past.
    pub fn advance(&mut self) -> Result<(), PlayerError> {
        let Some(samples) = self.queue.pop_front() else {
            self.is_playing = false;
            return Ok(());
        };

        let now = self.output.current_time();
        let start = now.max(self.next_start_time);
        let duration = samples.len() as f64 / self.sample_rate as f64;

        self.output.schedule(samples, start)?;
        self.next_start_time = start + duration;
        Ok(())
    }

    /// Discard everything: pending queue, device schedule, chain state.
    ///
    /// The player is reusable afterwards — the next
    /// [`enqueue_chunk`](Self::enqueue_chunk) starts a fresh chain anchored
    /// at the device's then-current time.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.output.clear();
        self.is_playing = false;
        self.next_start_time = 0.0;
    }

    /// True while a scheduling chain is active.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Number of decoded buffers waiting to be scheduled.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
