//! Speaker playback via `cpal`.
//!
//! [`CpalOutput`] implements [`AudioOutput`] on top of a mono cpal output
//! stream.  The device clock is derived from the number of frames the
//! output callback has consumed, so "schedule at time T" means "start at
//! output frame `T * sample_rate`" — sample-accurate and immune to wall
//! clock drift.
//!
//! The callback owns no allocation-heavy work: it copies samples from the
//! front scheduled segment (or writes silence), and fires a
//! [`OutputEvent::BufferEnded`] notification when a segment's last sample
//! has been written.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc::UnboundedSender;

use super::output::{AudioOutput, OutputError, OutputEvent};

// ---------------------------------------------------------------------------
// Schedule state
// ---------------------------------------------------------------------------

/// One scheduled buffer, positioned on the device's frame clock.
struct Segment {
    /// Output frame index at which the first sample plays.
    start_frame: u64,
    samples: Vec<f32>,
    /// Read position within `samples`.
    pos: usize,
}

/// State shared between the scheduler thread and the cpal callback.
struct ScheduleState {
    /// Pending segments, FIFO.  The scheduler guarantees non-overlapping,
    /// non-decreasing start frames, so the callback only ever looks at the
    /// front.
    segments: VecDeque<Segment>,
    /// Total frames the output callback has produced so far.
    frames_elapsed: u64,
}

/// Fill one callback buffer from the schedule.
///
/// Frames before the front segment's start are silence; a start frame
/// already in the past plays immediately (the scheduler clamps start times,
/// so this only happens within one callback buffer of slack).
fn fill_output(
    state: &mut ScheduleState,
    data: &mut [f32],
    events: &UnboundedSender<OutputEvent>,
) {
    for out in data.iter_mut() {
        let frame = state.frames_elapsed;
        let mut finished = false;

        *out = 0.0;
        if let Some(seg) = state.segments.front_mut() {
            if frame >= seg.start_frame {
                *out = seg.samples[seg.pos];
                seg.pos += 1;
                finished = seg.pos == seg.samples.len();
            }
        }

        if finished {
            state.segments.pop_front();
            // Receiver may be gone during session teardown.
            let _ = events.send(OutputEvent::BufferEnded);
        }

        state.frames_elapsed += 1;
    }
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Mono output device wrapper built on top of `cpal`.
///
/// The stream starts playing (silence) immediately on construction and is
/// stopped when the value is dropped.  One `CpalOutput` is the sole writer
/// to the device for the whole session; only the playback scheduler submits
/// buffers to it.
pub struct CpalOutput {
    state: Arc<Mutex<ScheduleState>>,
    sample_rate: u32,
    _stream: cpal::Stream,
}

impl CpalOutput {
    /// Open the system default output device as a mono stream at
    /// `sample_rate` Hz.
    ///
    /// `events` receives one [`OutputEvent::BufferEnded`] per scheduled
    /// buffer, sent from the audio callback thread.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::NoDevice`] when no output device exists, or
    /// [`OutputError::BuildStream`] / [`OutputError::PlayStream`] when the
    /// platform rejects the mono stream configuration.
    pub fn new(
        sample_rate: u32,
        events: UnboundedSender<OutputEvent>,
    ) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let state = Arc::new(Mutex::new(ScheduleState {
            segments: VecDeque::new(),
            frames_elapsed: 0,
        }));

        let callback_state = Arc::clone(&state);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut st = callback_state.lock().unwrap();
                fill_output(&mut st, data, &events);
            },
            |err: cpal::StreamError| {
                log::error!("cpal output stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;

        Ok(Self {
            state,
            sample_rate,
            _stream: stream,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn current_time(&self) -> f64 {
        let frames = self.state.lock().unwrap().frames_elapsed;
        frames as f64 / self.sample_rate as f64
    }

    fn schedule(&mut self, samples: Vec<f32>, start_time: f64) -> Result<(), OutputError> {
        let start_frame = (start_time * self.sample_rate as f64).round() as u64;
        self.state.lock().unwrap().segments.push_back(Segment {
            start_frame,
            samples,
            pos: 0,
        });
        Ok(())
    }

    fn clear(&mut self) {
        self.state.lock().unwrap().segments.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    // `CpalOutput` itself needs physical audio hardware, so the tests
    // exercise `fill_output` on the shared schedule state directly — the
    // callback is a thin wrapper around it.

    use super::*;
    use tokio::sync::mpsc;

    fn state() -> ScheduleState {
        ScheduleState {
            segments: VecDeque::new(),
            frames_elapsed: 0,
        }
    }

    #[test]
    fn silence_until_start_frame() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut st = state();
        st.segments.push_back(Segment {
            start_frame: 4,
            samples: vec![0.5; 4],
            pos: 0,
        });

        let mut buf = [1.0f32; 8];
        fill_output(&mut st, &mut buf, &tx);

        assert_eq!(buf[..4], [0.0; 4]);
        assert_eq!(buf[4..], [0.5; 4]);
        assert_eq!(st.frames_elapsed, 8);
    }

    #[test]
    fn segment_completion_emits_event_and_pops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut st = state();
        st.segments.push_back(Segment {
            start_frame: 0,
            samples: vec![0.1; 3],
            pos: 0,
        });

        let mut buf = [0.0f32; 8];
        fill_output(&mut st, &mut buf, &tx);

        assert!(st.segments.is_empty());
        assert!(matches!(rx.try_recv(), Ok(OutputEvent::BufferEnded)));
        assert!(rx.try_recv().is_err(), "exactly one event per segment");
        // Remainder of the buffer is silence.
        assert_eq!(buf[3..], [0.0; 5]);
    }

    #[test]
    fn past_start_frame_plays_immediately() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut st = state();
        st.frames_elapsed = 100;
        st.segments.push_back(Segment {
            start_frame: 50, // already in the past
            samples: vec![0.7; 2],
            pos: 0,
        });

        let mut buf = [0.0f32; 4];
        fill_output(&mut st, &mut buf, &tx);

        assert_eq!(buf[..2], [0.7; 2]);
    }

    #[test]
    fn back_to_back_segments_have_no_gap() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut st = state();
        st.segments.push_back(Segment {
            start_frame: 0,
            samples: vec![0.1; 4],
            pos: 0,
        });
        st.segments.push_back(Segment {
            start_frame: 4,
            samples: vec![0.2; 4],
            pos: 0,
        });

        let mut buf = [0.0f32; 8];
        fill_output(&mut st, &mut buf, &tx);

        assert_eq!(buf[..4], [0.1; 4]);
        assert_eq!(buf[4..], [0.2; 4]);
        assert!(matches!(rx.try_recv(), Ok(OutputEvent::BufferEnded)));
        assert!(matches!(rx.try_recv(), Ok(OutputEvent::BufferEnded)));
    }

    #[test]
    fn segment_spans_multiple_callbacks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut st = state();
        st.segments.push_back(Segment {
            start_frame: 0,
            samples: vec![0.3; 10],
            pos: 0,
        });

        let mut buf = [0.0f32; 6];
        fill_output(&mut st, &mut buf, &tx);
        assert!(rx.try_recv().is_err(), "no event mid-segment");

        fill_output(&mut st, &mut buf, &tx);
        assert!(matches!(rx.try_recv(), Ok(OutputEvent::BufferEnded)));
        assert_eq!(buf[..4], [0.3; 4]);
        assert_eq!(buf[4..], [0.0; 2]);
    }
}
