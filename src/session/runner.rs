//! Session event loop.
//!
//! [`run_session`] drains three event sources in one `tokio::select!` loop:
//!
//! ```text
//! AgentEvent::Audio(chunk)   ──▶ player.enqueue_chunk
//! OutputEvent::BufferEnded   ──▶ player.advance
//! mic chunk (mono f32)       ──▶ resample → encode_wav_chunk → audioIn
//! AgentEvent::Closed         ──▶ player.reset, return
//! ```
//!
//! A single consumer owns all player mutation, so queue, cursor and playing
//! flag never race — the "on buffer end, schedule next" chain of the
//! playback design becomes an explicit loop here instead of nested
//! callbacks.
//!
//! Faults are contained per chunk: a malformed agent chunk is logged and
//! dropped, a failed mic encode is logged and skipped; neither ends the
//! session.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::agent::{AgentEvent, AgentHandle};
use crate::audio::{encode_wav_chunk, resample, AudioStreamPlayer, OutputEvent};

/// Run one voice session to completion.
///
/// Returns when the agent connection closes ([`AgentEvent::Closed`]) or
/// every event source has gone away.  The player is reset on the way out so
/// queued audio does not outlive the session.
///
/// `mic_sample_rate` is the native rate of chunks on `mic_chunks`;
/// `input_sample_rate` is what the agent expects for `audioIn` payloads.
/// Playback-only sessions just drop the mic sender before calling this.
pub async fn run_session(
    mut player: AudioStreamPlayer,
    agent: AgentHandle,
    mut agent_events: UnboundedReceiver<AgentEvent>,
    mut output_events: UnboundedReceiver<OutputEvent>,
    mut mic_chunks: UnboundedReceiver<Vec<f32>>,
    mic_sample_rate: u32,
    input_sample_rate: u32,
) {
    let mut mic_active = true;

    loop {
        tokio::select! {
            event = agent_events.recv() => match event {
                Some(AgentEvent::Audio(data)) => {
                    if let Err(e) = player.enqueue_chunk(&data) {
                        log::warn!("dropping agent chunk: {e}");
                    }
                }
                Some(AgentEvent::Error(message)) => {
                    log::error!("agent error: {message}");
                }
                Some(AgentEvent::Closed) | None => {
                    log::info!("agent connection closed; ending session");
                    break;
                }
            },

            event = output_events.recv() => match event {
                Some(OutputEvent::BufferEnded) => {
                    if let Err(e) = player.advance() {
                        log::error!("failed to schedule next buffer: {e}");
                    }
                }
                None => {
                    log::warn!("output device event stream ended");
                    break;
                }
            },

            chunk = mic_chunks.recv(), if mic_active => match chunk {
                Some(samples) => {
                    let resampled = resample(&samples, mic_sample_rate, input_sample_rate);
                    match encode_wav_chunk(&resampled, input_sample_rate) {
                        Ok(data) => agent.send_audio(data),
                        Err(e) => log::warn!("skipping mic chunk: {e}"),
                    }
                }
                None => {
                    // Capture was never started or its handle was dropped.
                    mic_active = false;
                }
            },
        }
    }

    player.reset();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc;

    use super::*;
    use crate::agent::{AgentEvent, AgentHandle, ClientMessage};
    use crate::audio::{decode_chunk, AudioOutput, OutputError};

    const RATE: u32 = 24_000;

    #[derive(Default)]
    struct FakeState {
        now: f64,
        starts: Vec<f64>,
        cleared: bool,
    }

    #[derive(Clone, Default)]
    struct FakeOutput(Arc<Mutex<FakeState>>);

    impl AudioOutput for FakeOutput {
        fn current_time(&self) -> f64 {
            self.0.lock().unwrap().now
        }

        fn schedule(&mut self, _samples: Vec<f32>, start_time: f64) -> Result<(), OutputError> {
            self.0.lock().unwrap().starts.push(start_time);
            Ok(())
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().cleared = true;
        }
    }

    /// Base64 WAV chunk with `n` constant samples.
    fn agent_chunk(n: usize) -> String {
        encode_wav_chunk(&vec![0.25; n], RATE).expect("encode")
    }

    /// Let the session future (joined on the same task) make progress.
    async fn breathe() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn full_session_flow() {
        let fake = FakeOutput::default();
        let player = AudioStreamPlayer::new(Box::new(fake.clone()), RATE);

        let (agent_tx, agent_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (mic_tx, mic_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel();
        let handle = AgentHandle::new(outgoing_tx);

        let session = run_session(player, handle, agent_rx, output_rx, mic_rx, 48_000, 16_000);

        let fake_driver = fake.clone();
        let driver = async move {
            // Two agent chunks arrive; the first starts the chain.
            agent_tx.send(AgentEvent::Audio(agent_chunk(2400))).unwrap();
            agent_tx.send(AgentEvent::Audio(agent_chunk(2400))).unwrap();
            breathe().await;
            assert_eq!(fake_driver.0.lock().unwrap().starts.len(), 1);

            // The device reports the first buffer done; the second follows.
            fake_driver.0.lock().unwrap().now = 0.1;
            output_tx.send(OutputEvent::BufferEnded).unwrap();
            breathe().await;
            assert_eq!(fake_driver.0.lock().unwrap().starts.len(), 2);

            // A 10ms mic chunk at 48 kHz goes out as 16 kHz audioIn.
            mic_tx.send(vec![0.1_f32; 480]).unwrap();
            breathe().await;

            agent_tx.send(AgentEvent::Closed).unwrap();
        };

        tokio::join!(session, driver);

        // Gapless: second buffer starts exactly at the first one's end.
        let state = fake.0.lock().unwrap();
        assert_eq!(state.starts.len(), 2);
        assert!((state.starts[0] - 0.0).abs() < 1e-9);
        assert!((state.starts[1] - 0.1).abs() < 1e-9);
        assert!(state.cleared, "player must be reset when the session ends");
        drop(state);

        // The mic chunk was resampled to the agent input rate and encoded.
        let sent = outgoing_rx.try_recv().expect("one audioIn frame");
        let ClientMessage::AudioIn { data } = sent else {
            panic!("expected audioIn, got {sent:?}");
        };
        let samples = decode_chunk(&data).expect("decode our own encoding");
        assert_eq!(samples.len(), 160); // 480 @ 48k → 160 @ 16k
    }

    #[tokio::test]
    async fn malformed_chunk_does_not_end_session() {
        let fake = FakeOutput::default();

        let (agent_tx, agent_rx) = mpsc::unbounded_channel();
        let (_output_tx, output_rx) = mpsc::unbounded_channel();
        let (_mic_tx, mic_rx) = mpsc::unbounded_channel::<Vec<f32>>();
        let (outgoing_tx, _outgoing_rx) = mpsc::unbounded_channel();

        let session = run_session(
            AudioStreamPlayer::new(Box::new(fake.clone()), RATE),
            AgentHandle::new(outgoing_tx),
            agent_rx,
            output_rx,
            mic_rx,
            0,
            16_000,
        );

        let fake_driver = fake.clone();
        let driver = async move {
            agent_tx.send(AgentEvent::Audio("@@garbage@@".into())).unwrap();
            breathe().await;

            // Session still alive: a good chunk after the bad one plays.
            agent_tx.send(AgentEvent::Audio(agent_chunk(240))).unwrap();
            breathe().await;
            assert_eq!(fake_driver.0.lock().unwrap().starts.len(), 1);

            agent_tx.send(AgentEvent::Closed).unwrap();
        };

        tokio::join!(session, driver);
    }

    #[tokio::test]
    async fn playback_only_session_tolerates_missing_mic() {
        let fake = FakeOutput::default();

        let (agent_tx, agent_rx) = mpsc::unbounded_channel();
        let (_output_tx, output_rx) = mpsc::unbounded_channel();
        let (mic_tx, mic_rx) = mpsc::unbounded_channel::<Vec<f32>>();
        let (outgoing_tx, _outgoing_rx) = mpsc::unbounded_channel();
        drop(mic_tx); // no microphone on this machine

        let session = run_session(
            AudioStreamPlayer::new(Box::new(fake.clone()), RATE),
            AgentHandle::new(outgoing_tx),
            agent_rx,
            output_rx,
            mic_rx,
            0,
            16_000,
        );

        let driver = async move {
            agent_tx.send(AgentEvent::Audio(agent_chunk(240))).unwrap();
            breathe().await;
            agent_tx.send(AgentEvent::Closed).unwrap();
        };

        tokio::join!(session, driver);
        assert_eq!(fake.0.lock().unwrap().starts.len(), 1);
    }
}
