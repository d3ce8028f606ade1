//! Voice session orchestration.
//!
//! A session is one websocket conversation with the agent: the runner owns
//! the playback scheduler for its whole lifetime and is the only code that
//! mutates it.

pub mod runner;

pub use runner::run_session;
