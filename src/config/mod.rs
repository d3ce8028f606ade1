//! Configuration module for the voice-agent client.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the agent
//! connection and local audio, `AppPaths` for cross-platform directories,
//! and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AgentConfig, AppConfig, AudioConfig};
