//! Voice-agent service client — wire messages and websocket transport.

pub mod messages;
pub mod transport;

pub use messages::{ClientMessage, ServerMessage};
pub use transport::{connect, AgentEvent, AgentHandle, TransportError};
