//! WebSocket transport
//!
//! - [`protocol`] - message types and handling, shared by both directions
//! - [`PrintClient`] - outbound client with fixed-delay reconnect
//!
//! The inbound `/ws` endpoint lives in [`crate::api::ws`].

pub mod client;
pub mod protocol;

pub use client::PrintClient;
pub use protocol::{InboundMessage, OutboundMessage, handle, handle_text};
