//! Core module - configuration, shared state and the HTTP server
//!
//! - [`Config`] - bridge configuration
//! - [`BridgeState`] - shared handler state
//! - [`Server`] - HTTP server
//! - [`ServerError`] - server lifecycle errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, PrintBackend};
pub use error::ServerError;
pub use server::Server;
pub use state::BridgeState;
