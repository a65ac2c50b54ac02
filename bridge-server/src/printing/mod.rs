//! Print Dispatch Module
//!
//! This module turns an inbound print request into a spooler job:
//! - Dispatcher: picks the strategy for the declared content type
//! - Materializer: writes content to transient (or retained) files
//! - Renderer: out-of-process HTML printing

pub mod dispatcher;
pub mod error;
pub mod materializer;
pub mod renderer;
pub mod test_page;
pub mod types;

pub use dispatcher::PrintDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use materializer::{Artifact, Materializer};
pub use renderer::{CommandRenderer, HtmlRenderer, ScriptRenderer, platform_renderer};
pub use test_page::test_page_content;
pub use types::*;
