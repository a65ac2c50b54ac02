//! Utilities - boundary errors and logging

pub mod error;
pub mod logger;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use logger::init_logger_with_file;
