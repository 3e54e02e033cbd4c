//! Utility functions

pub mod logger;
pub mod sanitize;

pub use logger::{init_logging, init_logging_with};
pub use sanitize::scrub_message;
