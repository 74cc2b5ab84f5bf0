//! Shared utilities for the Trio wallet engine.

pub mod format;
pub mod logging;

pub use format::{format_duration, format_units};
pub use logging::{init_logging, init_tracing, LogFormat, LoggingError};
