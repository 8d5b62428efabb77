//! # Symstore Utilities
//!
//! Logging setup shared by the symstore library and command line tool.

pub mod logging;

pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
