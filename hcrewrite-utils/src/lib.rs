//! hcrewrite Utilities
//!
//! Ambient helpers shared by the rewrite engine crates: logging
//! initialisation on top of `tracing`, and configuration loading for
//! recipe and type-table documents written in TOML, JSON or YAML.
//!
//! The engine crates only emit `tracing` events and never install a
//! subscriber themselves. A tool embedding them calls [`init_logging`]
//! once at startup:
//!
//! ```no_run
//! use hcrewrite_utils::{init_logging, LogLevel, LoggerConfig};
//!
//! init_logging(LoggerConfig {
//!     level: LogLevel::Debug,
//!     ..LoggerConfig::default()
//! })?;
//! # Ok::<(), hcrewrite_utils::UtilError>(())
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod logging;

pub use config::{load_config, parse_config, ConfigFormat};
pub use logging::{init_logging, LogLevel, LoggerConfig};

/// Result type used throughout hcrewrite utilities
pub type Result<T> = std::result::Result<T, UtilError>;

/// Error types for utility operations
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),
}
