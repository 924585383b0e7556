//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode between reading the config
//! and printing the report.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wumpus_core::config::ConfigError,
    },

    /// The run itself failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: wumpus_core::runner::RunnerError,
    },

    /// The report could not be rendered.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
