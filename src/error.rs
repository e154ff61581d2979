// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Error type shared by the generator engine, the testers and the sweep.

/// Consolidated error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request, configuration value or map parameter is out of range.
    /// Raised before any value is drawn.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("statistics error: {0}")]
    Statistics(String),

    /// Writing a result failed. Carries the case so a run can be resumed
    /// by redoing exactly this (generator, m) pair.
    #[error("failed to persist result for {generator} at m = {m}: {source}")]
    Persist {
        generator: String,
        m: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("sweep worker for batch {0} panicked")]
    WorkerPanicked(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
