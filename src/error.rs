//! Muninn error types

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    /// The inference provider failed for a whole chunk.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The provider returned a different number of results than inputs.
    ///
    /// The coordinator treats this like any other chunk failure: every
    /// text in the chunk falls back to a neutral record and nothing from
    /// the chunk is cached.
    #[error("inference returned {got} results for {expected} inputs")]
    ResultCountMismatch { expected: usize, got: usize },

    // Configuration errors
    #[error("no inference provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
