//! Error types for puzzle level generation

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during level generation, serialization or batch output
#[derive(Debug, Error)]
pub enum PuzzleError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// More shapes were requested than there are interior grid points
    #[error("requested {requested} shapes but the grid only has {available} interior points")]
    TooManyShapes { requested: usize, available: usize },

    /// The configured attempt cap was reached without producing a valid level
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// An upstream geometric invariant was broken; this is a defect, not bad luck
    #[error("internal consistency error: {0}")]
    Internal(String),

    /// A level document could not be turned back into pieces
    #[error("invalid level document: {0}")]
    InvalidLevel(String),

    /// Writing a level file failed
    #[error(
        "failed to write {} (seed {seed}, shapes {min_shapes}..={max_shapes}): {source}",
        path.display()
    )]
    Io {
        path: PathBuf,
        seed: u64,
        min_shapes: usize,
        max_shapes: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The batch worker thread panicked before reporting a result
    #[error("batch worker panicked")]
    WorkerPanicked,
}

/// Result type alias for puzzle operations
pub type Result<T> = std::result::Result<T, PuzzleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_shapes_message() {
        let err = PuzzleError::TooManyShapes { requested: 10, available: 4 };
        assert_eq!(
            err.to_string(),
            "requested 10 shapes but the grid only has 4 interior points"
        );
    }

    #[test]
    fn test_io_error_mentions_parameters() {
        let err = PuzzleError::Io {
            path: PathBuf::from("/nowhere/level.json"),
            seed: 7,
            min_shapes: 3,
            max_shapes: 5,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let message = err.to_string();
        assert!(message.contains("seed 7"));
        assert!(message.contains("3..=5"));
        assert!(message.contains("level.json"));
    }
}
