use thiserror::Error;

/// Result type alias for linkback interpretation.
pub type Result<T> = std::result::Result<T, LinkbackError>;

#[derive(Debug, Error)]
pub enum LinkbackError {
    /// Structurally invalid input. The one fatal condition: silently
    /// misclassifying a malformed tree would corrupt stored metadata.
    #[error("Invalid document structure: {0}")]
    InvalidDocument(String),

    #[error("Enrichment fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
