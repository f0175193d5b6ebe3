#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// Request failed or the server answered with an error status
    #[error(transparent)]
    Network(#[from] anyhow::Error),

    /// The collection already holds the book
    #[error("{0}")]
    Conflict(String),

    /// Persisted value could not be read back
    #[error("Failed to decode persisted {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
