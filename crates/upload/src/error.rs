//! Upload error types.

/// Errors raised while preparing or performing a transfer.
///
/// None of these reach the presentation layer directly: the orchestrator
/// folds them into a terminal [`UploadEvent`](crate::UploadEvent).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("not a regular file: {0}")]
    NotAFile(String),

    #[error("cancelled")]
    Cancelled,
}
