//! Wire constants and shared types for talking to a beamdrop upload endpoint.

pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use types::{ExpirationUnit, ServerConfig, ServerLimits, UploadOptions};

/// Errors produced when parsing user-supplied protocol values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown expiration unit: {0}")]
    UnknownUnit(String),
}
