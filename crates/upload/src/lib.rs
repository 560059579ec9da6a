//! Upload orchestration for single-request file transfers.
//!
//! This crate owns the **control flow** of an upload: validation, attempts,
//! backoff between attempts, progress reporting and the terminal outcome.
//! It has no HTTP dependency; the network side is supplied through the
//! [`UploadTransport`] trait (see `beamdrop-http` for the real one).
//!
//! # Lifecycle
//!
//! 1. **Validate** the file size and options against [`ServerLimits`]
//! 2. **Attempt** a PUT of the whole file, streaming progress
//! 3. **Classify** the response
//! 4. **Back off** and retry on transport failures while budget remains
//! 5. **Report** exactly one terminal event

pub mod error;
pub mod orchestrator;
pub mod transport;
pub mod types;

// Re-export primary types for convenience.
pub use beamdrop_protocol::{ServerLimits, UploadOptions};
pub use beamdrop_transfer::RejectReason;
pub use error::UploadError;
pub use orchestrator::UploadOrchestrator;
pub use transport::{TransferRequest, TransferResponse, UploadFile, UploadTransport};
pub use types::{UploadEvent, UploadOutcome, UploadResult};
