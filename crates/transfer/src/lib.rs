//! Transfer policy for single-request file uploads.
//!
//! Everything here is pure decision logic: no I/O, no clocks. The
//! orchestrator in `beamdrop-upload` asks these functions what to send,
//! how to read the answer, and how long to wait before trying again.

mod policy;
mod progress;
mod types;
mod validation;

pub use policy::{
    UNEXPECTED_RESPONSE, build_headers, classify, compute_backoff, compute_backoff_ms,
    upload_path,
};
pub use progress::ProgressMeter;
pub use types::{AttemptState, RejectReason, TransferOutcome, UploadState};
pub use validation::{validate_options, validate_size};
