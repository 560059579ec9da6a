use std::collections::BTreeMap;
use std::time::Duration;

use beamdrop_protocol::UploadOptions;
use beamdrop_protocol::constants::{AUTHORIZATION_HEADER, BASE_BACKOFF, EXPIRATION_HEADER};

use crate::{RejectReason, TransferOutcome};

/// Failure message for a `200` whose body is not a link.
pub const UNEXPECTED_RESPONSE: &str = "unexpected response";

/// Builds the request headers for the chosen access controls.
///
/// The password travels as-is; the server compares it verbatim. An unset
/// option produces no header at all so the server applies its own default
/// (for expiration: a one-time link).
pub fn build_headers(options: &UploadOptions) -> BTreeMap<&'static str, String> {
    let mut headers = BTreeMap::new();
    if let Some(password) = &options.password {
        headers.insert(AUTHORIZATION_HEADER, password.clone());
    }
    if let Some(seconds) = options.expiration_seconds {
        headers.insert(EXPIRATION_HEADER, seconds.to_string());
    }
    headers
}

/// Request path for a file: `/` followed by the raw file name.
pub fn upload_path(file_name: &str) -> String {
    format!("/{file_name}")
}

/// Maps a transfer response onto an outcome.
///
/// A `200` only counts as success when the body is a link; anything else
/// under `200` is reported as a retryable failure rather than trusted.
pub fn classify(status: u16, body: &str) -> TransferOutcome {
    match status {
        200 => {
            let trimmed = body.trim();
            if trimmed.starts_with("http") {
                let url = trimmed.lines().next().unwrap_or(trimmed).trim_end();
                TransferOutcome::Success {
                    url: url.to_string(),
                }
            } else {
                TransferOutcome::TransportFailure {
                    message: UNEXPECTED_RESPONSE.into(),
                }
            }
        }
        401 => TransferOutcome::Rejected {
            reason: RejectReason::AuthFailure,
        },
        code => TransferOutcome::TransportFailure {
            message: format!("server status {code}"),
        },
    }
}

/// Delay in milliseconds after a failed attempt: `1000 * 2^(attempt-1)`.
///
/// Uncapped and without jitter. Saturates instead of overflowing.
pub fn compute_backoff_ms(attempt: u32) -> u64 {
    let base = BASE_BACKOFF.as_millis() as u64;
    let exp = attempt.saturating_sub(1);
    match 1u64.checked_shl(exp) {
        Some(factor) => base.saturating_mul(factor),
        None => u64::MAX,
    }
}

/// [`compute_backoff_ms`] as a [`Duration`].
pub fn compute_backoff(attempt: u32) -> Duration {
    Duration::from_millis(compute_backoff_ms(attempt))
}
