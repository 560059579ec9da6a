use beamdrop_protocol::{ServerLimits, UploadOptions};

use crate::RejectReason;

/// Checks a file size against the server's upload limit.
///
/// A file exactly at the limit is accepted.
pub fn validate_size(file_size: u64, limits: &ServerLimits) -> Result<(), RejectReason> {
    if file_size > limits.max_upload_size_bytes {
        return Err(RejectReason::TooLarge {
            size: file_size,
            limit: limits.max_upload_size_bytes,
        });
    }
    Ok(())
}

/// Rejects option combinations the server would never accept.
///
/// Rejects a password that is present but blank.
pub fn validate_options(options: &UploadOptions) -> Result<(), RejectReason> {
    if let Some(password) = &options.password
        && password.trim().is_empty()
    {
        return Err(RejectReason::MissingPassword);
    }
    Ok(())
}
