//! Events and results produced by the orchestrator.

use std::time::Duration;

use beamdrop_transfer::{RejectReason, UploadState};

/// Event emitted while an upload runs.
///
/// Every upload invocation emits any number of `Progress` and
/// `RetryScheduled` events followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Progress of the current attempt, 0–100. Each attempt starts at 0.
    Progress {
        upload_id: String,
        file: String,
        attempt: u32,
        percent: f64,
    },
    /// An attempt failed; the next one starts after `delay`.
    RetryScheduled {
        upload_id: String,
        file: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// The server stored the file.
    Succeeded {
        upload_id: String,
        file: String,
        url: String,
    },
    /// The upload was refused and will not be retried.
    Rejected {
        upload_id: String,
        file: String,
        reason: RejectReason,
    },
    /// Every attempt failed.
    Failed {
        upload_id: String,
        file: String,
        message: String,
        attempts: u32,
    },
    /// Cancelled through the orchestrator's token.
    Cancelled { upload_id: String, file: String },
}

impl UploadEvent {
    pub fn upload_id(&self) -> &str {
        match self {
            Self::Progress { upload_id, .. }
            | Self::RetryScheduled { upload_id, .. }
            | Self::Succeeded { upload_id, .. }
            | Self::Rejected { upload_id, .. }
            | Self::Failed { upload_id, .. }
            | Self::Cancelled { upload_id, .. } => upload_id,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Progress { file, .. }
            | Self::RetryScheduled { file, .. }
            | Self::Succeeded { file, .. }
            | Self::Rejected { file, .. }
            | Self::Failed { file, .. }
            | Self::Cancelled { file, .. } => file,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. } | Self::RetryScheduled { .. })
    }
}

/// Terminal outcome of one upload invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded { url: String },
    Rejected { reason: RejectReason },
    Failed { message: String, attempts: u32 },
    Cancelled,
}

impl UploadOutcome {
    /// Lifecycle state this outcome ends in.
    pub fn state(&self) -> UploadState {
        match self {
            Self::Succeeded { .. } => UploadState::Succeeded,
            Self::Rejected { .. } => UploadState::Rejected,
            Self::Failed { .. } => UploadState::Failed,
            Self::Cancelled => UploadState::Cancelled,
        }
    }

    pub(crate) fn into_event(self, upload_id: String, file: String) -> UploadEvent {
        match self {
            Self::Succeeded { url } => UploadEvent::Succeeded {
                upload_id,
                file,
                url,
            },
            Self::Rejected { reason } => UploadEvent::Rejected {
                upload_id,
                file,
                reason,
            },
            Self::Failed { message, attempts } => UploadEvent::Failed {
                upload_id,
                file,
                message,
                attempts,
            },
            Self::Cancelled => UploadEvent::Cancelled { upload_id, file },
        }
    }
}

/// Result of a single file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub upload_id: String,
    pub file: String,
    pub outcome: UploadOutcome,
}

impl UploadResult {
    pub fn url(&self) -> Option<&str> {
        match &self.outcome {
            UploadOutcome::Succeeded { url } => Some(url),
            _ => None,
        }
    }
}
