use std::fmt;

use beamdrop_protocol::constants::DEFAULT_MAX_ATTEMPTS;

/// Why an upload was refused without further attempts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("file is {size} bytes, server limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("password protection requested without a password")]
    MissingPassword,

    #[error("password rejected by server")]
    AuthFailure,
}

/// How a single transfer attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The server stored the file and returned its retrieval link.
    Success { url: String },
    /// The server refused the upload; retrying cannot help.
    Rejected { reason: RejectReason },
    /// Anything else. Worth another attempt if the budget allows.
    TransportFailure { message: String },
}

/// Attempt counter for one file's upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    attempt: u32,
    max_attempts: u32,
}

impl Default for AttemptState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl AttemptState {
    /// Starts at attempt 1. A budget of zero still allows one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 1,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `true` if a failure now may be followed by another attempt.
    pub fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Moves to the next attempt, or returns `None` when the budget is spent.
    pub fn next(self) -> Option<Self> {
        self.has_remaining().then(|| Self {
            attempt: self.attempt + 1,
            max_attempts: self.max_attempts,
        })
    }
}

/// Lifecycle of one upload invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Validating,
    Attempting(u32),
    Succeeded,
    Rejected,
    Failed,
    Cancelled,
}

impl UploadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Rejected | Self::Failed | Self::Cancelled
        )
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        match (self, next) {
            (Idle, Validating) => true,
            (Validating, Rejected | Attempting(1) | Cancelled) => true,
            (Attempting(n), Attempting(m)) => m == n + 1,
            (Attempting(_), Succeeded | Rejected | Failed | Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Attempting(n) => write!(f, "attempting({n})"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Rejected => f.write_str("rejected"),
            Self::Failed => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}
