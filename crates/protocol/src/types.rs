use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::{
    DEFAULT_MAX_EXPIRATION_SECS, DEFAULT_MAX_UPLOAD_SIZE, FALLBACK_EXPIRATION_SECS,
};

/// Access controls requested for a single upload.
///
/// `None` means no restriction: without a password anyone holding the link
/// can fetch the file, and without an expiration the server issues a
/// one-time link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub password: Option<String>,
    pub expiration_seconds: Option<u64>,
}

impl UploadOptions {
    /// Creates options with no restrictions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests password protection.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Requests a link lifetime in seconds. Zero is treated as "unset".
    pub fn with_expiration_seconds(mut self, seconds: u64) -> Self {
        self.expiration_seconds = (seconds > 0).then_some(seconds);
        self
    }

    /// Returns `true` if the server will hand out a one-time link.
    pub fn is_one_time(&self) -> bool {
        self.expiration_seconds.is_none()
    }
}

/// Unit used when the user enters an expiration as value + unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationUnit {
    Seconds,
    Minutes,
    #[default]
    Hours,
    Days,
}

impl ExpirationUnit {
    /// Number of seconds in one unit.
    pub fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
        }
    }
}

impl FromStr for ExpirationUnit {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(Self::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hr" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(ProtocolError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for ExpirationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        };
        f.write_str(s)
    }
}

/// Converts a value + unit entry into seconds.
///
/// Non-positive values fall back to one hour.
pub fn expiration_seconds(value: i64, unit: ExpirationUnit) -> u64 {
    if value <= 0 {
        return FALLBACK_EXPIRATION_SECS;
    }
    (value as u64).saturating_mul(unit.seconds())
}

/// Body of `GET /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_for_multi_download: Option<u64>,
}

/// Limits enforced by the server, threaded explicitly into validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    pub max_upload_size_bytes: u64,
    pub max_expiration_seconds: u64,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE,
            max_expiration_seconds: DEFAULT_MAX_EXPIRATION_SECS,
        }
    }
}

impl ServerLimits {
    /// Builds limits from the advertised config, filling missing or zero
    /// fields with defaults.
    pub fn from_config(config: &ServerConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_upload_size_bytes: config
                .max_upload_size
                .filter(|&v| v > 0)
                .unwrap_or(defaults.max_upload_size_bytes),
            max_expiration_seconds: config
                .max_age_for_multi_download
                .filter(|&v| v > 0)
                .unwrap_or(defaults.max_expiration_seconds),
        }
    }
}
