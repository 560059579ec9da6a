use std::time::Duration;

/// Header carrying the raw upload password.
///
/// The server compares the value verbatim, so it is never hashed or
/// prefixed with an auth scheme.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header carrying the requested link lifetime in whole seconds.
pub const EXPIRATION_HEADER: &str = "X-Expiration-Seconds";

/// Path of the read-only server configuration endpoint.
pub const CONFIG_PATH: &str = "/api/config";

/// Upload size limit assumed when the server does not advertise one (5 GiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Link lifetime limit assumed when the server does not advertise one (7 days).
pub const DEFAULT_MAX_EXPIRATION_SECS: u64 = 7 * 86_400;

/// Lifetime used when an expiration is requested with a non-positive value.
pub const FALLBACK_EXPIRATION_SECS: u64 = 3_600;

/// Number of transfer attempts per file, first attempt included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubles for every attempt after that.
pub const BASE_BACKOFF: Duration = Duration::from_millis(1_000);

/// Timeout for establishing a TCP connection to the server.
///
/// Only the connect phase is bounded. The transfer itself may take as
/// long as the file needs.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the configuration request.
pub const CONFIG_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
