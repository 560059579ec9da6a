//! Upload server client.
//!
//! Async HTTP client using `reqwest`. Streams file bodies from disk and
//! reports bytes sent while the request is in flight.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use beamdrop_protocol::constants::{CONFIG_PATH, CONFIG_REQUEST_TIMEOUT, CONNECT_TIMEOUT};
use beamdrop_protocol::{ServerConfig, ServerLimits};
use beamdrop_upload::{TransferRequest, TransferResponse, UploadError, UploadTransport};
use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Read size for streaming file bodies.
const UPLOAD_BUFFER_SIZE: usize = 64 * 1024;

/// Errors from the config endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for one upload server.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Self::with_connect_timeout(base_url, CONNECT_TIMEOUT)
    }

    /// Creates a client with a custom connect timeout.
    ///
    /// Only connecting is bounded; uploads of large files may run for as
    /// long as they need.
    pub fn with_connect_timeout(base_url: &str, connect_timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the server's advertised configuration.
    pub async fn fetch_config(&self) -> Result<ServerConfig, Error> {
        let url = format!("{}{}", self.base_url, CONFIG_PATH);
        let resp = self
            .http
            .get(&url)
            .timeout(CONFIG_REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns the server's limits, or defaults if they cannot be read.
    ///
    /// Never fails: a missing config endpoint must not block uploads.
    pub async fn server_limits(&self) -> ServerLimits {
        match self.fetch_config().await {
            Ok(config) => {
                let limits = ServerLimits::from_config(&config);
                debug!(
                    max_upload_size = limits.max_upload_size_bytes,
                    max_expiration_secs = limits.max_expiration_seconds,
                    "server limits loaded"
                );
                limits
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch server config, using defaults");
                ServerLimits::default()
            }
        }
    }

    async fn put_file(
        &self,
        request: &TransferRequest,
        progress_tx: mpsc::Sender<u64>,
    ) -> Result<TransferResponse, UploadError> {
        let url = format!("{}{}", self.base_url, request.path);
        let file = tokio::fs::File::open(&request.file.path).await?;

        let mut sent: u64 = 0;
        let stream = ReaderStream::with_capacity(file, UPLOAD_BUFFER_SIZE).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                // Report progress (non-blocking).
                let _ = progress_tx.try_send(sent);
            }
            chunk
        });

        let mut builder = self
            .http
            .put(&url)
            .header(CONTENT_LENGTH, request.file.size)
            .body(reqwest::Body::wrap_stream(stream));
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        debug!(%url, size = request.file.size, "sending upload request");
        let resp = builder.send().await.map_err(network_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(network_error)?;

        Ok(TransferResponse { status, body })
    }
}

impl UploadTransport for Client {
    fn put<'a>(
        &'a self,
        request: &'a TransferRequest,
        progress_tx: mpsc::Sender<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResponse, UploadError>> + Send + 'a>> {
        Box::pin(self.put_file(request, progress_tx))
    }
}

fn network_error(e: reqwest::Error) -> UploadError {
    UploadError::Network(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdrop_protocol::UploadOptions;
    use beamdrop_transfer::{build_headers, upload_path};
    use beamdrop_upload::UploadFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a mock HTTP server that answers one request with `status` and
    /// `body`. The join handle yields the raw request it received.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return String::new();
            };

            let mut received = Vec::new();
            let mut buf = vec![0u8; 8192];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            let resp = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;

            String::from_utf8_lossy(&received).into_owned()
        });

        (url, handle)
    }

    /// Returns `true` once headers and a `Content-Length` body have arrived.
    fn request_complete(data: &[u8]) -> bool {
        let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
        let len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        data.len() >= end + 4 + len
    }

    async fn temp_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> UploadFile {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        UploadFile::from_path(&path).await.unwrap()
    }

    fn request_for(file: UploadFile, options: &UploadOptions) -> TransferRequest {
        TransferRequest {
            path: upload_path(&file.name),
            headers: build_headers(options),
            file,
        }
    }

    #[tokio::test]
    async fn put_sends_path_headers_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let file = temp_file(&dir, "hello.txt", b"hello").await;
        let (url, handle) = mock_server(200, "https://dl.example/abc\n").await;

        let client = Client::new(&url).unwrap();
        let options = UploadOptions::new()
            .with_password("s3cret")
            .with_expiration_seconds(60);
        let request = request_for(file, &options);
        let (tx, _rx) = mpsc::channel(16);

        let resp = client.put(&request, tx).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "https://dl.example/abc\n");

        let raw = handle.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("PUT /hello.txt HTTP/1.1"), "request: {raw}");
        assert!(lower.contains("authorization: s3cret"), "request: {raw}");
        assert!(lower.contains("x-expiration-seconds: 60"), "request: {raw}");
        assert!(lower.contains("content-length: 5"), "request: {raw}");
        assert!(raw.ends_with("hello"), "request: {raw}");
    }

    #[tokio::test]
    async fn put_without_options_sends_no_access_headers() {
        let dir = tempfile::tempdir().unwrap();
        let file = temp_file(&dir, "plain.bin", b"abc").await;
        let (url, handle) = mock_server(200, "http://h/1").await;

        let client = Client::new(&url).unwrap();
        let request = request_for(file, &UploadOptions::new());
        let (tx, _rx) = mpsc::channel(16);
        client.put(&request, tx).await.unwrap();

        let lower = handle.await.unwrap().to_ascii_lowercase();
        assert!(!lower.contains("authorization:"));
        assert!(!lower.contains("x-expiration-seconds:"));
    }

    #[tokio::test]
    async fn put_reports_bytes_sent() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![7u8; 200_000];
        let file = temp_file(&dir, "blob.bin", &content).await;
        let (url, handle) = mock_server(200, "https://dl.example/blob").await;

        let client = Client::new(&url).unwrap();
        let request = request_for(file, &UploadOptions::new());
        let (tx, mut rx) = mpsc::channel(64);
        client.put(&request, tx).await.unwrap();
        handle.await.unwrap();

        let mut reports = Vec::new();
        while let Ok(sent) = rx.try_recv() {
            reports.push(sent);
        }
        assert!(!reports.is_empty());
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(reports.last(), Some(&200_000));
    }

    #[tokio::test]
    async fn put_returns_error_status_as_response() {
        let dir = tempfile::tempdir().unwrap();
        let file = temp_file(&dir, "a.txt", b"x").await;
        let (url, handle) = mock_server(401, "bad password").await;

        let client = Client::new(&url).unwrap();
        let request = request_for(file, &UploadOptions::new().with_password("nope"));
        let (tx, _rx) = mpsc::channel(16);

        let resp = client.put(&request, tx).await.unwrap();
        assert_eq!(resp.status, 401);
        assert_eq!(resp.body, "bad password");

        handle.abort();
    }

    #[tokio::test]
    async fn put_to_closed_port_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let file = temp_file(&dir, "a.txt", b"x").await;
        let client = Client::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let request = request_for(file, &UploadOptions::new());
        let (tx, _rx) = mpsc::channel(16);

        let err = client.put(&request, tx).await.unwrap_err();
        assert!(matches!(err, UploadError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn put_missing_local_file_is_io_error() {
        let client = Client::new("http://127.0.0.1:9").unwrap();
        let request = TransferRequest {
            path: "/gone.txt".into(),
            headers: Default::default(),
            file: UploadFile {
                name: "gone.txt".into(),
                path: "/nonexistent/dir/gone.txt".into(),
                size: 1,
            },
        };
        let (tx, _rx) = mpsc::channel(16);

        let err = client.put(&request, tx).await.unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }

    #[tokio::test]
    async fn fetch_config_parses_limits() {
        let (url, handle) =
            mock_server(200, r#"{"maxUploadSize":1048576,"maxAgeForMultiDownload":3600}"#).await;

        let client = Client::new(&url).unwrap();
        let config = client.fetch_config().await.unwrap();
        assert_eq!(config.max_upload_size, Some(1_048_576));
        assert_eq!(config.max_age_for_multi_download, Some(3_600));

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("GET /api/config HTTP/1.1"), "request: {raw}");
    }

    #[tokio::test]
    async fn server_limits_fall_back_on_error_status() {
        let (url, handle) = mock_server(500, "boom").await;

        let client = Client::new(&url).unwrap();
        assert_eq!(client.server_limits().await, ServerLimits::default());

        handle.abort();
    }

    #[tokio::test]
    async fn fetch_config_rejects_bad_json() {
        let (url, handle) = mock_server(200, "not json").await;

        let client = Client::new(&url).unwrap();
        let err = client.fetch_config().await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn server_limits_use_advertised_values() {
        let (url, handle) = mock_server(200, r#"{"maxUploadSize":2048}"#).await;

        let client = Client::new(&url).unwrap();
        let limits = client.server_limits().await;
        assert_eq!(limits.max_upload_size_bytes, 2048);
        assert_eq!(
            limits.max_expiration_seconds,
            ServerLimits::default().max_expiration_seconds
        );

        handle.abort();
    }

    #[tokio::test]
    async fn server_limits_fall_back_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = Client::new(&format!("http://127.0.0.1:{port}")).unwrap();
        assert_eq!(client.server_limits().await, ServerLimits::default());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = Client::new("https://files.example/").unwrap();
        assert_eq!(client.base_url(), "https://files.example");
    }
}
