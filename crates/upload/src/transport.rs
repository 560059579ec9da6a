//! Transport trait and the request/response values it exchanges.
//!
//! `UploadTransport` is implemented over HTTP by `beamdrop-http`. Keeping
//! it a trait lets the orchestrator run against scripted mocks in tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::UploadError;

/// A local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name as sent to the server (last path component).
    pub name: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Size in bytes at selection time.
    pub size: u64,
}

impl UploadFile {
    /// Stats `path` and builds an upload entry for it.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(UploadError::NotAFile(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::NotAFile(path.display().to_string()))?;

        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

/// One PUT carrying a whole file.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Target path, `/` + raw file name.
    pub path: String,
    /// Access-control headers.
    pub headers: BTreeMap<&'static str, String>,
    pub file: UploadFile,
}

/// Status and body of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResponse {
    pub status: u16,
    pub body: String,
}

/// Abstract network side of an upload.
pub trait UploadTransport: Send + Sync {
    /// Sends the request and waits for the server's response.
    ///
    /// While the body streams, the transport reports the cumulative number
    /// of bytes sent on `progress_tx`. Reports are best effort and may be
    /// dropped. An `Err` means no response was received at all.
    fn put<'a>(
        &'a self,
        request: &'a TransferRequest,
        progress_tx: mpsc::Sender<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResponse, UploadError>> + Send + 'a>>;
}
