//! Upload orchestrator.
//!
//! Drives each file through validation, transfer attempts and backoff,
//! reports progress on an event channel, and supports cancellation.

use std::sync::Arc;

use beamdrop_protocol::constants::DEFAULT_MAX_ATTEMPTS;
use beamdrop_protocol::{ServerLimits, UploadOptions};
use beamdrop_transfer::{
    AttemptState, ProgressMeter, TransferOutcome, UploadState, build_headers, classify,
    compute_backoff, upload_path, validate_options, validate_size,
};
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::UploadError;
use crate::transport::{TransferRequest, TransferResponse, UploadFile, UploadTransport};
use crate::types::{UploadEvent, UploadOutcome, UploadResult};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Orchestrates uploads of one or more files.
pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
    max_attempts: u32,
}

impl UploadOrchestrator {
    /// Creates an orchestrator with the default attempt budget.
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the number of attempts per file (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Retry and terminal events are delivered with backpressure, so the
    /// receiver must be drained while uploads run.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the token that cancels every upload of this orchestrator.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads one file and returns its terminal outcome.
    ///
    /// The same outcome is emitted as the last event for this upload.
    pub async fn upload(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
        limits: &ServerLimits,
    ) -> UploadResult {
        let mut run = Run::new(&file.name);
        info!(
            upload_id = %run.upload_id,
            file = %file.name,
            size = file.size,
            "upload started"
        );

        let outcome = self.drive(&mut run, file, options, limits).await;
        run.transition(outcome.state());

        match &outcome {
            UploadOutcome::Succeeded { url } => {
                info!(upload_id = %run.upload_id, file = %run.file, %url, "upload completed");
            }
            UploadOutcome::Rejected { reason } => {
                warn!(upload_id = %run.upload_id, file = %run.file, %reason, "upload rejected");
            }
            UploadOutcome::Failed { message, attempts } => {
                error!(
                    upload_id = %run.upload_id,
                    file = %run.file,
                    attempts,
                    error = %message,
                    "upload failed"
                );
            }
            UploadOutcome::Cancelled => {
                info!(upload_id = %run.upload_id, file = %run.file, "upload cancelled");
            }
        }

        self.emit(
            outcome
                .clone()
                .into_event(run.upload_id.clone(), run.file.clone()),
        )
        .await;

        UploadResult {
            upload_id: run.upload_id,
            file: run.file,
            outcome,
        }
    }

    /// Uploads several files independently.
    ///
    /// Uploads progress concurrently on the calling task and share nothing
    /// but the transport and the event channel. One failing upload does not
    /// affect the others. Results come back in input order.
    pub async fn upload_all(
        &self,
        files: &[UploadFile],
        options: &UploadOptions,
        limits: &ServerLimits,
    ) -> Vec<UploadResult> {
        join_all(files.iter().map(|file| self.upload(file, options, limits))).await
    }

    async fn drive(
        &self,
        run: &mut Run,
        file: &UploadFile,
        options: &UploadOptions,
        limits: &ServerLimits,
    ) -> UploadOutcome {
        run.transition(UploadState::Validating);
        if let Err(reason) = validate_size(file.size, limits).and_then(|()| validate_options(options))
        {
            return UploadOutcome::Rejected { reason };
        }

        let request = TransferRequest {
            path: upload_path(&file.name),
            headers: build_headers(options),
            file: file.clone(),
        };
        let mut attempts = AttemptState::new(self.max_attempts);
        let mut meter = ProgressMeter::new(Some(file.size));

        loop {
            if self.cancel.is_cancelled() {
                return UploadOutcome::Cancelled;
            }

            let attempt = attempts.attempt();
            run.transition(UploadState::Attempting(attempt));
            meter.reset();
            // Attempt start is delivered with backpressure, unlike later percentages.
            self.emit(run.progress(attempt, meter.last())).await;

            let outcome = match self.transfer(run, attempt, &request, &mut meter).await {
                Ok(resp) => {
                    debug!(
                        upload_id = %run.upload_id,
                        attempt,
                        status = resp.status,
                        "transfer response received"
                    );
                    classify(resp.status, &resp.body)
                }
                Err(UploadError::Cancelled) => return UploadOutcome::Cancelled,
                Err(e) => TransferOutcome::TransportFailure {
                    message: e.to_string(),
                },
            };

            let message = match outcome {
                TransferOutcome::Success { url } => return UploadOutcome::Succeeded { url },
                TransferOutcome::Rejected { reason } => return UploadOutcome::Rejected { reason },
                TransferOutcome::TransportFailure { message } => message,
            };

            warn!(
                upload_id = %run.upload_id,
                file = %run.file,
                attempt,
                max_attempts = attempts.max_attempts(),
                progress = meter.last(),
                error = %message,
                "upload attempt failed"
            );

            let Some(next) = attempts.next() else {
                return UploadOutcome::Failed {
                    message,
                    attempts: attempt,
                };
            };

            let delay = compute_backoff(attempt);
            self.emit(UploadEvent::RetryScheduled {
                upload_id: run.upload_id.clone(),
                file: run.file.clone(),
                attempt,
                delay,
                error: message,
            })
            .await;

            tokio::select! {
                _ = self.cancel.cancelled() => return UploadOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }

            attempts = next;
        }
    }

    /// Runs one transfer, forwarding byte counts as progress events.
    ///
    /// Cancellation drops the in-flight transfer future, which aborts the
    /// request.
    async fn transfer(
        &self,
        run: &Run,
        attempt: u32,
        request: &TransferRequest,
        meter: &mut ProgressMeter,
    ) -> Result<TransferResponse, UploadError> {
        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let mut transfer = self.transport.put(request, progress_tx);

        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                result = &mut transfer => break result,
                Some(sent) = progress_rx.recv() => {
                    if let Some(percent) = meter.update(sent) {
                        self.emit_progress(run, attempt, percent);
                    }
                }
            }
        };

        // Reports queued right before the response still belong to this attempt.
        while let Ok(sent) = progress_rx.try_recv() {
            if let Some(percent) = meter.update(sent) {
                self.emit_progress(run, attempt, percent);
            }
        }

        result
    }

    fn emit_progress(&self, run: &Run, attempt: u32, percent: f64) {
        // Lossy: a slow consumer only misses intermediate percentages.
        let _ = self.events_tx.try_send(run.progress(attempt, percent));
    }

    async fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

/// Per-invocation bookkeeping. Dropped when the upload returns.
struct Run {
    upload_id: String,
    file: String,
    state: UploadState,
}

impl Run {
    fn new(file: &str) -> Self {
        Self {
            upload_id: Uuid::new_v4().to_string(),
            file: file.to_string(),
            state: UploadState::Idle,
        }
    }

    fn progress(&self, attempt: u32, percent: f64) -> UploadEvent {
        UploadEvent::Progress {
            upload_id: self.upload_id.clone(),
            file: self.file.clone(),
            attempt,
            percent,
        }
    }

    fn transition(&mut self, next: UploadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal upload transition {} -> {}",
            self.state,
            next
        );
        debug!(upload_id = %self.upload_id, from = %self.state, to = %next, "upload state changed");
        self.state = next;
    }
}
