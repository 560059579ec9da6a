//! Upload run: server limits, file selection, orchestration and rendering.

use std::sync::Arc;
use std::time::Duration;

use beamdrop_http::Client;
use beamdrop_upload::{UploadEvent, UploadFile, UploadOrchestrator, UploadOutcome};
use tokio::sync::mpsc;

use crate::args::Args;
use crate::config::Config;
use crate::display::{self, Renderer};

/// Runs every requested upload. Returns `true` if all of them succeeded.
pub async fn run(config: Config, args: Args) -> anyhow::Result<bool> {
    let server_url = args.server_url(&config).to_string();
    let options = args.upload_options(&config);

    let client = Client::with_connect_timeout(
        &server_url,
        Duration::from_secs(config.connect_timeout_secs),
    )?;
    let limits = client.server_limits().await;
    tracing::info!(server = %server_url, "{}", display::limits_hint(&limits));

    if let Some(secs) = options.expiration_seconds
        && secs > limits.max_expiration_seconds
    {
        tracing::warn!(
            requested = secs,
            max = limits.max_expiration_seconds,
            "expiration exceeds the server maximum, the server may shorten it"
        );
    }

    let mut all_ok = true;
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match UploadFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                println!("[{}] cannot read file: {e}", path.display());
                all_ok = false;
            }
        }
    }
    if files.is_empty() {
        return Ok(false);
    }

    let mut orchestrator = UploadOrchestrator::new(Arc::new(client))
        .with_max_attempts(args.max_attempts(&config));
    let events = orchestrator
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("event receiver already taken"))?;

    let cancel = orchestrator.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling uploads");
            cancel.cancel();
        }
    });

    let renderer = tokio::spawn(render_events(events, Renderer::new(&options)));

    let results = orchestrator.upload_all(&files, &options, &limits).await;

    // Dropping the orchestrator closes the event channel and ends rendering.
    drop(orchestrator);
    renderer.await?;
    ctrl_c.abort();

    let succeeded = results
        .iter()
        .filter(|r| matches!(r.outcome, UploadOutcome::Succeeded { .. }))
        .count();
    tracing::info!(succeeded, total = results.len(), "uploads finished");

    Ok(all_ok && succeeded == results.len())
}

async fn render_events(mut events: mpsc::Receiver<UploadEvent>, mut renderer: Renderer) {
    while let Some(event) = events.recv().await {
        if let Some(line) = renderer.render(&event) {
            println!("{line}");
        }
    }
}
