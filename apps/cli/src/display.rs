//! Text rendering of upload events and limits.

use std::collections::HashMap;

use beamdrop_protocol::{ServerLimits, UploadOptions};
use beamdrop_upload::{RejectReason, UploadEvent};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with 1024-based units, e.g. `1.5KB` or `5GB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".into();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / scale as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value}{}", SIZE_UNITS[unit])
}

/// Formats a duration in the largest unit that divides it exactly.
pub fn format_duration(seconds: u64) -> String {
    let (count, unit) = [(86_400, "day"), (3_600, "hour"), (60, "minute")]
        .into_iter()
        .find(|&(size, _)| seconds >= size && seconds % size == 0)
        .map(|(size, unit)| (seconds / size, unit))
        .unwrap_or((seconds, "second"));

    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Labels describing the link a successful upload produces.
pub fn link_labels(options: &UploadOptions) -> Vec<String> {
    let mut labels = Vec::with_capacity(2);
    if options.is_one_time() {
        labels.push("one-time link".into());
    }
    if let Some(secs) = options.expiration_seconds {
        labels.push(format!("expires in {}", format_duration(secs)));
    }
    if options.password.as_deref().is_some_and(|p| !p.is_empty()) {
        labels.push("password protected".into());
    }
    labels
}

/// One-line summary of what the server accepts.
pub fn limits_hint(limits: &ServerLimits) -> String {
    format!(
        "max file size {}, max link lifetime {}",
        format_bytes(limits.max_upload_size_bytes),
        format_duration(limits.max_expiration_seconds)
    )
}

/// Turns events into user-facing lines.
///
/// Progress is printed at 10% steps so each upload produces a bounded
/// number of lines.
pub struct Renderer {
    labels: String,
    last_step: HashMap<String, u32>,
}

impl Renderer {
    pub fn new(options: &UploadOptions) -> Self {
        Self {
            labels: link_labels(options).join(", "),
            last_step: HashMap::new(),
        }
    }

    /// Returns the line to print for `event`, if any.
    pub fn render(&mut self, event: &UploadEvent) -> Option<String> {
        let file = event.file();
        if event.is_terminal() {
            self.last_step.remove(event.upload_id());
        }

        let text = match event {
            UploadEvent::Progress {
                upload_id,
                attempt,
                percent,
                ..
            } => {
                let step = (percent / 10.0).floor() as u32;
                // Each attempt restarts at 0%.
                if *percent == 0.0 {
                    self.last_step.remove(upload_id);
                    return (*attempt > 1).then(|| format!("[{file}] attempt {attempt}"));
                }
                let last = self.last_step.insert(upload_id.clone(), step);
                if last == Some(step) {
                    return None;
                }
                format!("{}%", step * 10)
            }
            UploadEvent::RetryScheduled { delay, error, .. } => format!(
                "upload failed ({error}), retrying in {}",
                format_duration(delay.as_secs().max(1))
            ),
            UploadEvent::Succeeded { url, .. } => format!("{url} ({})", self.labels),
            UploadEvent::Rejected { reason, .. } => reject_message(reason),
            UploadEvent::Failed {
                message, attempts, ..
            } => format!(
                "upload failed after {attempts} attempt{}: {message}",
                if *attempts == 1 { "" } else { "s" }
            ),
            UploadEvent::Cancelled { .. } => "upload cancelled".into(),
        };
        Some(format!("[{file}] {text}"))
    }
}

fn reject_message(reason: &RejectReason) -> String {
    match reason {
        RejectReason::TooLarge { size, limit } => format!(
            "file is {}, larger than the {} limit",
            format_bytes(*size),
            format_bytes(*limit)
        ),
        RejectReason::MissingPassword => {
            "enter a password to enable password protection".into()
        }
        RejectReason::AuthFailure => {
            "authentication failed, check the password matches the server".into()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn progress(attempt: u32, percent: f64) -> UploadEvent {
        UploadEvent::Progress {
            upload_id: "u1".into(),
            file: "a.txt".into(),
            attempt,
            percent,
        }
    }

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(1), "1B");
        assert_eq!(format_bytes(1023), "1023B");
        assert_eq!(format_bytes(1024), "1KB");
        assert_eq!(format_bytes(1536), "1.5KB");
        assert_eq!(format_bytes(1_288_490_189), "1.2GB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5GB");
        assert_eq!(format_bytes(3 * 1024u64.pow(5)), "3072TB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(45), "45 seconds");
        assert_eq!(format_duration(120), "2 minutes");
        assert_eq!(format_duration(5_400), "90 minutes");
        assert_eq!(format_duration(3_600), "1 hour");
        assert_eq!(format_duration(7 * 86_400), "7 days");
    }

    #[test]
    fn labels() {
        assert_eq!(link_labels(&UploadOptions::new()), vec!["one-time link"]);

        let options = UploadOptions::new()
            .with_password("pw")
            .with_expiration_seconds(7_200);
        assert_eq!(
            link_labels(&options),
            vec!["expires in 2 hours", "password protected"]
        );
    }

    #[test]
    fn hint() {
        assert_eq!(
            limits_hint(&ServerLimits::default()),
            "max file size 5GB, max link lifetime 7 days"
        );
    }

    #[test]
    fn progress_printed_in_steps() {
        let mut r = Renderer::new(&UploadOptions::new());
        assert_eq!(r.render(&progress(1, 0.0)), None);
        assert_eq!(r.render(&progress(1, 12.0)).as_deref(), Some("[a.txt] 10%"));
        assert_eq!(r.render(&progress(1, 15.0)), None);
        assert_eq!(r.render(&progress(1, 100.0)).as_deref(), Some("[a.txt] 100%"));

        // Retry restarts the counter and announces the attempt.
        assert_eq!(
            r.render(&progress(2, 0.0)).as_deref(),
            Some("[a.txt] attempt 2")
        );
        assert_eq!(r.render(&progress(2, 12.0)).as_deref(), Some("[a.txt] 10%"));
    }

    #[test]
    fn terminal_event_forgets_progress() {
        let mut r = Renderer::new(&UploadOptions::new());
        r.render(&progress(1, 50.0));
        assert_eq!(r.last_step.len(), 1);

        let done = UploadEvent::Cancelled {
            upload_id: "u1".into(),
            file: "a.txt".into(),
        };
        assert_eq!(
            r.render(&done).as_deref(),
            Some("[a.txt] upload cancelled")
        );
        assert!(r.last_step.is_empty());
    }

    #[test]
    fn terminal_lines() {
        let mut r = Renderer::new(&UploadOptions::new().with_expiration_seconds(60));

        let ok = UploadEvent::Succeeded {
            upload_id: "u1".into(),
            file: "a.txt".into(),
            url: "https://x/abc".into(),
        };
        assert_eq!(
            r.render(&ok).as_deref(),
            Some("[a.txt] https://x/abc (expires in 1 minute)")
        );

        let retry = UploadEvent::RetryScheduled {
            upload_id: "u1".into(),
            file: "a.txt".into(),
            attempt: 1,
            delay: Duration::from_secs(2),
            error: "server status 500".into(),
        };
        assert_eq!(
            r.render(&retry).as_deref(),
            Some("[a.txt] upload failed (server status 500), retrying in 2 seconds")
        );

        let failed = UploadEvent::Failed {
            upload_id: "u1".into(),
            file: "a.txt".into(),
            message: "server status 500".into(),
            attempts: 3,
        };
        assert_eq!(
            r.render(&failed).as_deref(),
            Some("[a.txt] upload failed after 3 attempts: server status 500")
        );

        let rejected = UploadEvent::Rejected {
            upload_id: "u1".into(),
            file: "big.iso".into(),
            reason: RejectReason::TooLarge {
                size: 6 * 1024 * 1024 * 1024,
                limit: 5 * 1024 * 1024 * 1024,
            },
        };
        assert_eq!(
            r.render(&rejected).as_deref(),
            Some("[big.iso] file is 6GB, larger than the 5GB limit")
        );
    }
}
