//! Debounced background sync
//!
//! Local writes made while signed in should land in the backend without
//! the user pressing anything, but a burst of edits must not fire one
//! network round-trip per keystroke. `AutoSync` coalesces requests: a
//! cycle starts only after the requests go quiet for the debounce window.

use std::time::Duration;

use tokio::sync::mpsc;

use super::service::SyncService;

/// Handle to the background sync task. Dropping it stops the task; a
/// request still inside its quiet period is abandoned.
pub struct AutoSync {
    tx: mpsc::UnboundedSender<()>,
}

impl AutoSync {
    pub fn new(service: SyncService, debounce: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // coalesce until the channel stays quiet for one window
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(debounce) => break,
                        more = rx.recv() => {
                            if more.is_none() {
                                return;
                            }
                        }
                    }
                }

                match service.sync().await {
                    Ok(report) => {
                        tracing::debug!(
                            uploaded = report.uploaded,
                            downloaded = report.downloaded,
                            "Auto-sync cycle finished"
                        );
                    }
                    Err(e) => {
                        // surfaced again on the next manual sync; never retried here
                        tracing::warn!(error = %e, "Auto-sync cycle failed");
                    }
                }
            }
        });

        Self { tx }
    }

    /// Note that local data changed and a sync should happen soon
    pub fn request(&self) {
        let _ = self.tx.send(());
    }
}
