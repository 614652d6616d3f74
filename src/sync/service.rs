//! Sync orchestrator
//!
//! Drives one full synchronization cycle across expenses, loans and
//! categories: ensure the backend is provisioned, fetch both sides, merge,
//! persist locally, conditionally push, update the checkpoint. This is the
//! only entry point UI code may call; merge internals never leak past it.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{Future, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::Mutex;

use super::merge::{build_checkpoint, merge};
use crate::error::Result;
use crate::model::{Category, Expense, Loan, Syncable};
use crate::sheets::RemoteBackend;
use crate::store::{CheckpointStore, KvStore, RecordStore};

const LAST_SYNC_KEY: &str = "last_sync_time";

/// Summary of one sync cycle, as surfaced to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub uploaded: usize,
    pub downloaded: usize,
    pub conflicts: usize,
    pub message: String,
}

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// On a collection's first-ever push (empty checkpoint), skip the
    /// remote range clear so a pre-existing backup sheet is never wiped
    /// before it has been merged in.
    pub preserve_remote_on_first_sync: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            preserve_remote_on_first_sync: true,
        }
    }
}

type SharedCycle = Shared<Pin<Box<dyn Future<Output = Result<SyncReport>> + Send>>>;

/// Sync service handle; cheap to clone, all clones share one in-flight
/// cycle guard.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<SyncServiceInner>,
}

struct SyncServiceInner {
    backend: Arc<dyn RemoteBackend>,
    records: RecordStore,
    checkpoints: CheckpointStore,
    kv: Arc<dyn KvStore>,
    options: SyncOptions,
    in_flight: Mutex<Option<SharedCycle>>,
}

/// One collection's inputs, gathered before anything is written
struct Prepared<T> {
    local: Vec<T>,
    remote: Vec<T>,
    checkpoint: HashMap<String, String>,
}

impl SyncService {
    pub fn new(backend: Arc<dyn RemoteBackend>, kv: Arc<dyn KvStore>, options: SyncOptions) -> Self {
        Self {
            inner: Arc::new(SyncServiceInner {
                backend,
                records: RecordStore::new(kv.clone()),
                checkpoints: CheckpointStore::new(kv.clone()),
                kv,
                options,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Local record access for the view layer
    pub fn records(&self) -> &RecordStore {
        &self.inner.records
    }

    /// Run one sync cycle, or join the cycle already in flight.
    ///
    /// Concurrent callers all receive the result of the same cycle; two
    /// merges can never race on the same checkpoint.
    pub async fn sync(&self) -> Result<SyncReport> {
        let cycle = {
            let mut guard = self.inner.in_flight.lock().await;
            match guard.as_ref() {
                Some(cycle) => cycle.clone(),
                None => {
                    let service = self.clone();
                    let cycle: SharedCycle = async move {
                        let result = service.run_cycle().await;
                        service.inner.in_flight.lock().await.take();
                        result
                    }
                    .boxed()
                    .shared();
                    *guard = Some(cycle.clone());
                    cycle
                }
            }
        };

        cycle.await
    }

    /// Recovery tool: drop all checkpoints. The next cycle sees every
    /// local/remote difference as new and resolves purely by timestamp.
    pub async fn reset_sync_state(&self) -> Result<()> {
        self.inner.checkpoints.clear_all().await
    }

    /// When the last successful cycle finished, if any
    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.inner.kv.get(LAST_SYNC_KEY).await.ok()??;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        tracing::info!("Starting sync cycle");

        self.inner.backend.ensure_ready().await?;

        // All reads complete before anything is written, so every fetch
        // failure aborts with local state untouched.
        let (expenses, loans, categories) = tokio::try_join!(
            self.prepare::<Expense>(),
            self.prepare::<Loan>(),
            self.prepare::<Category>(),
        )?;

        let mut uploaded = 0;
        let mut downloaded = 0;
        let mut conflicts = 0;

        for counts in [
            self.commit(expenses).await?,
            self.commit(loans).await?,
            self.commit(categories).await?,
        ] {
            uploaded += counts.0;
            downloaded += counts.1;
            conflicts += counts.2;
        }

        let now = Utc::now();
        if let Err(e) = self.inner.kv.put(LAST_SYNC_KEY, &now.to_rfc3339()).await {
            tracing::warn!(error = %e, "Failed to record local sync time");
        }
        if let Err(e) = self.inner.backend.record_sync_time(now).await {
            tracing::warn!(error = %e, "Failed to record sync time in backend metadata");
        }

        let report = SyncReport {
            uploaded,
            downloaded,
            conflicts,
            message: summary_message(uploaded, downloaded, conflicts),
        };
        tracing::info!(
            uploaded = report.uploaded,
            downloaded = report.downloaded,
            conflicts = report.conflicts,
            "Sync cycle complete"
        );
        Ok(report)
    }

    async fn prepare<T: Syncable>(&self) -> Result<Prepared<T>> {
        let schema = T::schema();

        let (local, rows) = tokio::try_join!(
            self.inner.records.get_all::<T>(),
            self.inner.backend.fetch_rows(schema),
        )?;
        let remote = rows.iter().map(|row| T::from_row(row)).collect();
        let checkpoint = self.inner.checkpoints.load(schema.collection).await;

        Ok(Prepared {
            local,
            remote,
            checkpoint,
        })
    }

    /// Merge one collection and commit in order: persist local, push
    /// remote when local-origin changes exist, then rewrite the
    /// checkpoint. A crash between steps leaves the checkpoint stale,
    /// which the next cycle absorbs; it is never left corrupt.
    async fn commit<T: Syncable>(&self, prepared: Prepared<T>) -> Result<(usize, usize, usize)> {
        let schema = T::schema();
        let outcome = merge(&prepared.local, &prepared.remote, &prepared.checkpoint);

        self.inner.records.replace_all(&outcome.merged).await?;

        if outcome.needs_upload() {
            let rows: Vec<Vec<String>> = outcome.merged.iter().map(Syncable::to_row).collect();
            let first_sync = prepared.checkpoint.is_empty();
            let clear_first =
                !(first_sync && self.inner.options.preserve_remote_on_first_sync);
            self.inner.backend.write_rows(schema, rows, clear_first).await?;
        }

        let next = build_checkpoint(&outcome.merged);
        self.inner.checkpoints.save(schema.collection, &next).await?;

        tracing::debug!(
            collection = %schema.collection,
            uploaded = outcome.uploaded,
            downloaded = outcome.downloaded,
            conflicts = outcome.conflicts,
            "Collection merged"
        );
        Ok(outcome.counts())
    }
}

fn summary_message(uploaded: usize, downloaded: usize, conflicts: usize) -> String {
    if uploaded == 0 && downloaded == 0 && conflicts == 0 {
        return "Everything is up to date".to_string();
    }

    let mut message = format!("Synced: {} uploaded, {} downloaded", uploaded, downloaded);
    if conflicts > 0 {
        message.push_str(&format!(", {} conflicts resolved", conflicts));
    }
    message
}
