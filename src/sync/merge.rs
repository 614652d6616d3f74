//! Merge engine
//!
//! Reconciles a local record set against a freshly fetched remote record
//! set using content fingerprints and timestamp heuristics. There is no
//! transaction log and no server clock to lean on: the only durable memory
//! is the checkpoint of fingerprints from the last successful sync.
//!
//! Pure and synchronous — all I/O belongs to the orchestrator.

use std::collections::{HashMap, HashSet};

use crate::fingerprint::fingerprint;
use crate::model::{SyncStatus, Syncable};

/// Result of one merge cycle over a single collection
#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    /// Union of both sides, exactly one record per id
    pub merged: Vec<T>,
    /// Records whose adopted version originated locally
    pub uploaded: usize,
    /// Records whose adopted version originated remotely
    pub downloaded: usize,
    /// Records where both sides diverged from the last checkpoint
    pub conflicts: usize,
}

impl<T> MergeOutcome<T> {
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.uploaded, self.downloaded, self.conflicts)
    }

    /// The backend only needs a push when local-origin changes exist
    pub fn needs_upload(&self) -> bool {
        self.uploaded > 0
    }
}

/// Merge one collection.
///
/// Every id present on either side appears exactly once in the output:
/// local records keep their order, remote-only records follow in remote
/// order. Resolution rules, per id present on both sides:
///
/// - identical fingerprints: unchanged, adopt the local copy;
/// - differing fingerprints: the strictly later timestamp wins; an exact
///   tie adopts the remote version (edits made directly in the backend
///   carry no reliable local timestamp, so a tie is read as a deliberate
///   manual edit).
///
/// The checkpoint never changes which side wins; it identifies true
/// conflicts. When the last-known fingerprint exists and matches neither
/// side, both sides changed since the previous sync: the adopted record is
/// flagged instead of silently merged.
pub fn merge<T: Syncable>(
    local: &[T],
    remote: &[T],
    checkpoint: &HashMap<String, String>,
) -> MergeOutcome<T> {
    let mut merged: Vec<T> = Vec::with_capacity(local.len().max(remote.len()));
    let mut uploaded = 0;
    let mut downloaded = 0;
    let mut conflicts = 0;

    let mut remote_by_id: HashMap<&str, &T> = HashMap::with_capacity(remote.len());
    for record in remote {
        // ids are unique within a collection; keep the first on violation
        remote_by_id.entry(record.id()).or_insert(record);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(local.len());

    for local_record in local {
        if !seen.insert(local_record.id()) {
            continue;
        }

        let Some(remote_record) = remote_by_id.get(local_record.id()).copied() else {
            // local addition, not yet on the backend
            let mut adopted = local_record.clone();
            adopted.set_sync_status(SyncStatus::Synced);
            merged.push(adopted);
            uploaded += 1;
            continue;
        };

        let local_fp = fingerprint(local_record);
        let remote_fp = fingerprint(remote_record);

        if local_fp == remote_fp {
            let mut adopted = local_record.clone();
            adopted.set_sync_status(SyncStatus::Synced);
            merged.push(adopted);
            continue;
        }

        let last_known = checkpoint.get(local_record.id());
        let diverged = matches!(last_known, Some(fp) if *fp != local_fp && *fp != remote_fp);

        let adopt_local = local_record.timestamp() > remote_record.timestamp();
        let mut adopted = if adopt_local {
            uploaded += 1;
            local_record.clone()
        } else {
            downloaded += 1;
            remote_record.clone()
        };

        if diverged {
            conflicts += 1;
            adopted.set_sync_status(SyncStatus::Conflict);
            tracing::debug!(
                id = %adopted.id(),
                winner = if adopt_local { "local" } else { "remote" },
                "Both sides changed since last sync"
            );
        } else {
            adopted.set_sync_status(SyncStatus::Synced);
        }
        merged.push(adopted);
    }

    for remote_record in remote {
        if seen.insert(remote_record.id()) {
            // remote addition, adopt verbatim
            let mut adopted = remote_record.clone();
            adopted.set_sync_status(SyncStatus::Synced);
            merged.push(adopted);
            downloaded += 1;
        }
    }

    MergeOutcome {
        merged,
        uploaded,
        downloaded,
        conflicts,
    }
}

/// Fingerprints of every merged record; becomes the next checkpoint
pub fn build_checkpoint<T: Syncable>(merged: &[T]) -> HashMap<String, String> {
    merged
        .iter()
        .map(|record| (record.id().to_string(), fingerprint(record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Expense, Loan, LoanStatus};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn expense(id: &str, amount: f64, timestamp: DateTime<Utc>) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            currency: Currency::Dzd,
            description: "desc".to_string(),
            category: "food".to_string(),
            subcategory: None,
            date: "2024-01-01".to_string(),
            timestamp,
            sync_status: SyncStatus::Pending,
        }
    }

    #[test]
    fn test_local_addition_counts_as_uploaded() {
        // Scenario A: local-only expense
        let local = vec![expense("1", 50.0, ts(1))];
        let outcome = merge(&local, &[], &HashMap::new());

        assert_eq!(outcome.counts(), (1, 0, 0));
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].id, "1");
        assert!(outcome.needs_upload());
    }

    #[test]
    fn test_remote_addition_counts_as_downloaded() {
        // Scenario B: remote-only loan
        let remote = vec![Loan {
            id: "L1".to_string(),
            amount: 200.0,
            currency: Currency::Dzd,
            description: String::new(),
            giver: "Amine".to_string(),
            receiver: "Sara".to_string(),
            status: LoanStatus::Pending,
            date_created: "2024-01-01".to_string(),
            date_fulfilled: None,
            timestamp: ts(1),
            sync_status: SyncStatus::Synced,
        }];
        let outcome = merge(&[], &remote, &HashMap::new());

        assert_eq!(outcome.counts(), (0, 1, 0));
        assert_eq!(outcome.merged[0].id, "L1");
        assert!(!outcome.needs_upload());
    }

    #[test]
    fn test_unchanged_despite_metadata_differences() {
        let local = vec![expense("1", 50.0, ts(5))];
        let mut remote_record = expense("1", 50.0, ts(1));
        remote_record.sync_status = SyncStatus::Synced;

        let outcome = merge(&local, &[remote_record], &HashMap::new());
        assert_eq!(outcome.counts(), (0, 0, 0));
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_newer_local_wins() {
        // Scenario C: local is newer even though the checkpoint says only
        // the remote side changed; timestamps decide adoption
        let local = vec![expense("1", 50.0, ts(2))];
        let remote = vec![expense("1", 75.0, ts(1))];
        let mut checkpoint = HashMap::new();
        checkpoint.insert("1".to_string(), fingerprint(&local[0]));

        let outcome = merge(&local, &remote, &checkpoint);
        assert_eq!(outcome.counts(), (1, 0, 0));
        assert_eq!(outcome.merged[0].amount, 50.0);
        assert!(outcome.needs_upload());
    }

    #[test]
    fn test_newer_remote_wins() {
        let local = vec![expense("1", 50.0, ts(1))];
        let remote = vec![expense("1", 75.0, ts(2))];

        let outcome = merge(&local, &remote, &HashMap::new());
        assert_eq!(outcome.counts(), (0, 1, 0));
        assert_eq!(outcome.merged[0].amount, 75.0);
        assert!(!outcome.needs_upload());
    }

    #[test]
    fn test_equal_timestamps_prefer_remote() {
        let local = vec![expense("1", 50.0, ts(3))];
        let remote = vec![expense("1", 75.0, ts(3))];

        let outcome = merge(&local, &remote, &HashMap::new());
        assert_eq!(outcome.counts(), (0, 1, 0));
        assert_eq!(outcome.merged[0].amount, 75.0);
    }

    #[test]
    fn test_divergence_from_checkpoint_is_flagged() {
        // checkpoint knows a third fingerprint: both sides edited since
        let old = expense("1", 10.0, ts(1));
        let local = vec![expense("1", 50.0, ts(3))];
        let remote = vec![expense("1", 75.0, ts(2))];
        let mut checkpoint = HashMap::new();
        checkpoint.insert("1".to_string(), fingerprint(&old));

        let outcome = merge(&local, &remote, &checkpoint);
        assert_eq!(outcome.counts(), (1, 0, 1));
        assert_eq!(outcome.merged[0].amount, 50.0);
        assert_eq!(outcome.merged[0].sync_status, SyncStatus::Conflict);
    }

    #[test]
    fn test_one_sided_change_is_not_a_conflict() {
        // checkpoint matches the local side: only the remote edit is new
        let local = vec![expense("1", 50.0, ts(1))];
        let remote = vec![expense("1", 75.0, ts(2))];
        let mut checkpoint = HashMap::new();
        checkpoint.insert("1".to_string(), fingerprint(&local[0]));

        let outcome = merge(&local, &remote, &checkpoint);
        assert_eq!(outcome.counts(), (0, 1, 0));
        assert_eq!(outcome.merged[0].sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_union_completeness() {
        let local = vec![
            expense("a", 1.0, ts(1)),
            expense("b", 2.0, ts(1)),
            expense("c", 3.0, ts(1)),
        ];
        let remote = vec![
            expense("b", 2.0, ts(1)),
            expense("d", 4.0, ts(1)),
            expense("e", 5.0, ts(1)),
        ];

        let outcome = merge(&local, &remote, &HashMap::new());
        let ids: Vec<&str> = outcome.merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(outcome.counts(), (2, 2, 0));
    }

    #[test]
    fn test_duplicate_ids_within_a_side_keep_first() {
        let local = vec![expense("a", 1.0, ts(1)), expense("a", 9.0, ts(2))];
        let outcome = merge(&local, &[], &HashMap::new());

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].amount, 1.0);
    }

    #[test]
    fn test_merge_is_idempotent_after_checkpoint_update() {
        let local = vec![expense("1", 50.0, ts(2)), expense("2", 30.0, ts(1))];
        let remote = vec![expense("1", 75.0, ts(1)), expense("3", 20.0, ts(1))];

        let first = merge(&local, &remote, &HashMap::new());
        assert!(first.uploaded + first.downloaded > 0);

        // both sides now hold the merged set, checkpoint rebuilt
        let checkpoint = build_checkpoint(&first.merged);
        let second = merge(&first.merged, &first.merged, &checkpoint);
        assert_eq!(second.counts(), (0, 0, 0));
        assert!(!second.needs_upload());
    }

    #[test]
    fn test_build_checkpoint_covers_every_merged_record() {
        let local = vec![expense("1", 50.0, ts(1))];
        let remote = vec![expense("2", 75.0, ts(1))];

        let outcome = merge(&local, &remote, &HashMap::new());
        let checkpoint = build_checkpoint(&outcome.merged);

        assert_eq!(checkpoint.len(), 2);
        assert_eq!(
            checkpoint.get("1"),
            Some(&fingerprint(&outcome.merged[0]))
        );
    }
}
