//! Dinero Sync
//!
//! Synchronization core for a local-first personal finance tracker:
//! bidirectional merge between on-device records (expenses, loans,
//! categories) and a Google Sheets backup, with content-hash change
//! detection, timestamp conflict resolution and an incremental sync
//! checkpoint.
//!
//! # Modules
//!
//! - `model`: record types and the `Syncable` schema trait
//! - `fingerprint`: content hashing of business fields
//! - `store`: local key-value persistence, records and checkpoints
//! - `sheets`: the remote tabular backend (Google Sheets REST)
//! - `sync`: merge engine, orchestrator and debounced auto-sync

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod sheets;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{Result, SyncError};
pub use fingerprint::fingerprint;
pub use model::{Category, Collection, Currency, Expense, Loan, LoanStatus, SyncStatus, Syncable};
pub use sheets::{RemoteBackend, SheetsBackend, StaticTokenProvider, TokenProvider};
pub use store::{CheckpointStore, KvStore, MemoryKvStore, RecordStore, SqliteKvStore};
pub use sync::{AutoSync, SyncOptions, SyncReport, SyncService};
