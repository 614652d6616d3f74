//! Synchronization core
//!
//! Provides:
//! - The merge engine reconciling local and remote record sets
//! - The orchestrator running full sync cycles with single-flight guarding
//! - Debounced background sync for local-write bursts
//!
//! # Sync cycle
//!
//! 1. `ensure_ready` provisions or validates the remote spreadsheet
//! 2. Local records, remote rows and checkpoints load for all collections
//! 3. Each collection merges independently (pure, no I/O)
//! 4. Per collection: persist local → push remote if local changes exist →
//!    rewrite checkpoint
//! 5. The cycle's counts roll up into a single `SyncReport`

mod auto;
mod merge;
mod service;

pub use auto::AutoSync;
pub use merge::{build_checkpoint, merge, MergeOutcome};
pub use service::{SyncOptions, SyncReport, SyncService};
