//! Remote tabular backend
//!
//! The remote side of a sync is a rows-based tabular API: read all rows,
//! replace all rows, no transactions, no change feed, no server clock.
//! `RemoteBackend` is the collaborator boundary the orchestrator talks to;
//! `SheetsBackend` implements it over the Google Sheets v4 REST API.

mod client;

pub use client::SheetsBackend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::CollectionSchema;

/// Supplies a bearer token for each request. Auth flows (interactive
/// sign-in, refresh) live outside the core.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token from configuration
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(crate::error::SyncError::Auth(
                "no access token configured".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}

/// Identity of the provisioned backup spreadsheet, persisted locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetInfo {
    #[serde(rename = "spreadsheetId")]
    pub spreadsheet_id: String,
    #[serde(rename = "spreadsheetUrl")]
    pub spreadsheet_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Remote tabular backend collaborator
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Provision or discover the remote structure. Called once per sync
    /// cycle before any merge; failures are setup errors, distinct from a
    /// failed sync proper.
    async fn ensure_ready(&self) -> Result<()>;

    /// All data rows of one collection's sheet
    async fn fetch_rows(&self, schema: &CollectionSchema) -> Result<Vec<Vec<String>>>;

    /// Overwrite one collection's rows. With `clear_first` unset the range
    /// is not cleared before writing, so rows beyond the written window
    /// survive (the preserve-remote-on-first-sync branch).
    async fn write_rows(
        &self,
        schema: &CollectionSchema,
        rows: Vec<Vec<String>>,
        clear_first: bool,
    ) -> Result<()>;

    /// Stamp the last successful sync in the backend's metadata sheet
    async fn record_sync_time(&self, at: DateTime<Utc>) -> Result<()>;
}
