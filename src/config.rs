//! Configuration management for Dinero Sync

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sheets: SheetsConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// OAuth access token with spreadsheets + drive.file scope
    pub access_token: String,
    /// Pre-existing spreadsheet to attach to; a new one is provisioned when unset
    pub spreadsheet_id: Option<String>,
    /// Title used when provisioning a new backup spreadsheet
    pub spreadsheet_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Quiet period for coalescing auto-sync requests, in milliseconds
    pub debounce_ms: u64,
    /// Skip the remote range clear on the first push so a pre-existing
    /// backup sheet is never wiped before it has been merged in
    pub preserve_remote_on_first_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite:./dinero.db".to_string(),
            },
            sheets: SheetsConfig {
                access_token: String::new(),
                spreadsheet_id: None,
                spreadsheet_title: "ExpenseTracker_Backup".to_string(),
            },
            sync: SyncConfig {
                debounce_ms: 2000,
                preserve_remote_on_first_sync: true,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./dinero.db".to_string()),
            },
            sheets: SheetsConfig {
                access_token: env::var("GOOGLE_ACCESS_TOKEN")?,
                spreadsheet_id: env::var("SPREADSHEET_ID").ok(),
                spreadsheet_title: env::var("SPREADSHEET_TITLE")
                    .unwrap_or_else(|_| "ExpenseTracker_Backup".to_string()),
            },
            sync: SyncConfig {
                debounce_ms: env::var("SYNC_DEBOUNCE_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .unwrap_or(2000),
                preserve_remote_on_first_sync: env::var("PRESERVE_REMOTE_ON_FIRST_SYNC")
                    .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                    .unwrap_or(true),
            },
        })
    }
}
