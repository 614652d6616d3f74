//! Dinero Sync CLI
//!
//! Thin command-line surface over the sync core: `sync` runs one cycle,
//! `reset` clears the sync checkpoints, `status` shows what is stored
//! locally. Everything interesting lives in the library.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dinero_sync::{
    Category, Config, Expense, Loan, SheetsBackend, SqliteKvStore, StaticTokenProvider,
    SyncOptions, SyncService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinero_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Dinero Sync v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.database.url);

    let kv = Arc::new(
        SqliteKvStore::connect(&config.database.url)
            .await
            .context("failed to open local database")?,
    );

    let tokens = Arc::new(StaticTokenProvider::new(&config.sheets.access_token));
    let backend = Arc::new(SheetsBackend::new(
        tokens,
        kv.clone(),
        &config.sheets.spreadsheet_title,
        config.sheets.spreadsheet_id.clone(),
    ));

    let service = SyncService::new(
        backend.clone(),
        kv,
        SyncOptions {
            preserve_remote_on_first_sync: config.sync.preserve_remote_on_first_sync,
        },
    );

    let command = std::env::args().nth(1).unwrap_or_else(|| "sync".to_string());
    match command.as_str() {
        "sync" => {
            let report = service.sync().await.map_err(|e| {
                if e.is_setup() {
                    anyhow::anyhow!("setup failed: {}", e)
                } else {
                    anyhow::anyhow!("sync failed: {}", e)
                }
            })?;
            println!("{}", report.message);
            if let Some(url) = backend.spreadsheet_url().await {
                println!("Backup sheet: {}", url);
            }
        }
        "reset" => {
            service
                .reset_sync_state()
                .await
                .context("failed to reset sync state")?;
            println!("Sync state cleared; next sync resolves by timestamps only");
        }
        "status" => {
            let records = service.records();
            println!(
                "Expenses: {}",
                records.count::<Expense>().await.unwrap_or(0)
            );
            println!("Loans: {}", records.count::<Loan>().await.unwrap_or(0));
            println!(
                "Categories: {}",
                records.count::<Category>().await.unwrap_or(0)
            );
            match service.last_sync_time().await {
                Some(at) => println!("Last sync: {}", at.to_rfc3339()),
                None => println!("Last sync: never"),
            }
        }
        other => {
            anyhow::bail!("unknown command '{}' (expected sync, reset or status)", other);
        }
    }

    Ok(())
}
