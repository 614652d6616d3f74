//! Google Sheets v4 REST client
//!
//! One spreadsheet, one sheet tab per collection plus a Metadata tab.
//! Provisioning (create + header rows) happens in `ensure_ready`; data
//! access is plain range reads, range clears and value PUTs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{RemoteBackend, SheetInfo, TokenProvider};
use crate::error::{Result, SyncError};
use crate::model::{CollectionSchema, CATEGORIES_SCHEMA, EXPENSES_SCHEMA, LOANS_SCHEMA};
use crate::store::KvStore;

const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEET_INFO_KEY: &str = "sheet_info";
const METADATA_TITLE: &str = "Metadata";
const METADATA_SHEET_ID: i64 = 3;
const LAST_SYNC_CELL: &str = "Metadata!B2";

static COLLECTION_SCHEMAS: [&CollectionSchema; 3] =
    [&EXPENSES_SCHEMA, &LOANS_SCHEMA, &CATEGORIES_SCHEMA];

/// Google Sheets implementation of the remote backend
pub struct SheetsBackend {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    kv: Arc<dyn KvStore>,
    /// Spreadsheet to attach to when no sheet info has been persisted yet
    configured_id: Option<String>,
    /// Title used when provisioning a fresh spreadsheet
    title: String,
    info: RwLock<Option<SheetInfo>>,
}

impl SheetsBackend {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        kv: Arc<dyn KvStore>,
        title: &str,
        configured_id: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            kv,
            configured_id,
            title: title.to_string(),
            info: RwLock::new(None),
        }
    }

    /// Spreadsheet URL for display, if the backend has been provisioned
    pub async fn spreadsheet_url(&self) -> Option<String> {
        if let Some(info) = self.info.read().await.as_ref() {
            return Some(info.spreadsheet_url.clone());
        }
        let raw = self.kv.get(SHEET_INFO_KEY).await.ok()??;
        let info: SheetInfo = serde_json::from_str(&raw).ok()?;
        Some(info.spreadsheet_url)
    }

    async fn spreadsheet_id(&self) -> Result<String> {
        self.info
            .read()
            .await
            .as_ref()
            .map(|info| info.spreadsheet_id.clone())
            .ok_or_else(|| SyncError::Setup("backend not initialized".to_string()))
    }

    /// Map a non-success response to the error taxonomy
    async fn api_error(response: reqwest::Response, context: &str) -> SyncError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = format!("{}: HTTP {} {}", context, status.as_u16(), body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => SyncError::RateLimited(detail),
            _ => SyncError::Network(detail),
        }
    }

    async fn bearer(&self) -> Result<String> {
        self.tokens.access_token().await
    }

    fn range_url(&self, spreadsheet_id: &str, range: &str, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API_BASE_URL,
            spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }

    /// Validate that a spreadsheet exists and is reachable
    async fn lookup_spreadsheet(&self, spreadsheet_id: &str) -> Result<SheetInfo> {
        let url = format!(
            "{}/{}?fields=spreadsheetId,spreadsheetUrl",
            SHEETS_API_BASE_URL, spreadsheet_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "spreadsheet lookup").await);
        }

        let body: Value = response.json().await?;
        Ok(SheetInfo {
            spreadsheet_id: body["spreadsheetId"].as_str().unwrap_or(spreadsheet_id).to_string(),
            spreadsheet_url: body["spreadsheetUrl"].as_str().unwrap_or("").to_string(),
            created_at: Utc::now(),
        })
    }

    /// Create the backup spreadsheet with one tab per collection plus
    /// Metadata, then write the header rows.
    async fn create_spreadsheet(&self) -> Result<SheetInfo> {
        let mut sheet_defs: Vec<Value> = COLLECTION_SCHEMAS
            .iter()
            .map(|schema| {
                json!({
                    "properties": {
                        "sheetId": schema.sheet_id,
                        "title": schema.title,
                        "gridProperties": {
                            "rowCount": schema.row_count,
                            "columnCount": schema.columns.len() + 1,
                        },
                    }
                })
            })
            .collect();
        sheet_defs.push(json!({
            "properties": {
                "sheetId": METADATA_SHEET_ID,
                "title": METADATA_TITLE,
                "gridProperties": { "rowCount": 10, "columnCount": 3 },
            }
        }));

        let response = self
            .http
            .post(SHEETS_API_BASE_URL)
            .bearer_auth(self.bearer().await?)
            .json(&json!({
                "properties": { "title": self.title },
                "sheets": sheet_defs,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "create spreadsheet").await);
        }

        let body: Value = response.json().await?;
        let spreadsheet_id = body["spreadsheetId"]
            .as_str()
            .ok_or_else(|| SyncError::Setup("create response missing spreadsheetId".to_string()))?
            .to_string();
        let spreadsheet_url = body["spreadsheetUrl"].as_str().unwrap_or("").to_string();

        self.setup_headers(&spreadsheet_id).await?;

        tracing::info!(url = %spreadsheet_url, "Created backup spreadsheet");
        Ok(SheetInfo {
            spreadsheet_id,
            spreadsheet_url,
            created_at: Utc::now(),
        })
    }

    async fn setup_headers(&self, spreadsheet_id: &str) -> Result<()> {
        let mut requests: Vec<Value> = Vec::new();

        for schema in COLLECTION_SCHEMAS {
            let header_cells: Vec<Value> = schema
                .columns
                .iter()
                .map(|name| json!({ "userEnteredValue": { "stringValue": name } }))
                .collect();
            requests.push(json!({
                "updateCells": {
                    "range": {
                        "sheetId": schema.sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                        "startColumnIndex": 0,
                        "endColumnIndex": schema.columns.len(),
                    },
                    "rows": [{ "values": header_cells }],
                    "fields": "userEnteredValue",
                }
            }));
        }

        // Metadata: key/value header plus the LastSync row
        requests.push(json!({
            "updateCells": {
                "range": {
                    "sheetId": METADATA_SHEET_ID,
                    "startRowIndex": 0,
                    "endRowIndex": 2,
                    "startColumnIndex": 0,
                    "endColumnIndex": 2,
                },
                "rows": [
                    { "values": [
                        { "userEnteredValue": { "stringValue": "Key" } },
                        { "userEnteredValue": { "stringValue": "Value" } },
                    ]},
                    { "values": [
                        { "userEnteredValue": { "stringValue": "LastSync" } },
                        { "userEnteredValue": { "stringValue": Utc::now().to_rfc3339() } },
                    ]},
                ],
                "fields": "userEnteredValue",
            }
        }));

        // Bold header rows
        for sheet_id in COLLECTION_SCHEMAS
            .iter()
            .map(|s| s.sheet_id)
            .chain([METADATA_SHEET_ID])
        {
            requests.push(json!({
                "repeatCell": {
                    "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
                    "cell": {
                        "userEnteredFormat": {
                            "textFormat": { "bold": true },
                            "backgroundColor": { "red": 0.9, "green": 0.9, "blue": 0.95 },
                        }
                    },
                    "fields": "userEnteredFormat.textFormat.bold,userEnteredFormat.backgroundColor",
                }
            }));
        }

        let url = format!("{}/{}:batchUpdate", SHEETS_API_BASE_URL, spreadsheet_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.bearer().await?)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "setup sheet headers").await);
        }
        Ok(())
    }

    /// Coerce a raw cell value to a string; the API returns formatted
    /// values but numbers can still appear unquoted.
    fn coerce_cell(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl RemoteBackend for SheetsBackend {
    async fn ensure_ready(&self) -> Result<()> {
        if self.info.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.info.write().await;
        if guard.is_some() {
            return Ok(());
        }

        // Previously provisioned sheet saved locally
        if let Some(raw) = self.kv.get(SHEET_INFO_KEY).await? {
            match serde_json::from_str::<SheetInfo>(&raw) {
                Ok(info) => {
                    *guard = Some(info);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Saved sheet info corrupt, re-provisioning");
                }
            }
        }

        let info = match &self.configured_id {
            // Attach to a pre-existing spreadsheet
            Some(id) => self.lookup_spreadsheet(id).await.map_err(|e| match e {
                SyncError::Auth(_) => e,
                other => SyncError::Setup(other.to_string()),
            })?,
            None => self.create_spreadsheet().await.map_err(|e| match e {
                SyncError::Auth(_) => e,
                other => SyncError::Setup(other.to_string()),
            })?,
        };

        self.kv
            .put(SHEET_INFO_KEY, &serde_json::to_string(&info)?)
            .await?;
        *guard = Some(info);
        Ok(())
    }

    async fn fetch_rows(&self, schema: &CollectionSchema) -> Result<Vec<Vec<String>>> {
        let spreadsheet_id = self.spreadsheet_id().await?;
        let url = self.range_url(&spreadsheet_id, schema.data_range, "");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "fetch rows").await);
        }

        let body: Value = response.json().await?;
        let rows = body["values"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_array())
                    .map(|row| row.iter().map(Self::coerce_cell).collect())
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    async fn write_rows(
        &self,
        schema: &CollectionSchema,
        rows: Vec<Vec<String>>,
        clear_first: bool,
    ) -> Result<()> {
        let spreadsheet_id = self.spreadsheet_id().await?;

        let row_count = rows.len();

        if clear_first {
            let url = self.range_url(&spreadsheet_id, schema.data_range, ":clear");
            let response = self
                .http
                .post(&url)
                .bearer_auth(self.bearer().await?)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::api_error(response, "clear rows").await);
            }
        }

        let url = self.range_url(
            &spreadsheet_id,
            schema.data_range,
            "?valueInputOption=USER_ENTERED",
        );
        let response = self
            .http
            .put(&url)
            .bearer_auth(self.bearer().await?)
            .json(&json!({ "values": rows }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "write rows").await);
        }

        tracing::debug!(
            collection = %schema.collection,
            rows = row_count,
            cleared = clear_first,
            "Wrote rows to backend"
        );
        Ok(())
    }

    async fn record_sync_time(&self, at: DateTime<Utc>) -> Result<()> {
        let spreadsheet_id = self.spreadsheet_id().await?;
        let url = self.range_url(
            &spreadsheet_id,
            LAST_SYNC_CELL,
            "?valueInputOption=USER_ENTERED",
        );

        let response = self
            .http
            .put(&url)
            .bearer_auth(self.bearer().await?)
            .json(&json!({ "values": [[at.to_rfc3339()]] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "record sync time").await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::StaticTokenProvider;
    use super::*;

    #[test]
    fn test_coerce_cell_values() {
        assert_eq!(SheetsBackend::coerce_cell(&json!("abc")), "abc");
        assert_eq!(SheetsBackend::coerce_cell(&json!(50)), "50");
        assert_eq!(SheetsBackend::coerce_cell(&json!(50.5)), "50.5");
        assert_eq!(SheetsBackend::coerce_cell(&Value::Null), "");
    }

    #[tokio::test]
    async fn test_static_token_provider_rejects_empty() {
        let provider = StaticTokenProvider::new("");
        assert!(matches!(
            provider.access_token().await,
            Err(SyncError::Auth(_))
        ));

        let provider = StaticTokenProvider::new("ya29.token");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");
    }
}
