//! Collection schemas and row marshaling
//!
//! The merge engine is generic over one trait instead of three bespoke
//! merge functions. A `Syncable` type names its sheet schema, exposes its
//! bookkeeping fields, and marshals itself to and from a fixed-order row of
//! cells. Marshaling never fails: missing or malformed cells fall back to
//! safe defaults so one bad row cannot abort a whole fetch.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{Category, Collection, Currency, Expense, Loan, LoanStatus, SyncStatus};

/// Static description of one collection's sheet
#[derive(Debug, Clone, Copy)]
pub struct CollectionSchema {
    pub collection: Collection,
    /// Sheet tab title
    pub title: &'static str,
    /// Grid id used when provisioning the spreadsheet
    pub sheet_id: i64,
    /// Header row, in column order
    pub columns: &'static [&'static str],
    /// A1 range holding the data rows (headers excluded)
    pub data_range: &'static str,
    /// Grid dimensions requested at provisioning
    pub row_count: i64,
}

pub static EXPENSES_SCHEMA: CollectionSchema = CollectionSchema {
    collection: Collection::Expenses,
    title: "Expenses",
    sheet_id: 0,
    columns: &[
        "ID",
        "Date",
        "Amount",
        "Category",
        "Subcategory",
        "Description",
        "Currency",
        "Timestamp",
        "SyncStatus",
    ],
    data_range: "Expenses!A2:I",
    row_count: 1000,
};

pub static LOANS_SCHEMA: CollectionSchema = CollectionSchema {
    collection: Collection::Loans,
    title: "Loans",
    sheet_id: 1,
    columns: &[
        "ID",
        "Giver",
        "Receiver",
        "Amount",
        "Currency",
        "Description",
        "Status",
        "DateCreated",
        "DateFulfilled",
        "Timestamp",
        "SyncStatus",
    ],
    data_range: "Loans!A2:K",
    row_count: 1000,
};

pub static CATEGORIES_SCHEMA: CollectionSchema = CollectionSchema {
    collection: Collection::Categories,
    title: "Categories",
    sheet_id: 2,
    columns: &["ID", "Name", "Color", "Icon", "Timestamp", "SyncStatus"],
    data_range: "Categories!A2:F",
    row_count: 100,
};

/// A record the sync engine can merge and marshal
pub trait Syncable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn schema() -> &'static CollectionSchema;

    fn id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
    fn set_timestamp(&mut self, at: DateTime<Utc>);
    fn sync_status(&self) -> SyncStatus;
    fn set_sync_status(&mut self, status: SyncStatus);

    /// Business fields in fingerprint order. Absent optional fields must
    /// serialize as the empty string so absence hashes consistently.
    fn business_fields(&self) -> Vec<String>;

    /// Marshal to one sheet row, matching the schema's column order
    fn to_row(&self) -> Vec<String>;

    /// Unmarshal from one sheet row, defaulting malformed cells in place
    fn from_row(row: &[String]) -> Self;
}

/// Cell accessor; out-of-range columns read as empty (trailing empty cells
/// are trimmed by the Sheets API).
fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn cell_opt(row: &[String], index: usize) -> Option<String> {
    let value = cell(row, index);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn opt_field(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Syncable for Expense {
    fn schema() -> &'static CollectionSchema {
        &EXPENSES_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn set_timestamp(&mut self, at: DateTime<Utc>) {
        self.timestamp = at;
    }

    fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    fn set_sync_status(&mut self, status: SyncStatus) {
        self.sync_status = status;
    }

    fn business_fields(&self) -> Vec<String> {
        vec![
            self.amount.to_string(),
            self.category.clone(),
            opt_field(&self.subcategory),
            self.description.clone(),
            self.date.clone(),
        ]
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.date.clone(),
            self.amount.to_string(),
            self.category.clone(),
            opt_field(&self.subcategory),
            self.description.clone(),
            self.currency.as_str().to_string(),
            self.timestamp.to_rfc3339(),
            self.sync_status.as_str().to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Self {
        Self {
            id: cell(row, 0).to_string(),
            date: cell(row, 1).to_string(),
            amount: parse_amount(cell(row, 2)),
            category: cell(row, 3).to_string(),
            subcategory: cell_opt(row, 4),
            description: cell(row, 5).to_string(),
            currency: Currency::parse(cell(row, 6)),
            timestamp: parse_timestamp(cell(row, 7)),
            sync_status: SyncStatus::parse(cell(row, 8)),
        }
    }
}

impl Syncable for Loan {
    fn schema() -> &'static CollectionSchema {
        &LOANS_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn set_timestamp(&mut self, at: DateTime<Utc>) {
        self.timestamp = at;
    }

    fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    fn set_sync_status(&mut self, status: SyncStatus) {
        self.sync_status = status;
    }

    fn business_fields(&self) -> Vec<String> {
        vec![
            self.amount.to_string(),
            self.giver.clone(),
            self.receiver.clone(),
            self.description.clone(),
            self.status.as_str().to_string(),
            self.date_created.clone(),
            opt_field(&self.date_fulfilled),
        ]
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.giver.clone(),
            self.receiver.clone(),
            self.amount.to_string(),
            self.currency.as_str().to_string(),
            self.description.clone(),
            self.status.as_str().to_string(),
            self.date_created.clone(),
            opt_field(&self.date_fulfilled),
            self.timestamp.to_rfc3339(),
            self.sync_status.as_str().to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Self {
        Self {
            id: cell(row, 0).to_string(),
            giver: cell(row, 1).to_string(),
            receiver: cell(row, 2).to_string(),
            amount: parse_amount(cell(row, 3)),
            currency: Currency::parse(cell(row, 4)),
            description: cell(row, 5).to_string(),
            status: LoanStatus::parse(cell(row, 6)),
            date_created: cell(row, 7).to_string(),
            date_fulfilled: cell_opt(row, 8),
            timestamp: parse_timestamp(cell(row, 9)),
            sync_status: SyncStatus::parse(cell(row, 10)),
        }
    }
}

impl Syncable for Category {
    fn schema() -> &'static CollectionSchema {
        &CATEGORIES_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn set_timestamp(&mut self, at: DateTime<Utc>) {
        self.timestamp = at;
    }

    fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    fn set_sync_status(&mut self, status: SyncStatus) {
        self.sync_status = status;
    }

    fn business_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            opt_field(&self.color),
            opt_field(&self.icon),
        ]
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            opt_field(&self.color),
            opt_field(&self.icon),
            self.timestamp.to_rfc3339(),
            self.sync_status.as_str().to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Self {
        Self {
            id: cell(row, 0).to_string(),
            name: cell(row, 1).to_string(),
            color: cell_opt(row, 2),
            icon: cell_opt(row, 3),
            timestamp: parse_timestamp(cell(row, 4)),
            sync_status: SyncStatus::parse(cell(row, 5)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_expense_row_round_trip() {
        let expense = Expense::new(
            75.5,
            Currency::Eur,
            "dinner",
            "food",
            Some("restaurant"),
            "2024-01-15",
        );

        let parsed = Expense::from_row(&expense.to_row());
        assert_eq!(parsed.id, expense.id);
        assert_eq!(parsed.amount, 75.5);
        assert_eq!(parsed.subcategory.as_deref(), Some("restaurant"));
        assert_eq!(parsed.timestamp, expense.timestamp);
    }

    #[test]
    fn test_short_row_defaults_safely() {
        let parsed = Expense::from_row(&strings(&["e1", "2024-01-01"]));
        assert_eq!(parsed.id, "e1");
        assert_eq!(parsed.amount, 0.0);
        assert_eq!(parsed.currency, Currency::Dzd);
        assert_eq!(parsed.subcategory, None);
        assert_eq!(parsed.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_unparsable_cells_default_safely() {
        let parsed = Loan::from_row(&strings(&[
            "l1",
            "Amine",
            "Sara",
            "not-a-number",
            "XYZ",
            "",
            "???",
            "2024-02-01",
            "",
            "not-a-timestamp",
            "",
        ]));
        assert_eq!(parsed.amount, 0.0);
        assert_eq!(parsed.currency, Currency::Dzd);
        assert_eq!(parsed.status, LoanStatus::Pending);
        assert_eq!(parsed.date_fulfilled, None);
        // unparsable timestamp falls back to "now", which is never in the past
        assert!(parsed.timestamp <= Utc::now());
    }

    #[test]
    fn test_schema_column_counts_match_rows() {
        let expense = Expense::new(1.0, Currency::Dzd, "", "misc", None, "2024-01-01");
        assert_eq!(expense.to_row().len(), EXPENSES_SCHEMA.columns.len());

        let loan = Loan::new(1.0, Currency::Dzd, "", "a", "b", "2024-01-01");
        assert_eq!(loan.to_row().len(), LOANS_SCHEMA.columns.len());

        let category = Category::new("Food", Some("#FF6B6B"), None);
        assert_eq!(category.to_row().len(), CATEGORIES_SCHEMA.columns.len());
    }

    #[test]
    fn test_empty_subcategory_distinct_from_missing_column() {
        // both parse to None; absence and empty hash identically by design of
        // the fixed sentinel
        let with_empty = Expense::from_row(&strings(&[
            "e1", "2024-01-01", "10", "food", "", "desc", "DZD",
        ]));
        let truncated = Expense::from_row(&strings(&["e1", "2024-01-01", "10", "food"]));
        assert_eq!(with_empty.subcategory, truncated.subcategory);
    }
}
