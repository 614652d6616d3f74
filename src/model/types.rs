//! Record types for the finance tracker
//!
//! Every record carries the same bookkeeping envelope: a stable `id`
//! assigned at creation, a `timestamp` of the last local modification and a
//! `sync_status`. Everything else on a record is a business field and feeds
//! the content fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three synced collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Expenses,
    Loans,
    Categories,
}

impl Collection {
    /// Stable name used in storage keys and log fields
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Loans => "loans",
            Collection::Categories => "categories",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sync state of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Modified locally since the last successful sync
    Pending,
    /// In sync with the remote backend as of the last cycle
    Synced,
    /// Both sides diverged since the last checkpoint; resolved, but flagged
    Conflict,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::Conflict => "conflict",
        }
    }

    /// Lenient parse for sheet cells; anything unrecognized reads as synced
    /// (rows living in the backend have by definition been synced once).
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => SyncStatus::Pending,
            "conflict" => SyncStatus::Conflict,
            _ => SyncStatus::Synced,
        }
    }
}

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Dzd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Dzd => "DZD",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "EUR" => Currency::Eur,
            "USD" => Currency::Usd,
            _ => Currency::Dzd,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Dzd
    }
}

/// Lifecycle of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Fulfilled,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "fulfilled" => LoanStatus::Fulfilled,
            _ => LoanStatus::Pending,
        }
    }
}

/// A single expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub currency: Currency,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Day the expense happened (YYYY-MM-DD)
    pub date: String,
    /// Last local modification
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "syncStatus")]
    pub sync_status: SyncStatus,
}

impl Expense {
    /// Create a new locally-authored expense, marked pending for the next sync
    pub fn new(
        amount: f64,
        currency: Currency,
        description: &str,
        category: &str,
        subcategory: Option<&str>,
        date: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            currency,
            description: description.to_string(),
            category: category.to_string(),
            subcategory: subcategory.map(|s| s.to_string()),
            date: date.to_string(),
            timestamp: Utc::now(),
            sync_status: SyncStatus::Pending,
        }
    }
}

/// Money lent or borrowed between two people
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub amount: f64,
    pub currency: Currency,
    pub description: String,
    pub giver: String,
    pub receiver: String,
    pub status: LoanStatus,
    #[serde(rename = "dateCreated")]
    pub date_created: String,
    #[serde(rename = "dateFulfilled", skip_serializing_if = "Option::is_none")]
    pub date_fulfilled: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "syncStatus")]
    pub sync_status: SyncStatus,
}

impl Loan {
    pub fn new(
        amount: f64,
        currency: Currency,
        description: &str,
        giver: &str,
        receiver: &str,
        date_created: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            currency,
            description: description.to_string(),
            giver: giver.to_string(),
            receiver: receiver.to_string(),
            status: LoanStatus::Pending,
            date_created: date_created.to_string(),
            date_fulfilled: None,
            timestamp: Utc::now(),
            sync_status: SyncStatus::Pending,
        }
    }
}

/// Spending category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "syncStatus")]
    pub sync_status: SyncStatus,
}

impl Category {
    pub fn new(name: &str, color: Option<&str>, icon: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.map(|s| s.to_string()),
            icon: icon.map(|s| s.to_string()),
            timestamp: Utc::now(),
            sync_status: SyncStatus::Pending,
        }
    }
}
