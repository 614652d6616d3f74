//! Domain records and their sheet schemas
//!
//! Defines the three synced record types (expenses, loans, categories),
//! their bookkeeping envelope, and the `Syncable` trait that parameterizes
//! the merge engine over a collection schema.

mod syncable;
mod types;

pub use syncable::{CollectionSchema, Syncable, CATEGORIES_SCHEMA, EXPENSES_SCHEMA, LOANS_SCHEMA};
pub use types::{Category, Collection, Currency, Expense, Loan, LoanStatus, SyncStatus};
