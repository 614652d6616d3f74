//! Content fingerprinting
//!
//! A fingerprint is a SHA-256 hash over a record's business fields in their
//! fixed schema order, joined by a unit separator. Bookkeeping fields (id,
//! timestamp, sync status) are deliberately excluded: they are sync
//! metadata, not user data, and must never make two otherwise-identical
//! records look different.

use sha2::{Digest, Sha256};

use crate::model::Syncable;

/// Field separator; keeps `["ab", "c"]` distinct from `["a", "bc"]`.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Compute the content fingerprint of a record.
///
/// Pure and stable across process restarts: identical business fields
/// always produce the identical hex digest.
pub fn fingerprint<T: Syncable>(record: &T) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in record.business_fields().iter().enumerate() {
        if i > 0 {
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Expense, SyncStatus};
    use chrono::{TimeZone, Utc};

    fn sample_expense() -> Expense {
        Expense {
            id: "e1".to_string(),
            amount: 50.0,
            currency: Currency::Dzd,
            description: "groceries".to_string(),
            category: "food".to_string(),
            subcategory: None,
            date: "2024-01-02".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            sync_status: SyncStatus::Pending,
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let expense = sample_expense();
        assert_eq!(fingerprint(&expense), fingerprint(&expense));
    }

    #[test]
    fn test_bookkeeping_fields_do_not_affect_fingerprint() {
        let expense = sample_expense();
        let mut other = expense.clone();
        other.id = "different-id".to_string();
        other.timestamp = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        other.sync_status = SyncStatus::Conflict;

        assert_eq!(fingerprint(&expense), fingerprint(&other));
    }

    #[test]
    fn test_business_fields_change_fingerprint() {
        let expense = sample_expense();

        let mut changed = expense.clone();
        changed.amount = 75.0;
        assert_ne!(fingerprint(&expense), fingerprint(&changed));

        let mut changed = expense.clone();
        changed.category = "transport".to_string();
        assert_ne!(fingerprint(&expense), fingerprint(&changed));

        let mut changed = expense.clone();
        changed.subcategory = Some("market".to_string());
        assert_ne!(fingerprint(&expense), fingerprint(&changed));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // "foodx" + "" must not collide with "food" + "x"
        let mut a = sample_expense();
        a.category = "foodx".to_string();
        a.subcategory = None;

        let mut b = sample_expense();
        b.category = "food".to_string();
        b.subcategory = Some("x".to_string());

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
