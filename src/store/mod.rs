//! Persistence of invoices and expenses.
//!
//! Reports never read a store directly: they work on a [`Snapshot`] built
//! from a fresh [`EntryStore::list`] after every change.

pub mod http;
pub mod ledger;

pub use http::HttpStore;
pub use ledger::LedgerStore;

use crate::core::{validate, Entry, EntryData, EntryDraft, EntryId, EntryPatch, Kind, Ledger, Snapshot, ValidationError};
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot reach the bookkeeping service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid service url: {0}")]
    InvalidUrl(String),
    #[error("{0} not found")]
    NotFound(EntryId),
    #[error("rejected by the store: {0}")]
    Rejected(String),
    #[error("store error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("ledger file: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store returned malformed record {id}: {reason}")]
    Malformed { id: EntryId, reason: String },
}

/// Create, list, update and delete entries.
///
/// A failed call leaves the store unchanged from the caller's point of view.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Every stored record, malformed ones included
    async fn list(&self) -> Result<Ledger, StoreError>;

    /// Persist a validated entry; the store assigns the id
    async fn create(&self, data: &EntryData) -> Result<Entry, StoreError>;

    /// Replace only the fields set in `patch`
    async fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<Entry, StoreError>;

    async fn delete(&self, id: EntryId) -> Result<(), StoreError>;

    /// Liveness status reported by the store
    async fn health(&self) -> Result<String, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fetch the full ledger and build the report input from it
pub async fn load_snapshot(store: &dyn EntryStore) -> Result<Snapshot, StoreError> {
    let ledger = store.list().await?;
    log::debug!(
        "Fetched {} invoices and {} expenses",
        ledger.invoices.len(),
        ledger.expenses.len()
    );
    Ok(Snapshot::from_ledger(&ledger))
}

/// Validate a draft and create it. Invalid drafts never reach the store.
pub async fn submit(
    store: &dyn EntryStore,
    kind: Kind,
    draft: &EntryDraft,
    today: NaiveDate,
) -> Result<Entry, SubmitError> {
    let data = validate(kind, draft, today)?;
    let entry = store.create(&data).await?;
    log::info!("Created {}", entry.id);
    Ok(entry)
}

/// Apply the fields present in `draft` to an existing entry
pub async fn amend(store: &dyn EntryStore, id: EntryId, draft: &EntryDraft) -> Result<Entry, SubmitError> {
    let patch = EntryPatch::from_draft(id.kind, draft)?;
    if patch.is_empty() {
        log::warn!("Nothing to update on {}", id);
    }
    let entry = store.update(id, &patch).await?;
    log::info!("Updated {}", entry.id);
    Ok(entry)
}

/// Mark an invoice as paid or unpaid
pub async fn set_paid(store: &dyn EntryStore, id: EntryId, is_paid: bool) -> Result<Entry, SubmitError> {
    let patch = EntryPatch::paid(is_paid);
    patch.check(id.kind)?;
    Ok(store.update(id, &patch).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn draft(amount: &str) -> EntryDraft {
        EntryDraft {
            counterparty: Some("Acme".to_string()),
            amount_excl_tax: Some(amount.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn zero_amount_never_reaches_store() {
        let store = LedgerStore::in_memory(Ledger::default());
        let err = submit(&store, Kind::Invoice, &draft("0"), today()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::NonPositiveAmount)));
        assert_eq!(store.list().await.unwrap(), Ledger::default());
    }

    #[tokio::test]
    async fn submitted_entry_shows_up_in_snapshot() {
        let store = LedgerStore::in_memory(Ledger::default());
        let entry = submit(&store, Kind::Invoice, &draft("1000"), today()).await.unwrap();
        assert_eq!(entry.id, EntryId::new(Kind::Invoice, 1));

        let snapshot = load_snapshot(&store).await.unwrap();
        assert_eq!(snapshot.entries, vec![entry]);
        assert_eq!(snapshot.invoices().next().unwrap().amount_incl_tax(), dec!(1200));
    }

    #[tokio::test]
    async fn set_paid_on_expense_rejected() {
        let store = LedgerStore::in_memory(Ledger::default());
        let entry = submit(&store, Kind::Expense, &draft("50"), today()).await.unwrap();
        let err = set_paid(&store, entry.id, true).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::NotApplicable { .. })));
    }

    #[tokio::test]
    async fn amend_changes_only_given_fields() {
        let store = LedgerStore::in_memory(Ledger::default());
        let entry = submit(&store, Kind::Invoice, &draft("100"), today()).await.unwrap();
        let change = EntryDraft {
            rate: Some("10".to_string()),
            ..Default::default()
        };
        let updated = amend(&store, entry.id, &change).await.unwrap();
        assert_eq!(updated.data.rate.percent(), dec!(10));
        assert_eq!(updated.data.counterparty, "Acme");
        assert_eq!(updated.data.amount_excl_tax, dec!(100));
    }
}
