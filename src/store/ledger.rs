use super::{EntryStore, StoreError};
use crate::core::{
    Entry, EntryData, EntryId, EntryPatch, ExpenseRecord, InvoiceRecord, Kind, Ledger, ValidationError,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Ledger kept in a local JSON file, or only in memory.
///
/// All mutations are serialized through one lock. A mutation is applied to a
/// copy, written out, and only then made visible, so a failed write changes
/// nothing.
#[derive(Debug)]
pub struct LedgerStore {
    path: Option<PathBuf>,
    ledger: Mutex<Ledger>,
}

impl LedgerStore {
    pub fn in_memory(ledger: Ledger) -> Self {
        LedgerStore {
            path: None,
            ledger: Mutex::new(ledger),
        }
    }

    /// Open a ledger file. A missing file is an empty ledger, created on
    /// the first change.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let ledger = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No ledger at {}, starting empty", path.display());
                Ledger::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(LedgerStore {
            path: Some(path),
            ledger: Mutex::new(ledger),
        })
    }

    async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Ledger) -> Result<T, StoreError>,
    {
        let mut current = self.ledger.lock().await;
        let mut next = current.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            let json = serde_json::to_vec_pretty(&next)?;
            tokio::fs::write(path, json).await?;
            log::debug!("Wrote ledger to {}", path.display());
        }
        *current = next;
        Ok(out)
    }
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn next_id<'a>(ids: impl Iterator<Item = &'a u64>) -> u64 {
    ids.max().copied().unwrap_or(0) + 1
}

fn malformed(id: EntryId) -> impl FnOnce(String) -> StoreError {
    move |reason| StoreError::Malformed { id, reason }
}

#[async_trait]
impl EntryStore for LedgerStore {
    async fn list(&self) -> Result<Ledger, StoreError> {
        Ok(self.ledger.lock().await.clone())
    }

    async fn create(&self, data: &EntryData) -> Result<Entry, StoreError> {
        self.mutate(|ledger| {
            let number = match data.kind() {
                Kind::Invoice => {
                    let number = next_id(ledger.invoices.iter().map(|r| &r.id));
                    let mut record = InvoiceRecord::new(number, data);
                    record.created_at = Some(now());
                    ledger.invoices.push(record);
                    number
                }
                Kind::Expense => {
                    let number = next_id(ledger.expenses.iter().map(|r| &r.id));
                    let mut record = ExpenseRecord::new(number, data);
                    record.created_at = Some(now());
                    ledger.expenses.push(record);
                    number
                }
            };
            Ok(Entry {
                id: EntryId::new(data.kind(), number),
                data: data.clone(),
            })
        })
        .await
    }

    async fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<Entry, StoreError> {
        self.mutate(|ledger| {
            let rejected = |e: ValidationError| StoreError::Rejected(e.to_string());
            match id.kind {
                Kind::Invoice => {
                    let record = ledger
                        .invoices
                        .iter_mut()
                        .find(|r| r.id == id.number)
                        .ok_or(StoreError::NotFound(id))?;
                    let current = record.to_entry().map_err(malformed(id))?;
                    let data = patch.apply(&current.data).map_err(rejected)?;
                    *record = InvoiceRecord {
                        created_at: record.created_at.take(),
                        updated_at: Some(now()),
                        ..InvoiceRecord::new(id.number, &data)
                    };
                    Ok(Entry { id, data })
                }
                Kind::Expense => {
                    let record = ledger
                        .expenses
                        .iter_mut()
                        .find(|r| r.id == id.number)
                        .ok_or(StoreError::NotFound(id))?;
                    let current = record.to_entry().map_err(malformed(id))?;
                    let data = patch.apply(&current.data).map_err(rejected)?;
                    *record = ExpenseRecord {
                        created_at: record.created_at.take(),
                        updated_at: Some(now()),
                        ..ExpenseRecord::new(id.number, &data)
                    };
                    Ok(Entry { id, data })
                }
            }
        })
        .await
    }

    async fn delete(&self, id: EntryId) -> Result<(), StoreError> {
        self.mutate(|ledger| {
            let before = ledger.invoices.len() + ledger.expenses.len();
            match id.kind {
                Kind::Invoice => ledger.invoices.retain(|r| r.id != id.number),
                Kind::Expense => ledger.expenses.retain(|r| r.id != id.number),
            }
            if ledger.invoices.len() + ledger.expenses.len() == before {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn health(&self) -> Result<String, StoreError> {
        Ok(match &self.path {
            Some(path) => format!("local ledger {}", path.display()),
            None => "in-memory ledger".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{validate, EntryDraft, Snapshot};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn data(kind: Kind, amount: &str) -> EntryData {
        let draft = EntryDraft {
            date: Some("2025-02-10".to_string()),
            amount_excl_tax: Some(amount.to_string()),
            ..Default::default()
        };
        validate(kind, &draft, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tvac-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn ids_assigned_per_kind() {
        let store = LedgerStore::in_memory(Ledger::default());
        let a = store.create(&data(Kind::Invoice, "10")).await.unwrap();
        let b = store.create(&data(Kind::Invoice, "20")).await.unwrap();
        let c = store.create(&data(Kind::Expense, "30")).await.unwrap();
        assert_eq!(a.id.to_string(), "inv-1");
        assert_eq!(b.id.to_string(), "inv-2");
        assert_eq!(c.id.to_string(), "exp-1");
    }

    #[tokio::test]
    async fn ids_not_reused_after_delete_of_earlier_entry() {
        let store = LedgerStore::in_memory(Ledger::default());
        let a = store.create(&data(Kind::Invoice, "10")).await.unwrap();
        let b = store.create(&data(Kind::Invoice, "20")).await.unwrap();
        store.delete(a.id).await.unwrap();
        let c = store.create(&data(Kind::Invoice, "30")).await.unwrap();
        assert_eq!(c.id.number, b.id.number + 1);
    }

    #[tokio::test]
    async fn delete_missing_entry() {
        let store = LedgerStore::in_memory(Ledger::default());
        let id = EntryId::new(Kind::Expense, 9);
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn rejected_update_leaves_ledger_unchanged() {
        let store = LedgerStore::in_memory(Ledger::default());
        let inv = store.create(&data(Kind::Invoice, "10")).await.unwrap();
        let before = store.list().await.unwrap();

        let patch = EntryPatch {
            amount_excl_tax: Some(dec!(0)),
            ..Default::default()
        };
        assert!(matches!(store.update(inv.id, &patch).await, Err(StoreError::Rejected(_))));
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn update_sets_timestamp_and_keeps_creation() {
        let store = LedgerStore::in_memory(Ledger::default());
        let inv = store.create(&data(Kind::Invoice, "10")).await.unwrap();
        let created_at = store.list().await.unwrap().invoices[0].created_at.clone();

        let updated = store.update(inv.id, &EntryPatch::paid(true)).await.unwrap();
        assert_eq!(updated.data.is_paid(), Some(true));

        let record = &store.list().await.unwrap().invoices[0];
        assert!(record.is_paid);
        assert_eq!(record.created_at, created_at);
        assert!(record.updated_at.is_some());
    }

    #[tokio::test]
    async fn file_round_trip() {
        let path = temp_path("round-trip");
        let _ = tokio::fs::remove_file(&path).await;

        let store = LedgerStore::open(&path).await.unwrap();
        assert_eq!(store.list().await.unwrap(), Ledger::default());
        store.create(&data(Kind::Invoice, "1000")).await.unwrap();
        store.create(&data(Kind::Expense, "400")).await.unwrap();

        let reopened = LedgerStore::open(&path).await.unwrap();
        let snapshot = Snapshot::from_ledger(&reopened.list().await.unwrap());
        assert_eq!(snapshot.invoices().count(), 1);
        assert_eq!(snapshot.expenses().count(), 1);
        assert_eq!(snapshot.skipped(), 0);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(matches!(LedgerStore::open(&path).await, Err(StoreError::Json(_))));
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
