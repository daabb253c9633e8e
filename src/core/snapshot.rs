use super::entry::{Entry, EntryData, Kind};
use super::record::Ledger;
use super::warnings::Warning;

/// The entries every report is computed from.
///
/// Built fresh from a store listing before each report and replaced
/// wholesale after every mutation; it is never updated in place.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub warnings: Vec<Warning>,
}

impl Snapshot {
    pub fn new(entries: Vec<Entry>) -> Self {
        Snapshot {
            entries,
            warnings: Vec::new(),
        }
    }

    /// Convert raw records, excluding malformed ones with a warning
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut entries = Vec::with_capacity(ledger.invoices.len() + ledger.expenses.len());
        let mut warnings = Vec::new();

        let converted = ledger
            .invoices
            .iter()
            .map(|r| (r.entry_id(), r.to_entry()))
            .chain(ledger.expenses.iter().map(|r| (r.entry_id(), r.to_entry())));

        for (id, result) in converted {
            match result {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    log::warn!("Skipping malformed entry {}: {}", id, reason);
                    warnings.push(Warning::MalformedEntry {
                        id: id.to_string(),
                        reason,
                    });
                }
            }
        }

        log::debug!(
            "Snapshot: {} entries, {} skipped",
            entries.len(),
            warnings.len()
        );
        Snapshot { entries, warnings }
    }

    pub fn invoices(&self) -> impl Iterator<Item = &EntryData> {
        self.of_kind(Kind::Invoice)
    }

    pub fn expenses(&self) -> impl Iterator<Item = &EntryData> {
        self.of_kind(Kind::Expense)
    }

    fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &EntryData> {
        self.entries
            .iter()
            .filter(move |e| e.kind() == kind)
            .map(|e| &e.data)
    }

    /// Number of stored records excluded from reports
    pub fn skipped(&self) -> usize {
        self.warnings.len()
    }
}
