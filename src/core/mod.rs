pub mod draft;
pub mod entry;
pub mod period;
pub mod record;
pub mod snapshot;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use draft::{validate, EntryDraft, EntryPatch, ValidationError};
pub use entry::{Category, Entry, EntryData, EntryDetails, EntryId, Kind};
pub use period::Month;
pub use record::{ExpenseRecord, InvoiceRecord, Ledger};
pub use snapshot::Snapshot;
pub use warnings::Warning;
