pub mod rate;
pub mod vat;

pub use rate::{RateTier, TaxRate};
pub use vat::{compute_tax, round2, TaxBreakdown, MAX_AMOUNT};
