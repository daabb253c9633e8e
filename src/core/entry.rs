use super::period::Month;
use crate::tax::{compute_tax, TaxBreakdown, TaxRate};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether an entry is a client invoice or a supplier expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Invoice,
    Expense,
}

impl Kind {
    fn prefix(self) -> &'static str {
        match self {
            Kind::Invoice => "inv",
            Kind::Expense => "exp",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Invoice => write!(f, "invoice"),
            Kind::Expense => write!(f, "expense"),
        }
    }
}

/// Store-assigned identifier.
///
/// Invoices and expenses are numbered independently by the backing service,
/// so the kind is part of the identity. Rendered as `inv-12` / `exp-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    pub kind: Kind,
    pub number: u64,
}

impl EntryId {
    pub fn new(kind: Kind, number: u64) -> Self {
        EntryId { kind, number }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.number)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid entry id '{0}', expected inv-<n> or exp-<n>")]
pub struct ParseIdError(String);

impl FromStr for EntryId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError(s.to_string());
        let (prefix, number) = s.trim().split_once('-').ok_or_else(err)?;
        let kind = match prefix.to_ascii_lowercase().as_str() {
            "inv" => Kind::Invoice,
            "exp" => Kind::Expense,
            _ => return Err(err()),
        };
        let number = number.parse::<u64>().map_err(|_| err())?;
        Ok(EntryId { kind, number })
    }
}

impl Serialize for EntryId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[serde(rename = "Logiciel")]
    Software,
    #[serde(rename = "Matériel")]
    Hardware,
    #[serde(rename = "Transport")]
    Transport,
    #[serde(rename = "Téléphone")]
    Phone,
    #[serde(rename = "Fournitures")]
    Supplies,
    #[serde(rename = "Loyer")]
    Rent,
    #[default]
    #[serde(rename = "Autre")]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Software,
        Category::Hardware,
        Category::Transport,
        Category::Phone,
        Category::Supplies,
        Category::Rent,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Software => "Logiciel",
            Category::Hardware => "Matériel",
            Category::Transport => "Transport",
            Category::Phone => "Téléphone",
            Category::Supplies => "Fournitures",
            Category::Rent => "Loyer",
            Category::Other => "Autre",
        }
    }

    /// Lenient lookup: case-insensitive, accents optional. Anything
    /// unknown or empty falls into [`Category::Other`].
    pub fn parse(s: &str) -> Category {
        let wanted = fold(s.trim());
        Category::ALL
            .into_iter()
            .find(|c| fold(c.label()) == wanted)
            .unwrap_or(Category::Other)
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'É' | 'È' | 'Ê' => 'e',
            'à' | 'â' | 'À' | 'Â' => 'a',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields that only exist on one kind of entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDetails {
    Invoice { is_paid: bool },
    Expense { category: Category },
}

impl EntryDetails {
    pub fn kind(&self) -> Kind {
        match self {
            EntryDetails::Invoice { .. } => Kind::Invoice,
            EntryDetails::Expense { .. } => Kind::Expense,
        }
    }
}

/// A validated entry. Tax and total are never stored: they are derived from
/// `amount_excl_tax` and `rate` on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryData {
    pub date: NaiveDate,
    /// Client for invoices, supplier for expenses. May be empty.
    pub counterparty: String,
    pub document_number: String,
    pub description: Option<String>,
    pub amount_excl_tax: Decimal,
    pub rate: TaxRate,
    pub details: EntryDetails,
}

impl EntryData {
    pub fn kind(&self) -> Kind {
        self.details.kind()
    }

    pub fn month(&self) -> Month {
        Month::of(self.date)
    }

    pub fn tax(&self) -> TaxBreakdown {
        compute_tax(self.amount_excl_tax, self.rate)
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax().tax_amount
    }

    pub fn amount_incl_tax(&self) -> Decimal {
        self.tax().amount_incl_tax
    }

    /// `Some` only for invoices
    pub fn is_paid(&self) -> Option<bool> {
        match self.details {
            EntryDetails::Invoice { is_paid } => Some(is_paid),
            EntryDetails::Expense { .. } => None,
        }
    }

    /// `Some` only for expenses
    pub fn category(&self) -> Option<Category> {
        match self.details {
            EntryDetails::Expense { category } => Some(category),
            EntryDetails::Invoice { .. } => None,
        }
    }
}

/// A persisted entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub data: EntryData,
}

impl Entry {
    pub fn kind(&self) -> Kind {
        self.id.kind
    }
}
