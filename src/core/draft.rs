use super::entry::{Category, EntryData, EntryDetails, Kind};
use crate::tax::{TaxRate, MAX_AMOUNT};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount excluding tax must be a number greater than zero")]
    NonPositiveAmount,
    #[error("amount excluding tax must not exceed {}", MAX_AMOUNT)]
    AmountTooLarge,
    #[error("invalid VAT rate: {0}")]
    InvalidRate(String),
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("{field} does not apply to an {kind}")]
    NotApplicable { field: &'static str, kind: Kind },
}

/// Raw, user- or OCR-supplied entry fields, before validation.
///
/// Every field is optional text so that partially filled forms can be
/// carried around and merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub date: Option<String>,
    pub counterparty: Option<String>,
    pub document_number: Option<String>,
    pub description: Option<String>,
    pub amount_excl_tax: Option<String>,
    pub rate: Option<String>,
    pub is_paid: Option<bool>,
    pub category: Option<String>,
}

/// Validate a draft into an entry ready for the store.
///
/// Defaults: `date` is `today`, rate is 20%, category is "Autre", `is_paid`
/// is false. Fields belonging to the other kind are ignored.
pub fn validate(kind: Kind, draft: &EntryDraft, today: NaiveDate) -> Result<EntryData, ValidationError> {
    let amount_excl_tax = parse_amount(draft.amount_excl_tax.as_deref())?;
    let rate = match non_empty(draft.rate.as_deref()) {
        Some(raw) => parse_rate(raw)?,
        None => TaxRate::default(),
    };
    let date = match non_empty(draft.date.as_deref()) {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let details = match kind {
        Kind::Invoice => EntryDetails::Invoice {
            is_paid: draft.is_paid.unwrap_or(false),
        },
        Kind::Expense => EntryDetails::Expense {
            category: draft.category.as_deref().map(Category::parse).unwrap_or_default(),
        },
    };

    if !rate.is_recognized() {
        log::warn!("VAT rate {} is not a statutory tier", rate);
    }

    Ok(EntryData {
        date,
        counterparty: text(draft.counterparty.as_deref()),
        document_number: text(draft.document_number.as_deref()),
        description: non_empty(draft.description.as_deref()).map(str::to_string),
        amount_excl_tax,
        rate,
        details,
    })
}

/// Field replacements for an existing entry.
///
/// Built through [`EntryPatch::from_draft`] or [`EntryPatch::paid`], which
/// guarantee the replacements are valid for `kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub date: Option<NaiveDate>,
    pub counterparty: Option<String>,
    pub document_number: Option<String>,
    pub description: Option<String>,
    pub amount_excl_tax: Option<Decimal>,
    pub rate: Option<TaxRate>,
    pub is_paid: Option<bool>,
    pub category: Option<Category>,
}

impl EntryPatch {
    /// Toggle the payment status of an invoice
    pub fn paid(is_paid: bool) -> Self {
        EntryPatch {
            is_paid: Some(is_paid),
            ..Default::default()
        }
    }

    /// Only the fields present in the draft are replaced
    pub fn from_draft(kind: Kind, draft: &EntryDraft) -> Result<Self, ValidationError> {
        if kind == Kind::Expense && draft.is_paid.is_some() {
            return Err(ValidationError::NotApplicable { field: "is_paid", kind });
        }
        if kind == Kind::Invoice && draft.category.is_some() {
            return Err(ValidationError::NotApplicable { field: "category", kind });
        }

        let amount_excl_tax = match &draft.amount_excl_tax {
            Some(raw) => Some(parse_amount(Some(raw))?),
            None => None,
        };
        let rate = draft.rate.as_deref().map(parse_rate).transpose()?;
        let date = draft.date.as_deref().map(parse_date).transpose()?;

        Ok(EntryPatch {
            date,
            counterparty: draft.counterparty.clone(),
            document_number: draft.document_number.clone(),
            description: draft.description.clone(),
            amount_excl_tax,
            rate,
            is_paid: draft.is_paid,
            category: draft.category.as_deref().map(Category::parse),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }

    /// Check the patch only touches fields that exist on `kind`
    pub fn check(&self, kind: Kind) -> Result<(), ValidationError> {
        match kind {
            Kind::Expense if self.is_paid.is_some() => {
                Err(ValidationError::NotApplicable { field: "is_paid", kind })
            }
            Kind::Invoice if self.category.is_some() => {
                Err(ValidationError::NotApplicable { field: "category", kind })
            }
            _ => Ok(()),
        }
    }

    /// Merge into `data`, returning the updated entry
    pub fn apply(&self, data: &EntryData) -> Result<EntryData, ValidationError> {
        self.check(data.kind())?;
        let mut updated = data.clone();
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(counterparty) = &self.counterparty {
            updated.counterparty = counterparty.trim().to_string();
        }
        if let Some(number) = &self.document_number {
            updated.document_number = number.trim().to_string();
        }
        if let Some(description) = &self.description {
            updated.description = non_empty(Some(description)).map(str::to_string);
        }
        if let Some(amount) = self.amount_excl_tax {
            updated.amount_excl_tax = check_amount(amount)?;
        }
        if let Some(rate) = self.rate {
            updated.rate = rate;
        }
        updated.details = match updated.details {
            EntryDetails::Invoice { is_paid } => EntryDetails::Invoice {
                is_paid: self.is_paid.unwrap_or(is_paid),
            },
            EntryDetails::Expense { category } => EntryDetails::Expense {
                category: self.category.unwrap_or(category),
            },
        };
        Ok(updated)
    }
}

/// Parse a money amount as typed in a form: `1234.5`, `1 234,50`, `1234,50 €`
pub fn parse_amount(raw: Option<&str>) -> Result<Decimal, ValidationError> {
    let raw = non_empty(raw).ok_or(ValidationError::NonPositiveAmount)?;
    let cleaned: String = raw
        .trim_end_matches('€')
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let amount = Decimal::from_str(&cleaned).map_err(|_| ValidationError::NonPositiveAmount)?;
    check_amount(amount)
}

/// Accepts amounts in `(0, MAX_AMOUNT]`
pub fn check_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        Err(ValidationError::NonPositiveAmount)
    } else if amount > MAX_AMOUNT {
        Err(ValidationError::AmountTooLarge)
    } else {
        Ok(amount)
    }
}

pub fn parse_rate(raw: &str) -> Result<TaxRate, ValidationError> {
    TaxRate::from_str(raw).map_err(ValidationError::InvalidRate)
}

/// Accepts ISO `YYYY-MM-DD` and French `DD/MM/YYYY`
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn text(s: Option<&str>) -> String {
    s.map(str::trim).unwrap_or_default().to_string()
}
