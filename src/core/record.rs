//! Wire records exchanged with the bookkeeping service, and the on-disk
//! ledger format of the local store.

use super::draft::{check_amount, parse_date};
use super::entry::{Category, Entry, EntryData, EntryDetails, EntryId, Kind};
use crate::tax::TaxRate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Invoice as returned by `GET /api/invoices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceRecord {
    pub id: u64,
    /// Invoice date, YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    /// Amount excluding tax. `None` when missing or not a number.
    #[serde(default, with = "lenient_decimal")]
    #[schemars(with = "f64")]
    pub amount_ht: Option<Decimal>,
    /// VAT rate in percent. `None` when missing or not a number.
    #[serde(default, with = "lenient_decimal")]
    #[schemars(with = "f64")]
    pub vat_rate: Option<Decimal>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Expense as returned by `GET /api/expenses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseRecord {
    pub id: u64,
    /// Expense date, YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    /// Amount excluding tax. `None` when missing or not a number.
    #[serde(default, with = "lenient_decimal")]
    #[schemars(with = "f64")]
    pub amount_ht: Option<Decimal>,
    /// VAT rate in percent. `None` when missing or not a number.
    #[serde(default, with = "lenient_decimal")]
    #[schemars(with = "f64")]
    pub vat_rate: Option<Decimal>,
    /// One of Logiciel, Matériel, Transport, Téléphone, Fournitures, Loyer, Autre
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Every invoice and expense known to a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ledger {
    #[serde(default)]
    pub invoices: Vec<InvoiceRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
}

impl InvoiceRecord {
    pub fn new(id: u64, data: &EntryData) -> Self {
        InvoiceRecord {
            id,
            date: Some(data.date.format("%Y-%m-%d").to_string()),
            client: Some(data.counterparty.clone()),
            number: Some(data.document_number.clone()),
            desc: data.description.clone(),
            amount_ht: Some(data.amount_excl_tax),
            vat_rate: Some(data.rate.percent()),
            is_paid: data.is_paid().unwrap_or(false),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn entry_id(&self) -> EntryId {
        EntryId::new(Kind::Invoice, self.id)
    }

    pub fn to_entry(&self) -> Result<Entry, String> {
        let (date, amount_excl_tax, rate) = common_fields(self.date.as_deref(), self.amount_ht, self.vat_rate)?;
        Ok(Entry {
            id: self.entry_id(),
            data: EntryData {
                date,
                counterparty: self.client.clone().unwrap_or_default(),
                document_number: self.number.clone().unwrap_or_default(),
                description: self.desc.clone().filter(|d| !d.is_empty()),
                amount_excl_tax,
                rate,
                details: EntryDetails::Invoice { is_paid: self.is_paid },
            },
        })
    }
}

impl ExpenseRecord {
    pub fn new(id: u64, data: &EntryData) -> Self {
        ExpenseRecord {
            id,
            date: Some(data.date.format("%Y-%m-%d").to_string()),
            supplier: Some(data.counterparty.clone()),
            number: Some(data.document_number.clone()),
            desc: data.description.clone(),
            amount_ht: Some(data.amount_excl_tax),
            vat_rate: Some(data.rate.percent()),
            category: Some(data.category().unwrap_or_default().label().to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn entry_id(&self) -> EntryId {
        EntryId::new(Kind::Expense, self.id)
    }

    pub fn to_entry(&self) -> Result<Entry, String> {
        let (date, amount_excl_tax, rate) = common_fields(self.date.as_deref(), self.amount_ht, self.vat_rate)?;
        let category = self.category.as_deref().map(Category::parse).unwrap_or_default();
        Ok(Entry {
            id: self.entry_id(),
            data: EntryData {
                date,
                counterparty: self.supplier.clone().unwrap_or_default(),
                document_number: self.number.clone().unwrap_or_default(),
                description: self.desc.clone().filter(|d| !d.is_empty()),
                amount_excl_tax,
                rate,
                details: EntryDetails::Expense { category },
            },
        })
    }
}

fn common_fields(
    date: Option<&str>,
    amount_ht: Option<Decimal>,
    vat_rate: Option<Decimal>,
) -> Result<(chrono::NaiveDate, Decimal, TaxRate), String> {
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw).map_err(|e| e.to_string())?,
        None => return Err("missing date".to_string()),
    };
    let amount = amount_ht.ok_or_else(|| "amount excluding tax is missing or not a number".to_string())?;
    let amount = check_amount(amount).map_err(|e| format!("{}, got {}", e, amount))?;
    let percent = vat_rate.ok_or_else(|| "VAT rate is missing or not a number".to_string())?;
    let rate = TaxRate::new(percent).ok_or_else(|| format!("VAT rate out of range: {}", percent))?;
    Ok((date, amount, rate))
}

/// Reads numbers and numeric strings as `Decimal`. Anything else, including
/// numbers beyond the range of `Decimal`, reads as `None` so that one bad
/// record does not fail the whole listing.
mod lenient_decimal {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match value.and_then(|d| d.to_f64()) {
            Some(number) => serializer.serialize_f64(number),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(to_decimal))
    }

    fn to_decimal(value: &Value) -> Option<Decimal> {
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => return None,
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}
