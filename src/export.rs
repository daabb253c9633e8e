//! Spreadsheet exports of invoices and expenses.
//!
//! Semicolon separated and prefixed with a UTF-8 byte order mark so that
//! French-locale spreadsheet software opens them without an import dialog.

use crate::core::{Entry, EntryData, Kind};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Serialize)]
struct InvoiceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Client")]
    client: String,
    #[serde(rename = "N°")]
    number: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "HT")]
    amount_excl_tax: String,
    #[serde(rename = "Taux TVA")]
    rate: String,
    #[serde(rename = "TVA")]
    tax: String,
    #[serde(rename = "TTC")]
    amount_incl_tax: String,
    #[serde(rename = "Statut")]
    status: String,
}

#[derive(Serialize)]
struct ExpenseRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Fournisseur")]
    supplier: String,
    #[serde(rename = "N°")]
    number: String,
    #[serde(rename = "Catégorie")]
    category: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "HT")]
    amount_excl_tax: String,
    #[serde(rename = "Taux TVA")]
    rate: String,
    #[serde(rename = "TVA")]
    tax: String,
    #[serde(rename = "TTC")]
    amount_incl_tax: String,
}

#[derive(Default)]
struct Totals {
    excl: Decimal,
    tax: Decimal,
    incl: Decimal,
}

impl Totals {
    fn add(&mut self, data: &EntryData) {
        let tax = data.tax();
        self.excl += data.amount_excl_tax;
        self.tax += tax.tax_amount;
        self.incl += tax.amount_incl_tax;
    }
}

fn amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Entries of `kind`, newest first
fn sorted(entries: &[Entry], kind: Kind) -> Vec<&Entry> {
    let mut selected: Vec<&Entry> = entries.iter().filter(|e| e.kind() == kind).collect();
    selected.sort_by(|a, b| b.data.date.cmp(&a.data.date).then(b.id.cmp(&a.id)));
    selected
}

fn csv_writer<W: Write>(mut writer: W) -> csv::Result<csv::Writer<W>> {
    writer.write_all(BOM)?;
    Ok(csv::WriterBuilder::new().delimiter(b';').from_writer(writer))
}

pub fn write_invoices<W: Write>(entries: &[Entry], writer: W) -> csv::Result<()> {
    let mut wtr = csv_writer(writer)?;
    let mut totals = Totals::default();
    for entry in sorted(entries, Kind::Invoice) {
        let data = &entry.data;
        totals.add(data);
        wtr.serialize(InvoiceRow {
            date: data.date.to_string(),
            client: data.counterparty.clone(),
            number: data.document_number.clone(),
            description: data.description.clone().unwrap_or_default(),
            amount_excl_tax: amount(data.amount_excl_tax),
            rate: data.rate.to_string(),
            tax: amount(data.tax_amount()),
            amount_incl_tax: amount(data.amount_incl_tax()),
            status: if data.is_paid() == Some(true) { "Payée" } else { "En attente" }.to_string(),
        })?;
    }
    wtr.serialize(InvoiceRow {
        date: "Total".to_string(),
        client: String::new(),
        number: String::new(),
        description: String::new(),
        amount_excl_tax: amount(totals.excl),
        rate: String::new(),
        tax: amount(totals.tax),
        amount_incl_tax: amount(totals.incl),
        status: String::new(),
    })?;
    wtr.flush()?;
    Ok(())
}

pub fn write_expenses<W: Write>(entries: &[Entry], writer: W) -> csv::Result<()> {
    let mut wtr = csv_writer(writer)?;
    let mut totals = Totals::default();
    for entry in sorted(entries, Kind::Expense) {
        let data = &entry.data;
        totals.add(data);
        wtr.serialize(ExpenseRow {
            date: data.date.to_string(),
            supplier: data.counterparty.clone(),
            number: data.document_number.clone(),
            category: data.category().unwrap_or_default().label().to_string(),
            description: data.description.clone().unwrap_or_default(),
            amount_excl_tax: amount(data.amount_excl_tax),
            rate: data.rate.to_string(),
            tax: amount(data.tax_amount()),
            amount_incl_tax: amount(data.amount_incl_tax()),
        })?;
    }
    wtr.serialize(ExpenseRow {
        date: "Total".to_string(),
        supplier: String::new(),
        number: String::new(),
        category: String::new(),
        description: String::new(),
        amount_excl_tax: amount(totals.excl),
        rate: String::new(),
        tax: amount(totals.tax),
        amount_incl_tax: amount(totals.incl),
    })?;
    wtr.flush()?;
    Ok(())
}
