use super::ratio;
use crate::core::{Month, Snapshot};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

/// Invoiced revenue for one calendar year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueReport {
    /// Years with at least one invoice, newest first
    pub years: Vec<i32>,
    pub year: i32,
    /// Always twelve months, January first
    pub months: Vec<MonthlyRevenue>,
    pub totals: RevenueTotals,
    pub skipped_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: Month,
    pub invoice_count: usize,
    /// Revenue excluding tax
    pub ca: Decimal,
    pub vat: Decimal,
    /// Paid revenue excluding tax
    pub paid: Decimal,
    /// `paid / ca`, zero when nothing was invoiced
    pub collection_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTotals {
    pub invoice_count: usize,
    pub ca: Decimal,
    pub vat: Decimal,
    pub paid: Decimal,
    pub collection_ratio: Decimal,
}

/// Build the revenue report for `year`.
///
/// Without a year, the newest year with invoices is used, or `current_year`
/// when there are none.
pub fn revenue(snapshot: &Snapshot, year: Option<i32>, current_year: i32) -> RevenueReport {
    let years: BTreeSet<i32> = snapshot.invoices().map(|i| i.date.year()).collect();
    let years: Vec<i32> = years.into_iter().rev().collect();
    let year = year.or_else(|| years.first().copied()).unwrap_or(current_year);

    let mut months: Vec<MonthlyRevenue> = Month::year_months(year)
        .map(|month| MonthlyRevenue {
            month,
            invoice_count: 0,
            ca: Decimal::ZERO,
            vat: Decimal::ZERO,
            paid: Decimal::ZERO,
            collection_ratio: Decimal::ZERO,
        })
        .collect();

    for invoice in snapshot.invoices().filter(|i| i.date.year() == year) {
        let bucket = &mut months[invoice.date.month0() as usize];
        bucket.invoice_count += 1;
        bucket.ca += invoice.amount_excl_tax;
        bucket.vat += invoice.tax_amount();
        if invoice.is_paid() == Some(true) {
            bucket.paid += invoice.amount_excl_tax;
        }
    }

    for m in &mut months {
        m.collection_ratio = ratio(m.paid, m.ca);
    }

    let mut totals = RevenueTotals {
        invoice_count: months.iter().map(|m| m.invoice_count).sum(),
        ca: months.iter().map(|m| m.ca).sum(),
        vat: months.iter().map(|m| m.vat).sum(),
        paid: months.iter().map(|m| m.paid).sum(),
        collection_ratio: Decimal::ZERO,
    };
    totals.collection_ratio = ratio(totals.paid, totals.ca);

    RevenueReport {
        years,
        year,
        months,
        totals,
        skipped_entries: snapshot.skipped(),
    }
}
