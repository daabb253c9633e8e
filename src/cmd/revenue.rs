//! Revenue command - invoiced and collected revenue for one year

use super::{format_eur, format_percent, print_json, print_skipped, today, SourceArgs};
use crate::report::{revenue, RevenueReport};
use chrono::Datelike;
use clap::Args;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RevenueCommand {
    /// Calendar year (defaults to the latest year with invoices)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Mois")]
    month: &'static str,
    #[tabled(rename = "Factures")]
    invoices: usize,
    #[tabled(rename = "CA HT")]
    ca: String,
    #[tabled(rename = "TVA")]
    vat: String,
    #[tabled(rename = "Encaissé HT")]
    paid: String,
    #[tabled(rename = "Recouvrement")]
    ratio: String,
}

impl RevenueCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let report = revenue(&snapshot, self.year, today().year());
        if self.json {
            print_json(&report)
        } else {
            print_report(&report);
            Ok(())
        }
    }
}

fn print_report(report: &RevenueReport) {
    println!();
    println!("CHIFFRE D'AFFAIRES {}", report.year);
    if report.years.len() > 1 {
        let years: Vec<String> = report.years.iter().map(|y| y.to_string()).collect();
        println!("  Années disponibles: {}", years.join(", "));
    }
    println!();

    let mut rows: Vec<MonthRow> = report
        .months
        .iter()
        .map(|m| MonthRow {
            month: m.month.short_name(),
            invoices: m.invoice_count,
            ca: format_eur(m.ca),
            vat: format_eur(m.vat),
            paid: format_eur(m.paid),
            ratio: format_percent(m.collection_ratio),
        })
        .collect();
    rows.push(MonthRow {
        month: "Total",
        invoices: report.totals.invoice_count,
        ca: format_eur(report.totals.ca),
        vat: format_eur(report.totals.vat),
        paid: format_eur(report.totals.paid),
        ratio: format_percent(report.totals.collection_ratio),
    });
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    print_skipped(report.skipped_entries);
}
