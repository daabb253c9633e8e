//! Dashboard command - headline figures and recent activity

use super::{format_eur, print_json, print_skipped, today, SourceArgs};
use crate::report::{dashboard, DashboardSummary};
use chrono::NaiveDate;
use clap::Args;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct DashboardCommand {
    /// Last month of the activity chart (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Mois")]
    month: String,
    #[tabled(rename = "CA HT")]
    ca: String,
    #[tabled(rename = "TVA")]
    tva: String,
}

impl DashboardCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let summary = dashboard(&snapshot, self.as_of.unwrap_or_else(today));
        if self.json {
            print_json(&summary)
        } else {
            print_summary(&summary);
            Ok(())
        }
    }
}

fn print_summary(summary: &DashboardSummary) {
    println!();
    println!("TABLEAU DE BORD");
    println!();
    println!(
        "  CA encaissé (TTC):   {} ({} factures payées)",
        format_eur(summary.collected_revenue),
        summary.invoices_paid
    );
    println!(
        "  En attente (TTC):    {} ({} factures)",
        format_eur(summary.pending_revenue),
        summary.invoices_unpaid
    );
    println!("  Dépenses (TTC):      {}", format_eur(summary.total_expenses_incl_tax));
    println!();
    println!("  TVA collectée:       {}", format_eur(summary.total_collected_vat));
    println!("  TVA déductible:      {}", format_eur(summary.total_deductible_vat));
    let position = if summary.net_vat > rust_decimal::Decimal::ZERO {
        "à reverser"
    } else {
        "crédit"
    };
    println!("  TVA nette:           {} ({})", format_eur(summary.net_vat), position);
    println!();

    let rows: Vec<ChartRow> = summary
        .chart
        .iter()
        .map(|m| ChartRow {
            month: format!("{} {}", m.month.short_name(), m.month.year()),
            ca: format_eur(m.ca),
            tva: format_eur(m.tva),
        })
        .collect();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    print_skipped(summary.skipped_entries);
}
