//! VAT command - monthly declaration and per-rate breakdown

use super::{format_eur, print_json, print_skipped, SourceArgs};
use crate::report::{declaration, VatBalance, VatDeclaration};
use clap::Args;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct VatCommand {
    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Mois")]
    month: String,
    #[tabled(rename = "Collectée")]
    collected: String,
    #[tabled(rename = "Déductible")]
    deductible: String,
    #[tabled(rename = "Nette")]
    net: String,
    #[tabled(rename = "Cumul")]
    cumulative: String,
    #[tabled(rename = "Situation")]
    position: &'static str,
}

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Taux")]
    rate: String,
    #[tabled(rename = "Collectée")]
    collected: String,
    #[tabled(rename = "Déductible")]
    deductible: String,
    #[tabled(rename = "Nette")]
    net: String,
}

fn position(balance: &VatBalance) -> &'static str {
    if balance.is_owed() {
        "À payer"
    } else {
        "Crédit"
    }
}

impl VatCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let report = declaration(&snapshot);
        if self.json {
            print_json(&report)
        } else {
            print_declaration(&report);
            Ok(())
        }
    }
}

fn print_declaration(report: &VatDeclaration) {
    println!();
    println!("DÉCLARATION DE TVA");
    println!();

    if report.months.is_empty() {
        println!("  Aucune écriture.");
    } else {
        let rows: Vec<MonthRow> = report
            .months
            .iter()
            .map(|m| MonthRow {
                month: m.month.label(),
                collected: format_eur(m.balance.collected),
                deductible: format_eur(m.balance.deductible),
                net: format_eur(m.balance.net),
                cumulative: format_eur(m.cumulative_net),
                position: position(&m.balance),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
    println!();

    let rows: Vec<RateRow> = report
        .by_rate
        .iter()
        .map(|r| RateRow {
            rate: match r.tier {
                Some(_) => r.rate.to_string(),
                None => format!("{} (hors barème)", r.rate),
            },
            collected: format_eur(r.balance.collected),
            deductible: format_eur(r.balance.deductible),
            net: format_eur(r.balance.net),
        })
        .collect();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();

    println!("  TVA collectée:   {}", format_eur(report.totals.collected));
    println!("  TVA déductible:  {}", format_eur(report.totals.deductible));
    println!(
        "  TVA nette:       {} ({})",
        format_eur(report.totals.net),
        position(&report.totals)
    );
    print_skipped(report.skipped_entries);
}
