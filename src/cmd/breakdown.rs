//! Breakdown command - revenue per client or expenses per category

use super::{format_eur, print_json, SourceArgs};
use crate::report::{by_category, by_client, Breakdown};
use clap::{Args, ValueEnum};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct BreakdownCommand {
    /// What to break down
    #[arg(value_enum, default_value = "clients")]
    by: BreakdownBy,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BreakdownBy {
    /// Invoiced revenue excluding tax, per client
    Clients,
    /// Expenses including tax, per category
    Categories,
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "Montant")]
    value: String,
    #[tabled(rename = "Part")]
    percent: String,
}

impl BreakdownCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let breakdown = match self.by {
            BreakdownBy::Clients => by_client(&snapshot),
            BreakdownBy::Categories => by_category(&snapshot),
        };
        if self.json {
            return print_json(&breakdown);
        }
        self.print(&breakdown);
        Ok(())
    }

    fn print(&self, breakdown: &Breakdown) {
        if breakdown.is_empty() {
            println!("Aucune donnée.");
            return;
        }
        let rows: Vec<ShareRow> = breakdown
            .shares
            .iter()
            .map(|s| ShareRow {
                label: if s.label.is_empty() {
                    "(sans nom)".to_string()
                } else {
                    s.label.clone()
                },
                value: format_eur(s.value),
                percent: format!("{:.1}%", s.percent),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!("  Total: {}", format_eur(breakdown.total));
    }
}
