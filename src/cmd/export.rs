//! Export command - CSV files for spreadsheets and the accountant

use super::{KindArg, SourceArgs};
use crate::core::Kind;
use crate::export::{write_expenses, write_invoices};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Which entries to export
    #[arg(value_enum)]
    kind: KindArg,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout().lock()),
        };
        match Kind::from(self.kind) {
            Kind::Invoice => write_invoices(&snapshot.entries, writer)?,
            Kind::Expense => write_expenses(&snapshot.entries, writer)?,
        }
        if let Some(path) = &self.output {
            log::info!("Wrote {}", path.display());
        }
        Ok(())
    }
}
