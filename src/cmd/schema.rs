//! Schema command - print the ledger and export formats

use crate::core::Ledger;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or csv-columns
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the ledger file
    JsonSchema,
    /// Column descriptions of the CSV exports
    CsvColumns,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(Ledger);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvColumns => {
                print_columns("Invoices export", INVOICE_COLUMNS);
                println!();
                print_columns("Expenses export", EXPENSE_COLUMNS);
                println!();
                println!("Semicolon separated, UTF-8 with byte order mark, last row holds the totals.");
            }
        }
        Ok(())
    }
}

fn print_columns(title: &str, columns: &[(&str, &str)]) {
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
    for (name, description) in columns {
        println!("{:12} {}", name, description);
    }
}

const INVOICE_COLUMNS: &[(&str, &str)] = &[
    ("Date", "Invoice date, YYYY-MM-DD"),
    ("Client", "Client name"),
    ("N°", "Invoice number"),
    ("Description", "Free text"),
    ("HT", "Amount excluding tax"),
    ("Taux TVA", "VAT rate in percent"),
    ("TVA", "VAT amount, rounded to the cent"),
    ("TTC", "Amount including tax"),
    ("Statut", "Payée or En attente"),
];

const EXPENSE_COLUMNS: &[(&str, &str)] = &[
    ("Date", "Receipt date, YYYY-MM-DD"),
    ("Fournisseur", "Supplier name"),
    ("N°", "Receipt number"),
    ("Catégorie", "Expense category"),
    ("Description", "Free text"),
    ("HT", "Amount excluding tax"),
    ("Taux TVA", "VAT rate in percent"),
    ("TVA", "Deductible VAT, rounded to the cent"),
    ("TTC", "Amount including tax"),
];
