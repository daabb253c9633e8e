//! Entry commands - list, add, update, mark paid and delete

use super::{format_eur, interruptible, print_json, today, KindArg, SourceArgs};
use crate::core::{Entry, EntryDraft, EntryId, Kind};
use crate::extract::{run_extraction, Document, ExtractionOutcome};
use crate::store;
use clap::Args;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tokio_util::sync::CancellationToken;

/// Entry fields as typed on the command line
#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    /// Date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    date: Option<String>,

    /// Client of an invoice or supplier of an expense
    #[arg(long, visible_aliases = ["client", "supplier"])]
    counterparty: Option<String>,

    /// Invoice or receipt number
    #[arg(long)]
    number: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Amount excluding tax, e.g. 1234.50 or "1 234,50"
    #[arg(long)]
    amount: Option<String>,

    /// VAT rate in percent: 0, 5.5, 10 or 20
    #[arg(long)]
    rate: Option<String>,

    /// Invoice paid (`--paid` alone means true)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    paid: Option<bool>,

    /// Expense category: Logiciel, Matériel, Transport, Téléphone, Fournitures, Loyer, Autre
    #[arg(long)]
    category: Option<String>,
}

impl DraftArgs {
    fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            date: self.date.clone(),
            counterparty: self.counterparty.clone(),
            document_number: self.number.clone(),
            description: self.description.clone(),
            amount_excl_tax: self.amount.clone(),
            rate: self.rate.clone(),
            is_paid: self.paid,
            category: self.category.clone(),
        }
    }
}

/// Row for the entries table and JSON output
#[derive(Debug, Tabled, serde::Serialize)]
pub struct EntryRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Tiers")]
    counterparty: String,
    #[tabled(rename = "N°")]
    number: String,
    #[tabled(rename = "HT")]
    amount_excl_tax: String,
    #[tabled(rename = "Taux")]
    rate: String,
    #[tabled(rename = "TVA")]
    tax: String,
    #[tabled(rename = "TTC")]
    amount_incl_tax: String,
    #[tabled(rename = "Statut / Catégorie")]
    detail: String,
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        let data = &entry.data;
        let tax = data.tax();
        let detail = match (data.is_paid(), data.category()) {
            (Some(true), _) => "Payée".to_string(),
            (Some(false), _) => "En attente".to_string(),
            (None, Some(category)) => category.to_string(),
            (None, None) => String::new(),
        };
        EntryRow {
            id: entry.id.to_string(),
            date: data.date.to_string(),
            counterparty: data.counterparty.clone(),
            number: data.document_number.clone(),
            amount_excl_tax: format!("{:.2}", data.amount_excl_tax),
            rate: data.rate.to_string(),
            tax: format!("{:.2}", tax.tax_amount),
            amount_incl_tax: format!("{:.2}", tax.amount_incl_tax),
            detail,
        }
    }
}

fn print_entry(verb: &str, entry: &Entry) {
    println!(
        "{} {}: {} HT, TVA {}, {} TTC",
        verb,
        entry.id,
        format_eur(entry.data.amount_excl_tax),
        format_eur(entry.data.tax_amount()),
        format_eur(entry.data.amount_incl_tax())
    );
}

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Only invoices or only expenses
    #[arg(value_enum)]
    kind: Option<KindArg>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl ListCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let snapshot = source.snapshot().await?;
        let kind = self.kind.map(Kind::from);
        let mut entries: Vec<&Entry> = snapshot
            .entries
            .iter()
            .filter(|e| kind.map_or(true, |k| e.kind() == k))
            .collect();
        entries.sort_by(|a, b| b.data.date.cmp(&a.data.date).then(a.id.cmp(&b.id)));
        let rows: Vec<EntryRow> = entries.into_iter().map(EntryRow::from).collect();

        if self.json {
            return print_json(&rows);
        }
        if rows.is_empty() {
            println!("Aucune écriture.");
            return Ok(());
        }
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddCommand {
    #[arg(value_enum)]
    kind: KindArg,

    #[command(flatten)]
    fields: DraftArgs,

    /// Scanned invoice or receipt (pdf, jpg, png, webp) to pre-fill the fields from
    #[arg(long)]
    document: Option<PathBuf>,
}

impl AddCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let mut draft = self.fields.to_draft();
        if let Some(path) = &self.document {
            draft = prefill(source, path, &draft).await;
        }
        let kind: Kind = self.kind.into();
        let entry = interruptible(async {
            let store = source.open_store().await?;
            Ok::<_, anyhow::Error>(store::submit(store.as_ref(), kind, &draft, today()).await?)
        })
        .await?;
        print_entry("Created", &entry);
        Ok(())
    }
}

/// Pre-fill `draft` from a document. Values given on the command line are
/// overridden only by non-empty extracted values, and any failure falls
/// back to the draft as typed.
async fn prefill(source: &SourceArgs, path: &Path, draft: &EntryDraft) -> EntryDraft {
    let document = match Document::read(path).await {
        Ok(document) => document,
        Err(err) => {
            eprintln!("warning: {}; continuing with manual entry", err);
            return draft.clone();
        }
    };
    let extractor = match source.extractor() {
        Ok(extractor) => extractor,
        Err(err) => {
            eprintln!("warning: extraction unavailable ({}); manual entry", err);
            return draft.clone();
        }
    };

    let token = CancellationToken::new();
    let progress = |p: f64| eprint!("\rExtraction: {:>3.0}%", p);
    let extraction = run_extraction(&extractor, &document, &token, &progress);
    tokio::pin!(extraction);
    let finished = tokio::select! {
        outcome = &mut extraction => Some(outcome),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            token.cancel();
            extraction.await
        }
    };
    eprintln!();

    match &outcome {
        ExtractionOutcome::Succeeded { .. } => eprintln!("Fields extracted from {}", document.file_name),
        ExtractionOutcome::Failed { reason } => {
            eprintln!("warning: extraction unavailable ({}); manual entry", reason)
        }
        ExtractionOutcome::Discarded => eprintln!("Extraction cancelled; manual entry"),
    }
    outcome.apply(draft)
}

#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Entry id, e.g. inv-3 or exp-12
    id: EntryId,

    #[command(flatten)]
    fields: DraftArgs,
}

impl UpdateCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let store = source.open_store().await?;
        let entry = store::amend(store.as_ref(), self.id, &self.fields.to_draft()).await?;
        print_entry("Updated", &entry);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct SetPaidCommand {
    /// Invoice id, e.g. inv-3
    id: EntryId,

    /// Mark as unpaid instead
    #[arg(long)]
    unpaid: bool,
}

impl SetPaidCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let store = source.open_store().await?;
        let entry = store::set_paid(store.as_ref(), self.id, !self.unpaid).await?;
        let status = if self.unpaid { "unpaid" } else { "paid" };
        println!("{} marked {}", entry.id, status);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Entry id, e.g. inv-3 or exp-12
    id: EntryId,
}

impl DeleteCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let store = source.open_store().await?;
        store.delete(self.id).await?;
        println!("Deleted {}", self.id);
        Ok(())
    }
}
