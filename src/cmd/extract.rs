//! Extract command - read entry fields from scanned documents

use super::{print_json, SourceArgs};
use crate::extract::{Document, ExtractionBatch, ExtractionOutcome, ProgressSink};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ExtractCommand {
    /// Documents to read (pdf, jpg, png, webp)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ExtractionResult {
    file: String,
    #[serde(flatten)]
    outcome: ExtractionOutcome,
}

impl ExtractCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let extractor = Arc::new(source.extractor()?);
        let mut batch = ExtractionBatch::new(extractor);
        let mut results = Vec::new();

        for path in &self.files {
            match Document::read(path).await {
                Ok(document) => {
                    let name = document.file_name.clone();
                    let progress: Arc<dyn ProgressSink> =
                        Arc::new(move |p: f64| log::info!("{}: {:.0}%", name, p));
                    batch.spawn(document, progress);
                }
                Err(err) => results.push(ExtractionResult {
                    file: path.display().to_string(),
                    outcome: ExtractionOutcome::Failed {
                        reason: err.to_string(),
                    },
                }),
            }
        }

        let cancel = batch.cancellation();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, discarding pending extractions");
                cancel.cancel();
            }
        });
        for (file, outcome) in batch.join().await {
            results.push(ExtractionResult { file, outcome });
        }
        interrupt.abort();

        if self.json {
            return print_json(&results);
        }
        for result in &results {
            print_result(result);
        }
        Ok(())
    }
}

fn print_result(result: &ExtractionResult) {
    println!("{}", result.file);
    match &result.outcome {
        ExtractionOutcome::Succeeded { fields } => {
            let shown = [
                ("Tiers", &fields.counterparty),
                ("N°", &fields.document_number),
                ("Date", &fields.date),
                ("HT", &fields.amount_excl_tax),
                ("Taux TVA", &fields.rate),
                ("Catégorie", &fields.category),
            ];
            for (label, value) in shown {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    println!("  {:10} {}", label, value);
                }
            }
            if fields.is_empty() {
                println!("  (nothing recognised)");
            }
        }
        ExtractionOutcome::Failed { reason } => println!("  failed: {}", reason),
        ExtractionOutcome::Discarded => println!("  cancelled"),
    }
}
