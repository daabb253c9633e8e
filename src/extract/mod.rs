//! Pre-filling entry drafts from scanned invoices and receipts.
//!
//! Extraction is best effort. Whatever comes back is only a suggestion
//! merged into a draft the user still validates, and a failure leaves the
//! draft as it was.

pub mod http;
pub mod job;

pub use http::HttpExtractor;
pub use job::{run_extraction, ExtractionBatch, ExtractionOutcome};

use crate::core::EntryDraft;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExtractionFailure {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("extraction service error: {0}")]
    Service(String),
    #[error("extraction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected extraction response: {0}")]
    Malformed(String),
}

/// Document formats the extraction service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Webp,
}

impl DocumentType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentType::Pdf),
            "jpg" | "jpeg" => Some(DocumentType::Jpeg),
            "png" => Some(DocumentType::Png),
            "webp" => Some(DocumentType::Webp),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentType::Pdf => "application/pdf",
            DocumentType::Jpeg => "image/jpeg",
            DocumentType::Png => "image/png",
            DocumentType::Webp => "image/webp",
        }
    }
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub async fn read(path: &Path) -> Result<Self, ExtractionFailure> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractionFailure::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Document {
            file_name,
            bytes,
        })
    }

    pub fn document_type(&self) -> Result<DocumentType, ExtractionFailure> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentType::from_extension)
            .ok_or_else(|| ExtractionFailure::UnsupportedFormat(self.file_name.clone()))
    }
}

/// Fields read off a document. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub counterparty: Option<String>,
    pub document_number: Option<String>,
    pub date: Option<String>,
    pub amount_excl_tax: Option<String>,
    pub rate: Option<String>,
    pub category: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedFields::default()
    }

    /// Overlay the non-empty extracted fields onto `draft`.
    ///
    /// Fields the extractor left empty keep the draft's value, so a value
    /// typed by the user is never blanked.
    pub fn merge_into(&self, draft: &EntryDraft) -> EntryDraft {
        fn pick(extracted: &Option<String>, current: &Option<String>) -> Option<String> {
            match extracted.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() => Some(value.to_string()),
                _ => current.clone(),
            }
        }
        EntryDraft {
            date: pick(&self.date, &draft.date),
            counterparty: pick(&self.counterparty, &draft.counterparty),
            document_number: pick(&self.document_number, &draft.document_number),
            description: draft.description.clone(),
            amount_excl_tax: pick(&self.amount_excl_tax, &draft.amount_excl_tax),
            rate: pick(&self.rate, &draft.rate),
            is_paid: draft.is_paid,
            category: pick(&self.category, &draft.category),
        }
    }
}

/// Receives extraction progress, in percent
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// Turns a document into suggested entry fields
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        document: &Document,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractedFields, ExtractionFailure>;
}
