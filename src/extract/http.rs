use super::{Document, DocumentExtractor, ExtractedFields, ExtractionFailure, ProgressSink};
use crate::store::http::service_url;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Client for the OCR endpoint of the bookkeeping service
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    endpoint: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    fields: OcrFields,
    #[serde(default)]
    raw_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrFields {
    name: Option<String>,
    number: Option<String>,
    date: Option<String>,
    amount_ht: Option<f64>,
    vat_rate: Option<f64>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

impl From<OcrFields> for ExtractedFields {
    fn from(fields: OcrFields) -> Self {
        let number = |n: Option<f64>| n.filter(|n| n.is_finite()).map(|n| n.to_string());
        ExtractedFields {
            counterparty: fields.name,
            document_number: fields.number,
            date: fields.date,
            amount_excl_tax: number(fields.amount_ht),
            rate: number(fields.vat_rate),
            category: fields.category,
        }
    }
}

impl HttpExtractor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExtractionFailure> {
        let endpoint = service_url(base_url)
            .and_then(|base| base.join("api/ocr").map_err(|err| err.to_string()))
            .map_err(|err| ExtractionFailure::Service(format!("invalid service url: {err}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }
}

#[async_trait]
impl DocumentExtractor for HttpExtractor {
    async fn extract(
        &self,
        document: &Document,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractedFields, ExtractionFailure> {
        let kind = document.document_type()?;
        progress.report(10.0);

        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(kind.mime())?;
        let form = Form::new().part("file", part);
        progress.report(30.0);

        log::debug!("Uploading {} ({} bytes) to {}", document.file_name, document.bytes.len(), self.endpoint);
        let res = self.http.post(self.endpoint.clone()).multipart(form).send().await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res
                .json::<ErrorResponse>()
                .await
                .map(|err| match err.detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_else(|_| status.to_string());
            return Err(ExtractionFailure::Service(detail));
        }

        let body = res
            .json::<OcrResponse>()
            .await
            .map_err(|err| ExtractionFailure::Malformed(err.to_string()))?;
        if !body.success {
            return Err(ExtractionFailure::Service("extraction reported no success".to_string()));
        }
        if let Some(text) = &body.raw_text {
            log::debug!("OCR text: {}", text);
        }
        progress.report(100.0);
        Ok(body.fields.into())
    }
}
