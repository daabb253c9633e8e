use super::{EntryStore, StoreError};
use crate::core::{
    Entry, EntryData, EntryDetails, EntryId, EntryPatch, ExpenseRecord, InvoiceRecord, Kind, Ledger, ValidationError,
};
use async_trait::async_trait;
use reqwest::{Response, Url};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Client for the bookkeeping REST service
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    /// A message, or a list of field errors for validation failures
    detail: Value,
}

impl ErrorResponse {
    fn message(&self) -> String {
        match &self.detail {
            Value::String(s) => s.clone(),
            Value::Array(errors) => errors
                .iter()
                .map(|e| match (e.get("loc"), e.get("msg")) {
                    (Some(Value::Array(loc)), Some(Value::String(msg))) => {
                        let field = loc.last().map(|l| l.to_string()).unwrap_or_default();
                        format!("{}: {}", field.trim_matches('"'), msg)
                    }
                    _ => e.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = service_url(base_url).map_err(StoreError::InvalidUrl)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|err| StoreError::InvalidUrl(err.to_string()))
    }

    fn collection(&self, kind: Kind) -> Result<Url, StoreError> {
        self.endpoint(collection_path(kind))
    }

    fn item(&self, id: EntryId) -> Result<Url, StoreError> {
        self.endpoint(&format!("{}/{}", collection_path(id.kind), id.number))
    }
}

/// Parse the service base url so that relative routes join below its path
pub(crate) fn service_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|err| format!("{err}: {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn collection_path(kind: Kind) -> &'static str {
    match kind {
        Kind::Invoice => "api/invoices",
        Kind::Expense => "api/expenses",
    }
}

/// Map a non-success response to a [`StoreError`]
async fn check(res: Response, id: Option<EntryId>) -> Result<Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let message = res
        .json::<ErrorResponse>()
        .await
        .map(|err| err.message())
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
    log::debug!("Store responded {}: {}", status, message);

    let err = match (status.as_u16(), id) {
        (404, Some(id)) => StoreError::NotFound(id),
        (400..=499, _) => StoreError::Rejected(message),
        (status, _) => StoreError::Server { status, message },
    };
    Err(err)
}

async fn read_entry(res: Response, kind: Kind) -> Result<Entry, StoreError> {
    let converted = match kind {
        Kind::Invoice => {
            let record = res.json::<InvoiceRecord>().await?;
            (record.entry_id(), record.to_entry())
        }
        Kind::Expense => {
            let record = res.json::<ExpenseRecord>().await?;
            (record.entry_id(), record.to_entry())
        }
    };
    match converted {
        (_, Ok(entry)) => Ok(entry),
        (id, Err(reason)) => Err(StoreError::Malformed { id, reason }),
    }
}

fn money(value: Decimal) -> Value {
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

/// Full body for `POST`
fn create_body(data: &EntryData) -> Value {
    let mut body = json!({
        "date": data.date.format("%Y-%m-%d").to_string(),
        "number": data.document_number,
        "desc": data.description,
        "amount_ht": money(data.amount_excl_tax),
        "vat_rate": money(data.rate.percent()),
    });
    match data.details {
        EntryDetails::Invoice { is_paid } => {
            body["client"] = json!(data.counterparty);
            body["is_paid"] = json!(is_paid);
        }
        EntryDetails::Expense { category } => {
            body["supplier"] = json!(data.counterparty);
            body["category"] = json!(category.label());
        }
    }
    body
}

/// Partial body for `PUT`: only the fields being replaced
fn patch_body(kind: Kind, patch: &EntryPatch) -> Value {
    let mut body = Map::new();
    if let Some(date) = patch.date {
        body.insert("date".into(), json!(date.format("%Y-%m-%d").to_string()));
    }
    if let Some(counterparty) = &patch.counterparty {
        let field = match kind {
            Kind::Invoice => "client",
            Kind::Expense => "supplier",
        };
        body.insert(field.into(), json!(counterparty.trim()));
    }
    if let Some(number) = &patch.document_number {
        body.insert("number".into(), json!(number.trim()));
    }
    if let Some(desc) = &patch.description {
        body.insert("desc".into(), json!(desc.trim()));
    }
    if let Some(amount) = patch.amount_excl_tax {
        body.insert("amount_ht".into(), money(amount));
    }
    if let Some(rate) = patch.rate {
        body.insert("vat_rate".into(), money(rate.percent()));
    }
    if let Some(is_paid) = patch.is_paid {
        body.insert("is_paid".into(), json!(is_paid));
    }
    if let Some(category) = patch.category {
        body.insert("category".into(), json!(category.label()));
    }
    Value::Object(body)
}

#[async_trait]
impl EntryStore for HttpStore {
    async fn list(&self) -> Result<Ledger, StoreError> {
        let res = self.http.get(self.collection(Kind::Invoice)?).send().await?;
        let invoices = check(res, None).await?.json::<Vec<InvoiceRecord>>().await?;

        let res = self.http.get(self.collection(Kind::Expense)?).send().await?;
        let expenses = check(res, None).await?.json::<Vec<ExpenseRecord>>().await?;

        Ok(Ledger { invoices, expenses })
    }

    async fn create(&self, data: &EntryData) -> Result<Entry, StoreError> {
        let res = self
            .http
            .post(self.collection(data.kind())?)
            .json(&create_body(data))
            .send()
            .await?;
        read_entry(check(res, None).await?, data.kind()).await
    }

    async fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<Entry, StoreError> {
        patch
            .check(id.kind)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        if let Some(amount) = patch.amount_excl_tax {
            if amount <= Decimal::ZERO {
                return Err(StoreError::Rejected(ValidationError::NonPositiveAmount.to_string()));
            }
        }
        let res = self
            .http
            .put(self.item(id)?)
            .json(&patch_body(id.kind, patch))
            .send()
            .await?;
        read_entry(check(res, Some(id)).await?, id.kind).await
    }

    async fn delete(&self, id: EntryId) -> Result<(), StoreError> {
        let res = self.http.delete(self.item(id)?).send().await?;
        check(res, Some(id)).await?;
        Ok(())
    }

    async fn health(&self) -> Result<String, StoreError> {
        let res = self.http.get(self.endpoint("health")?).send().await?;
        let health = check(res, None).await?.json::<HealthResponse>().await?;
        Ok(health.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, EntryDraft};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn store(base: &str) -> HttpStore {
        HttpStore::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_joined_onto_base() {
        let s = store("http://localhost:8000");
        assert_eq!(
            s.collection(Kind::Invoice).unwrap().as_str(),
            "http://localhost:8000/api/invoices"
        );
        assert_eq!(
            s.item(EntryId::new(Kind::Expense, 7)).unwrap().as_str(),
            "http://localhost:8000/api/expenses/7"
        );

        let prefixed = store("https://example.org/tva");
        assert_eq!(
            prefixed.endpoint("health").unwrap().as_str(),
            "https://example.org/tva/health"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(matches!(
            HttpStore::new("not a url", Duration::from_secs(1)),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn create_body_uses_service_field_names() {
        let draft = EntryDraft {
            date: Some("2025-03-01".to_string()),
            counterparty: Some("OVH".to_string()),
            amount_excl_tax: Some("1 000".to_string()),
            rate: Some("20".to_string()),
            category: Some("Logiciel".to_string()),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let data = crate::core::validate(Kind::Expense, &draft, today).unwrap();
        let body = create_body(&data);
        assert_eq!(body["supplier"], "OVH");
        assert_eq!(body["category"], "Logiciel");
        assert_eq!(body["amount_ht"], 1000.0);
        assert_eq!(body["vat_rate"], 20.0);
        assert_eq!(body["date"], "2025-03-01");
        assert!(body.get("client").is_none());
        assert!(body.get("is_paid").is_none());
    }

    #[test]
    fn patch_body_only_has_changed_fields() {
        let patch = EntryPatch {
            amount_excl_tax: Some(dec!(250)),
            category: Some(Category::Transport),
            ..Default::default()
        };
        let body = patch_body(Kind::Expense, &patch);
        assert_eq!(body, json!({"amount_ht": 250.0, "category": "Transport"}));

        assert_eq!(patch_body(Kind::Invoice, &EntryPatch::paid(true)), json!({"is_paid": true}));
    }

    #[test]
    fn error_detail_messages() {
        let plain: ErrorResponse = serde_json::from_str(r#"{"detail": "Facture introuvable"}"#).unwrap();
        assert_eq!(plain.message(), "Facture introuvable");

        let validation: ErrorResponse = serde_json::from_str(
            r#"{"detail": [{"loc": ["body", "amount_ht"], "msg": "Input should be greater than or equal to 0", "type": "greater_than_equal"}]}"#,
        )
        .unwrap();
        assert_eq!(
            validation.message(),
            "amount_ht: Input should be greater than or equal to 0"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        // nothing listens on the discard port
        let s = store("http://127.0.0.1:9");
        assert!(matches!(s.list().await, Err(StoreError::Transport(_))));
    }
}
