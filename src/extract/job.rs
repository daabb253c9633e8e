use super::{Document, DocumentExtractor, ExtractedFields, ProgressSink};
use crate::core::EntryDraft;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Terminal state of an extraction job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExtractionOutcome {
    Succeeded { fields: ExtractedFields },
    /// The user carries on with the manual draft
    Failed { reason: String },
    /// Cancelled before completion; the result was dropped
    Discarded,
}

impl ExtractionOutcome {
    /// The draft to continue with: pre-filled on success, unchanged otherwise
    pub fn apply(&self, draft: &EntryDraft) -> EntryDraft {
        match self {
            ExtractionOutcome::Succeeded { fields } => fields.merge_into(draft),
            ExtractionOutcome::Failed { .. } | ExtractionOutcome::Discarded => draft.clone(),
        }
    }
}

/// Forwards progress while the job is live, clamped to `0..=100` and never
/// going backwards.
struct Gate<'a> {
    token: &'a CancellationToken,
    sink: &'a dyn ProgressSink,
    // non-negative floats order the same as their bit patterns
    last: AtomicU64,
}

impl<'a> Gate<'a> {
    fn new(token: &'a CancellationToken, sink: &'a dyn ProgressSink) -> Self {
        Gate {
            token,
            sink,
            last: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl ProgressSink for Gate<'_> {
    fn report(&self, percent: f64) {
        if self.token.is_cancelled() || percent.is_nan() || percent <= 0.0 {
            return;
        }
        let percent = percent.min(100.0);
        let previous = f64::from_bits(self.last.fetch_max(percent.to_bits(), Ordering::SeqCst));
        if percent > previous {
            self.sink.report(percent);
        }
    }
}

/// Run one extraction under `token`.
///
/// Cancellation is cooperative: the extractor call is not interrupted, but
/// once the token is cancelled no more progress is forwarded and the
/// result is discarded.
pub async fn run_extraction(
    extractor: &dyn DocumentExtractor,
    document: &Document,
    token: &CancellationToken,
    progress: &dyn ProgressSink,
) -> ExtractionOutcome {
    if token.is_cancelled() {
        return ExtractionOutcome::Discarded;
    }
    let gate = Gate::new(token, progress);
    let result = extractor.extract(document, &gate).await;

    if token.is_cancelled() {
        log::debug!("Extraction of {} cancelled, result discarded", document.file_name);
        return ExtractionOutcome::Discarded;
    }
    match result {
        Ok(fields) => {
            gate.report(100.0);
            log::info!("Extracted fields from {}", document.file_name);
            ExtractionOutcome::Succeeded { fields }
        }
        Err(err) => {
            log::warn!("Extraction of {} failed: {}", document.file_name, err);
            ExtractionOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

struct Job {
    file_name: String,
    token: CancellationToken,
    handle: JoinHandle<ExtractionOutcome>,
}

/// Several extractions in flight at once.
///
/// Each job runs on its own task under a child of the batch token, so one
/// job can be cancelled without touching the others.
pub struct ExtractionBatch {
    extractor: Arc<dyn DocumentExtractor>,
    token: CancellationToken,
    jobs: Vec<Job>,
}

impl ExtractionBatch {
    pub fn new(extractor: Arc<dyn DocumentExtractor>) -> Self {
        ExtractionBatch {
            extractor,
            token: CancellationToken::new(),
            jobs: Vec::new(),
        }
    }

    /// Start extracting `document`, returning the job index
    pub fn spawn(&mut self, document: Document, progress: Arc<dyn ProgressSink>) -> usize {
        let token = self.token.child_token();
        let extractor = Arc::clone(&self.extractor);
        let job_token = token.clone();
        let file_name = document.file_name.clone();
        let handle = tokio::spawn(async move {
            run_extraction(extractor.as_ref(), &document, &job_token, progress.as_ref()).await
        });
        self.jobs.push(Job {
            file_name,
            token,
            handle,
        });
        self.jobs.len() - 1
    }

    /// Cancel a single job. Unknown indices are ignored.
    pub fn cancel(&self, index: usize) {
        if let Some(job) = self.jobs.get(index) {
            job.token.cancel();
        }
    }

    pub fn cancel_all(&self) {
        self.token.cancel();
    }

    /// Token cancelling every job, for use after the batch is handed to [`join`](Self::join)
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for every job, in spawn order
    pub async fn join(self) -> Vec<(String, ExtractionOutcome)> {
        let mut outcomes = Vec::with_capacity(self.jobs.len());
        for job in self.jobs {
            let outcome = match job.handle.await {
                Ok(outcome) => outcome,
                Err(err) => ExtractionOutcome::Failed {
                    reason: format!("extraction task failed: {}", err),
                },
            };
            outcomes.push((job.file_name, outcome));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionFailure;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// Reports the scripted progress, optionally waits for a permit, then
    /// returns the scripted result
    struct Scripted {
        progress: Vec<f64>,
        fields: Option<ExtractedFields>,
        cancel_during: Option<CancellationToken>,
        release: Option<Arc<Semaphore>>,
    }

    impl Scripted {
        fn ok(progress: Vec<f64>) -> Self {
            Scripted {
                progress,
                fields: Some(fields()),
                cancel_during: None,
                release: None,
            }
        }
    }

    #[async_trait]
    impl DocumentExtractor for Scripted {
        async fn extract(
            &self,
            _document: &Document,
            progress: &dyn ProgressSink,
        ) -> Result<ExtractedFields, ExtractionFailure> {
            for (i, p) in self.progress.iter().enumerate() {
                progress.report(*p);
                if i == 0 {
                    if let Some(token) = &self.cancel_during {
                        token.cancel();
                    }
                }
            }
            if let Some(release) = &self.release {
                let _permit = release.acquire().await.unwrap();
            }
            self.fields
                .clone()
                .ok_or_else(|| ExtractionFailure::Service("Erreur OCR: image illisible".to_string()))
        }
    }

    fn fields() -> ExtractedFields {
        ExtractedFields {
            counterparty: Some("Adobe".to_string()),
            amount_excl_tax: Some("59.99".to_string()),
            ..Default::default()
        }
    }

    fn document(name: &str) -> Document {
        Document {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, impl Fn(f64) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |p: f64| seen.lock().unwrap().push(p)
        };
        (seen, sink)
    }

    #[tokio::test]
    async fn progress_clamped_and_monotonic() {
        let extractor = Scripted::ok(vec![10.0, 30.0, 25.0, 150.0, -5.0, f64::NAN]);
        let (seen, sink) = recorder();
        let outcome = run_extraction(&extractor, &document("a.pdf"), &CancellationToken::new(), &sink).await;
        assert_eq!(outcome, ExtractionOutcome::Succeeded { fields: fields() });
        assert_eq!(*seen.lock().unwrap(), vec![10.0, 30.0, 100.0]);
    }

    #[tokio::test]
    async fn completion_reports_one_hundred() {
        let extractor = Scripted::ok(vec![10.0]);
        let (seen, sink) = recorder();
        run_extraction(&extractor, &document("a.pdf"), &CancellationToken::new(), &sink).await;
        assert_eq!(*seen.lock().unwrap(), vec![10.0, 100.0]);
    }

    #[tokio::test]
    async fn failure_keeps_manual_draft() {
        let extractor = Scripted {
            fields: None,
            ..Scripted::ok(vec![10.0])
        };
        let (_seen, sink) = recorder();
        let outcome = run_extraction(&extractor, &document("a.png"), &CancellationToken::new(), &sink).await;
        assert!(matches!(&outcome, ExtractionOutcome::Failed { reason } if reason.contains("illisible")));

        let draft = EntryDraft {
            counterparty: Some("Manual".to_string()),
            ..Default::default()
        };
        assert_eq!(outcome.apply(&draft), draft);
    }

    #[tokio::test]
    async fn cancelled_mid_flight_discards_result_and_progress() {
        let token = CancellationToken::new();
        let extractor = Scripted {
            cancel_during: Some(token.clone()),
            ..Scripted::ok(vec![10.0, 30.0, 60.0])
        };
        let (seen, sink) = recorder();
        let outcome = run_extraction(&extractor, &document("a.pdf"), &token, &sink).await;
        assert_eq!(outcome, ExtractionOutcome::Discarded);
        assert_eq!(*seen.lock().unwrap(), vec![10.0]);
    }

    #[tokio::test]
    async fn already_cancelled_never_starts() {
        let token = CancellationToken::new();
        token.cancel();
        let (seen, sink) = recorder();
        let outcome = run_extraction(&Scripted::ok(vec![10.0]), &document("a.pdf"), &token, &sink).await;
        assert_eq!(outcome, ExtractionOutcome::Discarded);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_cancels_one_job_only() {
        let release = Arc::new(Semaphore::new(0));
        let extractor = Arc::new(Scripted {
            release: Some(Arc::clone(&release)),
            ..Scripted::ok(vec![10.0])
        });
        let mut batch = ExtractionBatch::new(extractor);
        let (_seen, sink) = recorder();
        let sink: Arc<dyn ProgressSink> = Arc::new(sink);
        let first = batch.spawn(document("first.pdf"), Arc::clone(&sink));
        let second = batch.spawn(document("second.pdf"), sink);
        assert_eq!((first, second), (0, 1));

        batch.cancel(first);
        release.add_permits(2);
        let outcomes = batch.join().await;

        assert_eq!(outcomes[first], ("first.pdf".to_string(), ExtractionOutcome::Discarded));
        assert_eq!(
            outcomes[second],
            ("second.pdf".to_string(), ExtractionOutcome::Succeeded { fields: fields() })
        );
    }

    #[tokio::test]
    async fn batch_cancel_all() {
        let release = Arc::new(Semaphore::new(0));
        let extractor = Arc::new(Scripted {
            release: Some(Arc::clone(&release)),
            ..Scripted::ok(vec![])
        });
        let mut batch = ExtractionBatch::new(extractor);
        let (_seen, sink) = recorder();
        let sink: Arc<dyn ProgressSink> = Arc::new(sink);
        batch.spawn(document("a.pdf"), Arc::clone(&sink));
        batch.spawn(document("b.pdf"), sink);

        batch.cancel_all();
        release.add_permits(2);
        let outcomes = batch.join().await;
        assert!(outcomes.iter().all(|(_, o)| *o == ExtractionOutcome::Discarded));
    }
}
