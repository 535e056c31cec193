//! Batch orchestration with per-document retry.
//!
//! Documents are processed sequentially in request order. One document's
//! failure never aborts the batch; every request produces an outcome in the
//! same position it was submitted in.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BatchError, PipelineError, RemoteError, TerminalFailure, TextSourceError};
use crate::models::ConfigRepository;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::text::TextSource;

/// Largest batch accepted in one call.
pub const MAX_BATCH_SIZE: usize = 50;

/// One document to process.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequest {
    pub source_name: String,
    /// `None` selects the default entity.
    pub entity_id: Option<String>,
}

impl DocumentRequest {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            entity_id: None,
        }
    }

    pub fn for_entity(source_name: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            entity_id: Some(entity_id.into()),
        }
    }
}

/// Anything that can turn a request into a processed document. The pipeline
/// adapter below is the real implementation; tests substitute their own.
pub trait RemoteExtractor {
    fn process(&self, request: &DocumentRequest) -> Result<PipelineOutput, RemoteError>;
}

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per document, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; each further retry doubles it.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// Final outcome for one document.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Success {
        #[serde(flatten)]
        output: PipelineOutput,
        attempts: u32,
    },
    Failed {
        source_name: String,
        #[serde(serialize_with = "serialize_error")]
        error: RemoteError,
        attempts: u32,
    },
}

fn serialize_error<S: serde::Serializer>(e: &RemoteError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&e.to_string())
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DocumentOutcome::Success { .. })
    }

    pub fn source_name(&self) -> &str {
        match self {
            DocumentOutcome::Success { output, .. } => output.record.source_name(),
            DocumentOutcome::Failed { source_name, .. } => source_name,
        }
    }
}

/// Outcomes in submission order, one per accepted request.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<DocumentOutcome>,
    /// Requests dropped by [`BatchOrchestrator::run_truncated`], zero otherwise.
    pub truncated: usize,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Runs a batch of documents through an extractor, retrying transient
/// failures per the policy.
pub struct BatchOrchestrator<E> {
    extractor: E,
    policy: RetryPolicy,
}

impl<E: RemoteExtractor> BatchOrchestrator<E> {
    pub fn new(extractor: E, policy: RetryPolicy) -> Self {
        Self { extractor, policy }
    }

    /// Process every request. Batches over [`MAX_BATCH_SIZE`] are rejected
    /// whole, never silently shortened.
    pub fn run(&self, requests: &[DocumentRequest]) -> Result<BatchResult, BatchError> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(BatchError::TooManyDocuments {
                count: requests.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(self.run_all(requests, 0, |_, _| {}))
    }

    /// Process the first [`MAX_BATCH_SIZE`] requests and record how many were
    /// dropped. Use only when the caller explicitly opted into truncation.
    pub fn run_truncated(&self, requests: &[DocumentRequest]) -> BatchResult {
        let keep = requests.len().min(MAX_BATCH_SIZE);
        self.run_all(&requests[..keep], requests.len() - keep, |_, _| {})
    }

    /// Like [`run`](Self::run) with a callback after each document, for
    /// progress reporting.
    pub fn run_with_progress(
        &self,
        requests: &[DocumentRequest],
        progress: impl FnMut(usize, &DocumentOutcome),
    ) -> Result<BatchResult, BatchError> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(BatchError::TooManyDocuments {
                count: requests.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(self.run_all(requests, 0, progress))
    }

    fn run_all(
        &self,
        requests: &[DocumentRequest],
        truncated: usize,
        mut progress: impl FnMut(usize, &DocumentOutcome),
    ) -> BatchResult {
        info!(count = requests.len(), truncated, "starting batch");

        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let outcome = self.run_one(request);
            progress(index, &outcome);
            outcomes.push(outcome);
        }

        let result = BatchResult { outcomes, truncated };
        info!(
            succeeded = result.succeeded(),
            failed = result.failed(),
            "batch finished"
        );
        result
    }

    fn run_one(&self, request: &DocumentRequest) -> DocumentOutcome {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.extractor.process(request) {
                Ok(output) => {
                    debug!(source = %request.source_name, attempts, "document succeeded");
                    return DocumentOutcome::Success { output, attempts };
                }
                Err(error) if error.is_retryable() && attempts < self.policy.max_attempts => {
                    let delay = self.policy.delay(attempts);
                    warn!(
                        source = %request.source_name,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient failure, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(error) => {
                    warn!(source = %request.source_name, attempts, %error, "document failed");
                    return DocumentOutcome::Failed {
                        source_name: request.source_name.clone(),
                        error,
                        attempts,
                    };
                }
            }
        }
    }
}

/// Adapter that runs requests through the local pipeline. Local failures
/// are all terminal; there is nothing transient about a missing file or an
/// unreadable scan.
pub struct PipelineRemote<'a, C: ConfigRepository, S: TextSource> {
    pipeline: Pipeline<'a, C>,
    source: S,
}

impl<'a, C: ConfigRepository, S: TextSource> PipelineRemote<'a, C, S> {
    pub fn new(pipeline: Pipeline<'a, C>, source: S) -> Self {
        Self { pipeline, source }
    }
}

impl<C: ConfigRepository, S: TextSource> RemoteExtractor for PipelineRemote<'_, C, S> {
    fn process(&self, request: &DocumentRequest) -> Result<PipelineOutput, RemoteError> {
        let text = self.source.fetch(&request.source_name).map_err(|e| match e {
            TextSourceError::NotFound(name) => TerminalFailure::NotFound(name),
            TextSourceError::Empty(name) => {
                TerminalFailure::BadInput(format!("no usable text in {name}"))
            }
            TextSourceError::Unreadable { source_name, reason } => {
                TerminalFailure::BadInput(format!("cannot read {source_name}: {reason}"))
            }
        })?;

        self.pipeline
            .process(
                &request.source_name,
                &text,
                request.entity_id.as_deref(),
            )
            .map_err(|e| match e {
                PipelineError::OcrFailure(name) => {
                    TerminalFailure::BadInput(format!("no usable text in {name}")).into()
                }
                PipelineError::UnknownEntity(id) => {
                    TerminalFailure::BadInput(format!("unknown entity {id}")).into()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransientFailure;
    use crate::models::{ConfigStore, InvoiceRecord};
    use crate::naming;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::time::Instant;

    /// Scripted extractor: each document fails a fixed number of times with
    /// the given error before succeeding.
    struct Scripted {
        failures: Vec<(u32, RemoteError)>,
        calls: RefCell<Vec<u32>>,
    }

    impl Scripted {
        fn new(failures: Vec<(u32, RemoteError)>) -> Self {
            let calls = RefCell::new(vec![0; failures.len()]);
            Self { failures, calls }
        }
    }

    impl RemoteExtractor for Scripted {
        fn process(&self, request: &DocumentRequest) -> Result<PipelineOutput, RemoteError> {
            let index: usize = request.source_name.parse().unwrap();
            let mut calls = self.calls.borrow_mut();
            calls[index] += 1;

            let (fail_times, error) = &self.failures[index];
            if calls[index] <= *fail_times {
                return Err(error.clone());
            }

            let record = InvoiceRecord::new(request.source_name.clone(), "");
            let naming = naming::render(&record, None);
            Ok(PipelineOutput {
                record,
                classification: None,
                folder: None,
                naming,
                confidence: 1.0,
                warnings: Vec::new(),
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        }
    }

    fn requests(n: usize) -> Vec<DocumentRequest> {
        (0..n).map(|i| DocumentRequest::new(i.to_string())).collect()
    }

    #[test]
    fn test_terminal_failure_is_isolated_and_not_retried() {
        let extractor = Scripted::new(vec![
            (0, RemoteError::from(TransientFailure::Timeout(String::new()))),
            (9, RemoteError::from(TerminalFailure::Unauthorized("bad key".into()))),
            (0, RemoteError::from(TransientFailure::Timeout(String::new()))),
        ]);
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        let result = orchestrator.run(&requests(3)).unwrap();

        assert_eq!(result.outcomes.len(), 3);
        assert!(result.outcomes[0].is_success());
        assert!(!result.outcomes[1].is_success());
        assert!(result.outcomes[2].is_success());
        // Terminal failures get exactly one attempt.
        assert_eq!(orchestrator.extractor.calls.borrow()[1], 1);
        // Order matches submission order.
        assert_eq!(result.outcomes[1].source_name(), "1");
    }

    #[test]
    fn test_transient_failure_retried_with_backoff() {
        let extractor = Scripted::new(vec![(
            2,
            RemoteError::from(TransientFailure::ServerError("503".into())),
        )]);
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        let started = Instant::now();
        let result = orchestrator.run(&requests(1)).unwrap();
        let elapsed = started.elapsed();

        assert!(result.outcomes[0].is_success());
        match &result.outcomes[0] {
            DocumentOutcome::Success { attempts, .. } => assert_eq!(*attempts, 3),
            DocumentOutcome::Failed { .. } => unreachable!(),
        }
        // Two retries: 10ms then 20ms.
        assert!(elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn test_transient_failure_gives_up_after_max_attempts() {
        let extractor = Scripted::new(vec![(
            9,
            RemoteError::from(TransientFailure::RateLimited("429".into())),
        )]);
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        let result = orchestrator.run(&requests(1)).unwrap();

        match &result.outcomes[0] {
            DocumentOutcome::Failed { attempts, error, .. } => {
                assert_eq!(*attempts, 3);
                assert!(error.is_retryable());
            }
            DocumentOutcome::Success { .. } => unreachable!(),
        }
        assert_eq!(orchestrator.extractor.calls.borrow()[0], 3);
    }

    #[test]
    fn test_oversized_batch_rejected_whole() {
        let extractor = Scripted::new(
            (0..51)
                .map(|_| (0, RemoteError::from(TransientFailure::Timeout(String::new()))))
                .collect(),
        );
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        assert_eq!(
            orchestrator.run(&requests(51)).unwrap_err(),
            BatchError::TooManyDocuments { count: 51, max: 50 }
        );
        // Nothing was processed.
        assert!(orchestrator.extractor.calls.borrow().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_explicit_truncation_processes_first_fifty() {
        let extractor = Scripted::new(
            (0..51)
                .map(|_| (0, RemoteError::from(TransientFailure::Timeout(String::new()))))
                .collect(),
        );
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        let result = orchestrator.run_truncated(&requests(51));
        assert_eq!(result.outcomes.len(), 50);
        assert_eq!(result.truncated, 1);
        assert_eq!(result.succeeded(), 50);
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_progress_callback_sees_every_outcome() {
        let extractor = Scripted::new(vec![
            (0, RemoteError::from(TransientFailure::Timeout(String::new()))),
            (0, RemoteError::from(TransientFailure::Timeout(String::new()))),
        ]);
        let orchestrator = BatchOrchestrator::new(extractor, fast_policy());

        let mut seen = Vec::new();
        orchestrator
            .run_with_progress(&requests(2), |i, outcome| {
                seen.push((i, outcome.is_success()));
            })
            .unwrap();

        assert_eq!(seen, vec![(0, true), (1, true)]);
    }

    #[test]
    fn test_pipeline_remote_maps_missing_file_to_terminal() {
        use crate::text::FileTextSource;
        let dir = tempfile::TempDir::new().unwrap();

        let config = ConfigStore::builtin();
        let remote = PipelineRemote::new(Pipeline::new(&config), FileTextSource::new(dir.path()));

        let err = remote
            .process(&DocumentRequest::new("absent.pdf"))
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(matches!(
            err,
            RemoteError::Terminal(TerminalFailure::NotFound(_))
        ));
    }
}
