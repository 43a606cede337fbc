//! End-to-end graph generation workflow.
//!
//! One sequential orchestration per request: build the dataset, submit it to
//! the external runner, poll the run to a terminal status, walk the ordered
//! result stream, and materialize any chart artifacts. Per-artifact failures
//! are collected as warnings; everything earlier in the chain aborts the
//! workflow.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::artifacts::ArtifactStore;
use crate::assistants::RunStatus;
use crate::dataset;
use crate::error::{ArtifactError, SpendchartError};
use crate::poll::{Clock, Poller, TokioClock};
use crate::results::ResultMessage;
use crate::runner::JobRunner;
use crate::store::{Category, ExpenseStore};

/// Immutable input: which slice of the expense table to chart.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub category: Category,
    pub month: String,
}

/// What a finished workflow hands back to the caller.
#[derive(Debug)]
pub struct GraphOutcome {
    /// Paths of the charts written to the output directory.
    pub saved_files: Vec<PathBuf>,
    /// Per-artifact failures that did not sink the workflow.
    pub warnings: Vec<String>,
    /// The run's messages in narration order.
    pub narration: Vec<ResultMessage>,
}

/// Drives graph requests through the full delegation workflow.
pub struct GraphService<R, C = TokioClock> {
    runner: R,
    artifacts: ArtifactStore,
    poller: Poller<C>,
}

impl<R: JobRunner, C: Clock> GraphService<R, C> {
    pub fn new(runner: R, artifacts: ArtifactStore, poller: Poller<C>) -> Self {
        Self {
            runner,
            artifacts,
            poller,
        }
    }

    /// Runs the workflow to completion or the first fatal error. Blocks until
    /// the run reaches a terminal status or `cancel` fires.
    pub async fn generate(
        &self,
        store: &ExpenseStore,
        request: &GraphRequest,
        cancel: &CancellationToken,
    ) -> Result<GraphOutcome, SpendchartError> {
        // Dataset: validate the month and refuse to submit an empty payload.
        let payload = dataset::build(store, request.category, &request.month).await?;
        let payload_json = payload.to_json()?;

        // Submission. Not retried here; only status polls retry.
        let job = self
            .runner
            .submit(&payload_json, &request.month)
            .await
            .map_err(|e| {
                if e.is_auth_failure() {
                    SpendchartError::AuthenticationFailed(e.to_string())
                } else {
                    SpendchartError::ExternalServiceUnavailable(e.to_string())
                }
            })?;

        // Poll until the runner reports a terminal status.
        let status = if job.status.is_terminal() {
            job.status
        } else {
            self.poller
                .wait_until_terminal(&self.runner, &job, cancel)
                .await?
        };
        if status != RunStatus::Completed {
            return Err(SpendchartError::JobDidNotComplete(status));
        }

        // Consume the ordered result stream.
        let narration = self
            .runner
            .list_messages(&job)
            .await
            .map_err(|e| SpendchartError::ExternalServiceUnavailable(e.to_string()))?;

        // Materialize artifacts in stream order, collecting failures.
        let mut saved_files = Vec::new();
        let mut failures: Vec<ArtifactError> = Vec::new();
        for message in &narration {
            for file_id in &message.artifacts {
                match self.fetch_and_save(file_id).await {
                    Ok(path) => saved_files.push(path),
                    Err(failure) => failures.push(failure),
                }
            }
        }

        // Partial success is success; nothing saved with at least one
        // artifact failure is not.
        if saved_files.is_empty() && !failures.is_empty() {
            return Err(failures.remove(0).into());
        }

        Ok(GraphOutcome {
            saved_files,
            warnings: failures.iter().map(|f| f.to_string()).collect(),
            narration,
        })
    }

    async fn fetch_and_save(&self, file_id: &str) -> Result<PathBuf, ArtifactError> {
        let fetch_err = |source| ArtifactError::Fetch {
            file_id: file_id.to_string(),
            source,
        };
        let filename = self
            .runner
            .artifact_filename(file_id)
            .await
            .map_err(fetch_err)?;
        let bytes = self.runner.artifact_bytes(file_id).await.map_err(fetch_err)?;
        self.artifacts.save(&filename, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::AssistantsError;
    use crate::runner::JobHandle;
    use crate::store::NewExpense;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct InstantClock;

    impl Clock for InstantClock {
        async fn sleep(&self, _duration: Duration) {}
    }

    // Artifact behavior for the mock runner: a saved (filename, bytes) pair
    // or an HTTP status to fail the fetch with.
    type MockArtifact = Result<(String, Vec<u8>), u16>;

    struct MockRunner {
        submit_error: Option<u16>,
        statuses: Mutex<Vec<RunStatus>>,
        messages: Vec<ResultMessage>,
        artifacts: HashMap<String, MockArtifact>,
        submits: AtomicU32,
        lists: AtomicU32,
    }

    impl MockRunner {
        fn completing(messages: Vec<ResultMessage>, artifacts: HashMap<String, MockArtifact>) -> Self {
            Self {
                submit_error: None,
                statuses: Mutex::new(vec![RunStatus::InProgress, RunStatus::Completed]),
                messages,
                artifacts,
                submits: AtomicU32::new(0),
                lists: AtomicU32::new(0),
            }
        }

        fn ending_with(status: RunStatus) -> Self {
            Self {
                submit_error: None,
                statuses: Mutex::new(vec![RunStatus::InProgress, status]),
                messages: Vec::new(),
                artifacts: HashMap::new(),
                submits: AtomicU32::new(0),
                lists: AtomicU32::new(0),
            }
        }

        fn failing_submit(status: u16) -> Self {
            Self {
                submit_error: Some(status),
                statuses: Mutex::new(Vec::new()),
                messages: Vec::new(),
                artifacts: HashMap::new(),
                submits: AtomicU32::new(0),
                lists: AtomicU32::new(0),
            }
        }
    }

    impl JobRunner for MockRunner {
        async fn submit(
            &self,
            _payload_json: &str,
            _month: &str,
        ) -> Result<JobHandle, AssistantsError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.submit_error {
                return Err(AssistantsError::ApiError {
                    status,
                    message: "submit refused".into(),
                });
            }
            Ok(JobHandle {
                run_id: "run-1".into(),
                thread_id: "thread-1".into(),
                status: RunStatus::Queued,
            })
        }

        async fn run_status(&self, _job: &JobHandle) -> Result<RunStatus, AssistantsError> {
            Ok(self.statuses.lock().unwrap().remove(0))
        }

        async fn list_messages(
            &self,
            _job: &JobHandle,
        ) -> Result<Vec<ResultMessage>, AssistantsError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(self.messages.clone())
        }

        async fn artifact_filename(&self, file_id: &str) -> Result<String, AssistantsError> {
            match self.artifacts.get(file_id).unwrap() {
                Ok((filename, _)) => Ok(filename.clone()),
                Err(status) => Err(AssistantsError::ApiError {
                    status: *status,
                    message: "fetch refused".into(),
                }),
            }
        }

        async fn artifact_bytes(&self, file_id: &str) -> Result<Vec<u8>, AssistantsError> {
            match self.artifacts.get(file_id).unwrap() {
                Ok((_, bytes)) => Ok(bytes.clone()),
                Err(status) => Err(AssistantsError::ApiError {
                    status: *status,
                    message: "fetch refused".into(),
                }),
            }
        }
    }

    fn message(text: Option<&str>, artifacts: &[&str]) -> ResultMessage {
        ResultMessage {
            role: "assistant".into(),
            text: text.map(String::from),
            artifacts: artifacts.iter().map(|s| s.to_string()).collect(),
        }
    }

    async fn seeded_store() -> (tempfile::TempDir, ExpenseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpenseStore::connect(&dir.path().join("test.db"))
            .await
            .unwrap();
        store
            .add(NewExpense {
                description: "Groceries".into(),
                category: Category::Food,
                amount: 42.5,
                date: "2025-01-15".parse().unwrap(),
            })
            .await
            .unwrap();
        (dir, store)
    }

    fn service<R: JobRunner>(
        runner: R,
        out_dir: &std::path::Path,
    ) -> GraphService<R, InstantClock> {
        GraphService::new(
            runner,
            ArtifactStore::new(out_dir),
            Poller::with_clock(Duration::from_secs(1), 100, 3, InstantClock),
        )
    }

    fn request() -> GraphRequest {
        GraphRequest {
            category: Category::Food,
            month: "January".into(),
        }
    }

    #[tokio::test]
    async fn happy_path_saves_artifacts_in_stream_order() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(
            vec![
                message(Some("Working on it"), &[]),
                message(Some("Here is your chart"), &["file-a", "file-b"]),
            ],
            HashMap::from([
                ("file-a".into(), Ok(("january.png".into(), b"aaa".to_vec()))),
                ("file-b".into(), Ok(("totals.png".into(), b"bbb".to_vec()))),
            ]),
        );
        let service = service(runner, &dir.path().join("charts"));

        let outcome = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.saved_files.len(), 2);
        assert_eq!(outcome.saved_files[0].file_name().unwrap(), "january.png");
        assert_eq!(outcome.saved_files[1].file_name().unwrap(), "totals.png");
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.narration.len(), 2);
        assert_eq!(outcome.narration[0].text.as_deref(), Some("Working on it"));
    }

    #[tokio::test]
    async fn no_data_fails_before_any_submission() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(Vec::new(), HashMap::new());
        let service = service(runner, dir.path());

        let err = service
            .generate(
                &store,
                &GraphRequest {
                    category: Category::Health,
                    month: "January".into(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SpendchartError::NoDataFound { .. }));
        assert_eq!(service.runner.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_month_fails_before_any_submission() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(Vec::new(), HashMap::new());
        let service = service(runner, dir.path());

        let err = service
            .generate(
                &store,
                &GraphRequest {
                    category: Category::Food,
                    month: "Januray".into(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SpendchartError::InvalidMonthName(_)));
        assert_eq!(service.runner.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_run_never_reads_results() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::ending_with(RunStatus::Failed);
        let service = service(runner, dir.path());

        let err = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SpendchartError::JobDidNotComplete(RunStatus::Failed)
        ));
        assert_eq!(service.runner.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_run_reports_its_status() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::ending_with(RunStatus::Expired);
        let service = service(runner, dir.path());

        let err = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpendchartError::JobDidNotComplete(RunStatus::Expired)
        ));
    }

    #[tokio::test]
    async fn auth_refusal_at_submit_is_authentication_failed() {
        let (dir, store) = seeded_store().await;
        let service = service(MockRunner::failing_submit(401), dir.path());

        let err = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SpendchartError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn server_refusal_at_submit_is_service_unavailable() {
        let (dir, store) = seeded_store().await;
        let service = service(MockRunner::failing_submit(503), dir.path());

        let err = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SpendchartError::ExternalServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn duplicate_artifact_names_are_not_overwritten() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(
            vec![
                message(None, &["file-a"]),
                message(None, &["file-b"]),
            ],
            HashMap::from([
                ("file-a".into(), Ok(("chart.png".into(), b"first".to_vec()))),
                ("file-b".into(), Ok(("chart.png".into(), b"second".to_vec()))),
            ]),
        );
        let out_dir = dir.path().join("charts");
        let service = service(runner, &out_dir);

        let outcome = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.saved_files[0].file_name().unwrap(), "chart.png");
        assert_eq!(outcome.saved_files[1].file_name().unwrap(), "chart (1).png");
        assert_eq!(std::fs::read(&outcome.saved_files[0]).unwrap(), b"first");
        assert_eq!(std::fs::read(&outcome.saved_files[1]).unwrap(), b"second");
    }

    #[tokio::test]
    async fn one_failed_artifact_becomes_a_warning_not_a_failure() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(
            vec![message(None, &["file-a", "file-b", "file-c"])],
            HashMap::from([
                ("file-a".into(), Ok(("one.png".into(), b"1".to_vec()))),
                ("file-b".into(), Err(500)),
                ("file-c".into(), Ok(("three.png".into(), b"3".to_vec()))),
            ]),
        );
        let service = service(runner, dir.path());

        let outcome = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.saved_files.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("file-b"));
    }

    #[tokio::test]
    async fn zero_saved_artifacts_with_failures_is_a_failure() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(
            vec![message(None, &["file-a"])],
            HashMap::from([("file-a".into(), Err(500))]),
        );
        let service = service(runner, dir.path());

        let err = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpendchartError::Artifact(ArtifactError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn run_with_no_artifacts_succeeds_with_empty_paths() {
        let (dir, store) = seeded_store().await;
        let runner = MockRunner::completing(
            vec![message(Some("No chart needed"), &[])],
            HashMap::new(),
        );
        let service = service(runner, dir.path());

        let outcome = service
            .generate(&store, &request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.saved_files.is_empty());
        assert!(outcome.warnings.is_empty());
    }
}
