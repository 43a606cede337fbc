//! Narrow seam over the external job runner.
//!
//! The orchestration and the poller only ever see [`JobRunner`]: submit a
//! payload, read a run status, list ordered result messages, fetch an
//! artifact. Vendor-specific wire shapes stay behind [`OpenAiRunner`], and
//! tests substitute mock implementations.

use crate::assistants::{AssistantsClient, AssistantsError, RunStatus};
use crate::results::{self, ResultMessage};

/// Name under which the dataset is uploaded to the runner.
pub const UPLOAD_FILENAME: &str = "expense_data.json";

const ASSISTANT_NAME: &str = "Expense Graph Generator";
const ASSISTANT_INSTRUCTIONS: &str =
    "Use the data provided to generate a graph for expenses.";

/// Opaque handle to an external run: everything the workflow needs to poll it
/// and read its output.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub run_id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

/// The operations the graph workflow needs from the external runner.
pub trait JobRunner {
    /// Upload the serialized payload and atomically start a run whose thread
    /// is seeded with the graph instruction for `month`.
    async fn submit(&self, payload_json: &str, month: &str)
        -> Result<JobHandle, AssistantsError>;

    /// Read the current status of the run.
    async fn run_status(&self, job: &JobHandle) -> Result<RunStatus, AssistantsError>;

    /// The run's output messages, oldest first.
    async fn list_messages(&self, job: &JobHandle) -> Result<Vec<ResultMessage>, AssistantsError>;

    /// Display filename of an artifact.
    async fn artifact_filename(&self, file_id: &str) -> Result<String, AssistantsError>;

    /// Raw bytes of an artifact.
    async fn artifact_bytes(&self, file_id: &str) -> Result<Vec<u8>, AssistantsError>;
}

/// [`JobRunner`] backed by the OpenAI Assistants API.
pub struct OpenAiRunner {
    client: AssistantsClient,
    model: String,
}

impl OpenAiRunner {
    pub fn new(client: AssistantsClient, model: String) -> Self {
        Self { client, model }
    }
}

impl JobRunner for OpenAiRunner {
    async fn submit(
        &self,
        payload_json: &str,
        month: &str,
    ) -> Result<JobHandle, AssistantsError> {
        let file = self
            .client
            .upload_file(UPLOAD_FILENAME, payload_json.as_bytes().to_vec())
            .await?;

        let assistant = self
            .client
            .create_assistant(&self.model, ASSISTANT_NAME, ASSISTANT_INSTRUCTIONS, &file.id)
            .await?;

        let run = self
            .client
            .create_thread_and_run(
                &assistant.id,
                &format!("Generate a graph for the expenses in {month}."),
            )
            .await?;

        Ok(JobHandle {
            run_id: run.id,
            thread_id: run.thread_id,
            status: run.status,
        })
    }

    async fn run_status(&self, job: &JobHandle) -> Result<RunStatus, AssistantsError> {
        let run = self.client.get_run(&job.thread_id, &job.run_id).await?;
        Ok(run.status)
    }

    async fn list_messages(&self, job: &JobHandle) -> Result<Vec<ResultMessage>, AssistantsError> {
        let list = self.client.list_messages(&job.thread_id).await?;
        Ok(results::extract(list.data).collect())
    }

    async fn artifact_filename(&self, file_id: &str) -> Result<String, AssistantsError> {
        let file = self.client.get_file(file_id).await?;
        Ok(file.filename)
    }

    async fn artifact_bytes(&self, file_id: &str) -> Result<Vec<u8>, AssistantsError> {
        self.client.download_file(file_id).await
    }
}
