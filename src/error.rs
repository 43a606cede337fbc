use thiserror::Error;

use crate::assistants::{AssistantsError, RunStatus};
use crate::store::Category;

#[derive(Debug, Error)]
pub enum SpendchartError {
    #[error("invalid expense: {0}")]
    InvalidExpense(String),

    #[error("expense not found: {0}")]
    ExpenseNotFound(i64),

    #[error("'{0}' is not a month name")]
    InvalidMonthName(String),

    #[error("no expenses found for {category} in {month}")]
    NoDataFound { category: Category, month: String },

    #[error("authentication with the job runner failed: {0}")]
    AuthenticationFailed(String),

    #[error("job runner unavailable: {0}")]
    ExternalServiceUnavailable(String),

    #[error("status polling failed after {attempts} consecutive errors: {source}")]
    PollingFailed {
        attempts: u32,
        source: AssistantsError,
    },

    #[error("run did not reach a terminal status within {0} polls")]
    PollTimeout(u32),

    #[error("run ended with status {0} instead of completing")]
    JobDidNotComplete(RunStatus),

    #[error("graph generation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A per-artifact failure. Collected as warnings while the remaining artifacts
/// are still processed; escalated only when no artifact could be saved at all.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to fetch artifact {file_id}: {source}")]
    Fetch {
        file_id: String,
        source: AssistantsError,
    },

    #[error("failed to write artifact {filename}: {source}")]
    Write {
        filename: String,
        source: std::io::Error,
    },
}
