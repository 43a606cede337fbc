use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::error::AssistantsError;
use super::types::{
    Assistant, CreateAssistantRequest, CreateThreadAndRunRequest, FileObject, FileSearchResources,
    MessageList, Run, ThreadMessageInput, ThreadPayload, Tool, ToolResources, VectorStore,
};

const API_URL: &str = "https://api.openai.com/v1";

// Page size for message listing; longer threads are followed page by page.
const MESSAGES_PAGE_LIMIT: u32 = 100;

/// HTTP client for the Assistants API of the external job runner.
pub struct AssistantsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl AssistantsClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a named input file with purpose `assistants`.
    pub async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<FileObject, AssistantsError> {
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(filename.to_string()));

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .multipart(form)
            .send()
            .await?;

        parse(response).await
    }

    /// Create an assistant with the code-execution tool enabled and the
    /// uploaded file attached as searchable input.
    pub async fn create_assistant(
        &self,
        model: &str,
        name: &str,
        instructions: &str,
        file_id: &str,
    ) -> Result<Assistant, AssistantsError> {
        let req = CreateAssistantRequest {
            model: model.to_string(),
            name: name.to_string(),
            instructions: instructions.to_string(),
            tools: vec![Tool::code_interpreter()],
            tool_resources: ToolResources {
                file_search: FileSearchResources {
                    vector_stores: vec![VectorStore {
                        file_ids: vec![file_id.to_string()],
                    }],
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/assistants", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&req)
            .send()
            .await?;

        parse(response).await
    }

    /// Create a thread seeded with one user message and start a run of the
    /// assistant against it, in a single call.
    pub async fn create_thread_and_run(
        &self,
        assistant_id: &str,
        initial_message: &str,
    ) -> Result<Run, AssistantsError> {
        let req = CreateThreadAndRunRequest {
            assistant_id: assistant_id.to_string(),
            thread: ThreadPayload {
                messages: vec![ThreadMessageInput {
                    role: "user".to_string(),
                    content: initial_message.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(format!("{}/threads/runs", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&req)
            .send()
            .await?;

        parse(response).await
    }

    /// Fetch the current state of a run.
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantsError> {
        let response = self
            .client
            .get(format!(
                "{}/threads/{thread_id}/runs/{run_id}",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;

        parse(response).await
    }

    /// List all messages of a thread in ascending chronological order,
    /// following the `has_more`/`after` cursor across pages.
    pub async fn list_messages(&self, thread_id: &str) -> Result<MessageList, AssistantsError> {
        let mut data = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("order", "asc".to_string()),
                ("limit", MESSAGES_PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let response = self
                .client
                .get(format!("{}/threads/{thread_id}/messages", self.base_url))
                .query(&query)
                .bearer_auth(&self.api_key)
                .header("OpenAI-Beta", "assistants=v2")
                .send()
                .await?;

            let page: MessageList = parse(response).await?;
            after = page.data.last().map(|message| message.id.clone());
            let more = page.has_more && after.is_some();
            data.extend(page.data);
            if !more {
                return Ok(MessageList {
                    data,
                    has_more: false,
                });
            }
        }
    }

    /// Fetch file metadata (used to recover the display filename).
    pub async fn get_file(&self, file_id: &str) -> Result<FileObject, AssistantsError> {
        let response = self
            .client
            .get(format!("{}/files/{file_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;

        parse(response).await
    }

    /// Download the raw content of a file.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, AssistantsError> {
        let response = self
            .client
            .get(format!("{}/files/{file_id}/content", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;

        let response = check(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

// Turns a non-2xx response into ApiError with the body as the message.
async fn check(response: Response) -> Result<Response, AssistantsError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(AssistantsError::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AssistantsError> {
    let response = check(response).await?;
    Ok(response.json::<T>().await?)
}
