//! Tipos de dados para requisições e respostas da API de Assistants.
//!
//! Todas as structs derivam `Serialize` e/ou `Deserialize` para conversão JSON
//! conforme o formato esperado pelos endpoints `/files`, `/assistants` e
//! `/threads` do job runner externo.

use serde::{Deserialize, Serialize};

/// Status de um run, conforme reportado pelo runner externo.
///
/// Transições observadas: `Queued → InProgress → {Completed | Failed |
/// Cancelled | Expired}`. Apenas `Completed` é sucesso terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    /// Verdadeiro quando o run não transicionará mais de estado.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

/// Um arquivo registrado no runner (upload de dados ou artefato gerado).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// Identificador opaco do arquivo (ex.: "file-abc123").
    pub id: String,
    /// Nome de exibição do arquivo.
    pub filename: String,
}

/// Ferramenta habilitada em um assistant. Serializada como `{"type": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Tool {
    /// A ferramenta de execução de código que produz o gráfico.
    pub fn code_interpreter() -> Self {
        Self {
            kind: "code_interpreter".to_string(),
        }
    }
}

/// Recursos de ferramenta anexados na criação do assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResources {
    pub file_search: FileSearchResources,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSearchResources {
    pub vector_stores: Vec<VectorStore>,
}

/// Vector store criado a partir dos arquivos enviados, tornando-os
/// pesquisáveis pelo assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    pub file_ids: Vec<String>,
}

/// Corpo da requisição `POST /assistants`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssistantRequest {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub tools: Vec<Tool>,
    pub tool_resources: ToolResources,
}

/// Assistant criado pelo runner.
#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    pub id: String,
}

/// Mensagem inicial enviada ao criar a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessageInput {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadPayload {
    pub messages: Vec<ThreadMessageInput>,
}

/// Corpo da requisição `POST /threads/runs` — cria a thread e inicia o run
/// atomicamente.
#[derive(Debug, Clone, Serialize)]
pub struct CreateThreadAndRunRequest {
    pub assistant_id: String,
    pub thread: ThreadPayload,
}

/// Um run retornado pelo runner.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

/// Página de mensagens de uma thread (`GET /threads/{id}/messages`).
///
/// `has_more` indica que existem mais páginas; o id da última mensagem serve
/// de cursor `after` para a próxima.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub has_more: bool,
}

/// Uma mensagem em uma thread, com um ou mais blocos de conteúdo.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    #[serde(default)]
    pub id: String,
    pub role: String,
    pub content: Vec<MessageContent>,
}

/// Um bloco de conteúdo dentro de uma mensagem.
///
/// O campo `type` do JSON seleciona a variante; blocos de tipo desconhecido
/// caem em [`Other`](MessageContent::Other) e são ignorados pelo consumidor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: ImageFileRef },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// Referência a um arquivo de imagem gerado (o artefato do gráfico).
#[derive(Debug, Clone, Deserialize)]
pub struct ImageFileRef {
    pub file_id: String,
}
