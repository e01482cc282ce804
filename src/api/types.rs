//! Request and response shapes of the analysis backend

use serde::{Deserialize, Serialize};

/// Default model for streamed summaries
pub const DEFAULT_SUMMARY_MODEL: &str = "cosmos-reason1";

/// Chat speaker role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

/// Response of `POST /chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Processing status of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploading,
    Uploaded,
    Processing,
    Summarized,
    Error,
}

/// Uploaded file as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub upload_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
}

/// Parameters of a streamed summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeParams {
    /// Backend file id
    pub id: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub caption_summarization_prompt: String,
    pub summary_aggregation_prompt: String,
    pub enable_chat: bool,
    pub enable_chat_history: bool,
    pub enable_audio: bool,
    pub stream: bool,
}

impl SummarizeParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            chunk_duration: None,
            prompt: None,
            caption_summarization_prompt: String::new(),
            summary_aggregation_prompt: String::new(),
            enable_chat: true,
            enable_chat_history: true,
            enable_audio: false,
            stream: true,
        }
    }
}

/// A model the backend can summarize with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// Backend alert raised while analysing a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: String,
    pub file_id: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub description: String,
    pub severity: AlertSeverity,
}

/// Error body shapes the backend uses
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message from `detail` or `error`
    pub fn message(&self) -> Option<String> {
        let value = self.detail.as_ref().or(self.error.as_ref())?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
