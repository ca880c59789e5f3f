/// Payloads exchanged with the survey front end and with the upstream
/// chat-completions API.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub(crate) fn parse(role: &str) -> Option<Self> {
        match role {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A validated request from the front end.
///
/// `temperature` and `seed` are kept as sent: the front end posts them as numbers or
/// strings, and they are resolved leniently by
/// [`resolve_parameters`](crate::relay::resolve_parameters) rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<Value>,
    pub seed: Option<Value>,
}

/// The body returned to the front end on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub generated_text: String,
    pub used_temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub used_seed: Option<i64>,
}

/// The JSON body sent upstream.
#[derive(Debug, Serialize)]
pub(crate) struct UpstreamPayload<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: &'a [ChatMessage],
    pub(crate) temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<i64>,
}

/// The subset of an upstream chat completion the relay reads. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    pub(crate) choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub(crate) usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub(crate) message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    pub(crate) content: String,
}

/// Token accounting reported by the upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default, rename = "prompt_tokens")]
    pub prompt: u64,
    #[serde(default, rename = "completion_tokens")]
    pub completion: u64,
    #[serde(default, rename = "total_tokens")]
    pub total: u64,
}

/// OpenAI style error body: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamErrorBody {
    pub(crate) error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamErrorDetail {
    pub(crate) message: String,
}
