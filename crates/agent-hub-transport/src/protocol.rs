//! Wire protocol for the HTTP message API.
//!
//! Every response carries a uniform envelope: `ok` plus a
//! human-readable `message`, with operation-specific fields alongside.

use agent_hub_core::LogEntry;
use agent_hub_session::{ContextSummary, PollReply};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body for `/msg` and `/msg_sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    /// Target context id; empty selects or creates the default context.
    #[serde(default)]
    pub context: String,
    /// Input text.
    pub text: String,
}

/// Body for `/pause`.
#[derive(Debug, Clone, Deserialize)]
pub struct PauseRequest {
    #[serde(default)]
    pub context: String,
    pub paused: bool,
}

/// Body for `/poll`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollRequest {
    #[serde(default)]
    pub context: String,
    /// Number of log entries the client has already seen.
    #[serde(default)]
    pub log_from: usize,
}

/// Body for `/reset`, `/remove` and `/export_chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub context: String,
}

/// Body for `/load_chats`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadChatsRequest {
    pub chats: Vec<String>,
}

/// Envelope for submissions.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,
    pub context: String,
}

/// Envelope for pause toggles.
#[derive(Debug, Clone, Serialize)]
pub struct PauseResponse {
    pub ok: bool,
    pub message: String,
    pub paused: bool,
}

/// Envelope for operations with no extra payload.
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub ok: bool,
    pub message: String,
}

/// Envelope for `/export_chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub ok: bool,
    pub message: String,
    pub context: String,
    /// Serialized chat JSON.
    pub content: String,
}

/// Envelope for `/load_chats`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadChatsResponse {
    pub ok: bool,
    pub message: String,
    pub ctxids: Vec<String>,
}

/// Envelope for `/poll`.
#[derive(Debug, Clone, Serialize)]
pub struct PollResponse {
    pub ok: bool,
    pub context: String,
    pub contexts: Vec<ContextSummary>,
    pub logs: Vec<LogEntry>,
    pub log_guid: Uuid,
    pub log_version: u64,
    pub log_progress: String,
    pub paused: bool,
}

impl From<PollReply> for PollResponse {
    fn from(reply: PollReply) -> Self {
        Self {
            ok: true,
            context: reply.context,
            contexts: reply.contexts,
            logs: reply.logs,
            log_guid: reply.log_guid,
            log_version: reply.log_version,
            log_progress: reply.log_progress,
            paused: reply.paused,
        }
    }
}

/// Uniform failure envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_context_defaults_to_empty() {
        let req: MessageRequest = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(req.context, "");
        assert_eq!(req.text, "hello");
    }

    #[test]
    fn poll_request_defaults() {
        let req: PollRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.context, "");
        assert_eq!(req.log_from, 0);

        let req: PollRequest =
            serde_json::from_str(r#"{"context":"c1","log_from":7}"#).unwrap();
        assert_eq!(req.context, "c1");
        assert_eq!(req.log_from, 7);
    }

    #[test]
    fn missing_text_is_a_parse_error() {
        assert!(serde_json::from_str::<MessageRequest>(r#"{"context":"x"}"#).is_err());
    }

    #[test]
    fn envelopes_serialize_ok_flag() {
        let json = serde_json::to_string(&AckResponse {
            ok: true,
            message: "Context removed.".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""ok":true"#));

        let json = serde_json::to_string(&ErrorResponse {
            ok: false,
            message: "Invalid request: no text".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""ok":false"#));
    }
}
