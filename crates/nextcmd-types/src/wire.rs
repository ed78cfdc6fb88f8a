use crate::suggestion::{Reason, Risk};
use serde::{Deserialize, Serialize};

/// Current wire schema version. Events with a greater `version` than this
/// are rejected (`accept-if-equal`, `reject-if-greater`, §9); events with a
/// lesser version are accepted as-is since unknown/missing fields already
/// default.
pub const WIRE_VERSION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventType {
    CommandStart,
    CommandEnd,
}

/// Raw event as received over the IPC boundary (§6.1). All byte limits
/// from §6.1 are enforced by the orchestrator's validation step, not by
/// this type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestEvent {
    pub version: i32,
    #[serde(rename = "type")]
    pub event_type: WireEventType,
    pub ts: i64,
    pub session_id: String,
    pub shell: String,
    pub cwd: String,
    pub cmd_raw: String,
    pub exit_code: i32,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_repo_name: Option<String>,
    #[serde(default)]
    pub git_repo_root: Option<String>,
    #[serde(default)]
    pub ephemeral: bool,
}

/// Suggestion request as received over the IPC boundary (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub session_id: String,
    pub cwd: String,
    pub buffer: String,
    #[serde(default)]
    pub cursor_pos: usize,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub repo_key: Option<String>,
    #[serde(default)]
    pub include_low_confidence: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionWire {
    pub command: String,
    pub source: String,
    pub score: f64,
    pub description: String,
    pub risk: Risk,
    pub reasons: Vec<ReasonWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonWire {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub contribution: f64,
}

impl From<Reason> for ReasonWire {
    fn from(r: Reason) -> Self {
        ReasonWire {
            kind: format!("{:?}", r.tag),
            description: r.tag.description().to_string(),
            contribution: r.contribution,
        }
    }
}

/// Closed set of error codes (§6.2, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EInvalidArgument,
    EUnavailable,
    EInternal,
    EDeadlineExceeded,
    ECorruptState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            retryable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<SuggestionWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
}
