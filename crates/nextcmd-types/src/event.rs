use serde::{Deserialize, Serialize};

/// Boundary operator preceding a pipeline segment (§4.2). `None` only for
/// the first segment of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryOp {
    Pipe,
    And,
    Or,
    Semicolon,
}

impl BoundaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryOp::Pipe => "|",
            BoundaryOp::And => "&&",
            BoundaryOp::Or => "||",
            BoundaryOp::Semicolon => ";",
        }
    }

    /// Parse a boundary token, longest-match first so `&&`/`||` are never
    /// mistaken for two single-char operators.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "||" => Some(BoundaryOp::Or),
            "&&" => Some(BoundaryOp::And),
            "|" => Some(BoundaryOp::Pipe),
            ";" => Some(BoundaryOp::Semicolon),
            _ => None,
        }
    }
}

/// One executed command (§3 `CommandEvent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Monotonically assigned row id; `None` before insertion.
    #[serde(default)]
    pub id: Option<i64>,
    pub session_id: String,
    pub completed_ts_ms: i64,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    pub exit_code: i32,
    pub cwd: String,
    pub normalized_text: String,
    pub template_id: String,
    #[serde(default)]
    pub repo_key: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub repo_root: Option<String>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl CommandEvent {
    pub fn failed(&self) -> bool {
        self.exit_code != 0
    }
}

/// One ordered segment of a pipeline-split command (§3 `PipelineEvent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub parent_event_id: i64,
    pub position: u32,
    pub boundary_before: Option<BoundaryOp>,
    pub raw_segment: String,
    pub normalized_text: String,
    pub template_id: String,
}
