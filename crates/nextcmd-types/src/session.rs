use serde::{Deserialize, Serialize};

/// Shell kind reported by the hook on `command_start`/`command_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    Other,
}

/// A shell instance. Created on first event, mutated only to set `end_ts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub shell: ShellKind,
    pub start_ts: i64,
    #[serde(default)]
    pub end_ts: Option<i64>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, shell: ShellKind, start_ts: i64) -> Self {
        Self {
            session_id: session_id.into(),
            shell,
            start_ts,
            end_ts: None,
            host: None,
            user: None,
            os: None,
        }
    }
}
