use serde::{Deserialize, Serialize};

/// Kind of manifest a `ProjectTask` was discovered from (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Makefile,
    PackageScript,
}

/// Discovered task from a repo manifest (§3 `ProjectTask`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTask {
    pub repo_key: String,
    pub kind: TaskKind,
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discovered_ms: i64,
}
