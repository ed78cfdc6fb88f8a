use std::path::PathBuf;

/// Snapshot of daemon/store state for `nextcmd status` (§6.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub data_dir: Option<PathBuf>,
    pub session_count: i64,
    pub event_count: i64,
    pub cached_suggestion_count: i64,
}
