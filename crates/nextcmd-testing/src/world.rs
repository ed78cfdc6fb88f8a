//! Scratch test workspace: an isolated data directory backed by an open
//! in-process [`Store`](nextcmd_store::Store), plus a ready-to-configure
//! `nextcmd` CLI command for end-to-end assertions.

use anyhow::Result;
use assert_cmd::Command;
use nextcmd_store::Store;
use nextcmd_types::{CommandEvent, Session, ShellKind};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for constructing a [`Workspace`] with fine-grained control.
///
/// # Example
/// ```no_run
/// use nextcmd_testing::Workspace;
///
/// let workspace = Workspace::builder()
///     .without_data_dir()
///     .build();
/// ```
pub struct WorkspaceBuilder {
    skip_data_dir_creation: bool,
    env_vars: HashMap<String, String>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self { skip_data_dir_creation: false, env_vars: HashMap::new() }
    }

    /// Skip eager store creation, for testing fresh-install scenarios
    /// where the daemon must create the data directory itself.
    pub fn without_data_dir(mut self) -> Self {
        self.skip_data_dir_creation = true;
        self
    }

    /// Set an environment variable for CLI invocations built via
    /// [`Workspace::cmd`].
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Workspace {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let data_dir = temp_dir.path().join(".nextcmd");

        let store = if self.skip_data_dir_creation {
            None
        } else {
            fs::create_dir_all(&data_dir).expect("failed to create data dir");
            Some(Store::open(&data_dir, true).expect("failed to open store"))
        };

        Workspace { temp_dir, data_dir, store, env_vars: self.env_vars }
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Isolated data directory plus an open store, torn down when dropped.
pub struct Workspace {
    temp_dir: TempDir,
    data_dir: PathBuf,
    store: Option<Store>,
    env_vars: HashMap<String, String>,
}

impl Workspace {
    pub fn builder() -> WorkspaceBuilder {
        WorkspaceBuilder::new()
    }

    pub fn new() -> Self {
        WorkspaceBuilder::new().build()
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    pub fn root(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    /// The open store. Panics if built `without_data_dir`.
    pub fn store(&self) -> &Store {
        self.store.as_ref().expect("workspace was built without a data dir")
    }

    /// A `nextcmd` CLI invocation pre-wired with `--data-dir` and any
    /// environment variables configured on the builder.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("nextcmd").expect("nextcmd binary not found");
        cmd.arg("--data-dir").arg(&self.data_dir);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// Ensure a session row exists, returning the session id.
    pub fn ensure_session(&self, session_id: &str, shell: ShellKind, start_ts: i64) -> Result<String> {
        let session = Session::new(session_id, shell, start_ts);
        self.store().with_conn(|conn| nextcmd_store::sessions::ensure_exists(conn, &session))?;
        Ok(session_id.to_string())
    }

    /// Insert a synthetic event, returning its assigned row id. Seeds the
    /// session and template rows the event's foreign keys require, the
    /// same way `nextcmd_engine::write_event` does for a real event.
    pub fn insert_event(&self, event: &CommandEvent) -> Result<i64> {
        self.store().with_conn(|conn| {
            nextcmd_store::sessions::ensure_exists(conn, &Session::new(event.session_id.clone(), ShellKind::Other, event.completed_ts_ms))?;
            nextcmd_store::templates::upsert(conn, &event.template_id, &event.normalized_text, 0, event.completed_ts_ms)
        })?;
        Ok(self.store().with_conn(|conn| nextcmd_store::events::insert(conn, event))?)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::CommandEventBuilder;

    #[test]
    fn fresh_workspace_opens_an_empty_store() {
        let workspace = Workspace::new();
        let counts = workspace.store().with_conn(nextcmd_store::maintenance::counts).unwrap();
        assert_eq!(counts.session_count, 0);
        assert_eq!(counts.event_count, 0);
    }

    #[test]
    fn without_data_dir_defers_store_creation() {
        let workspace = Workspace::builder().without_data_dir().build();
        assert!(!workspace.data_dir().exists());
    }

    #[test]
    fn insert_event_round_trips_through_the_store() {
        let workspace = Workspace::new();
        workspace.ensure_session("s1", ShellKind::Bash, 0).unwrap();
        let event = CommandEventBuilder::new("s1", 1000, "git status").build();
        let id = workspace.insert_event(&event).unwrap();
        assert!(id > 0);

        let counts = workspace.store().with_conn(nextcmd_store::maintenance::counts).unwrap();
        assert_eq!(counts.event_count, 1);
    }
}
