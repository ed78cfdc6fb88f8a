//! Builders for synthetic domain data used across integration tests.

use nextcmd_types::CommandEvent;

/// Fluent builder for a [`CommandEvent`], defaulting to a successful,
/// non-ephemeral command with no repo context. Tests override only the
/// fields that matter to the scenario under test.
pub struct CommandEventBuilder {
    event: CommandEvent,
}

impl CommandEventBuilder {
    /// Start building an event for `session_id` completed at `completed_ts_ms`,
    /// normalizing to `template_id` verbatim.
    pub fn new(session_id: impl Into<String>, completed_ts_ms: i64, template_id: impl Into<String>) -> Self {
        let template_id = template_id.into();
        Self {
            event: CommandEvent {
                id: None,
                session_id: session_id.into(),
                completed_ts_ms,
                duration_ms: Some(5),
                exit_code: 0,
                cwd: "/tmp".into(),
                normalized_text: template_id.clone(),
                template_id,
                repo_key: None,
                branch: None,
                repo_name: None,
                repo_root: None,
                ephemeral: false,
            },
        }
    }

    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.event.exit_code = exit_code;
        self
    }

    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.event.duration_ms = Some(duration_ms);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.event.cwd = cwd.into();
        self
    }

    pub fn normalized_text(mut self, normalized_text: impl Into<String>) -> Self {
        self.event.normalized_text = normalized_text.into();
        self
    }

    pub fn repo(mut self, repo_key: impl Into<String>, repo_root: impl Into<String>) -> Self {
        self.event.repo_key = Some(repo_key.into());
        self.event.repo_root = Some(repo_root.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.event.branch = Some(branch.into());
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.event.ephemeral = ephemeral;
        self
    }

    pub fn build(self) -> CommandEvent {
        self.event
    }
}
