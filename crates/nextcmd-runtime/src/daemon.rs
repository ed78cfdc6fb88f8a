use crate::config::Config;
use crate::orchestrator::RequestOrchestrator;
use crate::{Error, Result};
use nextcmd_core::{floor_char_boundary, short_hash};
use nextcmd_engine::{write_event, WriteContext};
use nextcmd_normalize::Normalizer;
use nextcmd_store::Store;
use nextcmd_types::wire::{IngestEvent, SuggestRequest, SuggestResponse, WireEventType, WIRE_VERSION};
use nextcmd_types::{CommandEvent, Session, ShellKind, TaskKind};
use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(5 * 60);
const RETENTION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_SESSION_ID_LEN: usize = 128;
const MAX_CWD_LEN: usize = 4096;
const MAX_CMD_RAW_LEN: usize = 64 * 1024;
const MAX_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as i64
}

/// Truncate to at most `max_bytes`, backing off to the nearest char
/// boundary so multi-byte UTF-8 sequences are never split.
fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let cut = floor_char_boundary(s, max_bytes);
    s.truncate(cut);
}

fn shell_from_str(s: &str) -> ShellKind {
    match s {
        "bash" => ShellKind::Bash,
        "zsh" => ShellKind::Zsh,
        "fish" => ShellKind::Fish,
        _ => ShellKind::Other,
    }
}

/// Clamp/truncate an ingest event to the §6.1 wire limits. Rejects only
/// what can't be repaired: an empty `session_id`/`cwd`, or a `version`
/// newer than this binary supports (§9 accept-if-equal/reject-if-greater).
fn validate_ingest(mut event: IngestEvent) -> Result<IngestEvent> {
    if event.version > WIRE_VERSION {
        return Err(Error::Validation(format!(
            "event wire version {} is newer than supported version {WIRE_VERSION}",
            event.version
        )));
    }
    if event.session_id.is_empty() {
        return Err(Error::Validation("session_id is required".into()));
    }
    if event.cwd.is_empty() {
        return Err(Error::Validation("cwd is required".into()));
    }

    if event.session_id.len() > MAX_SESSION_ID_LEN {
        tracing::warn!(len = event.session_id.len(), "session_id exceeds max length, truncating");
        truncate_at_char_boundary(&mut event.session_id, MAX_SESSION_ID_LEN);
    }
    if event.cwd.len() > MAX_CWD_LEN {
        tracing::warn!(len = event.cwd.len(), "cwd exceeds max length, truncating");
        truncate_at_char_boundary(&mut event.cwd, MAX_CWD_LEN);
    }
    if event.cmd_raw.len() > MAX_CMD_RAW_LEN {
        tracing::warn!(len = event.cmd_raw.len(), "cmd_raw exceeds max length, truncating");
        truncate_at_char_boundary(&mut event.cmd_raw, MAX_CMD_RAW_LEN);
    }
    event.exit_code = event.exit_code.clamp(-128, 255);
    if let Some(duration_ms) = event.duration_ms {
        event.duration_ms = Some(duration_ms.clamp(0, MAX_DURATION_MS));
    }

    Ok(event)
}

/// Owns the store, the request orchestrator, and the background
/// checkpoint/retention timers (§4.3, §4.7). The IPC listener and the
/// CLI's debugging driver both call `ingest`/`suggest` on the same
/// instance.
#[derive(Debug)]
pub struct Daemon {
    store: Arc<Store>,
    normalizer: Normalizer,
    orchestrator: RequestOrchestrator,
    config: Arc<Config>,
    shutdown_txs: Vec<mpsc::Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl Daemon {
    pub fn open(data_dir: &Path, config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(data_dir, config.enable_recovery)?);
        let config = Arc::new(config);
        let orchestrator = RequestOrchestrator::new(store.clone(), config.clone());

        let mut daemon = Self {
            store,
            normalizer: Normalizer::default(),
            orchestrator,
            config,
            shutdown_txs: Vec::new(),
            workers: Vec::new(),
        };
        daemon.spawn_checkpoint_timer();
        daemon.spawn_retention_timer();
        Ok(daemon)
    }

    fn spawn_timer(&mut self, name: &'static str, interval: Duration, mut tick: impl FnMut() + Send + 'static) {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Ok(()) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => tick(),
                }
            })
            .expect("failed to spawn background timer thread");
        self.shutdown_txs.push(tx);
        self.workers.push(handle);
    }

    fn spawn_checkpoint_timer(&mut self) {
        let store = self.store.clone();
        self.spawn_timer("nextcmd-checkpoint", CHECKPOINT_INTERVAL, move || {
            if let Err(err) = store.checkpoint() {
                tracing::warn!(error = %err, "WAL checkpoint failed");
            }
        });
    }

    fn spawn_retention_timer(&mut self) {
        let store = self.store.clone();
        let config = self.config.clone();
        self.spawn_timer("nextcmd-retention", RETENTION_INTERVAL, move || {
            match crate::retention::purge(&store, now_ms(), config.retention_days, config.auto_vacuum) {
                Ok(report) => tracing::info!(deleted = report.events_deleted, vacuumed = report.vacuumed, "retention purge complete"),
                Err(err) => tracing::warn!(error = %err, "retention purge failed"),
            }
        });
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    /// `RecordEvent` (§4.4, §6.1). `command_start` only ensures the
    /// session row exists; aggregate writes happen on `command_end`.
    pub fn ingest(&self, event: IngestEvent) -> Result<()> {
        let event = validate_ingest(event)?;

        match event.event_type {
            WireEventType::CommandStart => {
                let session = Session::new(event.session_id.clone(), shell_from_str(&event.shell), event.ts);
                self.store.with_conn(|conn| nextcmd_store::sessions::ensure_exists(conn, &session))?;
                Ok(())
            }
            WireEventType::CommandEnd => self.ingest_command_end(event),
        }
    }

    fn ingest_command_end(&self, event: IngestEvent) -> Result<()> {
        let normalized = self.normalizer.normalize(&event.cmd_raw).map_err(nextcmd_engine::Error::from)?;

        let prev = self.store.with_conn(|conn| nextcmd_store::events::last_for_session(conn, &event.session_id))?;
        let dir_scope_key = short_hash(&event.cwd);

        let active_project_types = match &event.git_repo_root {
            Some(repo_root) => {
                let repo_key = nextcmd_core::repo_key(None, repo_root);
                let tasks = self.store.with_conn(|conn| nextcmd_store::tasks::for_repo(conn, &repo_key))?;
                tasks
                    .into_iter()
                    .map(|t| match t.kind {
                        TaskKind::Makefile => "makefile".to_string(),
                        TaskKind::PackageScript => "package_script".to_string(),
                    })
                    .collect::<HashSet<_>>()
                    .into_iter()
                    .collect()
            }
            None => Vec::new(),
        };

        let repo_key = event.git_repo_root.as_deref().map(|root| nextcmd_core::repo_key(None, root));

        let command_event = CommandEvent {
            id: None,
            session_id: event.session_id.clone(),
            completed_ts_ms: event.ts,
            duration_ms: event.duration_ms,
            exit_code: event.exit_code,
            cwd: event.cwd.clone(),
            normalized_text: normalized.normalized_text,
            template_id: normalized.template_id,
            repo_key: repo_key.clone(),
            branch: event.git_branch.clone(),
            repo_name: event.git_repo_name.clone(),
            repo_root: event.git_repo_root.clone(),
            ephemeral: event.ephemeral,
        };

        let ctx = WriteContext {
            prev_template_id: prev.as_ref().map(|e| e.template_id.clone()),
            prev_exit_code: prev.as_ref().map(|e| e.exit_code),
            dir_scope_key: dir_scope_key.clone(),
            active_project_types,
        };

        write_event(
            &self.store,
            &event.cmd_raw,
            &self.normalizer,
            command_event,
            &normalized.slots,
            &ctx,
            &self.config.write_config(),
            event.ts,
        )?;

        self.orchestrator.cache().invalidate_session(&event.session_id);
        if let Some(repo_key) = &repo_key {
            self.orchestrator.cache().invalidate_repo(repo_key);
        }

        Ok(())
    }

    /// `GetSuggestions` (§4.9).
    pub fn suggest(&self, req: &SuggestRequest) -> SuggestResponse {
        self.orchestrator.suggest(req, now_ms())
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        for tx in self.shutdown_txs.drain(..) {
            let _ = tx.send(());
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        if let Err(err) = self.store.checkpoint() {
            tracing::warn!(error = %err, "final checkpoint on shutdown failed");
        }
    }
}
