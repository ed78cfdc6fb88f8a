use std::path::{Path, PathBuf};
use std::sync::Arc;

use nextcmd_runtime::{Config, Daemon};
use nextcmd_types::wire::{IngestEvent, SuggestRequest, SuggestResponse};

use crate::error::{Error, Result};
use crate::status::Status;

/// Embedding facade over a [`Daemon`](nextcmd_runtime::Daemon). Every
/// method is synchronous and deadline-bound by the runtime layer itself
/// (§5); the `_async` variants exist only for callers already running on
/// a `tokio` executor and simply move the call onto a blocking thread.
pub struct Client {
    inner: Arc<Daemon>,
}

impl Client {
    /// Open (or create) the store under `data_dir` with the given config.
    pub fn connect_with_config(data_dir: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let daemon = Daemon::open(&data_dir.into(), config)?;
        Ok(Self { inner: Arc::new(daemon) })
    }

    /// Open (or create) the store under `data_dir` with default config.
    pub fn connect(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::connect_with_config(data_dir, Config::default())
    }

    /// Resolve the default data directory (`NEXTCMD_PATH`, then the
    /// platform data directory, then `~/.nextcmd`) and connect there.
    pub fn connect_default() -> Result<Self> {
        let data_dir = nextcmd_core::path::resolve_data_dir(None).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::connect(data_dir)
    }

    /// Record a `command_start`/`command_end` event (§4.4, §6.1).
    pub fn ingest(&self, event: IngestEvent) -> Result<()> {
        Ok(self.inner.ingest(event)?)
    }

    /// Same as [`Client::ingest`], off the calling thread.
    pub async fn ingest_async(&self, event: IngestEvent) -> Result<()> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.ingest(event)).await??;
        Ok(())
    }

    /// Fetch ranked suggestions for the current buffer state (§4.9).
    pub fn suggest(&self, req: &SuggestRequest) -> SuggestResponse {
        self.inner.suggest(req)
    }

    /// Same as [`Client::suggest`], off the calling thread.
    pub async fn suggest_async(&self, req: SuggestRequest) -> Result<SuggestResponse> {
        let inner = self.inner.clone();
        Ok(tokio::task::spawn_blocking(move || inner.suggest(&req)).await?)
    }

    /// Row counts and config snapshot for `nextcmd status` (§6.5).
    pub fn status(&self) -> Result<Status> {
        let counts = self
            .inner
            .store()
            .with_conn(nextcmd_store::maintenance::counts)
            .map_err(nextcmd_runtime::Error::from)?;
        Ok(Status {
            data_dir: self.inner.store().data_dir().map(Path::to_path_buf),
            session_count: counts.session_count,
            event_count: counts.event_count,
            cached_suggestion_count: counts.cached_suggestion_count,
        })
    }

    /// Recompute `command_stats`/`transition_stats`/`failure_recovery`
    /// from retained raw events (`--rebuild-aggregates`, §4.7, §6.5).
    pub fn rebuild_aggregates(&self, tau_ms: i64) -> Result<nextcmd_runtime::retention::RebuildReport> {
        Ok(nextcmd_runtime::retention::rebuild_aggregates(self.inner.store(), tau_ms)?)
    }
}
