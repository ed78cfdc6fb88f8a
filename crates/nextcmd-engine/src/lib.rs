//! Aggregate write path and candidate scorer (C4/C5/C6, §4.4-§4.5).
//! The runtime crate owns deadlines, caching, and IPC; this crate owns
//! the pure-ish business logic they call into under those deadlines.

mod dangerous;
mod error;
mod score;
mod write;

pub use error::{Error, Result};
pub use score::{score, ScoreConfig, ScoreRequest};
pub use write::{write_event, WriteConfig, WriteContext};

use nextcmd_store::Store;
use nextcmd_types::{Scope, SuppressionLevel};

/// `RecordDismissal` (§4.10): the engine-level entry point the runtime
/// calls when the user skips past a suggestion without acting on it.
pub fn record_dismissal(
    store: &Store,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
    now_ms: i64,
) -> Result<SuppressionLevel> {
    store
        .with_tx(|tx| nextcmd_store::dismissal::record_dismissal(tx, scope, context_template_id, dismissed_template_id, now_ms))
        .map_err(Into::into)
}

/// `RecordNever` (§4.10): jump straight to permanent suppression.
pub fn record_never(
    store: &Store,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
    now_ms: i64,
) -> Result<()> {
    store
        .with_tx(|tx| nextcmd_store::dismissal::record_never(tx, scope, context_template_id, dismissed_template_id, now_ms))
        .map_err(Into::into)
}
