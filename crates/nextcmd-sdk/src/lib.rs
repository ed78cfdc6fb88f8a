//! nextcmd-sdk: embedding facade for the nextcmd suggestion engine.
//!
//! # Overview
//!
//! `nextcmd-sdk` wraps [`nextcmd_runtime::Daemon`] in a small, stable API
//! for shells and tools that want to embed the engine directly instead of
//! talking to it over the IPC socket (§6.1). The hot path stays
//! synchronous and deadline-bound exactly as the runtime layer defines it
//! (§5); the `_async` methods exist only for callers already running on a
//! `tokio` executor.
//!
//! # Quickstart
//!
//! ```no_run
//! use nextcmd_sdk::Client;
//! use nextcmd_types::wire::SuggestRequest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect_default()?;
//! let response = client.suggest(&SuggestRequest {
//!     session_id: "s1".into(),
//!     cwd: "/repo".into(),
//!     buffer: "git ".into(),
//!     cursor_pos: 4,
//!     max_results: 5,
//!     repo_key: None,
//!     include_low_confidence: false,
//! });
//! for suggestion in response.suggestions {
//!     println!("{} ({})", suggestion.command, suggestion.source);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Async callers
//!
//! ```no_run
//! use nextcmd_sdk::Client;
//! use nextcmd_types::wire::SuggestRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect_default()?;
//! let response = client.suggest_async(SuggestRequest {
//!     session_id: "s1".into(),
//!     cwd: "/repo".into(),
//!     buffer: String::new(),
//!     cursor_pos: 0,
//!     max_results: 5,
//!     repo_key: None,
//!     include_low_confidence: false,
//! }).await?;
//! println!("{} suggestions", response.suggestions.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod status;

pub use client::Client;
pub use error::{Error, Result};
pub use status::Status;

// Re-exported so callers can build requests/events without a direct
// dependency on the lower crates.
pub use nextcmd_runtime::Config;
pub use nextcmd_types::wire::{IngestEvent, SuggestRequest, SuggestResponse, SuggestionWire, WireEventType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_suggest_on_an_empty_store_returns_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::connect(dir.path()).unwrap();

        let response = client.suggest(&SuggestRequest {
            session_id: "s1".into(),
            cwd: "/repo".into(),
            buffer: String::new(),
            cursor_pos: 0,
            max_results: 5,
            repo_key: None,
            include_low_confidence: false,
        });
        assert!(response.error.is_none());
        assert!(response.suggestions.is_empty());
    }

    #[test]
    fn ingest_then_status_reflects_the_new_event() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::connect(dir.path()).unwrap();

        client
            .ingest(IngestEvent {
                version: 1,
                event_type: WireEventType::CommandEnd,
                ts: 1_000,
                session_id: "s1".into(),
                shell: "zsh".into(),
                cwd: "/repo".into(),
                cmd_raw: "git status".into(),
                exit_code: 0,
                duration_ms: Some(5),
                git_branch: None,
                git_repo_name: None,
                git_repo_root: None,
                ephemeral: false,
            })
            .unwrap();

        let status = client.status().unwrap();
        assert_eq!(status.event_count, 1);
    }

    #[tokio::test]
    async fn suggest_async_matches_the_sync_path() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::connect(dir.path()).unwrap();

        let response = client
            .suggest_async(SuggestRequest {
                session_id: "s1".into(),
                cwd: "/repo".into(),
                buffer: String::new(),
                cursor_pos: 0,
                max_results: 5,
                repo_key: None,
                include_low_confidence: false,
            })
            .await
            .unwrap();
        assert!(response.error.is_none());
    }
}
