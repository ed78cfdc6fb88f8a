//! The process shell around the engine: cache hierarchy, retention,
//! discovery, the request orchestrator, the typing-pace tracker, and
//! the daemon that owns them all (C7-C10, §4.6-§4.10).

pub mod cache;
pub mod config;
pub mod daemon;
pub mod discovery;
mod error;
#[cfg(unix)]
pub mod ipc;
pub mod orchestrator;
pub mod retention;
pub mod typing;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use orchestrator::RequestOrchestrator;
