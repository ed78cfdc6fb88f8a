//! Embedded SQLite store for nextcmd (§4.3, C3). Owns every persistent
//! table in the data model; the engine and runtime crates talk to it
//! exclusively through this crate's functions, never through raw SQL
//! of their own.

pub mod cache;
pub mod dismissal;
mod error;
pub mod events;
mod lock;
pub mod maintenance;
mod migrations;
pub mod pipeline;
pub mod project_types;
pub mod recovery;
mod schema;
mod scope_codec;
pub mod sessions;
pub mod slots;
pub mod stats;
mod store;
pub mod tasks;
pub mod templates;

pub use error::{Error, Result};
pub use store::Store;

pub use self::cache as suggestion_cache;
