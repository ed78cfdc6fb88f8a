//! Testing infrastructure for nextcmd integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `Workspace`: a scratch data directory backed by an open in-process store
//! - `fixtures`: builders for synthetic `CommandEvent`s

pub mod fixtures;
pub mod world;

pub use fixtures::CommandEventBuilder;
pub use world::Workspace;
