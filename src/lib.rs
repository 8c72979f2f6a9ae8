//! Community Sync Server Library
//!
//! This library exposes the internal modules for testing and for the
//! `cli-sync` binary.

pub mod cms;
pub mod community;
pub mod config;
pub mod notifications;
pub mod relational_store;
pub mod server;
pub mod sqlite_persistence;
pub mod sync;

// Re-export commonly used types for convenience
pub use cms::{ContentStore, HttpContentStore, InMemoryContentStore};
pub use notifications::{HttpNotifier, NoOpNotifier, Notifier};
pub use relational_store::{RelationalStore, SqliteRelationalStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
