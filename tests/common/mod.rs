//! Shared harness for the end-to-end suites.
//!
//! Every suite declares `mod common;` and imports from here only. A
//! [`TestServer`] owns an isolated database, an in-memory CMS and a recording
//! notifier; [`TestClient`] knows the HTTP routes.
//!
//! ```no_run
//! mod common;
//! use common::*;
//!
//! #[tokio::test]
//! async fn test_subscribe() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!     assert!(client.subscribe("reader@example.com").await.status().is_success());
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use server::{test_config, TestServer};

// Not every suite needs every fixture.
#[allow(unused_imports)]
pub use fixtures::{
    blog_document, event_document, event_in_days, insert_event, RecordingNotifier,
};
