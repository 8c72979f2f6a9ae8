mod admin_request_routes;
pub mod config;
pub mod error;
mod event_routes;
mod http_layers;
pub mod metrics;
mod newsletter_routes;
pub mod server;
pub mod state;
mod sync_routes;
mod webhook_routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use http_layers::*;
pub use server::{make_app, run_server};
