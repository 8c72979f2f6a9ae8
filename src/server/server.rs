use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::admin_request_routes::admin_request_routes;
use super::event_routes::event_routes;
use super::newsletter_routes::newsletter_routes;
use super::sync_routes::sync_routes;
use super::webhook_routes::webhook_routes;
use super::{log_requests, metrics::metrics_handler, state::*, ServerConfig};
use crate::relational_store::{RelationalStore, TieredStore};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub environment: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        environment: state.config.environment.as_str().to_string(),
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn RelationalStore>,
    cms: GuardedContentStore,
    notifier: GuardedNotifier,
) -> Result<Router> {
    let state = ServerState::new(config, TieredStore::new(store), cms, notifier);

    let api_routes: Router = Router::new()
        .merge(webhook_routes())
        .merge(sync_routes())
        .merge(event_routes())
        .merge(newsletter_routes())
        .merge(admin_request_routes())
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn RelationalStore>,
    cms: GuardedContentStore,
    notifier: GuardedNotifier,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store, cms, notifier)?;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", e);
        }
    });
    info!("Metrics server listening on port {}", metrics_port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app).await?)
}
