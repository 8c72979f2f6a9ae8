use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use community_sync_server::cms::{ContentStore, HttpContentStore, InMemoryContentStore};
use community_sync_server::config::{self, Environment};
use community_sync_server::notifications::{HttpNotifier, NoOpNotifier, Notifier};
use community_sync_server::relational_store::SqliteRelationalStore;
use community_sync_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use community_sync_server::sync::SignaturePolicy;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding community.db. Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Deployment environment. Batch sync is open to anyone outside production.
    #[clap(long, default_value = "development")]
    pub environment: Environment,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            environment: args.environment,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!("  environment: {}", app_config.environment.as_str());

    if !app_config.community_db_path().exists() {
        info!(
            "Creating new community database at {:?}",
            app_config.community_db_path()
        );
    }
    let store = Arc::new(SqliteRelationalStore::new(app_config.community_db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let cms: Arc<dyn ContentStore> = match &app_config.cms {
        Some(cms) => {
            info!("Using CMS dataset {} at {}", cms.dataset, cms.base_url);
            Arc::new(HttpContentStore::new(
                cms.base_url.clone(),
                cms.dataset.clone(),
                cms.api_version.clone(),
                cms.token.clone(),
                cms.timeout_sec,
            )?)
        }
        None => {
            warn!("No [cms] configured, using an in-memory content store");
            Arc::new(InMemoryContentStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match &app_config.notifications.service {
        Some(service) => {
            info!("Sending notifications through {}", service.base_url);
            Arc::new(HttpNotifier::new(
                service.base_url.clone(),
                service.api_key.clone(),
                app_config.notifications.timeout_sec,
            )?)
        }
        None => {
            warn!("No [notifications] configured, notifications are disabled");
            Arc::new(NoOpNotifier)
        }
    };

    let server_config = ServerConfig::from(&app_config);
    match &server_config.signature_policy {
        SignaturePolicy::Require { .. } => {}
        SignaturePolicy::AllowUnsigned => {
            warn!("webhook.allow_unsigned is set: webhook signatures are NOT verified")
        }
        SignaturePolicy::RejectAll => {
            warn!("No webhook secret configured, every webhook will be rejected")
        }
    }
    if app_config.environment.is_production() && app_config.sync.admin_key.is_none() {
        warn!("No sync admin key configured, batch and reverse sync endpoints are disabled");
    }

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    tokio::select! {
        result = run_server(
            server_config,
            store,
            cms,
            notifier,
            app_config.metrics_port,
        ) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
