mod file_config;

pub use file_config::{CmsConfig, FileConfig, NotificationsConfig, SyncConfig, WebhookConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_CMS_API_VERSION: &str = "2024-01-01";
pub const DEFAULT_HTTP_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_REMINDER_OFFSETS_HOURS: [u32; 2] = [24, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub environment: Environment,

    // Integrations
    pub cms: Option<CmsSettings>,
    pub webhook: WebhookSettings,
    pub sync: SyncSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CmsSettings {
    pub base_url: String,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookSettings {
    pub secret: Option<String>,
    pub allow_unsigned: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSettings {
    pub admin_key: Option<String>,
    pub fallback_author_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationServiceSettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettings {
    /// `None` disables outbound notifications.
    pub service: Option<NotificationServiceSettings>,
    pub timeout_sec: u64,
    pub reminder_offsets_hours: Vec<u32>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            service: None,
            timeout_sec: DEFAULT_HTTP_TIMEOUT_SEC,
            reminder_offsets_hours: DEFAULT_REMINDER_OFFSETS_HOURS.to_vec(),
        }
    }
}

/// Blank strings count as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let environment = match file.environment {
            Some(s) => match Environment::from_str(&s, true) {
                Ok(environment) => environment,
                Err(_) => bail!("Unknown environment {:?}", s),
            },
            None => cli.environment,
        };

        let cms = match file.cms {
            Some(cms) => {
                let (base_url, dataset) = match (non_blank(cms.base_url), non_blank(cms.dataset)) {
                    (Some(base_url), Some(dataset)) => (base_url, dataset),
                    _ => bail!("[cms] requires both base_url and dataset"),
                };
                Some(CmsSettings {
                    base_url,
                    dataset,
                    api_version: non_blank(cms.api_version)
                        .unwrap_or_else(|| DEFAULT_CMS_API_VERSION.to_string()),
                    token: non_blank(cms.token),
                    timeout_sec: cms.timeout_sec.unwrap_or(DEFAULT_HTTP_TIMEOUT_SEC),
                })
            }
            None => None,
        };

        let webhook_file = file.webhook.unwrap_or_default();
        let webhook = WebhookSettings {
            secret: non_blank(webhook_file.secret),
            allow_unsigned: webhook_file.allow_unsigned.unwrap_or(false),
        };
        if environment.is_production() && webhook.secret.is_none() && webhook.allow_unsigned {
            bail!("webhook.allow_unsigned cannot be used in production");
        }

        let sync_file = file.sync.unwrap_or_default();
        let sync = SyncSettings {
            admin_key: non_blank(sync_file.admin_key),
            fallback_author_id: non_blank(sync_file.fallback_author_id),
        };

        let notifications_file = file.notifications.unwrap_or_default();
        let service = match (
            non_blank(notifications_file.base_url),
            non_blank(notifications_file.api_key),
        ) {
            (Some(base_url), Some(api_key)) => Some(NotificationServiceSettings { base_url, api_key }),
            (None, None) => None,
            _ => bail!("[notifications] requires both base_url and api_key"),
        };
        let notifications = NotificationSettings {
            service,
            timeout_sec: notifications_file
                .timeout_sec
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SEC),
            reminder_offsets_hours: notifications_file
                .reminder_offsets_hours
                .unwrap_or_else(|| DEFAULT_REMINDER_OFFSETS_HOURS.to_vec()),
        };

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            environment,
            cms,
            webhook,
            sync,
            notifications,
        })
    }

    pub fn community_db_path(&self) -> PathBuf {
        self.db_dir.join("community.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
