use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub environment: Option<String>,

    // Integrations
    pub cms: Option<CmsConfig>,
    pub webhook: Option<WebhookConfig>,
    pub sync: Option<SyncConfig>,
    pub notifications: Option<NotificationsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CmsConfig {
    /// Project API root, e.g. "https://<project>.api.sanity.io"
    pub base_url: Option<String>,
    pub dataset: Option<String>,
    pub api_version: Option<String>,
    pub token: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    pub secret: Option<String>,
    /// Accept unsigned deliveries when no secret is set. Local development only.
    pub allow_unsigned: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub admin_key: Option<String>,
    pub fallback_author_id: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_sec: Option<u64>,
    pub reminder_offsets_hours: Option<Vec<u32>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            port = 4000
            environment = "production"

            [cms]
            base_url = "https://abc.api.sanity.io"
            dataset = "production"

            [webhook]
            secret = "whsec"

            [sync]
            admin_key = "key"

            [notifications]
            reminder_offsets_hours = [48, 2]
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(4000));
        assert_eq!(config.environment.as_deref(), Some("production"));
        assert_eq!(config.cms.unwrap().dataset.as_deref(), Some("production"));
        assert_eq!(config.webhook.unwrap().secret.as_deref(), Some("whsec"));
        assert_eq!(config.sync.unwrap().admin_key.as_deref(), Some("key"));
        assert_eq!(
            config.notifications.unwrap().reminder_offsets_hours,
            Some(vec![48, 2])
        );
    }
}
