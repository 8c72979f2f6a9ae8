use super::RequestsLoggingLevel;
use crate::config::{AppConfig, Environment, DEFAULT_REMINDER_OFFSETS_HOURS};
use crate::sync::SignaturePolicy;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub environment: Environment,
    pub signature_policy: SignaturePolicy,
    /// Key accepted by the batch and reverse sync endpoints in production.
    pub admin_key: Option<String>,
    pub fallback_author_id: Option<String>,
    pub reminder_offsets_hours: Vec<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            environment: Environment::Development,
            signature_policy: SignaturePolicy::RejectAll,
            admin_key: None,
            fallback_author_id: None,
            reminder_offsets_hours: DEFAULT_REMINDER_OFFSETS_HOURS.to_vec(),
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            environment: config.environment,
            signature_policy: SignaturePolicy::from_config(
                config.webhook.secret.as_deref(),
                config.webhook.allow_unsigned,
            ),
            admin_key: config.sync.admin_key.clone(),
            fallback_author_id: config.sync.fallback_author_id.clone(),
            reminder_offsets_hours: config.notifications.reminder_offsets_hours.clone(),
        }
    }
}
