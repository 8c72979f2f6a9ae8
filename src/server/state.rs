use axum::extract::FromRef;

use crate::cms::ContentStore;
use crate::notifications::Notifier;
use crate::relational_store::TieredStore;
use crate::sync::BatchGate;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedContentStore = Arc<dyn ContentStore>;
pub type GuardedNotifier = Arc<dyn Notifier>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub stores: TieredStore,
    pub cms: GuardedContentStore,
    pub notifier: GuardedNotifier,
    pub batch_gate: BatchGate,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        stores: TieredStore,
        cms: GuardedContentStore,
        notifier: GuardedNotifier,
    ) -> Self {
        let batch_gate = BatchGate::new(
            config.environment.is_production(),
            config.admin_key.clone(),
        );
        ServerState {
            config,
            start_time: Instant::now(),
            stores,
            cms,
            notifier,
            batch_gate,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for TieredStore {
    fn from_ref(input: &ServerState) -> Self {
        input.stores.clone()
    }
}

impl FromRef<ServerState> for GuardedContentStore {
    fn from_ref(input: &ServerState) -> Self {
        input.cms.clone()
    }
}

impl FromRef<ServerState> for GuardedNotifier {
    fn from_ref(input: &ServerState) -> Self {
        input.notifier.clone()
    }
}

impl FromRef<ServerState> for BatchGate {
    fn from_ref(input: &ServerState) -> Self {
        input.batch_gate.clone()
    }
}
