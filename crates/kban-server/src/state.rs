use anyhow::Result;
use kban_crypto::IdentifierCipher;
use kban_identity_core::InMemoryKbanService;
use std::sync::Arc;

use crate::config::Config;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub kban_service: Arc<InMemoryKbanService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let cipher = IdentifierCipher::new(Arc::clone(&config.encryption_key));
        let kban_service = Arc::new(InMemoryKbanService::in_memory(cipher).await?);

        Ok(Self {
            config,
            kban_service,
        })
    }
}
