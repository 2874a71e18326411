use std::sync::Arc;

use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::StoreConfig;

/// Durable key-value persistence of the bearer token.
///
/// Calls are synchronous and never wait on the network. Only the auth
/// context writes through this trait; everything else reads.
pub trait TokenStore: Send + Sync {
    /// Overwrites whatever token was stored before.
    fn save(&self, token: &str) -> Result<(), String>;
    fn load(&self) -> Result<Option<String>, String>;
    /// Removing an absent token is not an error.
    fn clear(&self) -> Result<(), String>;
    fn name(&self) -> &str;
}

/// Creates the store backend named in the configuration.
pub fn create_store(config: &StoreConfig) -> Arc<dyn TokenStore> {
    match config {
        StoreConfig::File(file_config) => {
            info!(
                "Using file token store at '{}' (key '{}')",
                file_config.path, file_config.key
            );
            Arc::new(FileStore::new(file_config))
        }
        StoreConfig::Memory => {
            info!("Using in-memory token store; sessions will not survive a restart.");
            Arc::new(MemoryStore::new())
        }
    }
}
