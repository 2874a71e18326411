use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the bearer token is persisted between runs.
/// Backends are told apart by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// A JSON document on disk holding one key, the bearer token.
    #[serde(rename = "file")]
    File(FileStoreConfig),
    /// Lives as long as the process; nothing survives a restart.
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FileStoreConfig {
    pub path: String,
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    "token".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory
    }
}
