use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "bookfinder";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORAGE_PATH: &str = ".bookfinder/storage.json";
const ENV_PREFIX: &str = "BOOKFINDER";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Base url of the backend serving both recommendations and saved books
    pub api_base_url: String,
    /// File backing the persisted search state
    pub storage_path: PathBuf,
    /// Bearer token, when absent the persisted `authToken` is used
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl AppConfig {
    /// Loads defaults, then the optional `bookfinder.{toml,json,yaml}` file, then `BOOKFINDER_*` variables
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(config_file: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("storage_path", DEFAULT_STORAGE_PATH)?
            .add_source(config::File::with_name(config_file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
