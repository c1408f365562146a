use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory chart images are written to and served from.
    /// Defaults to ./static/images
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
        }
    }
}

fn default_images_dir() -> String {
    "static/images".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Maximum number of uploaded sessions held in memory.
    /// The oldest session is evicted once the limit is reached.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_max_sessions() -> usize {
    crate::store::DEFAULT_MAX_SESSIONS
}

/// Environment overrides with prefix TABSIGHT_; a double underscore separates
/// section from key so keys may contain underscores.
/// Example: TABSIGHT_SERVER__PORT=9090, TABSIGHT_STORE__MAX_SESSIONS=64
fn environment() -> config::Environment {
    config::Environment::with_prefix("TABSIGHT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load(config_path: &str) -> Result<Self> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(config_path: &str, env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if self.paths.images_dir.trim().is_empty() {
            anyhow::bail!("Images directory cannot be empty");
        }

        if self.store.max_sessions == 0 {
            anyhow::bail!("Store capacity 'max_sessions' must be at least 1");
        }

        Ok(())
    }
}
