use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub blob: BlobConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_store_endpoint() -> String {
    "http://127.0.0.1:8686/v1".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            api_key: None,
        }
    }
}

/// Blob store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_blob_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_blob_endpoint() -> String {
    "http://127.0.0.1:8687/blobs".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            endpoint: default_blob_endpoint(),
            api_key: None,
        }
    }
}

/// Identity provider settings.
///
/// `credential` is the long-lived credential exchanged for a user profile at
/// sign-in. It is external configuration; nothing in this crate mints it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub credential: Option<String>,
}

fn default_auth_endpoint() -> String {
    "http://127.0.0.1:8688/identity".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_auth_endpoint(),
            api_key: None,
            credential: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("filmbook")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
