use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::deck::DeckIdentifier;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionConfig,
}

/// Where the validation service lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Use wss/https instead of ws/http
    pub secure: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Give up on a session after this many seconds without a frame.
    /// Unset waits indefinitely.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            host: "localhost".to_string(),
            port: default_service_port(),
            secure: false,
        }
    }
}

/// Port the validation service listens on
pub fn default_service_port() -> u16 {
    8000
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "deckcheck", "deckcheck")
}

impl Config {
    /// Load from the platform config dir, falling back to defaults when no
    /// file exists
    pub fn load() -> Result<Self> {
        if let Some(dirs) = project_dirs() {
            let config_file = dirs.config_dir().join("config.toml");
            if config_file.exists() {
                return Self::load_from(&config_file);
            }
        }
        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to the platform config dir, returning the file written
    pub fn save(&self) -> Result<PathBuf> {
        let dirs = project_dirs().ok_or_else(|| anyhow!("No config directory on this platform"))?;
        let config_file = dirs.config_dir().join("config.toml");
        self.save_to(&config_file)?;
        Ok(config_file)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Command-line flags win over the file
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>, secure: bool) -> Self {
        if let Some(host) = host {
            self.service.host = host;
        }
        if let Some(port) = port {
            self.service.port = port;
        }
        self.service.secure |= secure;
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.session
            .idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl ServiceConfig {
    fn base(&self, scheme: &str) -> Result<Url> {
        Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))
            .with_context(|| format!("Invalid service address {}:{}", self.host, self.port))
    }

    /// `{ws|wss}://host:port/ws/validate/<deck>`
    pub fn channel_url(&self, deck: &DeckIdentifier) -> Result<Url> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = self.base(scheme)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Service address cannot carry a path"))?
            .clear()
            .extend(["ws", "validate", deck.as_str()]);
        Ok(url)
    }

    /// `{http|https}://host:port/history`
    pub fn history_url(&self) -> Result<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Ok(self.base(scheme)?.join("history")?)
    }
}
