use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Top-level server configuration, loaded once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Maximum number of connections processed at the same time.
    pub pool_size: usize,
    /// Cookie domain used when a request carries no `Host` header.
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub document_root: PathBuf,
    pub script_extension: String,
    pub extension_prefix: String,
    pub private_prefix: String,
    pub mime_types: HashMap<String, String>,
    /// Request path -> worker implementation name.
    pub workers: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            pool_size: 16,
            domain: "localhost".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        // interval() panics on a zero period
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let mime_types = [
            ("html", "text/html"),
            ("htm", "text/html"),
            ("txt", "text/plain"),
            ("css", "text/css"),
            ("js", "text/javascript"),
            ("json", "application/json"),
            ("png", "image/png"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("gif", "image/gif"),
            ("svg", "image/svg+xml"),
            ("ico", "image/x-icon"),
            ("pdf", "application/pdf"),
        ];
        let workers = [
            ("/hello", "HelloWorker"),
            ("/echo", "EchoParams"),
            ("/counter", "VisitCounter"),
            ("/home", "Home"),
            ("/setbgcolor", "BackgroundColor"),
        ];

        Self {
            document_root: PathBuf::from("./webroot"),
            script_extension: "smscr".to_string(),
            extension_prefix: "/ext/".to_string(),
            private_prefix: "/private".to_string(),
            mime_types: mime_types
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            workers: workers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// Loads the file named by `WICKET_CONFIG` (default `wicket.yaml`).
    ///
    /// A missing file yields the defaults. `LISTEN` overrides the listen
    /// address either way.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("WICKET_CONFIG").unwrap_or_else(|_| "wicket.yaml".to_string());
        let mut cfg = Self::from_file(Path::new(&path))?;

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.pool_size == 0 {
            anyhow::bail!("server.pool_size must be greater than zero");
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
