use std::fs;
use std::path::Path;
use std::time::Duration;

use relay_logging::{relay_info, relay_warn};
use serde::Deserialize;

/// Server configuration, read from a RON file with a couple of environment
/// overrides (`PORT`, `HF_TOKEN`). A missing file yields the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    /// Hosts allowed in addition to the built-in set.
    pub extra_allowed_hosts: Vec<String>,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub download_dir: String,
    pub hf_token: Option<String>,
    pub hf_base: Option<String>,
    pub log_destination: LogDestinationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogDestinationConfig {
    File,
    Terminal,
    Both,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3001,
            extra_allowed_hosts: Vec::new(),
            rate_limit_max_requests: 30,
            rate_limit_window_secs: 60,
            download_dir: "downloads".to_string(),
            hf_token: None,
            hf_base: None,
            log_destination: LogDestinationConfig::Terminal,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from `path`, then applies environment overrides.
    pub fn load(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(config) => {
                    relay_info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(err) => {
                    relay_warn!("Failed to parse {:?}: {}; using defaults", path, err);
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                relay_warn!("Failed to read {:?}: {}; using defaults", path, err);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => relay_warn!("Ignoring non-numeric PORT={port}"),
            }
        }
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.is_empty() {
                self.hf_token = Some(token);
            }
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
