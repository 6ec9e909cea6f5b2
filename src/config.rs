use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_CHAINS_URL: &str = "https://chainid.network/chains.json";
pub const DEFAULT_TVL_URL: &str = "https://api.llama.fi/chains";

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_ip: Option<String>,
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProbeConfig {
    /// Hard deadline for one probe, connect through first response.
    pub timeout_ms: u64,
    /// Probes in flight at once within a batch.
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            concurrency: 32,
        }
    }
}

/// Hand-maintained chain entry that replaces the public chain list for its id.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChainOverride {
    pub chain_id: u64,
    pub name: String,
    #[serde(default)]
    pub rpc: Vec<String>,
    pub tvl: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MetadataConfig {
    pub chains_url: String,
    pub tvl_url: String,
    pub timeout_ms: u64,
    pub overrides: Vec<ChainOverride>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            chains_url: DEFAULT_CHAINS_URL.to_string(),
            tvl_url: DEFAULT_TVL_URL.to_string(),
            timeout_ms: 10_000,
            overrides: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub probe: ProbeConfig,
    pub metadata: MetadataConfig,
}

pub fn parse_config(config_str: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(config_str)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&config_str)
}

/// Like [`load_config`], but a missing file yields the built-in defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            tracing::info!("{} not found, using built-in defaults", path.display());
            Ok(AppConfig::default())
        }
        other => other,
    }
}
