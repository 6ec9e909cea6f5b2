use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons a single probe did not produce a payload. Only ever logged.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("empty endpoint url")]
    EmptyUrl,

    #[error("url requires an API key")]
    ApiKeyTemplate,

    #[error("unsupported url scheme")]
    UnsupportedScheme,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("socket closed before any message")]
    ClosedEarly,

    #[error("response is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("unknown chain id {0}")]
    ChainNotFound(u64),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build metadata client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
