use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire transport of an RPC endpoint, picked from its URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    WebSocket,
}

impl Transport {
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.trim().split_once("://")?;
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Some(Transport::Http),
            "ws" | "wss" => Some(Transport::WebSocket),
            _ => None,
        }
    }
}

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub raw_payload: Option<Value>,
    pub latency: Option<u64>,
    pub failed: bool,
}

impl ProbeResult {
    pub fn succeeded(url: &str, payload: Value, latency: u64) -> Self {
        Self {
            url: url.to_string(),
            raw_payload: Some(payload),
            latency: Some(latency),
            failed: false,
        }
    }

    pub fn failed(url: &str) -> Self {
        Self {
            url: url.to_string(),
            raw_payload: None,
            latency: None,
            failed: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub url: String,
    pub height: Option<u64>,
    pub latency: Option<u64>,
}

/// Response body of a chain lookup.
#[derive(Debug, Serialize, Clone)]
pub struct ChainRpcData {
    #[serde(rename = "rpcData")]
    pub rpc_data: Vec<NormalizedRecord>,
    pub name: String,
}

/// Candidate endpoints for one chain id, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEndpoints {
    pub name: String,
    pub urls: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub responsive: usize,
    pub fastest_url: Option<String>,
    pub fastest_latency: Option<u64>,
    pub tip_height: Option<u64>,
}
