use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use crate::error::ProbeError;
use crate::models::{ProbeResult, Transport};

pub(crate) const USER_AGENT: &str = concat!("rpc-latency/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: Value,
    id: u64,
}

/// Latest block header request, shared by every probe.
pub static PROBE_REQUEST: Lazy<String> = Lazy::new(|| {
    let request = JsonRpcRequest {
        jsonrpc: "2.0",
        method: "eth_getBlockByNumber",
        params: json!(["latest", false]),
        id: 1,
    };
    serde_json::to_string(&request).unwrap_or_default()
});

/// Sends one chain-height request to `url`. Never fails: every error is
/// folded into a `failed` result.
pub async fn probe(url: &str, timeout: Duration) -> ProbeResult {
    match probe_with_deadline(url, timeout).await {
        Ok((payload, latency)) => ProbeResult::succeeded(url, payload, latency),
        Err(e) => {
            debug!(url, error = %e, "probe failed");
            ProbeResult::failed(url)
        }
    }
}

async fn probe_with_deadline(url: &str, timeout: Duration) -> Result<(Value, u64), ProbeError> {
    if url.trim().is_empty() {
        return Err(ProbeError::EmptyUrl);
    }
    // Public chain lists publish templates like `.../v3/${INFURA_API_KEY}`.
    if url.contains("API_KEY") {
        return Err(ProbeError::ApiKeyTemplate);
    }
    let transport = Transport::from_url(url).ok_or(ProbeError::UnsupportedScheme)?;

    let attempt = async {
        match transport {
            Transport::Http => probe_http(url, timeout).await,
            Transport::WebSocket => probe_ws(url).await,
        }
    };

    tokio::time::timeout(timeout, attempt)
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
}

async fn probe_http(url: &str, timeout: Duration) -> Result<(Value, u64), ProbeError> {
    // One client per probe: latency always includes connection setup.
    let client = reqwest::ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;

    let start = Instant::now();
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(PROBE_REQUEST.clone())
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProbeError::Status(response.status()));
    }

    let body = response.bytes().await?;
    let latency = elapsed_ms(start);
    let payload = serde_json::from_slice(&body)?;
    Ok((payload, latency))
}

async fn probe_ws(url: &str) -> Result<(Value, u64), ProbeError> {
    let (mut socket, _) = connect_async(url).await?;
    socket.send(Message::Text(PROBE_REQUEST.clone())).await?;
    let start = Instant::now();

    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => {
                let latency = elapsed_ms(start);
                return Ok((serde_json::from_str(&text)?, latency));
            }
            Some(Ok(Message::Binary(bytes))) => {
                let latency = elapsed_ms(start);
                return Ok((serde_json::from_slice(&bytes)?, latency));
            }
            // ping, pong and raw frames carry no response
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(_))) | None => return Err(ProbeError::ClosedEarly),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
