//! Chain id to RPC endpoint lookup.
//!
//! Joins the public chain list with the DefiLlama TVL table so that the
//! endpoints of the most valuable entry for a chain id come first.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ChainOverride, MetadataConfig};
use crate::error::MetadataError;
use crate::models::ChainEndpoints;
use crate::rpc::USER_AGENT;

/// One entry of `chains.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainListEntry {
    pub name: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    #[serde(default)]
    pub rpc: Vec<RpcEntry>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RpcEntry {
    Url(Option<String>),
    Detailed { url: Option<String> },
}

impl RpcEntry {
    fn into_url(self) -> Option<String> {
        match self {
            RpcEntry::Url(url) | RpcEntry::Detailed { url } => url,
        }
    }
}

/// One row of the TVL table. Rows for non-EVM chains have no usable chain id.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainTvl {
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<Value>,
    #[serde(default)]
    pub tvl: Option<f64>,
}

impl ChainTvl {
    fn chain_id(&self) -> Option<u64> {
        match self.chain_id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    rpc: Vec<Option<String>>,
    tvl: f64,
}

/// Pure join of the two tables for `chain_id`.
pub fn join_chain(
    chain_id: u64,
    chains: Vec<ChainListEntry>,
    tvls: &[ChainTvl],
    overrides: &[ChainOverride],
) -> Result<ChainEndpoints, MetadataError> {
    let tvl_of = |id: u64| {
        tvls.iter()
            .find(|row| row.chain_id() == Some(id))
            .and_then(|row| row.tvl)
            .unwrap_or(0.0)
    };

    let pinned: Vec<&ChainOverride> = overrides.iter().filter(|o| o.chain_id == chain_id).collect();
    let mut candidates: Vec<Candidate> = if pinned.is_empty() {
        chains
            .into_iter()
            .filter(|c| c.chain_id == chain_id && c.status.as_deref() != Some("deprecated"))
            .map(|c| Candidate {
                tvl: tvl_of(c.chain_id),
                name: c.name,
                rpc: c.rpc.into_iter().map(RpcEntry::into_url).collect(),
            })
            .collect()
    } else {
        pinned
            .into_iter()
            .map(|o| Candidate {
                name: o.name.clone(),
                rpc: o.rpc.iter().cloned().map(Some).collect(),
                tvl: o.tvl.unwrap_or_else(|| tvl_of(o.chain_id)),
            })
            .collect()
    };

    candidates.sort_by(|a, b| b.tvl.partial_cmp(&a.tvl).unwrap_or(std::cmp::Ordering::Equal));

    let name = candidates
        .first()
        .map(|c| c.name.clone())
        .ok_or(MetadataError::ChainNotFound(chain_id))?;
    let urls = candidates.into_iter().flat_map(|c| c.rpc).collect();

    Ok(ChainEndpoints { name, urls })
}

/// Resolves chain ids against the remote chain list and TVL table.
#[derive(Debug, Clone)]
pub struct ChainDirectory {
    client: reqwest::Client,
    chains_url: String,
    tvl_url: String,
    overrides: Vec<ChainOverride>,
}

impl ChainDirectory {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .map_err(MetadataError::Client)?;

        Ok(Self {
            client,
            chains_url: config.chains_url.clone(),
            tvl_url: config.tvl_url.clone(),
            overrides: config.overrides.clone(),
        })
    }

    pub async fn resolve_chain(&self, chain_id: u64) -> Result<ChainEndpoints, MetadataError> {
        let (chains, tvls) = tokio::try_join!(
            self.fetch::<Vec<ChainListEntry>>(&self.chains_url),
            self.fetch::<Vec<ChainTvl>>(&self.tvl_url),
        )?;
        tracing::debug!(chain_id, chains = chains.len(), tvls = tvls.len(), "metadata fetched");

        join_chain(chain_id, chains, &tvls, &self.overrides)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, MetadataError> {
        let fetch_error = |source: reqwest::Error| MetadataError::Fetch {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?
            .json::<T>()
            .await
            .map_err(fetch_error)
    }
}
