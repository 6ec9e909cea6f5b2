use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::batch::Prober;
use crate::chains::ChainDirectory;
use crate::error::MetadataError;
use crate::models::ChainRpcData;
use crate::rank::{rank, summarize};

pub struct AppState {
    pub directory: ChainDirectory,
    pub prober: Prober,
}

impl AppState {
    /// Resolves a chain, probes all of its endpoints and ranks them.
    pub async fn rpc_data(&self, chain_id: u64) -> Result<ChainRpcData, MetadataError> {
        let chain = self.directory.resolve_chain(chain_id).await?;
        let rpc_data = rank(self.prober.probe_all(&chain.urls).await);

        let summary = summarize(&rpc_data);
        info!(
            chain_id,
            name = %chain.name,
            total = summary.total,
            responsive = summary.responsive,
            fastest = ?summary.fastest_latency,
            tip = ?summary.tip_height,
            "chain probed"
        );

        Ok(ChainRpcData {
            rpc_data,
            name: chain.name,
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    InvalidChainId,
    Metadata(MetadataError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidChainId => (
                StatusCode::BAD_REQUEST,
                "Chain ID must be a positive integer.".to_string(),
            ),
            ApiError::Metadata(MetadataError::ChainNotFound(id)) => {
                warn!(chain_id = id, "unknown chain requested");
                (StatusCode::NOT_FOUND, format!("Unknown chain id {}.", id))
            }
            ApiError::Metadata(e) => {
                error!(error = %e, "metadata lookup failed");
                (StatusCode::BAD_GATEWAY, "Failed to fetch RPC data.".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/rpcbychainId/:chain_id", get(get_rpc_by_chain_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /rpcbychainId/:chain_id
async fn get_rpc_by_chain_id(
    State(state): State<Arc<AppState>>,
    Path(chain_id): Path<String>,
) -> Result<Json<ChainRpcData>, ApiError> {
    let chain_id = parse_chain_id(&chain_id).ok_or(ApiError::InvalidChainId)?;
    let data = state.rpc_data(chain_id).await.map_err(ApiError::Metadata)?;
    Ok(Json(data))
}

fn parse_chain_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&id| id > 0)
}
