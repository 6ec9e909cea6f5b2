use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::models::NormalizedRecord;
use crate::normalize::normalize;
use crate::rpc::probe;

/// Fans probes out over a list of endpoints.
#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
    concurrency: usize,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Probes every non-empty URL and returns one record per probe, in input
    /// order. Null and empty entries are dropped without a probe. All probes
    /// run inside the caller's task, so dropping the future abandons them.
    pub async fn probe_all(&self, urls: &[Option<String>]) -> Vec<NormalizedRecord> {
        let targets: Vec<String> = urls
            .iter()
            .filter_map(|url| url.as_deref())
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .collect();
        let dropped = urls.len() - targets.len();
        let timeout = self.timeout;
        let concurrency = self.concurrency;

        let span = info_span!("batch", id = %Uuid::new_v4(), endpoints = targets.len());
        async move {
            // Completion order, so a stuck probe never holds finished slots.
            let mut settled: Vec<(usize, NormalizedRecord)> = stream::iter(targets.into_iter().enumerate())
                .map(move |(index, url): (usize, String)| async move {
                    (index, normalize(&url, &probe(&url, timeout).await))
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
            settled.sort_by_key(|&(index, _)| index);
            let records: Vec<NormalizedRecord> = settled.into_iter().map(|(_, record)| record).collect();

            let responsive = records.iter().filter(|r| r.height.is_some()).count();
            info!(dropped, responsive, "batch settled");
            records
        }
        .instrument(span)
        .await
    }
}
