mod api;
mod batch;
mod chains;
mod config;
mod error;
mod models;
mod normalize;
mod rank;
mod rpc;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::api::{router, AppState};
use crate::batch::Prober;
use crate::chains::ChainDirectory;
use crate::config::{load_config, load_config_or_default, AppConfig};
use crate::models::NormalizedRecord;
use crate::rank::{rank, summarize};

const DEFAULT_CONFIG: &str = "config.toml";

/// CLI arguments
#[derive(Parser)]
#[command(name = "rpc-latency", version, about = "Ranks public RPC endpoints of a chain by latency")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the latency API over HTTP
    Serve {
        /// IP address to bind the server to
        #[arg(long)]
        listen_ip: Option<String>,

        /// Port to bind the server to
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Look up a chain id and rank its endpoints
    Check {
        chain_id: u64,

        /// Re-run the lookup every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rank an explicit list of endpoint URLs
    Probe {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    // An explicitly named config must exist; the default one may not.
    let config: AppConfig = if args.config.as_os_str() == DEFAULT_CONFIG {
        load_config_or_default(&args.config)?
    } else {
        load_config(&args.config)?
    };

    match args.command {
        Command::Serve { listen_ip, port } => serve(config, listen_ip, port).await,
        Command::Check {
            chain_id,
            interval,
            json,
        } => check(config, chain_id, interval, json).await,
        Command::Probe { urls, json } => {
            let prober = Prober::new(&config.probe);
            let urls: Vec<Option<String>> = urls.into_iter().map(Some).collect();
            let records = rank(prober.probe_all(&urls).await);
            print_records("custom endpoints", &records, json)
        }
    }
}

fn app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    Ok(AppState {
        directory: ChainDirectory::new(&config.metadata)?,
        prober: Prober::new(&config.probe),
    })
}

async fn serve(
    mut config: AppConfig,
    listen_ip: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    // CLI arguments override the TOML config
    if let Some(ip) = listen_ip {
        config.server.listen_ip = Some(ip);
    }
    if let Some(port) = port {
        config.server.port = Some(port);
    }

    let state = Arc::new(app_state(&config)?);
    let app = router(state);

    let ip = config
        .server
        .listen_ip
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config.server.port.unwrap_or(5000);
    let addr: SocketAddr = format!("{}:{}", ip, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", ip, port))?;

    info!("Server running on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn check(
    config: AppConfig,
    chain_id: u64,
    interval: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let state = app_state(&config)?;

    let Some(secs) = interval else {
        let data = state.rpc_data(chain_id).await?;
        return print_records(&data.name, &data.rpc_data, json);
    };

    // Each poll replaces the previous result set wholesale.
    let cadence = Duration::from_secs(secs.max(1));
    loop {
        tokio::select! {
            result = state.rpc_data(chain_id) => match result {
                Ok(data) => print_records(&data.name, &data.rpc_data, json)?,
                Err(e) => warn!(chain_id, error = %e, "lookup failed, retrying next cycle"),
            },
            _ = shutdown_signal() => break,
        }
        tokio::select! {
            _ = tokio::time::sleep(cadence) => {}
            _ = shutdown_signal() => break,
        }
    }
    Ok(())
}

fn print_records(name: &str, records: &[NormalizedRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!("[{}] {} RPC URL LIST", Utc::now().to_rfc3339(), name);
    println!("{:<64} {:>12} {:>10}", "RPC Server Address", "Height", "Latency");
    for record in records {
        let height = record
            .height
            .map_or_else(|| "-".to_string(), |h| h.to_string());
        let latency = record
            .latency
            .map_or_else(|| "-".to_string(), |l| format!("{} ms", l));
        println!("{:<64} {:>12} {:>10}", record.url, height, latency);
    }

    let summary = summarize(records);
    match (summary.fastest_url, summary.fastest_latency) {
        (Some(url), Some(latency)) => println!(
            "{}/{} responding, fastest {} ({} ms), tip {}",
            summary.responsive,
            summary.total,
            url,
            latency,
            summary.tip_height.unwrap_or_default()
        ),
        _ => println!("0/{} responding", summary.total),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
