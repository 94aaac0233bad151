use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use api_types::EndpointWithRest;
use clap::Parser;
use env_config::NetworkPreset;
use metrics::{Metrics, SharedMetrics};
use network_api::{CancellationToken, NetworkClient, ReqwestTransport};
use restart_point::{ConfigEntry, StateSyncPatch};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command};

/// The consensus engine refuses to state-sync with fewer RPC servers.
const MIN_STATE_SYNC_RPC_SERVERS: usize = 2;

#[derive(Serialize)]
struct RestartOutput<'a> {
    network: &'a str,
    rest_endpoints: Vec<&'a str>,
    state_sync: &'a StateSyncPatch,
    entries: Vec<ConfigEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            signal_cancel.cancel();
        }
    });

    let metrics: SharedMetrics = Arc::new(Metrics::new().context("failed to register metrics")?);

    let result = run(&args, cancel, metrics.clone()).await;

    if let Some(path) = &args.metrics_file {
        if let Err(err) = metrics.write_to_file(path) {
            warn!(path = %path.display(), %err, "Failed to write metrics");
        }
    }

    result
}

async fn run(args: &Args, cancel: CancellationToken, metrics: SharedMetrics) -> Result<()> {
    let preset = args.preset()?;
    let endpoints = args.rest_endpoints(&preset)?;

    info!(
        network = preset.name,
        endpoints = endpoints.len(),
        restrict_to_healthy = !args.all_endpoints,
        "Connecting to network"
    );

    let transport = ReqwestTransport::new().context("failed to create http client")?;
    let client = NetworkClient::builder(transport)
        .endpoints(endpoints)
        .restrict_to_healthy(!args.all_endpoints)
        .config(args.tuning.client_config())
        .cancellation(cancel)
        .metrics(metrics.clone())
        .build()
        .await
        .context("failed to create network client")?;

    match &args.command {
        Command::Statistics => {
            let statistics = client.statistics().await.context("failed to get network statistics")?;
            check_chain_id(&preset, &statistics.chain_id);
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
        Command::HealthyEndpoints => {
            let rpc_servers = healthy_rpc_servers(&client, &preset).await?;

            println!("REST endpoints:");
            for endpoint in client.endpoints() {
                println!("  {endpoint}");
            }
            println!("State-sync RPC servers:");
            for server in rpc_servers {
                println!("  {server}");
            }
        }
        Command::RestartPoint { output } => {
            let statistics = client.statistics().await.context("failed to get network statistics")?;
            check_chain_id(&preset, &statistics.chain_id);

            let network_height = client.network_head().await.context("failed to get network head")?;
            info!(network_height, "Determined network height");

            let snapshots = client.snapshots().await.context("failed to get snapshots")?;
            let segments = client
                .history_segments(network_height)
                .await
                .context("failed to get network history segments")?;

            let restart_point = restart_point::select(&snapshots, &segments).context("failed to select restart point")?;
            metrics.set_restart_trust_height(restart_point.trust_height);
            info!(%restart_point, "Selected restart point");

            let rpc_servers = healthy_rpc_servers(&client, &preset).await?;
            if rpc_servers.len() < MIN_STATE_SYNC_RPC_SERVERS {
                warn!(
                    found = rpc_servers.len(),
                    required = MIN_STATE_SYNC_RPC_SERVERS,
                    "Not enough healthy state-sync RPC servers"
                );
            }

            let patch = StateSyncPatch::new(restart_point, rpc_servers);
            let result = RestartOutput {
                network: preset.name,
                rest_endpoints: client.endpoints().iter().map(|endpoint| endpoint.as_str()).collect(),
                state_sync: &patch,
                entries: patch.entries(),
            };

            println!("Restart point: {}", patch.restart_point);
            for entry in &result.entries {
                println!("  {} = {}", entry.key.as_str(), serde_json::to_string(&entry.value)?);
            }

            if let Some(path) = output {
                write_json(path, &result)?;
                info!(path = %path.display(), "Wrote restart point");
            }
        }
    }

    Ok(())
}

fn check_chain_id(preset: &NetworkPreset, chain_id: &str) {
    if !preset.is_chain(chain_id) {
        warn!(
            network = preset.name,
            expected = preset.chain_id,
            reported = chain_id,
            "Endpoints report a different chain than the selected network"
        );
    }
}

async fn healthy_rpc_servers(client: &NetworkClient<ReqwestTransport>, preset: &NetworkPreset) -> Result<Vec<String>> {
    let candidates: Vec<EndpointWithRest> = preset.state_sync_rpc_servers();
    client
        .healthy_endpoints(&candidates)
        .await
        .context("failed to check state-sync RPC servers")
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
