use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use env_config::NetworkPreset;
use network_api::{ClientConfig, RetryPolicy, DEFAULT_CLIENT_CONFIG};

#[derive(Parser, Debug)]
#[command(version, about = "Finds a trustworthy restart point for bootstrapping a node")]
pub struct Args {
    /// Built-in network preset providing default endpoints.
    #[arg(short, long, global = true, default_value = "mainnet")]
    pub network: String,

    /// REST endpoint url, or a YAML file holding a list of urls. Replaces the
    /// preset endpoints when given.
    #[arg(short, long, global = true)]
    pub rest: Vec<String>,

    /// Use every endpoint, including ones lagging behind the network.
    #[arg(long, global = true)]
    pub all_endpoints: bool,

    #[command(flatten)]
    pub tuning: Tuning,

    /// Write prometheus metrics in text format to this file on exit.
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug)]
pub struct Tuning {
    /// Blocks an endpoint may lag behind the network head.
    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.lagging_threshold)]
    pub lagging_threshold: u64,

    /// Blocks the newest history segment may lag behind the network height.
    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.segment_freshness_threshold)]
    pub segment_threshold: u64,

    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.request_timeout.as_millis() as u64)]
    pub timeout_ms: u64,

    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.retry.attempts)]
    pub retry_attempts: u32,

    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.retry.delay.as_millis() as u64)]
    pub retry_delay_ms: u64,

    /// Endpoints probed at the same time during health checks.
    #[arg(long, global = true, default_value_t = DEFAULT_CLIENT_CONFIG.max_concurrent_probes)]
    pub max_concurrent_probes: usize,
}

impl Tuning {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            lagging_threshold: self.lagging_threshold,
            segment_freshness_threshold: self.segment_threshold,
            request_timeout: Duration::from_millis(self.timeout_ms),
            retry: RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms)),
            max_concurrent_probes: self.max_concurrent_probes,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the status record of the first reachable endpoint.
    Statistics,
    /// Print healthy REST endpoints and healthy state-sync RPC servers.
    HealthyEndpoints,
    /// Select a restart point and print the resulting state-sync settings.
    RestartPoint {
        /// Also write the result as JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Args {
    pub fn preset(&self) -> Result<NetworkPreset> {
        match env_config::preset(&self.network) {
            Some(preset) => Ok(preset),
            None => bail!("unknown network preset: {}", self.network),
        }
    }

    /// Endpoints from `--rest` when given, the preset's otherwise.
    pub fn rest_endpoints(&self, preset: &NetworkPreset) -> Result<Vec<String>> {
        if self.rest.is_empty() {
            return Ok(preset.rest_endpoints());
        }

        let mut endpoints = Vec::new();
        for argument in &self.rest {
            endpoints.extend(parse_rest_argument(argument)?);
        }
        Ok(endpoints)
    }
}

/// Accepts either a url or a path to a YAML list of urls.
pub fn parse_rest_argument(argument: &str) -> Result<Vec<String>> {
    if argument.contains("://") {
        return Ok(vec![argument.to_string()]);
    }

    let contents = fs::read_to_string(argument).with_context(|| format!("failed to read endpoint file {argument}"))?;
    let endpoints: Vec<String> =
        serde_yaml::from_str(&contents).with_context(|| format!("failed to parse endpoint file {argument}"))?;

    if endpoints.is_empty() {
        bail!("endpoint file {argument} lists no endpoints");
    }
    Ok(endpoints)
}
