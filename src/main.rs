use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contract_mapper::config::{self, Config};
use contract_mapper::{AlloyCaller, ContractMapper, ContractSource, MapperConfig, MappingSpec, ProviderConfig};

#[derive(Debug, Parser)]
#[command(
    name = "contract-mapper",
    version,
    about = "Dump the readable state of a deployed contract as JSON"
)]
struct Args {
    /// Contract name, as found in the loaded artifacts
    contract: String,

    /// Deployed contract address
    address: String,

    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Network name from the config file
    #[arg(long, short)]
    network: Option<String>,

    /// Artifact file, directory or wildcard pattern (repeatable)
    #[arg(long = "contracts", short = 'c')]
    contracts: Vec<String>,

    /// Directory artifact patterns are resolved against
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// TOML mapping applied to this call instead of the configured one
    #[arg(long, short)]
    mapping: Option<PathBuf>,

    /// Maximum calls in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let settings = config::load();
    let mapper_config = mapper_config_from_args(&args, &settings);
    let call_mapping = args.mapping.as_ref().map(load_mapping).transpose()?;

    let mapper = match provider_from_args(&args) {
        Some(provider) => {
            let endpoint = provider.display();
            let caller = AlloyCaller::connect(provider)
                .await
                .with_context(|| format!("Connection failed ({})", endpoint))?;
            tracing::debug!(endpoint = caller.endpoint(), "connected");
            ContractMapper::new(mapper_config, Arc::new(caller))?
        }
        None => ContractMapper::connect(mapper_config, &settings).await?,
    };

    let output = mapper.map(&args.contract, &args.address, call_mapping).await?;

    println!("{}", serde_json::to_string_pretty(&output.values)?);
    for diagnostic in &output.diagnostics {
        eprintln!("dropped {}", diagnostic);
    }

    Ok(())
}

/// Config file settings with command-line overrides
fn mapper_config_from_args(args: &Args, settings: &Config) -> MapperConfig {
    let mut mapper_config = MapperConfig::from_config(settings);

    if let Some(network) = &args.network {
        mapper_config.network = Some(network.clone());
    }
    if let Some(dir) = &args.working_dir {
        mapper_config.working_dir = dir.clone();
    }
    if !args.contracts.is_empty() {
        mapper_config.contracts = ContractSource::Paths(args.contracts.clone());
    }
    if let Some(concurrency) = args.concurrency {
        mapper_config.concurrency = concurrency;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        mapper_config.call_timeout = Duration::from_millis(timeout_ms);
    }

    mapper_config
}

/// Endpoint given directly on the command line, if any
fn provider_from_args(args: &Args) -> Option<ProviderConfig> {
    if let Some(rpc) = &args.rpc {
        return Some(ProviderConfig::Http(rpc.clone()));
    }
    if let Some(ws) = &args.ws {
        return Some(ProviderConfig::WebSocket(ws.clone()));
    }
    #[cfg(unix)]
    {
        if let Some(ipc) = &args.ipc {
            return Some(ProviderConfig::Ipc(ipc.clone()));
        }
    }
    None
}

fn load_mapping(path: &PathBuf) -> Result<MappingSpec> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parse mapping {}", path.display()))
}
