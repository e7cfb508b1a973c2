//! Alloy-backed read caller over HTTP, WebSocket or IPC

use std::path::PathBuf;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, Bytes};
use anyhow::{Context, Result};

use crate::domain::abi::AbiEntry;
use crate::domain::ReadCaller;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// `eth_call`-based implementation of [`ReadCaller`]
pub struct AlloyCaller {
    provider: DynProvider,
    endpoint: String,
}

impl AlloyCaller {
    /// Connect to the configured endpoint
    pub async fn connect(config: ProviderConfig) -> Result<Self> {
        let endpoint = config.display();
        let provider = match config {
            ProviderConfig::Http(url) => {
                let rpc_url = url.parse().context("Invalid HTTP URL")?;
                ProviderBuilder::new().connect_http(rpc_url).erased()
            }
            ProviderConfig::WebSocket(url) => ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?
                .erased(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => {
                use alloy::providers::IpcConnect;
                let ipc = IpcConnect::new(path.to_string_lossy().to_string());
                ProviderBuilder::new()
                    .connect_ipc(ipc)
                    .await
                    .context("Failed to create IPC provider")?
                    .erased()
            }
        };

        Ok(Self { provider, endpoint })
    }

    /// Endpoint display name
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ReadCaller for AlloyCaller {
    async fn call_read(&self, address: Address, function: &AbiEntry) -> Result<Vec<DynSolValue>> {
        let calldata = Bytes::copy_from_slice(&function.selector());
        let request = TransactionRequest::default().to(address).input(calldata.into());

        let data = self
            .provider
            .call(request)
            .await
            .with_context(|| format!("eth_call {} failed", function.signature()))?;

        decode_outputs(function, &data)
    }
}

/// Decode raw return data against the function's declared outputs
pub fn decode_outputs(function: &AbiEntry, data: &[u8]) -> Result<Vec<DynSolValue>> {
    if function.outputs.is_empty() {
        return Ok(Vec::new());
    }
    // An EOA or a missing contract answers eth_call with empty data
    if data.is_empty() {
        anyhow::bail!("empty return data (no contract code at address?)");
    }

    let types: Vec<DynSolType> = function
        .outputs
        .iter()
        .map(|param| {
            let ty = param.canonical_type();
            DynSolType::parse(&ty)
                .with_context(|| format!("Failed to parse type '{}' for output '{}'", ty, param.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_sequence(data)
        .context("Failed to decode return data")?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}
