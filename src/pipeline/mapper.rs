//! Mapper facade - contract name + address in, mapped object out

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use super::extractor::{self, ExtractOptions, DEFAULT_CALL_TIMEOUT, DEFAULT_CONCURRENCY};
use crate::config::Config;
use crate::domain::abi::{self, ContractSet};
use crate::domain::convert::{Converter, ConverterRegistry};
use crate::domain::mapping::MappingSpec;
use crate::domain::ReadCaller;
use crate::error::{FieldDiagnostic, MapperError, Result};
use crate::infrastructure::{AlloyCaller, ArtifactLoader};

/// Where contract descriptors come from
#[derive(Debug, Clone)]
pub enum ContractSource {
    /// File paths, directories or glob patterns, relative to the working directory
    Paths(Vec<String>),
    /// Descriptors already in memory
    Loaded(ContractSet),
}

impl Default for ContractSource {
    fn default() -> Self {
        ContractSource::Paths(Vec::new())
    }
}

/// Construction-time settings
#[derive(Clone)]
pub struct MapperConfig {
    /// Network to connect to when no caller is supplied
    pub network: Option<String>,
    pub working_dir: PathBuf,
    /// User converters layered over the defaults
    pub types: HashMap<String, Converter>,
    /// Default mapping, replaced per call by an explicit mapping
    pub mapping: MappingSpec,
    pub contracts: ContractSource,
    pub concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            network: None,
            working_dir: PathBuf::from("."),
            types: HashMap::new(),
            mapping: MappingSpec::new(),
            contracts: ContractSource::default(),
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl MapperConfig {
    /// Settings taken from a configuration file, defaults elsewhere
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            network: config.default_network.clone(),
            working_dir: config.working_dir.clone().unwrap_or(defaults.working_dir),
            types: HashMap::new(),
            mapping: config.mapping.clone(),
            contracts: ContractSource::Paths(config.contracts.clone()),
            concurrency: config.concurrency.unwrap_or(defaults.concurrency),
            call_timeout: config
                .call_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.call_timeout),
        }
    }

    pub fn contracts(mut self, contracts: ContractSource) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn mapping(mut self, mapping: MappingSpec) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn converter(mut self, ty: impl Into<String>, converter: Converter) -> Self {
        self.types.insert(ty.into(), converter);
        self
    }
}

/// Settings in force for one `map` call
#[derive(Debug, Clone, Copy)]
pub struct EffectiveConfig<'a> {
    pub network: Option<&'a str>,
    pub working_dir: &'a Path,
    pub converters: &'a ConverterRegistry,
    pub mapping: &'a MappingSpec,
    pub options: ExtractOptions,
}

/// Result of a `map` call
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapOutput {
    /// Final object, in extraction order
    pub values: Map<String, Value>,
    /// Fields dropped by failed calls, conversions or transforms
    pub diagnostics: Vec<FieldDiagnostic>,
}

/// Extracts and maps the readable state of deployed contracts
pub struct ContractMapper {
    network: Option<String>,
    working_dir: PathBuf,
    contracts: Arc<ContractSet>,
    converters: Arc<ConverterRegistry>,
    mapping: Arc<MappingSpec>,
    options: ExtractOptions,
    caller: Arc<dyn ReadCaller>,
}

impl ContractMapper {
    /// Build a mapper around an existing read caller. Contracts given as
    /// paths are loaded here, once.
    pub fn new(config: MapperConfig, caller: Arc<dyn ReadCaller>) -> Result<Self> {
        let contracts = match config.contracts {
            ContractSource::Loaded(set) => set,
            ContractSource::Paths(patterns) => ArtifactLoader::load(&config.working_dir, &patterns)?,
        };

        let mut converters = ConverterRegistry::new();
        converters.extend(config.types);

        Ok(Self {
            network: config.network,
            working_dir: config.working_dir,
            contracts: Arc::new(contracts),
            converters: Arc::new(converters),
            mapping: Arc::new(config.mapping),
            options: ExtractOptions {
                concurrency: config.concurrency.max(1),
                call_timeout: config.call_timeout,
            },
            caller,
        })
    }

    /// Build a mapper that calls through the network named in `config.network`,
    /// resolved against the networks of `settings`
    pub async fn connect(config: MapperConfig, settings: &Config) -> Result<Self> {
        let name = config.network.clone().ok_or(MapperError::NoNetwork)?;
        let network = settings
            .network(&name)
            .ok_or_else(|| MapperError::UnknownNetwork(name.clone()))?;
        let provider = network
            .provider_config()
            .ok_or_else(|| MapperError::NoEndpoint(name.clone()))?;

        let endpoint = provider.display();
        let caller = AlloyCaller::connect(provider)
            .await
            .map_err(|source| MapperError::Connect { endpoint, source })?;
        tracing::debug!(network = %name, endpoint = caller.endpoint(), "connected");

        Self::new(config, Arc::new(caller))
    }

    pub fn contracts(&self) -> &ContractSet {
        &self.contracts
    }

    /// Constructor defaults with the call's mapping, if any, taking precedence
    pub fn effective_config<'a>(&'a self, call_mapping: Option<&'a MappingSpec>) -> EffectiveConfig<'a> {
        EffectiveConfig {
            network: self.network.as_deref(),
            working_dir: &self.working_dir,
            converters: &*self.converters,
            mapping: call_mapping.unwrap_or(&*self.mapping),
            options: self.options,
        }
    }

    /// Extract every zero-argument read accessor of `contract_name` at
    /// `address` and apply the mapping.
    ///
    /// Fails only on an unknown contract or a malformed address, both checked
    /// before any call is made. Failed calls, conversions and transforms drop
    /// their field and are reported in [`MapOutput::diagnostics`].
    pub async fn map(
        &self,
        contract_name: &str,
        address: &str,
        call_mapping: Option<MappingSpec>,
    ) -> Result<MapOutput> {
        let contract = self
            .contracts
            .get(contract_name)
            .ok_or_else(|| MapperError::UnknownContract(contract_name.to_string()))?;
        let address = abi::parse_address(address)?;

        let started = Instant::now();
        let effective = self.effective_config(call_mapping.as_ref());

        let accessors = abi::select(contract);
        let extraction = extractor::extract(
            &accessors,
            address,
            self.caller.as_ref(),
            effective.converters,
            effective.options,
        )
        .await;
        let mapped = effective.mapping.apply(extraction.values);

        let mut diagnostics = extraction.failures;
        diagnostics.extend(mapped.failures);

        tracing::info!(
            contract = contract_name,
            %address,
            network = effective.network.unwrap_or("-"),
            working_dir = %effective.working_dir.display(),
            accessors = accessors.len(),
            fields = mapped.values.len(),
            dropped = diagnostics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mapped contract state"
        );

        Ok(MapOutput {
            values: mapped.values,
            diagnostics,
        })
    }

    /// [`map`](Self::map) without the diagnostics
    pub async fn map_values(
        &self,
        contract_name: &str,
        address: &str,
        call_mapping: Option<MappingSpec>,
    ) -> Result<Map<String, Value>> {
        Ok(self.map(contract_name, address, call_mapping).await?.values)
    }
}
