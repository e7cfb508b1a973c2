//! contract-mapper - snapshot the readable state of deployed contracts
//!
//! Given a contract ABI and an address, calls every zero-argument read-only
//! function, converts the decoded results per ABI type and reshapes them with
//! a declarative field mapping.
//!
//! # Example
//!
//! ```rust,no_run
//! use contract_mapper::{config, ContractMapper, ContractSource, MapperConfig, MappingRule, MappingSpec};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = config::load();
//!     let config = MapperConfig::from_config(&settings)
//!         .contracts(ContractSource::Paths(vec!["out".into()]));
//!
//!     let mapper = ContractMapper::connect(config, &settings).await?;
//!
//!     let mapping = MappingSpec::new().rule(
//!         "state",
//!         MappingRule::fan_out([
//!             MappingRule::transform("stateName", |v| {
//!                 let names = ["Funding", "Active", "Matured"];
//!                 let idx = v.as_u64().unwrap_or(u64::MAX) as usize;
//!                 Ok(names.get(idx).map(|n| json!(n)).unwrap_or(json!(null)))
//!             }),
//!             MappingRule::key("state"),
//!         ]),
//!     );
//!
//!     let output = mapper
//!         .map("Bond", "0x5FbDB2315678afecb367f032d93F642f64180aa3", Some(mapping))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&output.values)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod pipeline;

pub use domain::abi::{select, AbiEntry, ContractDescriptor, ContractSet, EntryKind, Mutability, Param};
pub use domain::convert::{to_json, Converter, ConverterRegistry};
pub use domain::mapping::{Mapped, MappingRule, MappingSpec, Transform};
pub use domain::ReadCaller;
pub use error::{DiagnosticStage, FieldDiagnostic, MapperError, Result};
pub use infrastructure::{AlloyCaller, ArtifactLoader, ProviderConfig};
pub use pipeline::{ContractMapper, ContractSource, EffectiveConfig, ExtractOptions, Extraction, MapOutput, MapperConfig};
