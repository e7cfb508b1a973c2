//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - ABI artifact loading from the filesystem
//! - Alloy-based read calls decoded with alloy-dyn-abi

pub mod abi;
pub mod ethereum;

pub use abi::ArtifactLoader;
pub use ethereum::{AlloyCaller, ProviderConfig};
