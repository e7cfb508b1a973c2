//! Ethereum infrastructure - Alloy provider implementations

mod provider;

pub use provider::{decode_outputs, AlloyCaller, ProviderConfig};
