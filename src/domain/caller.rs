//! Read-call capability - the transport the extractor calls through

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use anyhow::Result;

use super::abi::AbiEntry;

/// Invokes zero-argument read-only functions on deployed contracts.
///
/// This trait abstracts over the actual transport, so the pipeline can run
/// against an alloy provider or an in-memory fixture.
#[async_trait::async_trait]
pub trait ReadCaller: Send + Sync {
    /// Call `function` at `address` and return its decoded outputs in
    /// declaration order.
    ///
    /// # Returns
    /// * `Ok(values)` - One value per declared output
    /// * `Err(...)` - Revert, missing code, transport failure or undecodable data
    async fn call_read(&self, address: Address, function: &AbiEntry) -> Result<Vec<DynSolValue>>;
}
