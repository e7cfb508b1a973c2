//! Domain layer - ABI models, conversion and mapping rules
//!
//! Nothing in here performs I/O. The transport is reached only through
//! the [`ReadCaller`] trait.

pub mod abi;
pub mod caller;
pub mod convert;
pub mod mapping;

pub use caller::ReadCaller;
