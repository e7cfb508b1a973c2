//! ABI domain models
//!
//! Contract descriptors in declaration order and the accessor selection
//! policy over them, independent of the transport that calls them.

mod address;
mod entry;
mod selector;

pub use address::parse_address;
pub use entry::{AbiEntry, ContractDescriptor, ContractSet, EntryKind, Mutability, Param};
pub use selector::{is_accessor, is_read_only, select};
