//! Accessor selection - which ABI entries can be called without arguments

use std::collections::HashSet;

use super::{AbiEntry, ContractDescriptor, EntryKind, Mutability};

/// Select the zero-argument, read-only functions of a contract in declaration order.
///
/// Overloaded names keep only their first qualifying declaration, so the
/// result never contains duplicate names.
pub fn select(contract: &ContractDescriptor) -> Vec<&AbiEntry> {
    let mut seen = HashSet::new();
    contract
        .entries
        .iter()
        .filter(|entry| is_accessor(entry))
        .filter(|entry| seen.insert(entry.name.as_str()))
        .collect()
}

/// Plain function, no state change, no inputs
pub fn is_accessor(entry: &AbiEntry) -> bool {
    entry.kind == EntryKind::Function
        && is_read_only(entry.mutability)
        && entry.inputs.is_empty()
        && !entry.name.is_empty()
}

/// Whether calling a member of this mutability leaves chain state untouched
pub fn is_read_only(mutability: Mutability) -> bool {
    matches!(mutability, Mutability::Pure | Mutability::View)
}
