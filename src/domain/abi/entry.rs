//! ABI entry model - contract interface members in declaration order

use std::collections::HashMap;

use alloy_primitives::keccak256;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// A function input or output parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name (may be empty)
    #[serde(default)]
    pub name: String,
    /// Declared Solidity type (e.g., "uint256", "tuple", "tuple[]")
    #[serde(rename = "type")]
    pub ty: String,
    /// Tuple components, empty for non-tuple types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Param>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components: Vec::new(),
        }
    }

    /// Canonical type string with tuples expanded (e.g., "(uint256,address)[]")
    pub fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(Param::canonical_type).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.ty.clone(),
        }
    }
}

/// Kind of interface member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Constructor,
    Event,
    Error,
    Fallback,
    Receive,
}

/// State mutability classification (pure, view, nonpayable, payable)
pub use alloy_json_abi::StateMutability as Mutability;

/// One contract interface member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbiEntry {
    pub name: String,
    pub kind: EntryKind,
    pub mutability: Mutability,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
}

impl AbiEntry {
    /// Build a zero-input view function, mostly useful for tests and fixtures
    pub fn view(name: impl Into<String>, outputs: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Function,
            mutability: Mutability::View,
            inputs: Vec::new(),
            outputs,
        }
    }

    /// Full signature string (e.g., "balanceOf(address)")
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(Param::canonical_type).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// 4-byte function selector
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }
}

/// Wire shape of an ABI JSON entry. Older compilers emit `constant`/`payable`
/// instead of `stateMutability`.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default = "default_kind")]
    kind: EntryKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<Param>,
    #[serde(default)]
    outputs: Vec<Param>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<Mutability>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
}

fn default_kind() -> EntryKind {
    EntryKind::Function
}

impl From<RawEntry> for AbiEntry {
    fn from(raw: RawEntry) -> Self {
        let mutability = match (raw.state_mutability, raw.constant, raw.payable) {
            (Some(mutability), _, _) => mutability,
            (None, Some(true), _) => Mutability::View,
            (None, _, Some(true)) => Mutability::Payable,
            _ => Mutability::NonPayable,
        };
        Self {
            name: raw.name,
            kind: raw.kind,
            mutability,
            inputs: raw.inputs,
            outputs: raw.outputs,
        }
    }
}

/// A named contract interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractDescriptor {
    pub name: String,
    pub entries: Vec<AbiEntry>,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<String>, entries: Vec<AbiEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Parse either a raw ABI array or an artifact object with an `abi` field
    pub fn from_json(name: impl Into<String>, value: &serde_json::Value) -> Result<Self> {
        let name = name.into();
        let abi = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi") {
            abi
        } else {
            bail!("no ABI found for contract '{}'", name);
        };

        let raw: Vec<RawEntry> = serde_json::from_value(abi.clone())
            .with_context(|| format!("invalid ABI for contract '{}'", name))?;

        Ok(Self {
            name,
            entries: raw.into_iter().map(AbiEntry::from).collect(),
        })
    }
}

/// Loaded contract descriptors keyed by contract name
#[derive(Debug, Clone, Default)]
pub struct ContractSet {
    contracts: HashMap<String, ContractDescriptor>,
}

impl ContractSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor
    ///
    /// Note: first descriptor for a given name wins (no overwrite). Returns
    /// false when the name was already taken.
    pub fn insert(&mut self, descriptor: ContractDescriptor) -> bool {
        if self.contracts.contains_key(&descriptor.name) {
            return false;
        }
        self.contracts.insert(descriptor.name.clone(), descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ContractDescriptor> {
        self.contracts.get(name)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Contract names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contracts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<ContractDescriptor> for ContractSet {
    fn from_iter<I: IntoIterator<Item = ContractDescriptor>>(iter: I) -> Self {
        let mut set = Self::new();
        for descriptor in iter {
            set.insert(descriptor);
        }
        set
    }
}
