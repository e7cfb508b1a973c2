//! Type converter registry - raw decoded values to JSON, keyed by ABI type name

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{I256, U256};
use anyhow::Result;
use serde_json::Value;

use crate::error::contain_panic;

/// Conversion from a raw decoded value into the output representation
pub type Converter = Arc<dyn Fn(&DynSolValue) -> Result<Value> + Send + Sync>;

/// Types converted to decimal strings unless overridden
const DECIMAL_STRING_TYPES: &[&str] = &["uint256", "int256", "uint128", "int128", "uint", "int"];

/// Registry of converters keyed by exact ABI type name.
///
/// Lookup is exact: a converter registered for `"uint"` does not apply to
/// `"uint256"` and vice versa. User registrations win over defaults; types
/// without any registration go through [`to_json`].
#[derive(Clone)]
pub struct ConverterRegistry {
    defaults: HashMap<String, Converter>,
    user: HashMap<String, Converter>,
}

impl ConverterRegistry {
    /// Registry with the built-in defaults only
    pub fn new() -> Self {
        let decimal: Converter = Arc::new(decimal_string);
        let defaults = DECIMAL_STRING_TYPES
            .iter()
            .map(|ty| (ty.to_string(), Arc::clone(&decimal)))
            .collect();

        Self {
            defaults,
            user: HashMap::new(),
        }
    }

    /// Registry with no converters at all; every type passes through [`to_json`]
    pub fn empty() -> Self {
        Self {
            defaults: HashMap::new(),
            user: HashMap::new(),
        }
    }

    /// Register a user converter for an exact type name
    pub fn register<F>(&mut self, ty: impl Into<String>, converter: F) -> &mut Self
    where
        F: Fn(&DynSolValue) -> Result<Value> + Send + Sync + 'static,
    {
        self.user.insert(ty.into(), Arc::new(converter));
        self
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with<F>(mut self, ty: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&DynSolValue) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(ty, converter);
        self
    }

    /// Merge user converters from another map; existing user entries are replaced
    pub fn extend(&mut self, converters: impl IntoIterator<Item = (String, Converter)>) {
        self.user.extend(converters);
    }

    /// Find the converter registered for `ty`, user layer first
    pub fn lookup(&self, ty: &str) -> Option<&Converter> {
        self.user.get(ty).or_else(|| self.defaults.get(ty))
    }

    /// Convert a value of declared type `ty`, falling back to [`to_json`].
    /// A panicking converter is reported as an error.
    pub fn convert(&self, ty: &str, value: &DynSolValue) -> Result<Value> {
        match self.lookup(ty) {
            Some(converter) => contain_panic(|| converter(value)),
            None => Ok(to_json(value)),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut defaults: Vec<&String> = self.defaults.keys().collect();
        let mut user: Vec<&String> = self.user.keys().collect();
        defaults.sort();
        user.sort();
        f.debug_struct("ConverterRegistry")
            .field("defaults", &defaults)
            .field("user", &user)
            .finish()
    }
}

fn decimal_string(value: &DynSolValue) -> Result<Value> {
    Ok(match value {
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        other => to_json(other),
    })
}

/// Lossless JSON form of a decoded value.
///
/// Integers that fit in 64 bits become numbers, wider ones decimal strings.
/// Addresses are EIP-55 checksummed, byte strings `0x` hex, tuples arrays.
pub fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(u, _) => uint_to_json(*u),
        DynSolValue::Int(i, _) => int_to_json(*i),
        DynSolValue::Address(addr) => Value::String(addr.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        DynSolValue::Function(func) => Value::String(format!("0x{}", hex::encode(func.as_slice()))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
    }
}

fn uint_to_json(value: U256) -> Value {
    match u64::try_from(value) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(value.to_string()),
    }
}

fn int_to_json(value: I256) -> Value {
    match i64::try_from(value) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, FixedBytes};
    use anyhow::bail;
    use serde_json::json;

    fn uint(value: u64, bits: usize) -> DynSolValue {
        DynSolValue::Uint(U256::from(value), bits)
    }

    fn double_uint(value: &DynSolValue) -> Result<Value> {
        let DynSolValue::Uint(u, _) = value else {
            bail!("expected uint, got {:?}", value);
        };
        Ok(json!((*u * U256::from(2)).to::<u64>()))
    }

    #[test]
    fn test_default_uint256_is_decimal_string() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert("uint256", &uint(123, 256)).unwrap(), json!("123"));
    }

    #[test]
    fn test_user_override_wins_for_exact_type_only() {
        let registry = ConverterRegistry::new().with("uint256", double_uint);

        assert_eq!(registry.convert("uint256", &uint(123, 256)).unwrap(), json!(246));

        let word = DynSolValue::FixedBytes(FixedBytes::<32>::repeat_byte(0xab), 32);
        assert_eq!(
            registry.convert("bytes32", &word).unwrap(),
            json!(format!("0x{}", "ab".repeat(32)))
        );
        // int256 keeps its default
        let negative = DynSolValue::Int(I256::try_from(-5i64).unwrap(), 256);
        assert_eq!(registry.convert("int256", &negative).unwrap(), json!("-5"));
    }

    #[test]
    fn test_no_family_matching() {
        let registry = ConverterRegistry::empty().with("uint", double_uint);

        // "uint" registration does not leak into "uint256"
        assert_eq!(registry.convert("uint256", &uint(7, 256)).unwrap(), json!(7));
        assert_eq!(registry.convert("uint", &uint(7, 256)).unwrap(), json!(14));
    }

    #[test]
    fn test_identity_fallback() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert("uint8", &uint(1, 8)).unwrap(), json!(1));
        assert_eq!(registry.convert("bool", &DynSolValue::Bool(true)).unwrap(), json!(true));
        assert_eq!(
            registry.convert("string", &DynSolValue::String("Coin".into())).unwrap(),
            json!("Coin")
        );
    }

    #[test]
    fn test_to_json_wide_values_and_composites() {
        let wide = DynSolValue::Uint(U256::MAX, 256);
        assert_eq!(to_json(&wide), json!(U256::MAX.to_string()));

        let address: Address = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse().unwrap();
        let tuple = DynSolValue::Tuple(vec![
            DynSolValue::Address(address),
            DynSolValue::Array(vec![uint(1, 8), uint(2, 8)]),
            DynSolValue::Bytes(vec![0xde, 0xad]),
        ]);
        assert_eq!(
            to_json(&tuple),
            json!(["0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", [1, 2], "0xdead"])
        );
    }

    #[test]
    fn test_converter_error_is_returned() {
        let registry = ConverterRegistry::new().with("bytes32", double_uint);
        let word = DynSolValue::FixedBytes(FixedBytes::<32>::ZERO, 32);
        assert!(registry.convert("bytes32", &word).is_err());
    }

    #[test]
    fn test_converter_panic_is_returned_as_error() {
        let registry = ConverterRegistry::new().with("uint256", |_: &DynSolValue| -> Result<Value> {
            panic!("converter exploded")
        });
        let err = registry.convert("uint256", &uint(1, 256)).unwrap_err();
        assert!(err.to_string().contains("converter exploded"));
    }
}
