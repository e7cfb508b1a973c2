//! Value extraction - call every accessor, convert, collect in declaration order

use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use anyhow::{anyhow, bail, Result};
use futures::{stream, StreamExt};
use serde_json::{Map, Value};

use crate::domain::abi::AbiEntry;
use crate::domain::convert::ConverterRegistry;
use crate::domain::ReadCaller;
use crate::error::{DiagnosticStage, FieldDiagnostic};

/// Calls in flight per extraction unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Per-call deadline unless configured otherwise
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Converted values of the accessors that succeeded, plus what failed
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Accessor name -> converted value, in declaration order
    pub values: Map<String, Value>,
    pub failures: Vec<FieldDiagnostic>,
}

/// Call each accessor at `address` and convert its result.
///
/// Calls run concurrently, at most `options.concurrency` at a time, and each
/// is attempted once. A failing or timed-out call drops only its own field.
/// Every call is awaited before the result is assembled, and the result keeps
/// declaration order regardless of completion order.
pub async fn extract(
    accessors: &[&AbiEntry],
    address: Address,
    caller: &dyn ReadCaller,
    registry: &ConverterRegistry,
    options: ExtractOptions,
) -> Extraction {
    let outcomes: Vec<(&AbiEntry, Result<Vec<DynSolValue>>)> = stream::iter(accessors.iter().copied())
        .map(|entry| async move {
            tracing::debug!(accessor = %entry.name, %address, "calling accessor");
            let outcome = match tokio::time::timeout(options.call_timeout, caller.call_read(address, entry)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "call timed out after {}ms",
                    options.call_timeout.as_millis()
                )),
            };
            (entry, outcome)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut extraction = Extraction::default();
    for (entry, outcome) in outcomes {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(accessor = %entry.name, %address, "call failed: {:#}", err);
                extraction
                    .failures
                    .push(FieldDiagnostic::new(&entry.name, DiagnosticStage::Call, &err));
                continue;
            }
        };

        match convert_outputs(entry, &raw, registry) {
            Ok(value) => {
                extraction.values.insert(entry.name.clone(), value);
            }
            Err(err) => {
                tracing::warn!(accessor = %entry.name, "conversion failed: {:#}", err);
                extraction
                    .failures
                    .push(FieldDiagnostic::new(&entry.name, DiagnosticStage::Convert, &err));
            }
        }
    }

    extraction
}

/// Convert decoded outputs using each output's declared type.
///
/// One output converts to its own value, none to `null`, several to an object
/// keyed by output name (position for unnamed or repeated names).
fn convert_outputs(entry: &AbiEntry, raw: &[DynSolValue], registry: &ConverterRegistry) -> Result<Value> {
    if raw.len() != entry.outputs.len() {
        bail!(
            "expected {} output value(s), got {}",
            entry.outputs.len(),
            raw.len()
        );
    }

    match entry.outputs.as_slice() {
        [] => Ok(Value::Null),
        [output] => registry.convert(&output.ty, &raw[0]),
        outputs => {
            let mut object = Map::with_capacity(outputs.len());
            for (idx, (output, value)) in outputs.iter().zip(raw).enumerate() {
                // unnamed or repeated names fall back to the position
                let key = if output.name.trim().is_empty() || object.contains_key(&output.name) {
                    idx.to_string()
                } else {
                    output.name.clone()
                };
                object.insert(key, registry.convert(&output.ty, value)?);
            }
            Ok(Value::Object(object))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::Param;
    use alloy_primitives::U256;
    use serde_json::json;

    struct FixedCaller;

    #[async_trait::async_trait]
    impl ReadCaller for FixedCaller {
        async fn call_read(&self, _address: Address, function: &AbiEntry) -> Result<Vec<DynSolValue>> {
            match function.name.as_str() {
                "name" => Ok(vec![DynSolValue::String("Coin".into())]),
                "totalSupply" => Ok(vec![DynSolValue::Uint(U256::from(1000), 256)]),
                "reserves" => Ok(vec![
                    DynSolValue::Uint(U256::from(5), 112),
                    DynSolValue::Uint(U256::from(7), 112),
                ]),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(vec![DynSolValue::Bool(true)])
                }
                "late" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(vec![DynSolValue::Uint(U256::from(3), 8)])
                }
                "pair" => Ok(vec![
                    DynSolValue::Uint(U256::from(5), 112),
                    DynSolValue::Uint(U256::from(7), 112),
                ]),
                "wrongArity" => Ok(vec![]),
                _ => bail!("execution reverted"),
            }
        }
    }

    fn accessors() -> Vec<AbiEntry> {
        vec![
            AbiEntry::view("name", vec![Param::new("", "string")]),
            AbiEntry::view("broken", vec![Param::new("", "uint256")]),
            AbiEntry::view("totalSupply", vec![Param::new("", "uint256")]),
            AbiEntry::view(
                "reserves",
                vec![Param::new("reserve0", "uint112"), Param::new("", "uint112")],
            ),
        ]
    }

    #[tokio::test]
    async fn test_extract_contains_failures_and_keeps_order() {
        let entries = accessors();
        let refs: Vec<&AbiEntry> = entries.iter().collect();

        let extraction = extract(
            &refs,
            Address::ZERO,
            &FixedCaller,
            &ConverterRegistry::new(),
            ExtractOptions::default(),
        )
        .await;

        let keys: Vec<&str> = extraction.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "totalSupply", "reserves"]);
        assert_eq!(extraction.values["totalSupply"], json!("1000"));
        assert_eq!(extraction.values["reserves"], json!({"reserve0": 5, "1": 7}));

        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.failures[0].field, "broken");
        assert_eq!(extraction.failures[0].stage, DiagnosticStage::Call);
    }

    #[tokio::test]
    async fn test_timeout_degrades_single_accessor() {
        let entries = vec![
            AbiEntry::view("slow", vec![Param::new("", "bool")]),
            AbiEntry::view("name", vec![Param::new("", "string")]),
        ];
        let refs: Vec<&AbiEntry> = entries.iter().collect();
        let options = ExtractOptions {
            concurrency: 1,
            call_timeout: Duration::from_millis(50),
        };

        let extraction = extract(&refs, Address::ZERO, &FixedCaller, &ConverterRegistry::new(), options).await;

        assert_eq!(extraction.values.len(), 1);
        assert_eq!(extraction.values["name"], json!("Coin"));
        assert!(extraction.failures[0].error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_slow_first_accessor_keeps_declaration_order() {
        let entries = vec![
            AbiEntry::view("late", vec![Param::new("", "uint8")]),
            AbiEntry::view("name", vec![Param::new("", "string")]),
            AbiEntry::view("totalSupply", vec![Param::new("", "uint256")]),
        ];
        let refs: Vec<&AbiEntry> = entries.iter().collect();
        let options = ExtractOptions {
            concurrency: 8,
            call_timeout: Duration::from_secs(5),
        };

        let extraction = extract(&refs, Address::ZERO, &FixedCaller, &ConverterRegistry::new(), options).await;

        let keys: Vec<&str> = extraction.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["late", "name", "totalSupply"]);
        assert_eq!(extraction.values["late"], json!(3));
        assert!(extraction.failures.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_output_names_keep_every_value() {
        let entries = vec![AbiEntry::view(
            "pair",
            vec![Param::new("x", "uint112"), Param::new("x", "uint112")],
        )];
        let refs: Vec<&AbiEntry> = entries.iter().collect();

        let extraction = extract(
            &refs,
            Address::ZERO,
            &FixedCaller,
            &ConverterRegistry::new(),
            ExtractOptions::default(),
        )
        .await;

        assert_eq!(extraction.values["pair"], json!({"x": 5, "1": 7}));
        assert!(extraction.failures.is_empty());
    }

    #[tokio::test]
    async fn test_converter_panic_drops_only_its_field() {
        let entries = accessors();
        let refs: Vec<&AbiEntry> = entries.iter().collect();
        let registry = ConverterRegistry::new().with("string", |_: &DynSolValue| -> Result<Value> {
            panic!("bad converter")
        });

        let extraction = extract(&refs, Address::ZERO, &FixedCaller, &registry, ExtractOptions::default()).await;

        let keys: Vec<&str> = extraction.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["totalSupply", "reserves"]);
        let convert: Vec<&FieldDiagnostic> = extraction
            .failures
            .iter()
            .filter(|d| d.stage == DiagnosticStage::Convert)
            .collect();
        assert_eq!(convert.len(), 1);
        assert_eq!(convert[0].field, "name");
        assert!(convert[0].error.contains("bad converter"));
    }

    #[tokio::test]
    async fn test_arity_mismatch_is_conversion_failure() {
        let entries = vec![AbiEntry::view("wrongArity", vec![Param::new("", "uint256")])];
        let refs: Vec<&AbiEntry> = entries.iter().collect();

        let extraction = extract(
            &refs,
            Address::ZERO,
            &FixedCaller,
            &ConverterRegistry::new(),
            ExtractOptions::default(),
        )
        .await;

        assert!(extraction.values.is_empty());
        assert_eq!(extraction.failures[0].stage, DiagnosticStage::Convert);
    }

    #[test]
    fn test_convert_no_outputs_is_null() {
        let entry = AbiEntry::view("ping", vec![]);
        let value = convert_outputs(&entry, &[], &ConverterRegistry::new()).unwrap();
        assert_eq!(value, Value::Null);
    }
}
