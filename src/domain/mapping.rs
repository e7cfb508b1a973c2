//! Field mapping - declarative renames, fan-out and transforms over extracted values

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{contain_panic, DiagnosticStage, FieldDiagnostic};

/// Custom transform applied to a source value
pub type Transform = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// How one source field is written into the final object
#[derive(Clone)]
pub enum MappingRule {
    /// Copy verbatim under a new key
    Key(String),
    /// Write under `key`, through `transform` when present
    Transformed {
        key: String,
        transform: Option<Transform>,
    },
    /// Apply every rule independently to the same source value
    FanOut(Vec<MappingRule>),
}

impl MappingRule {
    pub fn key(key: impl Into<String>) -> Self {
        MappingRule::Key(key.into())
    }

    pub fn transform<F>(key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        MappingRule::Transformed {
            key: key.into(),
            transform: Some(Arc::new(transform)),
        }
    }

    pub fn fan_out(rules: impl IntoIterator<Item = MappingRule>) -> Self {
        MappingRule::FanOut(rules.into_iter().collect())
    }

    /// Write `value` into `out` per this rule, recording transform failures
    /// and panics
    fn apply(&self, value: &Value, out: &mut Map<String, Value>, failures: &mut Vec<FieldDiagnostic>) {
        match self {
            MappingRule::Key(key)
            | MappingRule::Transformed {
                key,
                transform: None,
            } => {
                out.insert(key.clone(), value.clone());
            }
            MappingRule::Transformed {
                key,
                transform: Some(transform),
            } => match contain_panic(|| transform(value)) {
                Ok(converted) => {
                    out.insert(key.clone(), converted);
                }
                Err(err) => {
                    tracing::warn!(field = %key, "transform failed: {:#}", err);
                    failures.push(FieldDiagnostic::new(key.clone(), DiagnosticStage::Transform, &err));
                }
            },
            MappingRule::FanOut(rules) => {
                for rule in rules {
                    rule.apply(value, out, failures);
                }
            }
        }
    }
}

impl From<&str> for MappingRule {
    fn from(key: &str) -> Self {
        MappingRule::key(key)
    }
}

impl From<String> for MappingRule {
    fn from(key: String) -> Self {
        MappingRule::Key(key)
    }
}

impl fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingRule::Key(key) => f.debug_tuple("Key").field(key).finish(),
            MappingRule::Transformed { key, transform } => f
                .debug_struct("Transformed")
                .field("key", key)
                .field("transform", &transform.as_ref().map(|_| "<fn>"))
                .finish(),
            MappingRule::FanOut(rules) => f.debug_tuple("FanOut").field(rules).finish(),
        }
    }
}

/// Rule shapes accepted from configuration files. Transforms are code-only.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleDef {
    Key(String),
    Descriptor { key: String },
    List(Vec<RuleDef>),
}

impl From<RuleDef> for MappingRule {
    fn from(def: RuleDef) -> Self {
        match def {
            RuleDef::Key(key) => MappingRule::Key(key),
            RuleDef::Descriptor { key } => MappingRule::Transformed {
                key,
                transform: None,
            },
            RuleDef::List(defs) => MappingRule::FanOut(defs.into_iter().map(Into::into).collect()),
        }
    }
}

/// Source field name -> rule
#[derive(Debug, Clone, Default)]
pub struct MappingSpec {
    rules: HashMap<String, MappingRule>,
}

impl MappingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for `source`
    pub fn rule(mut self, source: impl Into<String>, rule: impl Into<MappingRule>) -> Self {
        self.insert(source, rule);
        self
    }

    pub fn insert(&mut self, source: impl Into<String>, rule: impl Into<MappingRule>) {
        self.rules.insert(source.into(), rule.into());
    }

    pub fn get(&self, source: &str) -> Option<&MappingRule> {
        self.rules.get(source)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply these rules to an extraction result.
    ///
    /// Fields are visited in extraction order. Fields without a rule pass
    /// through under their own name; rules for fields that were not extracted
    /// are skipped. Destination keys are not checked for collisions: when two
    /// rules write the same key, the later write wins.
    pub fn apply(&self, values: Map<String, Value>) -> Mapped {
        let mut out = Map::with_capacity(values.len());
        let mut failures = Vec::new();

        for (source, value) in values {
            match self.rules.get(&source) {
                Some(rule) => rule.apply(&value, &mut out, &mut failures),
                None => {
                    out.insert(source, value);
                }
            }
        }

        Mapped {
            values: out,
            failures,
        }
    }
}

impl<'de> Deserialize<'de> for MappingSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let defs = HashMap::<String, RuleDef>::deserialize(deserializer)?;
        Ok(Self {
            rules: defs.into_iter().map(|(source, def)| (source, def.into())).collect(),
        })
    }
}

/// Output of [`MappingSpec::apply`]
#[derive(Debug, Clone, Default)]
pub struct Mapped {
    pub values: Map<String, Value>,
    pub failures: Vec<FieldDiagnostic>,
}
