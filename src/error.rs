//! Error types for contract-mapper

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal errors of a `map` call. All of them are raised before any contract
/// call is attempted.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("unknown contract '{0}'")]
    UnknownContract(String),

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("network '{0}' has no rpc, ws or ipc endpoint")]
    NoEndpoint(String),

    #[error("no network selected and no provider supplied")]
    NoNetwork,

    #[error("failed to load contracts: {0}")]
    Load(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = MapperError> = std::result::Result<T, E>;

/// Pipeline stage at which a single field was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    /// The read call failed (revert, no code, transport error, timeout)
    Call,
    /// The converter for the declared output type failed
    Convert,
    /// A mapping transform failed
    Transform,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            DiagnosticStage::Call => "call",
            DiagnosticStage::Convert => "convert",
            DiagnosticStage::Transform => "transform",
        };
        f.write_str(stage)
    }
}

/// A contained, non-fatal failure of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiagnostic {
    /// Accessor name for call/convert failures, destination key for transforms
    pub field: String,
    pub stage: DiagnosticStage,
    pub error: String,
}

impl FieldDiagnostic {
    pub fn new(field: impl Into<String>, stage: DiagnosticStage, error: &anyhow::Error) -> Self {
        Self {
            field: field.into(),
            stage,
            error: format!("{:#}", error),
        }
    }
}

impl fmt::Display for FieldDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.stage, self.error)
    }
}

/// Run a user-supplied converter or transform, turning a panic into an error
pub(crate) fn contain_panic<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(anyhow::anyhow!("panicked: {}", message))
        }
    }
}
