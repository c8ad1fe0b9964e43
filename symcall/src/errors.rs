///
/// Bridge error types.
///
/// Everything that can go wrong between a script calling an entry point and
/// native code running: unresolved names, missing arguments, signature
/// mismatches and line input failures. None of these are fatal to the host;
/// entry points turn them into a diagnostic and "no value".
///

use std::path::PathBuf;

use symcall_std_io::LineError;
use thiserror::Error;

use crate::symbols::SymbolKind;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("function {name} not found")]
    FunctionNotFound { name: String },

    #[error("symbol {name} not found")]
    SymbolNotFound { name: String },

    #[error("missing {what}")]
    MissingArgument { what: &'static str },

    #[error("invalid symbol name: {reason}")]
    InvalidName { reason: String },

    #[error("signature mismatch for {name}: {reason}")]
    SignatureMismatch { name: String, reason: String },

    #[error("line input failed: {0}")]
    LineInput(#[from] LineError),
}

impl BridgeError {
    pub(crate) fn not_found(name: impl Into<String>, kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Code => BridgeError::FunctionNotFound { name: name.into() },
            SymbolKind::Data => BridgeError::SymbolNotFound { name: name.into() },
        }
    }

    /// True when neither spelling of a name resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BridgeError::FunctionNotFound { .. } | BridgeError::SymbolNotFound { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = BridgeError::not_found("nonexistent_fn", SymbolKind::Code);
        assert_eq!(err.to_string(), "function nonexistent_fn not found");
        assert!(err.is_not_found());

        let err = BridgeError::not_found("_counter", SymbolKind::Data);
        assert_eq!(err.to_string(), "symbol _counter not found");
        assert!(err.is_not_found());

        let err = BridgeError::MissingArgument { what: "value" };
        assert_eq!(err.to_string(), "missing value");
        assert!(!err.is_not_found());

        let err = BridgeError::SignatureMismatch {
            name: "add_two_ints".to_string(),
            reason: "expects at most 2 arguments, got 3".to_string(),
        };
        assert!(err.to_string().contains("add_two_ints"));
        assert!(err.to_string().contains("at most 2"));

        let err = ConfigError::Invalid("max_args must be between 0 and 15".to_string());
        assert!(err.to_string().contains("Invalid config"));
    }
}
