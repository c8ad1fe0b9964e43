///
/// Script Error Types
///
/// Parse and runtime errors of the script engine. Both carry the byte span
/// they refer to so the CLI can show the offending source line.
///

use thiserror::Error;

use super::ast::Span;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("parse error: {message}")]
    Parse { message: String, span: Span },

    #[error("runtime error: {message}")]
    Runtime { message: String, span: Span },

    #[error("cannot read script {path}: {reason}")]
    Read { path: String, reason: String },
}

impl ScriptError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        ScriptError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn runtime(message: impl Into<String>, span: Span) -> Self {
        ScriptError::Runtime {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ScriptError::Parse { span, .. } | ScriptError::Runtime { span, .. } => Some(*span),
            ScriptError::Read { .. } => None,
        }
    }

    /// The message without the "parse error:" style prefix.
    pub fn message(&self) -> &str {
        match self {
            ScriptError::Parse { message, .. } | ScriptError::Runtime { message, .. } => message,
            ScriptError::Read { reason, .. } => reason,
        }
    }
}
