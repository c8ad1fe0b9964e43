//!
//! Diagnostic Module - Script Error Reporting
//!
//! Renders script parse and runtime errors with a source snippet using
//! miette. Bridge-level failures never get here: inside a script they are
//! advisory `warn!` events and the script keeps running.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new("boot.sym", &source);
//!   reporter.report(&err);
//!

use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::script::ScriptError;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScriptDiagnostic {
    message: String,
    src: NamedSource<String>,
    span: SourceSpan,
    label: String,
    help_text: Option<String>,
}

impl Diagnostic for ScriptDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
    }
}

impl ScriptDiagnostic {
    /// `None` for errors without a position in the source.
    pub fn from_script_error(err: &ScriptError, name: &str, source: &str) -> Option<Self> {
        let span = err.span()?;
        let start = span.start.min(source.len());
        let len = span.len().min(source.len() - start);
        let (line, col) = line_col(source, start);

        let (kind, help_text) = match err {
            ScriptError::Parse { .. } => ("parse error", None),
            ScriptError::Runtime { message, .. } => ("runtime error", runtime_help(message)),
            ScriptError::Read { .. } => return None,
        };

        Some(Self {
            message: format!("{} at {}:{}", kind, line, col),
            src: NamedSource::new(name, source.to_string()),
            span: (start, len).into(),
            label: err.message().to_string(),
            help_text,
        })
    }
}

fn runtime_help(message: &str) -> Option<String> {
    if message.starts_with("attempt to call unknown function") {
        Some("available functions: print, call, getGlobal, setGlobal, readLine".to_string())
    } else if message.starts_with("attempt to concatenate") {
        Some("only strings and numbers can be concatenated".to_string())
    } else {
        None
    }
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let col = before[line_start..].chars().count() + 1;
    (line, col)
}

pub struct DiagnosticReporter<'a> {
    name: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(name: &'a str, source: &'a str) -> Self {
        Self { name, source }
    }

    pub fn report(&self, err: &ScriptError) {
        match ScriptDiagnostic::from_script_error(err, self.name, self.source) {
            Some(diag) => eprintln!("{:?}", Report::new(diag)),
            None => eprintln!("Error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ast::Span;

    #[test]
    fn test_line_col() {
        let src = "a = 1\nb = 2\n";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 6), (2, 1));
        assert_eq!(line_col(src, 10), (2, 5));
        assert_eq!(line_col(src, 100), (3, 1));
    }

    #[test]
    fn test_diagnostic_from_runtime_error() {
        let src = "x = 1\nfrob(1)\n";
        let err = ScriptError::runtime("attempt to call unknown function 'frob'", Span::new(6, 13));
        let diag = ScriptDiagnostic::from_script_error(&err, "t.sym", src).unwrap();
        assert_eq!(diag.to_string(), "runtime error at 2:1");
        assert!(diag.help().is_some());

        let labels: Vec<_> = diag.labels().unwrap().collect();
        assert_eq!(labels[0].offset(), 6);
        assert_eq!(labels[0].len(), 7);
    }

    #[test]
    fn test_span_clamped_to_source() {
        let err = ScriptError::parse("expected ')'", Span::new(3, 9));
        let diag = ScriptDiagnostic::from_script_error(&err, "t.sym", "f(1").unwrap();
        assert_eq!(diag.to_string(), "parse error at 1:4");
        assert_eq!(diag.span, SourceSpan::from((3, 0)));
    }

    #[test]
    fn test_read_error_has_no_snippet() {
        let err = ScriptError::Read {
            path: "missing.sym".into(),
            reason: "not found".into(),
        };
        assert!(ScriptDiagnostic::from_script_error(&err, "missing.sym", "").is_none());
    }
}
