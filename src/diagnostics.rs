//! Diagnostics produced while extracting exposed declarations.
//!
//! The engine never logs warnings itself. Every recoverable problem is
//! pushed into a caller-supplied [`DiagnosticSink`], and the caller decides
//! how to present it (see `report`).

use serde::{Deserialize, Serialize};

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Namespace does not match the camelCase predicate.
    InvalidNamespace,
    /// The expose decorator or comment tag could not be understood.
    MalformedAnnotation,
    /// Declared return type contradicts the declaration.
    UnsupportedReturnType,
    /// Declaration shape that cannot be exposed (static, accessor, ...).
    UnsupportedDeclaration,
    /// Function or owning class is not exported from its module.
    NotExported,
    /// Referenced type is declared locally without `export`.
    TypeNotExported,
    /// Owning class needs constructor arguments for its singleton.
    ConstructorArguments,
    /// Source file could not be read.
    UnreadableFile,
    /// Source file could not be parsed.
    ParseError,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::InvalidNamespace => "invalid_namespace",
            DiagnosticCode::MalformedAnnotation => "malformed_annotation",
            DiagnosticCode::UnsupportedReturnType => "unsupported_return_type",
            DiagnosticCode::UnsupportedDeclaration => "unsupported_declaration",
            DiagnosticCode::NotExported => "not_exported",
            DiagnosticCode::TypeNotExported => "type_not_exported",
            DiagnosticCode::ConstructorArguments => "constructor_arguments",
            DiagnosticCode::UnreadableFile => "unreadable_file",
            DiagnosticCode::ParseError => "parse_error",
        }
    }

    /// Severity this code is reported with.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnreadableFile | DiagnosticCode::ParseError => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    /// 1-indexed; 0 when the diagnostic concerns the whole file.
    pub line: usize,
    /// `Class.method` or `function` the diagnostic is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the default severity of `code`.
    pub fn new(code: DiagnosticCode, file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            file: file.into(),
            line,
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// `file:line` (or just `file` for whole-file diagnostics).
    pub fn location(&self) -> String {
        if self.line > 0 {
            format!("{}:{}", self.file, self.line)
        } else {
            self.file.clone()
        }
    }
}

/// Receives diagnostics as they are produced.
pub trait DiagnosticSink {
    /// Append one diagnostic event.
    fn push(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn push(&mut self, diagnostic: Diagnostic) {
        Vec::push(self, diagnostic);
    }
}

/// Collected diagnostics of one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Check if there are any error-severity diagnostics.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.count(Severity::Warning) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

impl DiagnosticSink for DiagnosticReport {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
