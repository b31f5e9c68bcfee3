//! Typed diagnostics for declaration processing
//!
//! Diagnostics are typed by kind rather than by error class: every condition
//! the semantic core can report on user declarations has its own
//! [`DiagnosticKind`] variant with a default severity. A malformed declaration
//! produces diagnostics and is excluded from the output; it never aborts the
//! rest of the batch.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational message
    Info,
    /// Potential issue, processing continues and output is kept
    Warning,
    /// The offending declaration is invalid and excluded from output
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Severe => write!(f, "severe"),
        }
    }
}

/// The kind of a declaration-processing diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A function with this name is already defined in the unit
    DuplicateName,
    /// The function name is reserved and may not be user-defined
    RestrictedName,
    /// The function declares more parameters than the allowed maximum
    TooManyParameters,
    /// Two parameters of one function share a name
    DuplicateParameter,
    /// A declared type name did not resolve
    UnknownType,
    /// A parameter's resolved type is restricted
    InvalidParameterType,
    /// The resolved return type is restricted
    InvalidReturnType,
    /// The body's inferred type neither matches nor coerces to the declared return type
    ReturnTypeMismatch,
    /// A user-defined type remained unresolved (dangling or cyclic reference)
    UnresolvedTypeDefinition,
    /// A user-defined function shadows a built-in function
    ShadowsBuiltin,
    /// Partial-formula fragments of one name carry inconsistent attributes
    PartialAttributeInconsistent,
    /// A partial attribute names an operation the merger does not recognize
    UnknownPartialOperation,
}

impl DiagnosticKind {
    /// The severity this kind carries by default
    pub const fn default_severity(&self) -> Severity {
        match self {
            DiagnosticKind::ShadowsBuiltin => Severity::Warning,
            _ => Severity::Severe,
        }
    }

    /// Short description of the condition
    pub const fn description(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateName => "function is already defined",
            DiagnosticKind::RestrictedName => "function name is restricted",
            DiagnosticKind::TooManyParameters => "too many parameters",
            DiagnosticKind::DuplicateParameter => "duplicate parameter name",
            DiagnosticKind::UnknownType => "unknown type name",
            DiagnosticKind::InvalidParameterType => "parameter type is not allowed",
            DiagnosticKind::InvalidReturnType => "return type is not allowed",
            DiagnosticKind::ReturnTypeMismatch => "body type does not match declared return type",
            DiagnosticKind::UnresolvedTypeDefinition => "invalid type definition",
            DiagnosticKind::ShadowsBuiltin => "shadows a built-in function",
            DiagnosticKind::PartialAttributeInconsistent => {
                "partial attribute does not match other fragments"
            }
            DiagnosticKind::UnknownPartialOperation => "unknown partial merge operation",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A diagnostic with kind, severity, message and source anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message naming the offending identifiers
    pub message: String,
    /// Source anchor for the offending token
    pub span: Span,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            span,
        }
    }

    /// Create a Severe diagnostic
    pub fn severe(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Severe,
            message: message.into(),
            span,
        }
    }

    /// Create a Warning diagnostic
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    /// Check whether this diagnostic invalidates its declaration
    pub fn is_severe(&self) -> bool {
        self.severity == Severity::Severe
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.span)
    }
}
