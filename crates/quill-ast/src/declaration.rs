//! Declaration records delivered by the external parser
//!
//! A processing unit is one immutable batch of declarations: named formulas,
//! user-defined functions and user-defined types, each carrying identifier
//! spans and a parse-validity flag where applicable.

use crate::{Expr, TypeExpr};
use quill_diagnostics::{Span, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Merge operation named by a partial-formula attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartialOperation {
    /// Combine fragments with logical AND
    And,
    /// Combine fragments with logical OR
    Or,
    /// Combine fragments into a table union
    TableUnion,
    /// Combine fragments with a record merge
    RecordMerge,
    /// The attribute named an operation the parser did not recognize
    Unknown,
}

impl PartialOperation {
    /// Name of the combinator function the merger synthesizes for this operation
    pub const fn combinator(&self) -> Option<&'static str> {
        match self {
            PartialOperation::And => Some("And"),
            PartialOperation::Or => Some("Or"),
            PartialOperation::TableUnion => Some("Table"),
            PartialOperation::RecordMerge => Some("MergeRecords"),
            PartialOperation::Unknown => None,
        }
    }
}

impl fmt::Display for PartialOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialOperation::And => write!(f, "And"),
            PartialOperation::Or => write!(f, "Or"),
            PartialOperation::TableUnion => write!(f, "Table"),
            PartialOperation::RecordMerge => write!(f, "Record"),
            PartialOperation::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A partial-merge attribute on a named formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialAttribute {
    /// The merge operation this fragment requests
    pub operation: PartialOperation,
    /// Span of the attribute's operation token, used as the source anchor of
    /// the synthesized combining call
    pub operation_span: Span,
}

impl PartialAttribute {
    /// Create a new attribute
    pub const fn new(operation: PartialOperation, operation_span: Span) -> Self {
        Self {
            operation,
            operation_span,
        }
    }

    /// Check whether two attributes request the same operation
    pub fn same_operation(&self, other: &PartialAttribute) -> bool {
        self.operation == other.operation
    }
}

/// A named formula declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedFormula {
    /// Formula identifier (case-sensitive)
    pub ident: Spanned<String>,
    /// The formula body
    pub body: Expr,
    /// Byte offset of the declaration within the unit script
    pub source_offset: usize,
    /// Optional partial-merge attribute
    pub attribute: Option<PartialAttribute>,
}

impl NamedFormula {
    /// Create a named formula without an attribute
    pub fn new(ident: Spanned<String>, body: Expr, source_offset: usize) -> Self {
        Self {
            ident,
            body,
            source_offset,
            attribute: None,
        }
    }

    /// Attach a partial-merge attribute
    pub fn with_attribute(mut self, attribute: PartialAttribute) -> Self {
        self.attribute = Some(attribute);
        self
    }
}

/// One parameter of a user-defined function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdfArg {
    /// Parameter name
    pub name: Spanned<String>,
    /// Declared type name, resolved during validation
    pub type_name: Spanned<String>,
    /// Positional index within the parameter list
    pub index: usize,
}

impl UdfArg {
    /// Create a parameter record
    pub fn new(name: Spanned<String>, type_name: Spanned<String>, index: usize) -> Self {
        Self {
            name,
            type_name,
            index,
        }
    }
}

/// A user-defined function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Udf {
    /// Function identifier (case-sensitive)
    pub ident: Spanned<String>,
    /// Ordered parameter list
    pub args: Vec<UdfArg>,
    /// Declared return type name, resolved during validation
    pub return_type_name: Spanned<String>,
    /// The function body
    pub body: Expr,
    /// Whether the body allows side effects
    pub is_imperative: bool,
    /// Whether the upstream parser considered the declaration complete
    pub is_parse_valid: bool,
}

/// A user-defined type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Udt {
    /// Type identifier (case-sensitive)
    pub ident: Spanned<String>,
    /// The declared type expression
    pub type_expr: TypeExpr,
}

impl Udt {
    /// Create a type declaration
    pub fn new(ident: Spanned<String>, type_expr: TypeExpr) -> Self {
        Self { ident, type_expr }
    }
}

/// One processing unit's declarations, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationSet {
    /// Named formulas
    pub named_formulas: Vec<NamedFormula>,
    /// User-defined functions, complete and incomplete
    pub functions: Vec<Udf>,
    /// User-defined types
    pub types: Vec<Udt>,
}

impl DeclarationSet {
    /// Create an empty declaration set
    pub fn new() -> Self {
        Self::default()
    }
}
