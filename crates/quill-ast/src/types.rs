//! Type expressions for user-defined type declarations
//!
//! A UDT body is a type expression that may reference other UDT names,
//! externally supplied type names, or built-in primitive type names. Lowering
//! a type expression to a concrete structural type is the type graph
//! resolver's job; this module only carries the syntax.

use quill_diagnostics::{Span, Spanned};
use serde::{Deserialize, Serialize};

/// A type expression node with its source span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    /// The node kind
    pub kind: TypeExprKind,
    /// Source span of the node
    pub span: Span,
}

/// Type expression node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    /// A type name: a UDT, an external symbol, or a built-in primitive
    Name(String),
    /// Record type literal `{ field: Type, ... }`
    Record {
        /// Fields in declaration order
        fields: Vec<(Spanned<String>, TypeExpr)>,
    },
    /// Table type literal `[ElementType]` over a record element type
    Table {
        /// The element type expression
        element: Box<TypeExpr>,
    },
}

impl TypeExpr {
    /// Create a type expression node
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create a type name node
    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Self::new(TypeExprKind::Name(name.into()), span)
    }

    /// Create a record type node
    pub fn record(fields: Vec<(Spanned<String>, TypeExpr)>, span: Span) -> Self {
        Self::new(TypeExprKind::Record { fields }, span)
    }

    /// Create a table type node
    pub fn table(element: TypeExpr, span: Span) -> Self {
        Self::new(
            TypeExprKind::Table {
                element: Box::new(element),
            },
            span,
        )
    }

    /// Iterate over every type name referenced by this expression
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            TypeExprKind::Name(name) => out.push(name),
            TypeExprKind::Record { fields } => {
                for (_, field) in fields {
                    field.collect_names(out);
                }
            }
            TypeExprKind::Table { element } => element.collect_names(out),
        }
    }
}
