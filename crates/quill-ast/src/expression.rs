//! Formula expression trees
//!
//! The expression grammar is intentionally small: the semantic core binds and
//! type-checks these nodes, it does not define the full surface language.

use quill_diagnostics::{Span, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal values appearing in formula bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Boolean literal
    Boolean(bool),
    /// Floating-point number literal
    Number(f64),
    /// Text literal
    Text(String),
    /// The blank (null) literal
    Blank,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(t) => write!(f, "\"{t}\""),
            Literal::Blank => write!(f, "Blank()"),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Negate,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Logical conjunction
    And,
    /// Logical disjunction
    Or,
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Equality comparison
    Eq,
    /// Inequality comparison
    Ne,
    /// Less-than comparison
    Lt,
    /// Less-or-equal comparison
    Le,
    /// Greater-than comparison
    Gt,
    /// Greater-or-equal comparison
    Ge,
    /// Text concatenation
    Concat,
}

impl BinaryOp {
    /// Check whether this operator compares its operands
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Check whether this operator is arithmetic
    pub const fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }
}

/// Arguments of a call
pub type CallArgs = Vec<Expr>;

/// An expression node with its source span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// The node kind
    pub kind: ExprKind,
    /// Source span of the node
    pub span: Span,
}

/// Expression node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Literal value
    Literal(Literal),
    /// Bare identifier reference
    Ident(String),
    /// Function call `Head(arg, ...)`
    Call {
        /// Function name
        head: Spanned<String>,
        /// Arguments in order
        args: CallArgs,
    },
    /// Record constructor `{ field: expr, ... }`
    Record {
        /// Fields in declaration order
        fields: Vec<(Spanned<String>, Expr)>,
    },
    /// Unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Create an expression node
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create a literal node
    pub fn literal(lit: Literal, span: Span) -> Self {
        Self::new(ExprKind::Literal(lit), span)
    }

    /// Create an identifier node
    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    /// Create a call node
    pub fn call(head: Spanned<String>, args: impl IntoIterator<Item = Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                head,
                args: args.into_iter().collect(),
            },
            span,
        )
    }

    /// Create a binary node spanning both operands
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        let span = lhs.span.merge(rhs.span);
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }
}
