//! Expression binding
//!
//! Binding turns a syntax tree into a typed bound tree: identifiers resolve
//! to parameter reads, globals or data-source reads, calls resolve against
//! function signatures, constants fold, and every node carries an inferred
//! type. Binding never fails as control flow; unresolvable nodes bind to an
//! error node with the invalid type, which the return-type check downstream
//! turns into a diagnostic.

use quill_ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
use quill_diagnostics::Span;
use quill_types::{
    ExternalDataSource, FormulaType, NameResolver, NamedField, ReturnTypeRule, SymbolKind,
};
use serde::{Deserialize, Serialize};

/// A bound, typed expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundExpr {
    /// The bound node kind
    pub kind: BoundExprKind,
    /// Inferred type of the node
    pub ty: FormulaType,
    /// Source span carried over from the syntax node
    pub span: Span,
    /// Set when the downstream stage must coerce this node's value
    pub coerced_type: Option<FormulaType>,
}

/// Bound node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundExprKind {
    /// A constant value, literal or folded
    Constant(Literal),
    /// Read of a function parameter by positional index
    ParameterRead {
        /// Parameter name
        name: String,
        /// Positional index within the parameter list
        index: usize,
    },
    /// Read of a host-supplied global value
    GlobalRead {
        /// Global name
        name: String,
    },
    /// Reference to an external data source
    DataSourceRead {
        /// The referenced source
        source: ExternalDataSource,
    },
    /// A resolved call
    Call {
        /// Function name
        name: String,
        /// Bound arguments in order
        args: Vec<BoundExpr>,
        /// Whether the call requires asynchronous evaluation
        requires_async: bool,
    },
    /// A record constructor
    Record {
        /// Bound fields in declaration order
        fields: Vec<(String, BoundExpr)>,
    },
    /// A unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The bound operand
        operand: Box<BoundExpr>,
    },
    /// A binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Bound left operand
        lhs: Box<BoundExpr>,
        /// Bound right operand
        rhs: Box<BoundExpr>,
    },
    /// A node that did not resolve; carries the invalid type
    Error {
        /// The unresolved name, when the failure was a lookup
        name: Option<String>,
    },
}

impl BoundExpr {
    fn new(kind: BoundExprKind, ty: FormulaType, span: Span) -> Self {
        Self {
            kind,
            ty,
            span,
            coerced_type: None,
        }
    }

    fn error(name: Option<String>, span: Span) -> Self {
        Self::new(BoundExprKind::Error { name }, FormulaType::Invalid, span)
    }

    /// The constant literal, if this node folded to one
    pub fn as_constant(&self) -> Option<&Literal> {
        match &self.kind {
            BoundExprKind::Constant(lit) => Some(lit),
            _ => None,
        }
    }

    /// Check whether any node in this tree satisfies the predicate
    pub fn any(&self, pred: &impl Fn(&BoundExpr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match &self.kind {
            BoundExprKind::Call { args, .. } => args.iter().any(|a| a.any(pred)),
            BoundExprKind::Record { fields } => fields.iter().any(|(_, f)| f.any(pred)),
            BoundExprKind::Unary { operand, .. } => operand.any(pred),
            BoundExprKind::Binary { lhs, rhs, .. } => lhs.any(pred) || rhs.any(pred),
            _ => false,
        }
    }

    /// The first external data source referenced anywhere in this tree
    pub fn find_data_source(&self) -> Option<&ExternalDataSource> {
        if let BoundExprKind::DataSourceRead { source } = &self.kind {
            return Some(source);
        }
        match &self.kind {
            BoundExprKind::Call { args, .. } => args.iter().find_map(BoundExpr::find_data_source),
            BoundExprKind::Record { fields } => {
                fields.iter().find_map(|(_, f)| f.find_data_source())
            }
            BoundExprKind::Unary { operand, .. } => operand.find_data_source(),
            BoundExprKind::Binary { lhs, rhs, .. } => {
                lhs.find_data_source().or_else(|| rhs.find_data_source())
            }
            _ => None,
        }
    }
}

/// Bind an expression against a resolver
pub fn bind_expr(expr: &Expr, resolver: &dyn NameResolver) -> BoundExpr {
    match &expr.kind {
        ExprKind::Literal(lit) => BoundExpr::new(
            BoundExprKind::Constant(lit.clone()),
            literal_type(lit),
            expr.span,
        ),
        ExprKind::Ident(name) => bind_ident(name, expr.span, resolver),
        ExprKind::Call { head, args } => bind_call(head.inner.as_str(), head.span, args, expr.span, resolver),
        ExprKind::Record { fields } => {
            let bound: Vec<(String, BoundExpr)> = fields
                .iter()
                .map(|(name, field)| (name.inner.clone(), bind_expr(field, resolver)))
                .collect();
            let ty = FormulaType::record(
                bound
                    .iter()
                    .map(|(name, field)| NamedField::new(name.clone(), field.ty.clone())),
            );
            BoundExpr::new(BoundExprKind::Record { fields: bound }, ty, expr.span)
        }
        ExprKind::Unary { op, operand } => bind_unary(*op, operand, expr.span, resolver),
        ExprKind::Binary { op, lhs, rhs } => bind_binary(*op, lhs, rhs, expr.span, resolver),
    }
}

fn literal_type(lit: &Literal) -> FormulaType {
    match lit {
        Literal::Boolean(_) => FormulaType::Boolean,
        Literal::Number(_) => FormulaType::Number,
        Literal::Text(_) => FormulaType::Text,
        Literal::Blank => FormulaType::Blank,
    }
}

fn bind_ident(name: &str, span: Span, resolver: &dyn NameResolver) -> BoundExpr {
    match resolver.lookup(name) {
        Some(info) => {
            let kind = match info.kind {
                SymbolKind::Parameter { index } => BoundExprKind::ParameterRead {
                    name: name.to_string(),
                    index,
                },
                SymbolKind::DataSource(source) => BoundExprKind::DataSourceRead { source },
                SymbolKind::Global | SymbolKind::EnumValue => BoundExprKind::GlobalRead {
                    name: name.to_string(),
                },
            };
            BoundExpr::new(kind, info.ty, span)
        }
        None => BoundExpr::error(Some(name.to_string()), span),
    }
}

fn bind_call(
    name: &str,
    head_span: Span,
    args: &[Expr],
    span: Span,
    resolver: &dyn NameResolver,
) -> BoundExpr {
    let bound_args: Vec<BoundExpr> = args.iter().map(|a| bind_expr(a, resolver)).collect();

    let Some(signature) = resolver.lookup_function(name) else {
        return BoundExpr::error(Some(name.to_string()), head_span);
    };

    let ty = if !signature.accepts_arity(bound_args.len()) {
        FormulaType::Invalid
    } else {
        match &signature.return_rule {
            ReturnTypeRule::Fixed(ty) => ty.clone(),
            ReturnTypeRule::TableOfRecords => bound_args
                .first()
                .and_then(|arg| arg.ty.to_table())
                .unwrap_or(FormulaType::Invalid),
            ReturnTypeRule::MergedRecords => merge_record_types(&bound_args),
        }
    };

    BoundExpr::new(
        BoundExprKind::Call {
            name: name.to_string(),
            args: bound_args,
            requires_async: signature.requires_async,
        },
        ty,
        span,
    )
}

/// Merge the record shapes of all arguments; later fields win
fn merge_record_types(args: &[BoundExpr]) -> FormulaType {
    let mut fields: Vec<NamedField> = Vec::new();
    for arg in args {
        let Some(shape) = arg.ty.shape() else {
            return FormulaType::Invalid;
        };
        if matches!(arg.ty, FormulaType::Table(_)) {
            return FormulaType::Invalid;
        }
        for field in shape.fields() {
            if let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) {
                existing.ty = field.ty.clone();
            } else {
                fields.push(field.clone());
            }
        }
    }
    FormulaType::record(fields)
}

fn bind_unary(op: UnaryOp, operand: &Expr, span: Span, resolver: &dyn NameResolver) -> BoundExpr {
    let bound = bind_expr(operand, resolver);

    // Fold over constant operands
    if let Some(lit) = bound.as_constant() {
        match (op, lit) {
            (UnaryOp::Not, Literal::Boolean(b)) => {
                return BoundExpr::new(
                    BoundExprKind::Constant(Literal::Boolean(!b)),
                    FormulaType::Boolean,
                    span,
                );
            }
            (UnaryOp::Negate, Literal::Number(n)) => {
                return BoundExpr::new(
                    BoundExprKind::Constant(Literal::Number(-n)),
                    FormulaType::Number,
                    span,
                );
            }
            _ => {}
        }
    }

    let ty = match op {
        UnaryOp::Not if bound.ty == FormulaType::Boolean => FormulaType::Boolean,
        UnaryOp::Negate if matches!(bound.ty, FormulaType::Number | FormulaType::Decimal) => {
            bound.ty.clone()
        }
        _ => FormulaType::Invalid,
    };

    BoundExpr::new(
        BoundExprKind::Unary {
            op,
            operand: Box::new(bound),
        },
        ty,
        span,
    )
}

fn bind_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
    resolver: &dyn NameResolver,
) -> BoundExpr {
    let lhs = bind_expr(lhs, resolver);
    let rhs = bind_expr(rhs, resolver);

    if let Some(folded) = fold_binary(op, &lhs, &rhs) {
        let ty = literal_type(&folded);
        return BoundExpr::new(BoundExprKind::Constant(folded), ty, span);
    }

    let ty = binary_result_type(op, &lhs.ty, &rhs.ty);
    BoundExpr::new(
        BoundExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
        span,
    )
}

fn fold_binary(op: BinaryOp, lhs: &BoundExpr, rhs: &BoundExpr) -> Option<Literal> {
    let (a, b) = (lhs.as_constant()?, rhs.as_constant()?);
    match (op, a, b) {
        (BinaryOp::And, Literal::Boolean(x), Literal::Boolean(y)) => Some(Literal::Boolean(*x && *y)),
        (BinaryOp::Or, Literal::Boolean(x), Literal::Boolean(y)) => Some(Literal::Boolean(*x || *y)),
        (BinaryOp::Add, Literal::Number(x), Literal::Number(y)) => Some(Literal::Number(x + y)),
        (BinaryOp::Sub, Literal::Number(x), Literal::Number(y)) => Some(Literal::Number(x - y)),
        (BinaryOp::Mul, Literal::Number(x), Literal::Number(y)) => Some(Literal::Number(x * y)),
        // Division is never folded: runtime division-by-blank/zero semantics
        // belong to the evaluator
        (BinaryOp::Concat, Literal::Text(x), Literal::Text(y)) => {
            Some(Literal::Text(format!("{x}{y}")))
        }
        _ => None,
    }
}

fn binary_result_type(op: BinaryOp, lhs: &FormulaType, rhs: &FormulaType) -> FormulaType {
    if lhs.is_invalid() || rhs.is_invalid() {
        return FormulaType::Invalid;
    }

    if op.is_comparison() {
        return if lhs.coerces_to(rhs) || rhs.coerces_to(lhs) {
            FormulaType::Boolean
        } else {
            FormulaType::Invalid
        };
    }

    if op.is_arithmetic() {
        return match (lhs, rhs) {
            (FormulaType::Decimal, FormulaType::Decimal) => FormulaType::Decimal,
            (FormulaType::Number | FormulaType::Decimal | FormulaType::Blank, FormulaType::Number | FormulaType::Decimal | FormulaType::Blank) => {
                FormulaType::Number
            }
            _ => FormulaType::Invalid,
        };
    }

    match op {
        BinaryOp::And | BinaryOp::Or => {
            if lhs.coerces_to(&FormulaType::Boolean) && rhs.coerces_to(&FormulaType::Boolean) {
                FormulaType::Boolean
            } else {
                FormulaType::Invalid
            }
        }
        BinaryOp::Concat => {
            if lhs.coerces_to(&FormulaType::Text) && rhs.coerces_to(&FormulaType::Text) {
                FormulaType::Text
            } else {
                FormulaType::Invalid
            }
        }
        _ => FormulaType::Invalid,
    }
}
