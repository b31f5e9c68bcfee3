//! User-defined functions, unbound and bound
//!
//! Binding is modeled as a type-state transition: an [`UserDefinedFunction`]
//! holds only immutable declaration data, and a consuming [`bind`] converts
//! it into a [`BoundUserDefinedFunction`]. Re-binding an already-bound value
//! is therefore impossible to express; a caller that needs a second binding
//! asks the bound value for a fresh copy via [`with_binding`].
//!
//! [`bind`]: UserDefinedFunction::bind
//! [`with_binding`]: BoundUserDefinedFunction::with_binding

use crate::binder::{bind_expr, BoundExpr, BoundExprKind};
use crate::validate::ValidatedUdf;
use quill_ast::{Expr, UdfArg};
use quill_diagnostics::{Diagnostic, DiagnosticKind, Spanned};
use quill_types::{ExternalDataSource, FormulaType, FunctionScopeResolver, NameResolver};

/// A validated, not yet bound user-defined function
#[derive(Debug, Clone, PartialEq)]
pub struct UserDefinedFunction {
    ident: Spanned<String>,
    args: Vec<UdfArg>,
    param_types: Vec<FormulaType>,
    return_type: FormulaType,
    body: Expr,
    is_imperative: bool,
}

impl UserDefinedFunction {
    /// Build an unbound function from a validated declaration
    pub fn from_validated(validated: ValidatedUdf) -> Self {
        Self {
            ident: validated.udf.ident,
            args: validated.udf.args,
            param_types: validated.param_types,
            return_type: validated.return_type,
            body: validated.udf.body,
            is_imperative: validated.udf.is_imperative,
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.ident.inner
    }

    /// Declared return type
    pub fn return_type(&self) -> &FormulaType {
        &self.return_type
    }

    /// Parameters in declaration order
    pub fn args(&self) -> &[UdfArg] {
        &self.args
    }

    /// Resolved parameter types, indexed by position
    pub fn param_types(&self) -> &[FormulaType] {
        &self.param_types
    }

    /// Whether the body allows side effects
    pub fn is_imperative(&self) -> bool {
        self.is_imperative
    }

    /// Positional index of a parameter by name
    pub fn arg_index(&self, name: &str) -> Option<usize> {
        self.args
            .iter()
            .find(|arg| arg.name.inner == name)
            .map(|arg| arg.index)
    }

    /// Bind the body against the global resolver, consuming the declaration
    ///
    /// Layers the parameter scope over `global`, binds the body, then checks
    /// the inferred type against the declared return type: an exact accept
    /// passes as-is, a legal coercion annotates the body root with the
    /// declared type, and anything else records a severe return-type
    /// diagnostic. Binding always completes.
    pub fn bind(self, global: &dyn NameResolver) -> BoundUserDefinedFunction {
        let scoped = FunctionScopeResolver::new(global, &self.args, &self.param_types);
        let mut body = bind_expr(&self.body, &scoped);
        let mut diagnostics = Vec::new();

        // An exact accept needs no annotation
        if !self.return_type.accepts(&body.ty) {
            if body.ty.coerces_to(&self.return_type) {
                body.coerced_type = Some(self.return_type.clone());
            } else {
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::ReturnTypeMismatch,
                    format!(
                        "the body of '{}' produces {}, the declared return type is {}",
                        self.ident.inner,
                        body.ty.kind_str(),
                        self.return_type.kind_str()
                    ),
                    self.body.span,
                ));
            }
        }

        BoundUserDefinedFunction {
            declaration: self,
            body,
            diagnostics,
        }
    }
}

/// A user-defined function with its bound, typed body
///
/// Immutable once constructed. The derived `is_async` / `is_pageable` /
/// `is_delegatable` characteristics are queries over the bound body, not
/// stored state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUserDefinedFunction {
    declaration: UserDefinedFunction,
    body: BoundExpr,
    diagnostics: Vec<Diagnostic>,
}

impl BoundUserDefinedFunction {
    /// Function name
    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    /// Declared return type
    pub fn return_type(&self) -> &FormulaType {
        self.declaration.return_type()
    }

    /// Positional index of a parameter by name
    pub fn arg_index(&self, name: &str) -> Option<usize> {
        self.declaration.arg_index(name)
    }

    /// The bound body
    pub fn body(&self) -> &BoundExpr {
        &self.body
    }

    /// Diagnostics recorded during binding
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any sub-expression requires asynchronous evaluation
    pub fn is_async(&self) -> bool {
        self.body.any(&|node| match &node.kind {
            BoundExprKind::Call { requires_async, .. } => *requires_async,
            BoundExprKind::DataSourceRead { source } => source.requires_async,
            _ => false,
        })
    }

    /// Whether any referenced data source pages its results
    pub fn is_pageable(&self) -> bool {
        self.body.any(&|node| match &node.kind {
            BoundExprKind::DataSourceRead { source } => source.pageable,
            _ => false,
        })
    }

    /// Whether any referenced data source supports delegation
    pub fn is_delegatable(&self) -> bool {
        self.body.any(&|node| match &node.kind {
            BoundExprKind::DataSourceRead { source } => source.delegatable,
            _ => false,
        })
    }

    /// The first external data source the body references, if any
    pub fn try_get_external_data_source(&self) -> Option<&ExternalDataSource> {
        self.body.find_data_source()
    }

    /// Produce a fresh binding of the same declaration data
    pub fn with_binding(&self, global: &dyn NameResolver) -> BoundUserDefinedFunction {
        self.declaration.clone().bind(global)
    }
}
