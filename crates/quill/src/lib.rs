//! Quill: the semantic-analysis core of an embeddable formula language
//!
//! Quill turns user-authored declarations (named formulas, user-defined
//! functions, user-defined types) into validated, typed, bindable artifacts
//! and compiles connector capability metadata into the model a binder
//! consults for delegation decisions. Parsing and evaluation live outside
//! this workspace; declarations arrive as structured records and bound
//! functions leave as typed trees.
//!
//! The usual flow:
//!
//! 1. Feed a [`DeclarationSet`] to [`process_unit`], optionally with a host
//!    [`SymbolTable`] of globals, functions and type names.
//! 2. Bind each returned [`UserDefinedFunction`] with
//!    [`UserDefinedFunction::bind`].
//! 3. For each tabular connector, run [`compile_capabilities`] once and
//!    query the resulting [`TableCapabilityModel`] during binding.

pub use quill_ast::{
    BinaryOp, CallArgs, DeclarationSet, Expr, ExprKind, Literal, NamedFormula, PartialAttribute,
    PartialOperation, TypeExpr, TypeExprKind, Udf, UdfArg, Udt, UnaryOp,
};
pub use quill_delegation::{
    compile_capabilities, CapabilityError, ColumnCapability, ColumnCapabilityEntry, ColumnPath,
    DelegationCapability, ServiceCapabilities, TableCapabilityModel,
};
pub use quill_diagnostics::{Diagnostic, DiagnosticKind, Severity, Span, Spanned};
pub use quill_semantic::{
    bind_expr, merge_partial_formulas, process_unit, resolve_type_graph, validate_functions,
    BoundExpr, BoundExprKind, BoundUserDefinedFunction, TypeGraphResult, UserDefinedFunction,
    UserDefinedType, UserDefinitionResult, ValidatedUdf, MAX_PARAMETER_COUNT,
};
pub use quill_types::{
    is_restricted_type, ComposedResolver, ExternalDataSource, FormulaType, FunctionScopeResolver,
    FunctionSignature, NameLookupInfo, NameResolver, NamedField, RecordShape, ResolvedTypeTable,
    ReturnTypeRule, SymbolKind, SymbolTable, RESTRICTED_TYPES,
};
