//! Semantic analysis of formula declarations
//!
//! One processing unit is an immutable batch of named formulas, user-defined
//! functions and user-defined types. [`process_unit`] runs the whole
//! pipeline: partial-formula merging, type graph resolution, declaration
//! validation and construction of unbound function values. Binding stays an
//! explicit per-function step; see [`UserDefinedFunction::bind`].

mod binder;
mod function;
mod merger;
mod type_graph;
mod validate;

pub use binder::{bind_expr, BoundExpr, BoundExprKind};
pub use function::{BoundUserDefinedFunction, UserDefinedFunction};
pub use merger::merge_partial_formulas;
pub use type_graph::{resolve_type_graph, TypeGraphResult, UserDefinedType};
pub use validate::{validate_functions, ValidatedUdf, MAX_PARAMETER_COUNT, RESERVED_FUNCTION_NAMES};

use quill_ast::{DeclarationSet, NamedFormula};
use quill_diagnostics::Diagnostic;
use quill_types::{ComposedResolver, NameResolver, ResolvedTypeTable, SymbolTable};

/// Everything one processing unit produces
#[derive(Debug)]
pub struct UserDefinitionResult {
    /// Unbound functions that survived validation, in source order
    pub functions: Vec<UserDefinedFunction>,
    /// Named formulas after partial merging
    pub formulas: Vec<NamedFormula>,
    /// Name/type table over the unit's resolved type declarations
    pub resolved_types: ResolvedTypeTable,
    /// Per-declaration records of the resolved type definitions
    pub user_defined_types: Vec<UserDefinedType>,
    /// All diagnostics, in processing order
    pub diagnostics: Vec<Diagnostic>,
}

/// Process one declaration unit
///
/// `external` supplies host-provided globals, functions and type names; the
/// unit's own type declarations take precedence over it, and built-in
/// primitives resolve last. The returned functions are unbound; callers bind
/// each one explicitly against a resolver of their choosing.
pub fn process_unit(
    declarations: DeclarationSet,
    external: Option<&dyn NameResolver>,
) -> UserDefinitionResult {
    let mut diagnostics = Vec::new();

    let formulas = merge_partial_formulas(declarations.named_formulas, &mut diagnostics);

    let graph = resolve_type_graph(&declarations.types, external);
    diagnostics.extend(graph.diagnostics);

    let builtins = SymbolTable::with_builtins();
    let mut layers: Vec<&dyn NameResolver> = vec![&graph.table];
    if let Some(external) = external {
        layers.push(external);
    }
    layers.push(&builtins);
    let resolver = ComposedResolver::new(layers);

    let functions = validate_functions(&declarations.functions, &resolver, &mut diagnostics)
        .into_iter()
        .map(UserDefinedFunction::from_validated)
        .collect();

    UserDefinitionResult {
        functions,
        formulas,
        resolved_types: graph.table,
        user_defined_types: graph.definitions,
        diagnostics,
    }
}
