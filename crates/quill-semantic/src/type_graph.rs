//! Type graph resolution
//!
//! User-defined types may reference each other in any declaration order, so
//! resolution runs as an iterative fixed-point over an arena of declarations
//! rather than recursive descent: each pass lowers every declaration whose
//! referenced names are all resolvable, and the loop stops when a pass makes
//! no progress. Cycles (including direct self-reference) terminate naturally
//! because no participant ever becomes resolvable; every leftover declaration
//! is reported as an invalid type definition and stays absent from the table.
//!
//! Name lookup inside a type expression checks locally-declared types first,
//! then the externally supplied symbol table, then built-in primitive type
//! names. First match wins.

use quill_ast::{TypeExpr, TypeExprKind, Udt};
use quill_diagnostics::{Diagnostic, DiagnosticKind};
use quill_types::{FormulaType, NameResolver, NamedField, ResolvedTypeTable};
use serde::{Deserialize, Serialize};

/// One successfully resolved user-defined type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDefinedType {
    /// Declared type name
    pub name: String,
    /// The resolved structural type
    pub ty: FormulaType,
    /// The original declared type expression
    pub type_expr: TypeExpr,
}

/// Output of resolving one unit's type declarations
#[derive(Debug, Clone, Default)]
pub struct TypeGraphResult {
    /// Name/type table over every resolved declaration
    pub table: ResolvedTypeTable,
    /// Per-declaration records for resolved types, in declaration order
    pub definitions: Vec<UserDefinedType>,
    /// One severe diagnostic per unresolved or duplicate declaration
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve a unit's UDT declarations to a fixed point
///
/// `external` supplies host-provided type names consulted after local
/// declarations and before built-in primitives.
pub fn resolve_type_graph(udts: &[Udt], external: Option<&dyn NameResolver>) -> TypeGraphResult {
    let mut result = TypeGraphResult::default();

    // Arena of pending declaration indices; duplicates never enter it
    let mut pending: Vec<usize> = Vec::with_capacity(udts.len());
    for (index, udt) in udts.iter().enumerate() {
        let dup = udts[..index]
            .iter()
            .any(|earlier| earlier.ident.inner == udt.ident.inner);
        if dup {
            result.diagnostics.push(Diagnostic::severe(
                DiagnosticKind::DuplicateName,
                format!("type '{}' is already defined", udt.ident.inner),
                udt.ident.span,
            ));
        } else {
            pending.push(index);
        }
    }

    let mut pass = 0usize;
    loop {
        pass += 1;
        let before = pending.len();

        pending.retain(|&index| {
            let udt = &udts[index];
            match lower_type_expr(&udt.type_expr, &result.table, external) {
                Some(ty) => {
                    result.table.register_type(udt.ident.inner.clone(), ty);
                    false
                }
                None => true,
            }
        });

        log::debug!(
            "type graph pass {pass}: {} resolved, {} pending",
            before - pending.len(),
            pending.len()
        );

        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    for &index in &pending {
        let udt = &udts[index];
        result.diagnostics.push(Diagnostic::severe(
            DiagnosticKind::UnresolvedTypeDefinition,
            format!("the definition of type '{}' is invalid", udt.ident.inner),
            udt.ident.span,
        ));
    }

    // Definition records in declaration order, skipping duplicates
    let mut seen = Vec::new();
    for udt in udts {
        if seen.contains(&udt.ident.inner.as_str()) {
            continue;
        }
        seen.push(udt.ident.inner.as_str());
        if let Some(ty) = result.table.try_lookup(&udt.ident.inner) {
            result.definitions.push(UserDefinedType {
                name: udt.ident.inner.clone(),
                ty: ty.clone(),
                type_expr: udt.type_expr.clone(),
            });
        }
    }

    result
}

/// Lower a type expression against the current table, or give up for this pass
///
/// Returns `None` whenever any referenced name is not yet resolvable; the
/// caller retries on the next pass.
fn lower_type_expr(
    expr: &TypeExpr,
    local: &ResolvedTypeTable,
    external: Option<&dyn NameResolver>,
) -> Option<FormulaType> {
    match &expr.kind {
        TypeExprKind::Name(name) => local
            .try_lookup(name)
            .cloned()
            .or_else(|| external.and_then(|ext| ext.lookup_type(name)))
            .or_else(|| FormulaType::from_primitive_name(name)),
        TypeExprKind::Record { fields } => {
            let mut lowered = Vec::with_capacity(fields.len());
            for (name, field_expr) in fields {
                let ty = lower_type_expr(field_expr, local, external)?;
                lowered.push(NamedField::new(name.inner.clone(), ty));
            }
            Some(FormulaType::record(lowered))
        }
        TypeExprKind::Table { element } => {
            let element_ty = lower_type_expr(element, local, external)?;
            element_ty.to_table()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_diagnostics::{Span, Spanned};
    use quill_types::SymbolTable;

    fn sp(s: &str) -> Spanned<String> {
        Spanned::new(s.to_string(), Span::default())
    }

    fn udt(name: &str, expr: TypeExpr) -> Udt {
        Udt::new(sp(name), expr)
    }

    fn name_expr(name: &str) -> TypeExpr {
        TypeExpr::name(name, Span::default())
    }

    fn record_expr(fields: &[(&str, TypeExpr)]) -> TypeExpr {
        TypeExpr::record(
            fields
                .iter()
                .map(|(n, e)| (sp(n), e.clone()))
                .collect(),
            Span::default(),
        )
    }

    #[test]
    fn test_acyclic_graph_fully_resolves() {
        // Declared out of dependency order on purpose
        let udts = vec![
            udt("Orders", TypeExpr::table(name_expr("Order"), Span::default())),
            udt(
                "Order",
                record_expr(&[("id", name_expr("Number")), ("customer", name_expr("Customer"))]),
            ),
            udt("Customer", record_expr(&[("name", name_expr("Text"))])),
        ];

        let result = resolve_type_graph(&udts, None);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.table.len(), 3);
        assert_eq!(result.definitions.len(), 3);

        let orders = result.table.try_lookup("Orders").unwrap();
        assert_eq!(orders.kind_str(), "Table");
    }

    #[test]
    fn test_cycle_leaves_all_participants_unresolved() {
        let udts = vec![
            udt("A", record_expr(&[("b", name_expr("B"))])),
            udt("B", record_expr(&[("a", name_expr("A"))])),
            udt("C", name_expr("Number")),
        ];

        let result = resolve_type_graph(&udts, None);
        assert_eq!(result.table.len(), 1);
        assert!(result.table.contains("C"));

        let unresolved: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnresolvedTypeDefinition)
            .collect();
        assert_eq!(unresolved.len(), 2);
    }

    #[test]
    fn test_self_reference_unresolved() {
        let udts = vec![udt("Loop", record_expr(&[("next", name_expr("Loop"))]))];
        let result = resolve_type_graph(&udts, None);
        assert!(result.table.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::UnresolvedTypeDefinition
        );
    }

    #[test]
    fn test_local_shadows_external_shadows_primitive() {
        let mut external = SymbolTable::new();
        external.add_type("Number", FormulaType::Text);
        external.add_type("Score", FormulaType::Decimal);

        let udts = vec![
            udt("Score", name_expr("Boolean")),
            udt("UsesBoth", record_expr(&[("n", name_expr("Number")), ("s", name_expr("Score"))])),
        ];

        let result = resolve_type_graph(&udts, Some(&external));
        assert!(result.diagnostics.is_empty());

        let shape = result.table.try_lookup("UsesBoth").unwrap().shape().unwrap().clone();
        // External wins over the primitive, local wins over external
        assert_eq!(shape.field("n"), Some(&FormulaType::Text));
        assert_eq!(shape.field("s"), Some(&FormulaType::Boolean));
    }

    #[test]
    fn test_duplicate_declaration_first_wins() {
        let udts = vec![
            udt("T", name_expr("Number")),
            udt("T", name_expr("Text")),
        ];
        let result = resolve_type_graph(&udts, None);
        assert_eq!(result.table.try_lookup("T"), Some(&FormulaType::Number));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::DuplicateName);
    }

    #[test]
    fn test_idempotent_contents() {
        let udts = vec![
            udt("P", record_expr(&[("x", name_expr("Number"))])),
            udt("Ps", TypeExpr::table(name_expr("P"), Span::default())),
        ];

        let first = resolve_type_graph(&udts, None);
        let second = resolve_type_graph(&udts, None);
        let a: Vec<_> = first.table.iter().map(|(n, t)| (n.to_string(), t.clone())).collect();
        let b: Vec<_> = second.table.iter().map(|(n, t)| (n.to_string(), t.clone())).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_table_over_primitive_is_invalid_definition() {
        let udts = vec![udt("Bad", TypeExpr::table(name_expr("Number"), Span::default()))];
        let result = resolve_type_graph(&udts, None);
        assert!(result.table.is_empty());
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::UnresolvedTypeDefinition
        );
    }
}
