//! Declaration validation ahead of binding
//!
//! Every user-defined function is checked against the naming, arity and type
//! rules before an unbound function value is constructed for it. A single
//! severe violation voids the whole declaration and excludes it from the
//! output; the rest of the batch always continues. Shadowing a built-in
//! function is allowed but warned about.

use quill_ast::Udf;
use quill_diagnostics::{Diagnostic, DiagnosticKind};
use quill_types::{is_restricted_type, FormulaType, NameResolver};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Maximum number of parameters a user-defined function may declare
pub const MAX_PARAMETER_COUNT: usize = 30;

/// Function names that may never be user-defined
pub static RESERVED_FUNCTION_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "Type",
        "IsType",
        "AsType",
        "Set",
        "Collect",
        "ClearCollect",
        "UpdateContext",
        "Navigate",
    ])
});

/// A function declaration that passed validation, with resolved types
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUdf {
    /// The original declaration
    pub udf: Udf,
    /// Resolved parameter types, indexed by parameter position
    pub param_types: Vec<FormulaType>,
    /// Resolved declared return type
    pub return_type: FormulaType,
}

/// Validate a unit's function declarations
///
/// `resolver` must already see the unit's resolved user-defined types.
/// Returns the surviving declarations in source order; all diagnostics,
/// including warnings on surviving declarations, are appended to
/// `diagnostics`.
pub fn validate_functions(
    udfs: &[Udf],
    resolver: &dyn NameResolver,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ValidatedUdf> {
    let mut validated = Vec::new();
    let mut defined: HashSet<&str> = HashSet::new();

    for udf in udfs {
        // Incomplete declarations were already reported upstream
        if !udf.is_parse_valid {
            continue;
        }

        let before = diagnostics.len();
        let name = udf.ident.inner.as_str();

        if RESERVED_FUNCTION_NAMES.contains(name) {
            diagnostics.push(Diagnostic::severe(
                DiagnosticKind::RestrictedName,
                format!("function name '{name}' is restricted"),
                udf.ident.span,
            ));
        } else if defined.contains(name) {
            diagnostics.push(Diagnostic::severe(
                DiagnosticKind::DuplicateName,
                format!("function '{name}' is already defined"),
                udf.ident.span,
            ));
        } else if resolver.lookup_function(name).is_some() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::ShadowsBuiltin,
                format!("function '{name}' shadows a built-in function"),
                udf.ident.span,
            ));
        }

        if udf.args.len() > MAX_PARAMETER_COUNT {
            diagnostics.push(Diagnostic::severe(
                DiagnosticKind::TooManyParameters,
                format!(
                    "function '{name}' declares {} parameters, the maximum is {MAX_PARAMETER_COUNT}",
                    udf.args.len()
                ),
                udf.ident.span,
            ));
        }

        let mut param_names: HashSet<&str> = HashSet::new();
        let mut param_types = Vec::with_capacity(udf.args.len());
        for arg in &udf.args {
            if !param_names.insert(arg.name.inner.as_str()) {
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::DuplicateParameter,
                    format!("parameter '{}' is declared more than once", arg.name.inner),
                    arg.name.span,
                ));
            }

            match resolver.lookup_type(&arg.type_name.inner) {
                Some(ty) if is_restricted_type(&ty) => {
                    diagnostics.push(Diagnostic::severe(
                        DiagnosticKind::InvalidParameterType,
                        format!(
                            "type '{}' is not allowed as a parameter type",
                            arg.type_name.inner
                        ),
                        arg.type_name.span,
                    ));
                }
                Some(ty) => param_types.push(ty),
                None => {
                    diagnostics.push(Diagnostic::severe(
                        DiagnosticKind::UnknownType,
                        format!("unknown type '{}'", arg.type_name.inner),
                        arg.type_name.span,
                    ));
                }
            }
        }

        let return_type = match resolver.lookup_type(&udf.return_type_name.inner) {
            Some(ty) if is_restricted_type(&ty) => {
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::InvalidReturnType,
                    format!(
                        "type '{}' is not allowed as a return type",
                        udf.return_type_name.inner
                    ),
                    udf.return_type_name.span,
                ));
                None
            }
            Some(ty) => Some(ty),
            None => {
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::UnknownType,
                    format!("unknown type '{}'", udf.return_type_name.inner),
                    udf.return_type_name.span,
                ));
                None
            }
        };

        let severe = diagnostics[before..].iter().any(Diagnostic::is_severe);
        if severe {
            continue;
        }

        defined.insert(name);
        validated.push(ValidatedUdf {
            udf: udf.clone(),
            param_types,
            // A missing return type always came with a severe diagnostic
            return_type: return_type.unwrap_or_default(),
        });
    }

    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_ast::{Expr, Literal, UdfArg};
    use quill_diagnostics::{Span, Spanned};
    use quill_types::SymbolTable;
    use rstest::rstest;

    fn sp(s: &str) -> Spanned<String> {
        Spanned::new(s.to_string(), Span::default())
    }

    fn udf(name: &str, args: &[(&str, &str)], ret: &str) -> Udf {
        Udf {
            ident: sp(name),
            args: args
                .iter()
                .enumerate()
                .map(|(i, (n, t))| UdfArg::new(sp(n), sp(t), i))
                .collect(),
            return_type_name: sp(ret),
            body: Expr::literal(Literal::Number(0.0), Span::default()),
            is_imperative: false,
            is_parse_valid: true,
        }
    }

    fn validate(udfs: &[Udf]) -> (Vec<ValidatedUdf>, Vec<Diagnostic>) {
        let table = SymbolTable::with_builtins();
        let mut diags = Vec::new();
        let ok = validate_functions(udfs, &table, &mut diags);
        (ok, diags)
    }

    #[test]
    fn test_valid_function_passes() {
        let (ok, diags) = validate(&[udf("Double", &[("x", "Number")], "Number")]);
        assert!(diags.is_empty());
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].param_types, vec![FormulaType::Number]);
        assert_eq!(ok[0].return_type, FormulaType::Number);
    }

    #[rstest]
    #[case("Set")]
    #[case("Navigate")]
    #[case("ClearCollect")]
    fn test_reserved_names_rejected(#[case] name: &str) {
        let (ok, diags) = validate(&[udf(name, &[], "Number")]);
        assert!(ok.is_empty());
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::RestrictedName));
    }

    #[test]
    fn test_duplicate_first_wins() {
        let (ok, diags) = validate(&[
            udf("F", &[("x", "Number")], "Number"),
            udf("F", &[("y", "Text")], "Text"),
        ]);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].param_types, vec![FormulaType::Number]);
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::DuplicateName));
    }

    #[test]
    fn test_shadowing_builtin_warns_but_keeps() {
        let (ok, diags) = validate(&[udf("Abs", &[("x", "Number")], "Number")]);
        assert_eq!(ok.len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::ShadowsBuiltin);
        assert!(!diags[0].is_severe());
    }

    #[test]
    fn test_too_many_parameters() {
        let args: Vec<(String, &str)> = (0..=MAX_PARAMETER_COUNT)
            .map(|i| (format!("p{i}"), "Number"))
            .collect();
        let borrowed: Vec<(&str, &str)> = args.iter().map(|(n, t)| (n.as_str(), *t)).collect();
        let (ok, diags) = validate(&[udf("Wide", &borrowed, "Number")]);
        assert!(ok.is_empty());
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::TooManyParameters));
    }

    #[test]
    fn test_duplicate_parameter() {
        let (ok, diags) = validate(&[udf("F", &[("x", "Number"), ("x", "Text")], "Number")]);
        assert!(ok.is_empty());
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::DuplicateParameter));
    }

    #[test]
    fn test_unknown_and_restricted_types() {
        let (ok, diags) = validate(&[
            udf("F", &[("x", "Widget")], "Number"),
            udf("G", &[("x", "Decimal")], "Number"),
            udf("H", &[("x", "Number")], "DateTimeNoTimeZone"),
        ]);
        assert!(ok.is_empty());
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::UnknownType));
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidParameterType));
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidReturnType));
    }

    #[test]
    fn test_parse_invalid_skipped_silently() {
        let mut bad = udf("F", &[], "Number");
        bad.is_parse_valid = false;
        let (ok, diags) = validate(&[bad]);
        assert!(ok.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_one_bad_declaration_never_aborts_batch() {
        let (ok, _) = validate(&[
            udf("Set", &[], "Number"),
            udf("Good", &[("x", "Text")], "Text"),
        ]);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].udf.ident.inner, "Good");
    }
}
