//! Partial-formula merging
//!
//! Named formulas sharing one identifier and tagged with a merge attribute
//! are fragments of a single logical formula. The merger groups formulas by
//! name, checks that every fragment of a group requests the same recognized
//! operation, renames the fragments to collision-proof synthetic identifiers
//! and synthesizes one formula under the original name whose body calls the
//! operation's combinator over the renamed fragments in declaration order.
//! An inconsistent group falls back to its unmerged members; there is no
//! partial merge.

use indexmap::IndexMap;
use quill_ast::{Expr, NamedFormula, PartialOperation};
use quill_diagnostics::{Diagnostic, DiagnosticKind, Spanned};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

// Distinguishes suffixes across units within one process
static SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Merge partial formula fragments into combined formulas
///
/// Formulas without same-named partial siblings pass through unchanged.
/// Diagnostics for inconsistent groups are appended to `diagnostics` and the
/// affected group is returned unmodified.
pub fn merge_partial_formulas(
    formulas: Vec<NamedFormula>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<NamedFormula> {
    let mut groups: IndexMap<String, Vec<NamedFormula>> = IndexMap::new();
    for formula in formulas {
        groups
            .entry(formula.ident.inner.clone())
            .or_default()
            .push(formula);
    }

    let mut output = Vec::new();
    for (name, group) in groups {
        if group.len() == 1 || group.iter().all(|f| f.attribute.is_none()) {
            output.extend(group);
            continue;
        }

        match check_group(&name, &group, diagnostics) {
            Some(operation) => output.extend(merge_group(&name, group, operation)),
            None => output.extend(group),
        }
    }

    output
}

/// Validate a multi-member group; on success return its shared operation
fn check_group(
    name: &str,
    group: &[NamedFormula],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PartialOperation> {
    let mut consistent = true;

    let first = group[0].attribute.as_ref();
    for formula in group {
        match &formula.attribute {
            None => {
                consistent = false;
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::PartialAttributeInconsistent,
                    format!("fragment of '{name}' is missing the partial attribute"),
                    formula.ident.span,
                ));
            }
            Some(attr) if attr.operation == PartialOperation::Unknown => {
                consistent = false;
                diagnostics.push(Diagnostic::severe(
                    DiagnosticKind::UnknownPartialOperation,
                    format!("fragment of '{name}' names an unknown merge operation"),
                    attr.operation_span,
                ));
            }
            Some(attr) => {
                if first.is_some_and(|f| !f.same_operation(attr)) {
                    consistent = false;
                }
            }
        }
    }

    // Operation mismatch: report every attributed fragment of the group
    if consistent {
        let operation = first?.operation;
        return Some(operation);
    }

    if group
        .iter()
        .filter_map(|f| f.attribute.as_ref())
        .any(|attr| first.is_some_and(|f| !f.same_operation(attr)))
    {
        for formula in group {
            if let Some(attr) = &formula.attribute {
                if attr.operation != PartialOperation::Unknown {
                    diagnostics.push(Diagnostic::severe(
                        DiagnosticKind::PartialAttributeInconsistent,
                        format!(
                            "fragment of '{name}' requests operation {}, other fragments disagree",
                            attr.operation
                        ),
                        attr.operation_span,
                    ));
                }
            }
        }
    }

    None
}

/// Rename fragments and synthesize the combining formula
fn merge_group(
    name: &str,
    group: Vec<NamedFormula>,
    operation: PartialOperation,
) -> Vec<NamedFormula> {
    // combinator() is Some for every operation check_group lets through
    let Some(combinator) = operation.combinator() else {
        return group;
    };

    let op_span = group[0]
        .attribute
        .as_ref()
        .map(|attr| attr.operation_span)
        .unwrap_or_default();
    let source_offset = group[0].source_offset;

    let suffix = format!(
        "{:x}_{}",
        process::id(),
        SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed)
    );

    let mut output = Vec::with_capacity(group.len() + 1);
    let mut references = Vec::with_capacity(group.len());

    for (ordinal, mut fragment) in group.into_iter().enumerate() {
        let renamed = format!("{name}_{suffix}_{ordinal}");
        references.push(Expr::ident(renamed.clone(), op_span));
        fragment.ident.inner = renamed;
        fragment.attribute = None;
        output.push(fragment);
    }

    // The combining call is anchored at the attribute's own token so that
    // diagnostics on the merged expression point at real source
    let body = Expr::call(
        Spanned::new(combinator.to_string(), op_span),
        references,
        op_span,
    );
    output.push(NamedFormula::new(
        Spanned::new(name.to_string(), op_span),
        body,
        source_offset,
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_ast::{ExprKind, Literal, PartialAttribute};
    use quill_diagnostics::Span;
    use rstest::rstest;

    fn fragment(name: &str, n: f64, op: Option<PartialOperation>) -> NamedFormula {
        let formula = NamedFormula::new(
            Spanned::new(name.to_string(), Span::default()),
            Expr::literal(Literal::Number(n), Span::default()),
            n as usize,
        );
        match op {
            Some(op) => formula.with_attribute(PartialAttribute::new(op, Span::new(1, 4))),
            None => formula,
        }
    }

    #[test]
    fn test_single_and_unattributed_pass_through() {
        let mut diags = Vec::new();
        let input = vec![
            fragment("A", 1.0, Some(PartialOperation::And)),
            fragment("B", 2.0, None),
            fragment("B", 3.0, None),
        ];
        let out = merge_partial_formulas(input.clone(), &mut diags);
        assert!(diags.is_empty());
        assert_eq!(out, input);
    }

    #[rstest]
    #[case(PartialOperation::And, "And")]
    #[case(PartialOperation::Or, "Or")]
    #[case(PartialOperation::TableUnion, "Table")]
    #[case(PartialOperation::RecordMerge, "MergeRecords")]
    fn test_merge_synthesizes_combinator(#[case] op: PartialOperation, #[case] combinator: &str) {
        let mut diags = Vec::new();
        let out = merge_partial_formulas(
            vec![fragment("F", 1.0, Some(op)), fragment("F", 2.0, Some(op))],
            &mut diags,
        );
        assert!(diags.is_empty());
        assert_eq!(out.len(), 3);

        let merged = &out[2];
        assert_eq!(merged.ident.inner, "F");
        match &merged.body.kind {
            ExprKind::Call { head, args } => {
                assert_eq!(head.inner, combinator);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_preserves_order_and_renames() {
        let mut diags = Vec::new();
        let out = merge_partial_formulas(
            vec![
                fragment("F", 1.0, Some(PartialOperation::And)),
                fragment("F", 2.0, Some(PartialOperation::And)),
                fragment("F", 3.0, Some(PartialOperation::And)),
            ],
            &mut diags,
        );

        // Fragments keep their bodies, in original order, under new names
        assert_eq!(out[0].body.kind, ExprKind::Literal(Literal::Number(1.0)));
        assert_eq!(out[2].body.kind, ExprKind::Literal(Literal::Number(3.0)));
        assert!(out[0].ident.inner.starts_with("F_"));
        assert!(out[0].ident.inner.ends_with("_0"));
        assert!(out[2].ident.inner.ends_with("_2"));
        assert!(out.iter().take(3).all(|f| f.attribute.is_none()));

        // The synthesized body references the renamed fragments in order
        let ExprKind::Call { args, .. } = &out[3].body.kind else {
            panic!("expected call");
        };
        for (arg, fragment) in args.iter().zip(&out[..3]) {
            assert_eq!(arg.kind, ExprKind::Ident(fragment.ident.inner.clone()));
        }
    }

    #[test]
    fn test_merged_call_anchored_at_attribute_span() {
        let mut diags = Vec::new();
        let out = merge_partial_formulas(
            vec![
                fragment("F", 1.0, Some(PartialOperation::Or)),
                fragment("F", 2.0, Some(PartialOperation::Or)),
            ],
            &mut diags,
        );
        assert_eq!(out[2].body.span, Span::new(1, 4));
        assert_eq!(out[2].source_offset, 1);
    }

    #[test]
    fn test_operation_mismatch_fails_whole_group() {
        let mut diags = Vec::new();
        let input = vec![
            fragment("G", 1.0, Some(PartialOperation::And)),
            fragment("G", 2.0, Some(PartialOperation::Or)),
        ];
        let out = merge_partial_formulas(input.clone(), &mut diags);

        assert_eq!(out, input);
        let inconsistent: Vec<_> = diags
            .iter()
            .filter(|d| d.kind == DiagnosticKind::PartialAttributeInconsistent)
            .collect();
        assert_eq!(inconsistent.len(), 2);
    }

    #[test]
    fn test_missing_attribute_fails_whole_group() {
        let mut diags = Vec::new();
        let input = vec![
            fragment("H", 1.0, Some(PartialOperation::And)),
            fragment("H", 2.0, None),
        ];
        let out = merge_partial_formulas(input.clone(), &mut diags);
        assert_eq!(out, input);
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::PartialAttributeInconsistent));
    }

    #[test]
    fn test_unknown_operation_fails_whole_group() {
        let mut diags = Vec::new();
        let input = vec![
            fragment("K", 1.0, Some(PartialOperation::Unknown)),
            fragment("K", 2.0, Some(PartialOperation::Unknown)),
        ];
        let out = merge_partial_formulas(input.clone(), &mut diags);
        assert_eq!(out, input);
        assert_eq!(
            diags
                .iter()
                .filter(|d| d.kind == DiagnosticKind::UnknownPartialOperation)
                .count(),
            2
        );
    }

    #[test]
    fn test_suffixes_unique_across_groups() {
        let mut diags = Vec::new();
        let out = merge_partial_formulas(
            vec![
                fragment("A", 1.0, Some(PartialOperation::And)),
                fragment("A", 2.0, Some(PartialOperation::And)),
                fragment("B", 3.0, Some(PartialOperation::Or)),
                fragment("B", 4.0, Some(PartialOperation::Or)),
            ],
            &mut diags,
        );
        let a0 = &out[0].ident.inner;
        let b0 = &out[3].ident.inner;
        assert_ne!(
            a0.trim_start_matches("A"),
            b0.trim_start_matches("B")
        );
    }
}
