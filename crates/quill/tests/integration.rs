//! Cross-crate flow: declarations through binding and delegation queries

use pretty_assertions::assert_eq;
use quill::{
    compile_capabilities, process_unit, ColumnPath, DeclarationSet, DiagnosticKind, Expr,
    ExternalDataSource, FormulaType, NamedField, NamedFormula, PartialAttribute, PartialOperation,
    ServiceCapabilities, Span, Spanned, SymbolTable, TypeExpr, Udf, UdfArg, Udt,
};

fn sp(s: &str) -> Spanned<String> {
    Spanned::new(s.to_string(), Span::default())
}

fn orders_schema() -> FormulaType {
    FormulaType::table([
        NamedField::new("id", FormulaType::Number),
        NamedField::new("status", FormulaType::Text),
    ])
}

#[test]
fn test_declarations_to_bound_function_over_data_source() {
    let mut host = SymbolTable::with_builtins();
    host.add_data_source(
        ExternalDataSource::new("Orders", orders_schema())
            .delegatable()
            .pageable(),
    );

    let mut decls = DeclarationSet::new();
    // type OrderList := [{ id: Number, status: Text }]
    decls.types.push(Udt::new(
        sp("OrderList"),
        TypeExpr::table(
            TypeExpr::record(
                vec![
                    (sp("id"), TypeExpr::name("Number", Span::default())),
                    (sp("status"), TypeExpr::name("Text", Span::default())),
                ],
                Span::default(),
            ),
            Span::default(),
        ),
    ));
    // AllOrders(): OrderList = Orders
    decls.functions.push(Udf {
        ident: sp("AllOrders"),
        args: vec![],
        return_type_name: sp("OrderList"),
        body: Expr::ident("Orders", Span::default()),
        is_imperative: false,
        is_parse_valid: true,
    });

    let result = process_unit(decls, Some(&host));
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.functions.len(), 1);

    let bound = result.functions.into_iter().next().unwrap().bind(&host);
    assert!(bound.diagnostics().is_empty());
    assert!(bound.is_delegatable());
    assert!(bound.is_pageable());
    assert!(bound.is_async());
    assert_eq!(
        bound.try_get_external_data_source().map(|s| s.name.as_str()),
        Some("Orders")
    );
}

#[test]
fn test_partial_formulas_merge_and_bind() {
    let mut decls = DeclarationSet::new();
    for offset in [0usize, 40] {
        decls.named_formulas.push(
            NamedFormula::new(
                sp("Eligible"),
                Expr::literal(quill::Literal::Boolean(true), Span::default()),
                offset,
            )
            .with_attribute(PartialAttribute::new(
                PartialOperation::And,
                Span::new(offset, offset + 3),
            )),
        );
    }

    let result = process_unit(decls, None);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.formulas.len(), 3);

    // The synthesized formula binds against the built-in combinators
    let merged = &result.formulas[2];
    assert_eq!(merged.ident.inner, "Eligible");
    let host = SymbolTable::with_builtins();
    let mut env = SymbolTable::with_builtins();
    for fragment in &result.formulas[..2] {
        let bound = quill::bind_expr(&fragment.body, &host);
        env.add_global(fragment.ident.inner.clone(), bound.ty);
    }
    let bound = quill::bind_expr(&merged.body, &env);
    assert_eq!(bound.ty, FormulaType::Boolean);
}

#[test]
fn test_capability_model_answers_binder_queries() {
    let json = r#"{
        "columnCapabilities": {
            "status": { "filterFunctions": ["eq", "ne"], "isChoice": true },
            "notes": { "filterFunctions": ["contains"] }
        },
        "filterRestriction": { "nonFilterableProperties": ["notes"] },
        "filterFunctions": ["eq"],
        "isPageable": true
    }"#;
    let service: ServiceCapabilities = serde_json::from_str(json).unwrap();
    let model = compile_capabilities(&service).unwrap();

    assert!(model.is_delegatable());
    assert!(model.is_pageable());

    // Grants survive where no restriction applies
    assert!(model.supports_filter_function(&ColumnPath::root("status"), "eq"));
    assert!(model.supports_filter_function(&ColumnPath::parse("status/Value"), "ne"));
    // Restriction wins over the declared whitelist
    assert!(!model.supports_filter_function(&ColumnPath::root("notes"), "contains"));
    // Unlisted columns answer from the table-wide set
    assert!(model.supports_filter_function(&ColumnPath::root("id"), "eq"));
    assert!(!model.supports_filter_function(&ColumnPath::root("id"), "lt"));
}

#[test]
fn test_diagnostics_surface_as_data() {
    let mut decls = DeclarationSet::new();
    decls.types.push(Udt::new(
        sp("Loop"),
        TypeExpr::record(
            vec![(sp("next"), TypeExpr::name("Loop", Span::default()))],
            Span::default(),
        ),
    ));
    decls.functions.push(Udf {
        ident: sp("Bad"),
        args: vec![UdfArg::new(sp("x"), sp("Loop"), 0)],
        return_type_name: sp("Number"),
        body: Expr::ident("x", Span::default()),
        is_imperative: false,
        is_parse_valid: true,
    });

    let result = process_unit(decls, None);
    assert!(result.functions.is_empty());
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::UnresolvedTypeDefinition));
    assert!(kinds.contains(&DiagnosticKind::UnknownType));
}
