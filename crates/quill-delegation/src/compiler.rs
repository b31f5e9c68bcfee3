//! Capability compilation
//!
//! Turns a connector's wire description into a [`TableCapabilityModel`].
//! Restriction maps are built first and always win: a column the service
//! marks non-filterable receives no filter grant no matter what else is
//! declared about it. Compound column entries are an explicit hard error;
//! data is never silently dropped.

use crate::capability::{capabilities_for_functions, DelegationCapability};
use crate::model::TableCapabilityModel;
use crate::paths::ColumnPath;
use crate::service::{ColumnCapability, ColumnCapabilityEntry, ServiceCapabilities};
use thiserror::Error;

/// Name of the synthetic sub-path carrying a choice column's value
pub const CHOICE_VALUE_SEGMENT: &str = "Value";

/// Hard failures while compiling a capability description
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The description used the compound per-property column shape
    #[error("compound capability shape on column '{column}' is not supported")]
    UnsupportedShape {
        /// The offending column name
        column: String,
    },
}

/// Compile a connector capability description into the table model
pub fn compile_capabilities(
    service: &ServiceCapabilities,
) -> Result<TableCapabilityModel, CapabilityError> {
    let mut model = TableCapabilityModel {
        pageable: service.is_pageable,
        delegatable: service.filter_restriction.is_some()
            || service.sort_restriction.is_some()
            || service.filter_functions.is_some(),
        ..TableCapabilityModel::default()
    };

    compile_restrictions(service, &mut model);

    for (column, entry) in &service.column_capabilities {
        match entry {
            ColumnCapabilityEntry::Simple(cap) => {
                compile_column(column, cap, &mut model);
            }
            ColumnCapabilityEntry::Compound(_) => {
                return Err(CapabilityError::UnsupportedShape {
                    column: column.clone(),
                });
            }
        }
    }

    if let Some(functions) = &service.filter_functions {
        model.table_capabilities = capabilities_for_functions(functions.iter().map(String::as_str))
            | DelegationCapability::FILTER;
    }
    if let Some(functions) = &service.filter_supported_functions {
        model.table_supported_capabilities = Some(
            capabilities_for_functions(functions.iter().map(String::as_str))
                | DelegationCapability::FILTER,
        );
    }

    log::debug!(
        "compiled capability model: {} restricted, {} granted, {} replacements",
        model.column_restrictions.len(),
        model.column_capabilities.len(),
        model.replacement_paths.len()
    );

    Ok(model)
}

/// Build the restriction maps; these always precede grants
fn compile_restrictions(service: &ServiceCapabilities, model: &mut TableCapabilityModel) {
    if let Some(filter) = &service.filter_restriction {
        for column in &filter.non_filterable_properties {
            restrict(model, column, DelegationCapability::FILTER);
        }
    }
    if let Some(sort) = &service.sort_restriction {
        for column in &sort.unsortable_properties {
            restrict(model, column, DelegationCapability::SORT);
        }
        for column in &sort.ascending_only_properties {
            restrict(model, column, DelegationCapability::SORT_ASCENDING_ONLY);
        }
    }
    if let Some(group) = &service.group_restriction {
        for column in &group.ungroupable_properties {
            restrict(model, column, DelegationCapability::GROUP);
        }
    }
}

fn restrict(model: &mut TableCapabilityModel, column: &str, bits: DelegationCapability) {
    *model
        .column_restrictions
        .entry(ColumnPath::root(column))
        .or_default() |= bits;
}

fn compile_column(column: &str, cap: &ColumnCapability, model: &mut TableCapabilityModel) {
    let path = ColumnPath::root(column);

    if let Some(functions) = &cap.filter_functions {
        let bits = capabilities_for_functions(functions.iter().map(String::as_str))
            | DelegationCapability::FILTER;

        // Restriction wins over grant
        if !model
            .column_restriction(&path)
            .contains(DelegationCapability::FILTER)
        {
            model.column_capabilities.insert(path.clone(), bits);
        }

        // Choice columns filter through their synthetic value sub-path
        if cap.is_choice {
            let value_path = path.append(CHOICE_VALUE_SEGMENT);
            if !model
                .column_restriction(&value_path)
                .contains(DelegationCapability::FILTER)
            {
                model.column_capabilities.insert(value_path, bits);
            }
        }
    }

    if cap.is_choice {
        // Queries against the value sub-path address the column itself
        model
            .replacement_paths
            .insert(path.append(CHOICE_VALUE_SEGMENT), path.clone());
    }

    if let Some(alias) = &cap.query_alias {
        model
            .replacement_paths
            .insert(path.clone(), replacement_for_alias(&path, alias));
    }
}

/// Resolve a query alias to the path the service expects
///
/// A slash-separated alias is a full replacement path from the root. A bare
/// alias is appended as a child of the column's existing path; this is a
/// compatibility shim for one connector family and is deliberately not
/// generalized.
fn replacement_for_alias(path: &ColumnPath, alias: &str) -> ColumnPath {
    if alias.contains('/') {
        ColumnPath::parse(alias)
    } else {
        path.append(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{
        CompoundColumnCapability, FilterRestriction, GroupRestriction, SortRestriction,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn simple(cap: ColumnCapability) -> ColumnCapabilityEntry {
        ColumnCapabilityEntry::Simple(cap)
    }

    fn restricted(kind: &str, column: &str) -> ServiceCapabilities {
        let mut service = ServiceCapabilities::default();
        match kind {
            "non-filterable" => {
                service.filter_restriction = Some(FilterRestriction {
                    non_filterable_properties: vec![column.into()],
                });
            }
            "unsortable" => {
                service.sort_restriction = Some(SortRestriction {
                    unsortable_properties: vec![column.into()],
                    ascending_only_properties: vec![],
                });
            }
            "ascending-only" => {
                service.sort_restriction = Some(SortRestriction {
                    unsortable_properties: vec![],
                    ascending_only_properties: vec![column.into()],
                });
            }
            "ungroupable" => {
                service.group_restriction = Some(GroupRestriction {
                    ungroupable_properties: vec![column.into()],
                });
            }
            other => panic!("unknown restriction kind {other}"),
        }
        service
    }

    #[rstest]
    #[case("non-filterable", DelegationCapability::FILTER)]
    #[case("unsortable", DelegationCapability::SORT)]
    #[case("ascending-only", DelegationCapability::SORT_ASCENDING_ONLY)]
    #[case("ungroupable", DelegationCapability::GROUP)]
    fn test_restriction_kinds_map_to_bits(
        #[case] kind: &str,
        #[case] bits: DelegationCapability,
    ) {
        let model = compile_capabilities(&restricted(kind, "notes")).unwrap();
        assert_eq!(model.column_restriction(&ColumnPath::root("notes")), bits);
        assert!(model
            .column_restriction(&ColumnPath::root("other"))
            .is_none());
    }

    #[test]
    fn test_restriction_wins_over_grant() {
        let mut service = ServiceCapabilities::default();
        service.filter_restriction = Some(FilterRestriction {
            non_filterable_properties: vec!["notes".into()],
        });
        service.column_capabilities.insert(
            "notes".into(),
            simple(ColumnCapability {
                filter_functions: Some(vec!["eq".into(), "contains".into()]),
                ..ColumnCapability::default()
            }),
        );

        let model = compile_capabilities(&service).unwrap();
        let path = ColumnPath::root("notes");
        assert!(model
            .column_restriction(&path)
            .contains(DelegationCapability::FILTER));
        assert!(!model.supports_filter_function(&path, "eq"));
        // No grant was recorded for the restricted column
        assert_eq!(
            model.column_capabilities.get(&path),
            None
        );
    }

    #[test]
    fn test_column_grant_includes_filter() {
        let mut service = ServiceCapabilities::default();
        service.column_capabilities.insert(
            "age".into(),
            simple(ColumnCapability {
                filter_functions: Some(vec!["lt".into(), "gt".into()]),
                ..ColumnCapability::default()
            }),
        );

        let model = compile_capabilities(&service).unwrap();
        let caps = model.column_capabilities(&ColumnPath::root("age"));
        assert!(caps.contains(
            DelegationCapability::FILTER
                | DelegationCapability::LESS_THAN
                | DelegationCapability::GREATER_THAN
        ));
        assert!(model.supports_filter_function(&ColumnPath::root("age"), "lt"));
        assert!(!model.supports_filter_function(&ColumnPath::root("age"), "eq"));
    }

    #[test]
    fn test_choice_column_value_subpath() {
        let mut service = ServiceCapabilities::default();
        service.column_capabilities.insert(
            "status".into(),
            simple(ColumnCapability {
                filter_functions: Some(vec!["eq".into()]),
                is_choice: true,
                ..ColumnCapability::default()
            }),
        );

        let model = compile_capabilities(&service).unwrap();
        let value_path = ColumnPath::parse("status/Value");
        assert!(model.supports_filter_function(&value_path, "eq"));
        assert_eq!(
            model.replacement_path(&value_path),
            Some(&ColumnPath::root("status"))
        );
    }

    #[test]
    fn test_table_wide_lists_compiled_independently() {
        let mut service = ServiceCapabilities::default();
        service.filter_functions = Some(vec!["eq".into(), "lt".into(), "gt".into()]);
        service.filter_supported_functions = Some(vec!["eq".into()]);

        let model = compile_capabilities(&service).unwrap();
        assert!(model
            .table_capabilities
            .contains(DelegationCapability::FILTER | DelegationCapability::LESS_THAN));
        assert_eq!(
            model.table_supported_capabilities,
            Some(DelegationCapability::FILTER | DelegationCapability::EQUAL)
        );

        // A column with no entry of its own answers from the narrower set
        let other = ColumnPath::root("anything");
        assert!(model.supports_filter_function(&other, "eq"));
        assert!(!model.supports_filter_function(&other, "lt"));
    }

    #[test]
    fn test_sort_and_group_restrictions() {
        let mut service = ServiceCapabilities::default();
        service.sort_restriction = Some(SortRestriction {
            unsortable_properties: vec!["notes".into()],
            ascending_only_properties: vec!["created".into()],
        });

        let model = compile_capabilities(&service).unwrap();
        assert!(!model.supports_sort(&ColumnPath::root("notes")));
        assert!(model.supports_sort(&ColumnPath::root("created")));
        assert!(model.sort_ascending_only(&ColumnPath::root("created")));
        assert!(model.supports_group(&ColumnPath::root("notes")));
        assert!(model.is_delegatable());
    }

    #[test]
    fn test_alias_slash_vs_bare() {
        let mut service = ServiceCapabilities::default();
        service.column_capabilities.insert(
            "owner".into(),
            simple(ColumnCapability {
                query_alias: Some("owner/id".into()),
                ..ColumnCapability::default()
            }),
        );
        service.column_capabilities.insert(
            "region".into(),
            simple(ColumnCapability {
                query_alias: Some("code".into()),
                ..ColumnCapability::default()
            }),
        );

        let model = compile_capabilities(&service).unwrap();
        assert_eq!(
            model.replacement_path(&ColumnPath::root("owner")),
            Some(&ColumnPath::parse("owner/id"))
        );
        // Bare alias appends as a child of the existing path
        assert_eq!(
            model.replacement_path(&ColumnPath::root("region")),
            Some(&ColumnPath::parse("region/code"))
        );
    }

    #[test]
    fn test_compound_shape_fails_loudly() {
        let mut service = ServiceCapabilities::default();
        service.column_capabilities.insert(
            "address".into(),
            ColumnCapabilityEntry::Compound(CompoundColumnCapability::default()),
        );

        let err = compile_capabilities(&service).unwrap_err();
        assert_eq!(
            err,
            CapabilityError::UnsupportedShape {
                column: "address".into()
            }
        );
    }

    #[test]
    fn test_empty_description_not_delegatable() {
        let model = compile_capabilities(&ServiceCapabilities::default()).unwrap();
        assert!(!model.is_delegatable());
        assert!(!model.is_pageable());
        assert!(model.column_capabilities(&ColumnPath::root("x")).is_none());
    }
}
