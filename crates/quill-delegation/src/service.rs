//! Connector capability descriptions as delivered on the wire
//!
//! These structures mirror the JSON a tabular connector publishes about
//! itself. They are a faithful wire form, not a usable model; compilation
//! into a [`TableCapabilityModel`](crate::TableCapabilityModel) happens in
//! the compiler module.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A table's full capability description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceCapabilities {
    /// Per-column capability entries, keyed by root column name
    pub column_capabilities: IndexMap<String, ColumnCapabilityEntry>,
    /// Columns that may never be filtered on
    pub filter_restriction: Option<FilterRestriction>,
    /// Columns that may not be sorted, or only sorted ascending
    pub sort_restriction: Option<SortRestriction>,
    /// Columns that may not be grouped on
    pub group_restriction: Option<GroupRestriction>,
    /// Predicate functions every column supports
    pub filter_functions: Option<Vec<String>>,
    /// Table-wide supported predicate functions, a stricter subset
    ///
    /// Absent means "use the union of the declared support"; present means
    /// "use exactly this set" for columns without their own entry.
    pub filter_supported_functions: Option<Vec<String>>,
    /// Whether the table pages its results
    pub is_pageable: bool,
}

/// Filter restrictions for a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRestriction {
    /// Columns excluded from filtering entirely
    pub non_filterable_properties: Vec<String>,
}

/// Sort restrictions for a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortRestriction {
    /// Columns excluded from sorting entirely
    pub unsortable_properties: Vec<String>,
    /// Columns sortable in ascending direction only
    pub ascending_only_properties: Vec<String>,
}

/// Group restrictions for a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupRestriction {
    /// Columns excluded from grouping
    pub ungroupable_properties: Vec<String>,
}

/// One column's capability entry, a closed union of the shapes connectors emit
///
/// The compound shape (capabilities declared per sub-property) exists on the
/// wire but is not supported by compilation; it must be rejected explicitly,
/// never skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnCapabilityEntry {
    /// Capabilities declared per nested sub-property
    Compound(CompoundColumnCapability),
    /// Capabilities for the column itself
    Simple(ColumnCapability),
}

/// Capabilities of a single column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnCapability {
    /// Predicate functions this column supports
    pub filter_functions: Option<Vec<String>>,
    /// Alias the service expects in queries instead of the column name
    ///
    /// A slash in the alias makes it a full replacement path from the root;
    /// otherwise it is appended as a child of the column's path.
    pub query_alias: Option<String>,
    /// Whether the column holds choice (enumerated) values
    pub is_choice: bool,
}

/// The unsupported compound column shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundColumnCapability {
    /// Sub-property capabilities, keyed by property name
    pub properties: IndexMap<String, ColumnCapability>,
}
