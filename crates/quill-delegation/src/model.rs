//! The compiled per-table capability model
//!
//! Four independently addressable facets over one table: filter metadata,
//! sort metadata, group metadata and alias/path-replacement metadata. The
//! consuming binder queries this model by column path and predicate-function
//! name; it never sees the wire description.

use crate::capability::{capability_for_function, DelegationCapability};
use crate::paths::ColumnPath;
use indexmap::IndexMap;

/// Compiled capability facts for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCapabilityModel {
    /// Per-column restriction bits; a set bit forbids the operation
    pub(crate) column_restrictions: IndexMap<ColumnPath, DelegationCapability>,
    /// Per-column granted bits, already filtered against the restrictions
    pub(crate) column_capabilities: IndexMap<ColumnPath, DelegationCapability>,
    /// Table-wide bits granted to every column
    pub(crate) table_capabilities: DelegationCapability,
    /// Stricter table-wide set; absent means "use the table-wide union"
    pub(crate) table_supported_capabilities: Option<DelegationCapability>,
    /// Column-path replacements for query translation
    pub(crate) replacement_paths: IndexMap<ColumnPath, ColumnPath>,
    /// Whether the table pages its results
    pub(crate) pageable: bool,
    /// Whether the table declared any delegation metadata at all
    pub(crate) delegatable: bool,
}

impl TableCapabilityModel {
    /// Restriction bits for a column; `NONE` when unrestricted
    pub fn column_restriction(&self, path: &ColumnPath) -> DelegationCapability {
        self.column_restrictions
            .get(path)
            .copied()
            .unwrap_or(DelegationCapability::NONE)
    }

    /// Effective capability bits for a column
    ///
    /// A column-specific grant wins; otherwise the table-wide supported set
    /// applies when present, else the table-wide union.
    pub fn column_capabilities(&self, path: &ColumnPath) -> DelegationCapability {
        if let Some(caps) = self.column_capabilities.get(path) {
            return *caps;
        }
        self.table_supported_capabilities
            .unwrap_or(self.table_capabilities)
    }

    /// Check whether a predicate function can be pushed down on a column
    pub fn supports_filter_function(&self, path: &ColumnPath, function: &str) -> bool {
        if self
            .column_restriction(path)
            .contains(DelegationCapability::FILTER)
        {
            return false;
        }
        match capability_for_function(function) {
            Some(cap) => self.column_capabilities(path).contains(cap),
            None => false,
        }
    }

    /// Check whether a column can be sorted at all
    pub fn supports_sort(&self, path: &ColumnPath) -> bool {
        !self
            .column_restriction(path)
            .contains(DelegationCapability::SORT)
    }

    /// Check whether a column sorts ascending only
    pub fn sort_ascending_only(&self, path: &ColumnPath) -> bool {
        self.column_restriction(path)
            .contains(DelegationCapability::SORT_ASCENDING_ONLY)
    }

    /// Check whether a column can be grouped on
    pub fn supports_group(&self, path: &ColumnPath) -> bool {
        !self
            .column_restriction(path)
            .contains(DelegationCapability::GROUP)
    }

    /// The replacement path the service expects for a column, if any
    pub fn replacement_path(&self, path: &ColumnPath) -> Option<&ColumnPath> {
        self.replacement_paths.get(path)
    }

    /// Whether the table declared any delegation metadata
    pub fn is_delegatable(&self) -> bool {
        self.delegatable
    }

    /// Whether the table pages its results
    pub fn is_pageable(&self) -> bool {
        self.pageable
    }
}
