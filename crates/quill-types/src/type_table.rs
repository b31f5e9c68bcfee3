//! Bidirectional name/type table produced by type graph resolution
//!
//! The table is scoped to one processing unit. It is not safe for concurrent
//! mutation: at most one writer may register or remove types at a time, and
//! concurrent use requires external synchronization by the caller. Every
//! successful mutation bumps a monotonic version counter so dependent caches
//! can detect staleness without taking a lock.

use crate::{FormulaType, FunctionSignature, NameLookupInfo, NameResolver};
use indexmap::IndexMap;

/// Mapping from user-defined type names to resolved structural types
#[derive(Debug, Clone, Default)]
pub struct ResolvedTypeTable {
    by_name: IndexMap<String, FormulaType>,
    by_type: IndexMap<FormulaType, String>,
    version: u64,
}

impl ResolvedTypeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version; incremented on every successful mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a resolved type under a name
    ///
    /// Returns false (and leaves the table unchanged) if the name is already
    /// registered; existing entries are never silently overwritten.
    pub fn register_type(&mut self, name: impl Into<String>, ty: FormulaType) -> bool {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return false;
        }

        self.version += 1;
        self.by_type.entry(ty.clone()).or_insert_with(|| name.clone());
        self.by_name.insert(name, ty);
        true
    }

    /// Remove a registered type by name
    pub fn remove_type(&mut self, name: &str) -> bool {
        match self.by_name.shift_remove(name) {
            Some(ty) => {
                self.version += 1;
                if self.by_type.get(&ty).is_some_and(|n| n == name) {
                    self.by_type.shift_remove(&ty);
                }
                true
            }
            None => false,
        }
    }

    /// Register several types at once
    pub fn add_types(&mut self, types: impl IntoIterator<Item = (String, FormulaType)>) {
        for (name, ty) in types {
            self.register_type(name, ty);
        }
    }

    /// Look up a type by name
    pub fn try_lookup(&self, name: &str) -> Option<&FormulaType> {
        self.by_name.get(name)
    }

    /// Reverse lookup: the name a type was registered under
    pub fn try_get_type_name(&self, ty: &FormulaType) -> Option<&str> {
        self.by_type.get(ty).map(String::as_str)
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over name/type pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormulaType)> {
        self.by_name.iter().map(|(n, t)| (n.as_str(), t))
    }
}

impl NameResolver for ResolvedTypeTable {
    fn lookup(&self, _name: &str) -> Option<NameLookupInfo> {
        None
    }

    fn lookup_type(&self, name: &str) -> Option<FormulaType> {
        self.try_lookup(name).cloned()
    }

    fn lookup_function(&self, _name: &str) -> Option<&FunctionSignature> {
        None
    }
}
