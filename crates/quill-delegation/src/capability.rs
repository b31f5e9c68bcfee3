//! Delegation capability bits
//!
//! A [`DelegationCapability`] is a bitset of query operations a remote data
//! source can execute itself. Bits combine with bitwise OR and `NONE` is the
//! identity. Connector metadata names operations by predicate-function name
//! ("eq", "contains", ...); the fixed name-to-bit table here is the only
//! place those names are interpreted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::LazyLock;

/// A bitset of operations a remote source supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationCapability(u32);

impl DelegationCapability {
    /// No capability; identity of the union
    pub const NONE: Self = Self(0);
    /// Filtering in general
    pub const FILTER: Self = Self(1 << 0);
    /// Sorting in general
    pub const SORT: Self = Self(1 << 1);
    /// Sorting, ascending direction only
    pub const SORT_ASCENDING_ONLY: Self = Self(1 << 2);
    /// Grouping
    pub const GROUP: Self = Self(1 << 3);
    /// Equality predicate
    pub const EQUAL: Self = Self(1 << 4);
    /// Inequality predicate
    pub const NOT_EQUAL: Self = Self(1 << 5);
    /// Less-than predicate
    pub const LESS_THAN: Self = Self(1 << 6);
    /// Less-or-equal predicate
    pub const LESS_THAN_OR_EQUAL: Self = Self(1 << 7);
    /// Greater-than predicate
    pub const GREATER_THAN: Self = Self(1 << 8);
    /// Greater-or-equal predicate
    pub const GREATER_THAN_OR_EQUAL: Self = Self(1 << 9);
    /// Substring containment predicate
    pub const CONTAINS: Self = Self(1 << 10);
    /// Prefix predicate
    pub const STARTS_WITH: Self = Self(1 << 11);
    /// Suffix predicate
    pub const ENDS_WITH: Self = Self(1 << 12);
    /// Logical negation of a pushed-down predicate
    pub const NOT: Self = Self(1 << 13);
    /// Conjunction of pushed-down predicates
    pub const AND: Self = Self(1 << 14);
    /// Disjunction of pushed-down predicates
    pub const OR: Self = Self(1 << 15);
    /// Null/blank check predicate
    pub const NULL_CHECK: Self = Self(1 << 16);

    /// Raw bit pattern
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check whether every bit of `other` is set in `self`
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether any bit of `other` is set in `self`
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check whether no bit is set
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DelegationCapability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DelegationCapability {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DelegationCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Fixed predicate-function-name to capability-bit table
pub static FUNCTION_CAPABILITIES: LazyLock<IndexMap<&'static str, DelegationCapability>> =
    LazyLock::new(|| {
        IndexMap::from([
            ("eq", DelegationCapability::EQUAL),
            ("ne", DelegationCapability::NOT_EQUAL),
            ("lt", DelegationCapability::LESS_THAN),
            ("le", DelegationCapability::LESS_THAN_OR_EQUAL),
            ("gt", DelegationCapability::GREATER_THAN),
            ("ge", DelegationCapability::GREATER_THAN_OR_EQUAL),
            ("contains", DelegationCapability::CONTAINS),
            ("startswith", DelegationCapability::STARTS_WITH),
            ("endswith", DelegationCapability::ENDS_WITH),
            ("not", DelegationCapability::NOT),
            ("and", DelegationCapability::AND),
            ("or", DelegationCapability::OR),
            ("null", DelegationCapability::NULL_CHECK),
        ])
    });

/// Capability bit for a predicate-function name, if the name is known
pub fn capability_for_function(name: &str) -> Option<DelegationCapability> {
    FUNCTION_CAPABILITIES.get(name).copied()
}

/// Union of the capability bits for a list of predicate-function names
///
/// Unknown names contribute nothing; connectors routinely declare functions
/// this model does not track.
pub fn capabilities_for_functions<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> DelegationCapability {
    names
        .into_iter()
        .filter_map(capability_for_function)
        .fold(DelegationCapability::NONE, BitOr::bitor)
}
