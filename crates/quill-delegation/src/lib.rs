//! Delegation capability compilation
//!
//! A tabular connector describes what it can execute remotely: which columns
//! filter, sort or group, which predicate functions it understands, and how
//! column names translate into query paths. This crate compiles that wire
//! description into a [`TableCapabilityModel`] the binder queries when
//! deciding whether an operation can be pushed down instead of evaluated
//! locally.

mod capability;
mod compiler;
mod model;
mod paths;
mod service;

pub use capability::{
    capabilities_for_functions, capability_for_function, DelegationCapability,
    FUNCTION_CAPABILITIES,
};
pub use compiler::{compile_capabilities, CapabilityError, CHOICE_VALUE_SEGMENT};
pub use model::TableCapabilityModel;
pub use paths::ColumnPath;
pub use service::{
    ColumnCapability, ColumnCapabilityEntry, CompoundColumnCapability, FilterRestriction,
    GroupRestriction, ServiceCapabilities, SortRestriction,
};
