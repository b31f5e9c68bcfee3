//! Quill structural type system
//!
//! This crate defines:
//! - [`FormulaType`], the structural (shape-based) type of a formula value
//! - the process-lifetime restricted-type set forbidden in UDF signatures
//! - [`ResolvedTypeTable`], the bidirectional name/type table with a
//!   monotonic version counter
//! - the [`NameResolver`] trait, the global [`SymbolTable`] and the layered
//!   [`FunctionScopeResolver`] that stacks a parameter scope on top of it

mod resolver;
mod restricted;
mod type_system;
mod type_table;

pub use resolver::*;
pub use restricted::*;
pub use type_system::*;
pub use type_table::*;
