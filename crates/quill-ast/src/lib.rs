//! Quill declaration records and expression trees
//!
//! Declarations (named formulas, user-defined functions, user-defined types)
//! are produced by an external parser and handed to the semantic core as the
//! immutable records defined here. This crate never parses script text.

mod declaration;
mod expression;
mod types;

pub use declaration::*;
pub use expression::*;
pub use types::*;
