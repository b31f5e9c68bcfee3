//! Quill diagnostics and source spans
//!
//! This crate provides the diagnostic infrastructure for the Quill semantic
//! core: byte-range spans, source locations, and typed diagnostics. Per the
//! core's error policy, recoverable conditions are reported as `Diagnostic`
//! values returned to the host, never thrown as control flow.

mod diagnostic;
mod span;

pub use diagnostic::*;
pub use span::*;
