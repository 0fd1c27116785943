//! Linker tests
//!
//! End-to-end runs of the linker over small programs:
//! - Collapsing override chains into the final member
//! - Return labels of complex inlinings
//! - `_Source` and `_Empty` stubs, kept overrides
//! - Properties and events with storage semantics
//! - Diagnostics and cancellation

mod tests_analysis;
mod tests_diagnostics;
mod tests_linker;
mod tests_storage;
