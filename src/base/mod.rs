//! Foundation types for the weaver linker.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`NodeId`] - Stable syntax node identity
//! - [`SymbolId`], [`CompilationId`] - Symbol handles and their compilation context
//! - [`AspectLayerId`] - Ordinal of an aspect layer
//! - [`Name`] - Cheap-to-clone identifier text
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//!
//! This module has NO dependencies on other weaver modules.

mod ids;

pub use ids::{AspectLayerId, CompilationId, NodeId, SymbolId};

/// Identifier text (member names, locals, labels).
///
/// Most identifiers are short, so `SmolStr` keeps them inline.
pub type Name = smol_str::SmolStr;

// Re-export text-size types for convenience
pub use text_size;
pub use text_size::{TextRange, TextSize};
