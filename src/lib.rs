//! # weaver-link
//!
//! Linking phase of an aspect weaver: composes the overrides contributed by
//! independent aspects into one program, removes the versions nothing calls
//! and inlines calls between versions wherever that is sound.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! linking   → Reachability, inlining plan, body rewriting, stub emission
//!   ↓
//! model     → Symbol table, introduction registry, structural comparer
//!   ↓
//! syntax    → Statement/expression tree, annotations, factory, printer
//!   ↓
//! base      → Primitives (NodeId, SymbolId, Name, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → model → linking)
// ============================================================================

/// Foundation types: node and symbol ids, names, text ranges
pub mod base;

/// Syntax: declarations, bodies, aspect reference annotations
pub mod syntax;

/// Semantic model: symbols, declarations and the introduction registry
pub mod model;

/// The linker itself
pub mod linking;

// Re-export foundation types
pub use base::{AspectLayerId, CompilationId, Name, NodeId, SymbolId, TextRange, TextSize};

// Re-export the entry point
pub use linking::{
    AspectLinker, Diagnostic, LinkerError, LinkerInput, LinkerOptions, LinkerOutput,
    SymbolSemantic, SymbolSemanticKind,
};
