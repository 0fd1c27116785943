//! Plain identifiers shared by every layer.
//!
//! All identifiers are small `Copy` newtypes. None of them carries any
//! semantic meaning on its own; the owning table (syntax tree, symbol table,
//! aspect layer list) gives them meaning.

use std::fmt;

/// Identity of a syntax node.
///
/// Node ids are allocated by [`SyntaxFactory`](crate::syntax::SyntaxFactory)
/// and are stable for the lifetime of a compilation, which makes them usable
/// as map keys for substitutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a declared program entity inside one [`Compilation`](crate::model::Compilation).
///
/// Raw equality is reference identity. Structural identity (generic
/// constructions collapsing onto their definition) goes through
/// [`SymbolComparer`](crate::model::SymbolComparer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym{}", self.0)
    }
}

/// Identity of a compilation context.
///
/// Two compilations never share cached analysis results, even when their
/// symbol ids happen to coincide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilationId(pub u32);

/// Ordinal of an aspect layer in the global aspect order.
///
/// Lower ordinals are applied first, i.e. they sit closer to the original
/// source code in an override chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AspectLayerId(pub u32);

impl fmt::Display for AspectLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer{}", self.0)
    }
}
