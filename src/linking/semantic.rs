//! Symbol semantics: which version of a declaration a reference means.
//!
//! A declaration touched by aspects exists in up to three versions. The
//! [`Default`](SymbolSemanticKind::Default) version is the code written at
//! the declaration itself, [`Base`](SymbolSemanticKind::Base) is what the
//! member did before any override layer, and
//! [`Final`](SymbolSemanticKind::Final) is the fully composed member seen by
//! callers outside the aspect chain.

use std::fmt;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

use crate::base::SymbolId;
use crate::model::{Compilation, SymbolComparer};
use crate::syntax::AspectReferenceTargetKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolSemanticKind {
    Default,
    Base,
    Final,
}

impl fmt::Display for SymbolSemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolSemanticKind::Default => "Default",
            SymbolSemanticKind::Base => "Base",
            SymbolSemanticKind::Final => "Final",
        })
    }
}

/// A symbol paired with the version of it being referred to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolSemantic {
    pub symbol: SymbolId,
    pub kind: SymbolSemanticKind,
}

impl SymbolSemantic {
    pub fn new(symbol: SymbolId, kind: SymbolSemanticKind) -> Self {
        Self { symbol, kind }
    }

    pub fn default(symbol: SymbolId) -> Self {
        Self::new(symbol, SymbolSemanticKind::Default)
    }

    pub fn base(symbol: SymbolId) -> Self {
        Self::new(symbol, SymbolSemanticKind::Base)
    }

    pub fn final_(symbol: SymbolId) -> Self {
        Self::new(symbol, SymbolSemanticKind::Final)
    }

    /// Same version of another symbol (e.g. an accessor of this property).
    pub fn with_symbol(self, symbol: SymbolId) -> Self {
        Self { symbol, ..self }
    }

    /// The method-typed view, when the symbol is method-like.
    pub fn as_method(self, compilation: &Compilation) -> Option<MethodSemantic> {
        compilation
            .get_symbol(self.symbol)
            .filter(|data| data.is_method_like())
            .map(|_| MethodSemantic(self))
    }
}

impl fmt::Display for SymbolSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.symbol, self.kind)
    }
}

/// A [`SymbolSemantic`] whose symbol is a method, constructor or accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSemantic(SymbolSemantic);

impl MethodSemantic {
    /// Callers guarantee that `symbol` is method-like.
    pub(crate) fn new(symbol: SymbolId, kind: SymbolSemanticKind) -> Self {
        Self(SymbolSemantic::new(symbol, kind))
    }

    pub fn symbol(self) -> SymbolId {
        self.0.symbol
    }

    pub fn kind(self) -> SymbolSemanticKind {
        self.0.kind
    }

    pub fn semantic(self) -> SymbolSemantic {
        self.0
    }
}

impl From<MethodSemantic> for SymbolSemantic {
    fn from(method: MethodSemantic) -> Self {
        method.0
    }
}

impl fmt::Display for MethodSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What an aspect reference resolved to.
///
/// Accessors are normalized: `semantic` names the property or event and
/// `target_kind` the accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AspectReferenceTarget {
    pub semantic: SymbolSemantic,
    pub target_kind: AspectReferenceTargetKind,
}

impl AspectReferenceTarget {
    pub fn new(semantic: SymbolSemantic, target_kind: AspectReferenceTargetKind) -> Self {
        Self {
            semantic,
            target_kind,
        }
    }

    /// The semantic of the method the reference ends up invoking.
    pub fn method_semantic(&self, compilation: &Compilation) -> Option<MethodSemantic> {
        let symbol = if self.target_kind == AspectReferenceTargetKind::Itself {
            self.semantic.symbol
        } else {
            compilation
                .get_symbol(self.semantic.symbol)?
                .accessors
                .for_target_kind(self.target_kind)?
        };
        self.semantic.with_symbol(symbol).as_method(compilation)
    }
}

impl fmt::Display for AspectReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target_kind {
            AspectReferenceTargetKind::Itself => self.semantic.fmt(f),
            kind => write!(f, "{}.{}", self.semantic, kind.display()),
        }
    }
}

/// One rendering of a body: the destination it ends up in, and which
/// inlining (if any) put it there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InliningContextIdentifier {
    pub destination: MethodSemantic,
    pub inlining_id: Option<u32>,
}

impl InliningContextIdentifier {
    pub fn root(destination: MethodSemantic) -> Self {
        Self {
            destination,
            inlining_id: None,
        }
    }

    pub fn inlined(destination: MethodSemantic, inlining_id: u32) -> Self {
        Self {
            destination,
            inlining_id: Some(inlining_id),
        }
    }
}

impl fmt::Display for InliningContextIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inlining_id {
            Some(id) => write!(f, "{}#{}", self.destination, id),
            None => self.destination.fmt(f),
        }
    }
}

// ============================================================================
// STRUCTURAL COLLECTIONS
// ============================================================================

/// Insertion-ordered set of semantics compared through a [`SymbolComparer`].
#[derive(Clone, Debug)]
pub struct SemanticSet {
    comparer: SymbolComparer,
    items: IndexSet<SymbolSemantic, FxBuildHasher>,
}

impl SemanticSet {
    pub fn new(comparer: SymbolComparer) -> Self {
        Self {
            comparer,
            items: IndexSet::default(),
        }
    }

    fn canonical(&self, semantic: SymbolSemantic) -> SymbolSemantic {
        semantic.with_symbol(self.comparer.canonical(semantic.symbol))
    }

    /// Returns `true` if the semantic was not present.
    pub fn insert(&mut self, semantic: impl Into<SymbolSemantic>) -> bool {
        let semantic = self.canonical(semantic.into());
        self.items.insert(semantic)
    }

    pub fn contains(&self, semantic: impl Into<SymbolSemantic>) -> bool {
        self.items.contains(&self.canonical(semantic.into()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolSemantic> + '_ {
        self.items.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::CompilationId;
    use crate::model::{CompilationBuilder, MethodSpec};

    #[test]
    fn test_semantic_set_uses_structural_identity() {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let ty = builder.add_type("C");
        let m = builder.add_method(ty, MethodSpec::new("M"));
        let constructed = builder.add_constructed(m);
        let compilation = builder.build();

        let mut set = SemanticSet::new(SymbolComparer::for_compilation(&compilation));
        assert!(set.insert(SymbolSemantic::default(m)));
        assert!(!set.insert(SymbolSemantic::default(constructed)));
        assert!(set.contains(SymbolSemantic::default(constructed)));
        assert!(!set.contains(SymbolSemantic::final_(m)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_method_semantic_requires_method_symbol() {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let ty = builder.add_type("C");
        let m = builder.add_method(ty, MethodSpec::new("M"));
        let compilation = builder.build();

        assert!(SymbolSemantic::final_(m).as_method(&compilation).is_some());
        assert!(SymbolSemantic::default(ty).as_method(&compilation).is_none());
    }

    #[test]
    fn test_context_identifier_display() {
        let destination = MethodSemantic::new(SymbolId(2), SymbolSemanticKind::Final);
        assert_eq!(
            InliningContextIdentifier::inlined(destination, 3).to_string(),
            "sym2(Final)#3"
        );
        assert_eq!(InliningContextIdentifier::root(destination).to_string(), "sym2(Final)");
    }
}
