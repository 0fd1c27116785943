//! Results of the analysis step, read by the linking step.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::base::SymbolId;
use crate::syntax::Block;

use super::super::introductions::IntroductionIndex;
use super::super::semantic::{
    InliningContextIdentifier, MethodSemantic, SemanticSet, SymbolSemantic,
};
use super::bodies::SyntheticBodies;
use super::inlineability::InlineabilityAnalysis;
use super::inlining::DestinationPlan;
use super::substitutions::{self, ContextSubstitutions};

/// Immutable once built; shared by every rewriting task.
#[derive(Debug)]
pub struct LinkerAnalysisRegistry {
    pub(super) reachable: SemanticSet,
    pub(super) inlineability: InlineabilityAnalysis,
    pub(super) bodies: SyntheticBodies,
    pub(super) plans: IndexMap<MethodSemantic, DestinationPlan, FxBuildHasher>,
    pub(super) substitutions: FxHashMap<InliningContextIdentifier, ContextSubstitutions>,
    pub(super) base_references: FxHashSet<SymbolId>,
}

impl LinkerAnalysisRegistry {
    pub fn is_reachable(&self, semantic: impl Into<SymbolSemantic>) -> bool {
        self.reachable.contains(semantic)
    }

    /// Every use of the semantic is inlined; it gets no member of its own.
    pub fn is_inlined(&self, semantic: impl Into<SymbolSemantic>) -> bool {
        self.inlineability.inlined().contains(semantic)
    }

    pub fn reachable(&self) -> &SemanticSet {
        &self.reachable
    }

    pub fn substitutions(
        &self,
        context: InliningContextIdentifier,
    ) -> Option<&ContextSubstitutions> {
        self.substitutions.get(&context)
    }

    pub fn has_any_substitutions(&self, destination: MethodSemantic) -> bool {
        substitutions::has_any(&self.substitutions, destination)
    }

    pub fn has_base_semantic_references(&self, symbol: SymbolId) -> bool {
        self.base_references.contains(&symbol)
    }

    pub fn body<'s>(
        &'s self,
        index: &IntroductionIndex<'s>,
        semantic: MethodSemantic,
    ) -> Option<&'s Block> {
        self.bodies.body(index, semantic)
    }

    pub fn plan(&self, destination: MethodSemantic) -> Option<&DestinationPlan> {
        self.plans.get(&destination)
    }

    /// Destinations in planning order.
    pub fn destinations(&self) -> impl Iterator<Item = MethodSemantic> + '_ {
        self.plans.keys().copied()
    }
}
