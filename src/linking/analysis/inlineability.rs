//! Which aspect references are replaced by the body they call.

use rustc_hash::FxHashMap;

use crate::base::NodeId;
use crate::model::DeclarationFlags;

use super::super::context::LinkerContext;
use super::super::error::LinkerError;
use super::super::inliners::InlinerKind;
use super::super::semantic::{MethodSemantic, SemanticSet, SymbolSemanticKind};
use super::super::topo::topological_sort;
use super::bodies::SyntheticBodies;
use super::references::{ReferenceCache, ResolvedAspectReference};

#[derive(Clone, Debug)]
pub struct InlineabilityAnalysis {
    /// Inliner chosen for each inlined reference, keyed by the symbol source node.
    decisions: FxHashMap<NodeId, InlinerKind>,
    /// Semantics whose every use is inlined.
    inlined: SemanticSet,
}

impl InlineabilityAnalysis {
    pub fn inliner_for(&self, reference: &ResolvedAspectReference) -> Option<InlinerKind> {
        self.decisions.get(&reference.symbol_source_node).copied()
    }

    pub fn is_inlined(&self, semantic: MethodSemantic) -> bool {
        self.inlined.contains(semantic)
    }

    pub fn inlined(&self) -> &SemanticSet {
        &self.inlined
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

pub struct InlineabilityAnalyzer<'r, 'a> {
    ctx: &'r LinkerContext<'a>,
    references: &'r ReferenceCache,
    bodies: &'r SyntheticBodies,
    reachable: &'r SemanticSet,
    roots: &'r SemanticSet,
}

impl<'r, 'a> InlineabilityAnalyzer<'r, 'a> {
    pub fn new(
        ctx: &'r LinkerContext<'a>,
        references: &'r ReferenceCache,
        bodies: &'r SyntheticBodies,
        reachable: &'r SemanticSet,
        roots: &'r SemanticSet,
    ) -> Self {
        Self {
            ctx,
            references,
            bodies,
            reachable,
            roots,
        }
    }

    /// Reachable method semantics, in reachability order.
    fn reachable_methods(&self) -> Vec<MethodSemantic> {
        let compilation = self.ctx.compilation();
        self.reachable
            .iter()
            .filter_map(|semantic| semantic.as_method(compilation))
            .collect()
    }

    pub fn run(&self) -> Result<InlineabilityAnalysis, LinkerError> {
        let compilation = self.ctx.compilation();
        let callers = self.reachable_methods();

        // How many reachable references point at each method semantic.
        let mut reference_counts: FxHashMap<MethodSemantic, usize> = FxHashMap::default();
        for caller in &callers {
            for reference in self.references.get(*caller).iter() {
                if let Some(target) = reference.target_method(compilation) {
                    *reference_counts.entry(target).or_default() += 1;
                }
            }
        }

        let mut decisions = FxHashMap::default();
        let mut inlined = SemanticSet::new(self.ctx.comparer().clone());
        let mut edges: FxHashMap<MethodSemantic, Vec<MethodSemantic>> = FxHashMap::default();

        for caller in &callers {
            self.ctx.check_cancelled()?;
            for reference in self.references.get(*caller).iter() {
                let Some(target) = reference.target_method(compilation) else {
                    continue;
                };
                let count = reference_counts.get(&target).copied().unwrap_or_default();
                let Some(kind) = self.decide(*caller, target, count, reference) else {
                    continue;
                };
                tracing::trace!(caller = %caller, %target, inliner = %kind, "reference inlined");
                decisions.insert(reference.symbol_source_node, kind);
                inlined.insert(target);
                edges.entry(*caller).or_default().push(target);
            }
        }

        let sources: Vec<MethodSemantic> = callers
            .iter()
            .copied()
            .filter(|caller| edges.contains_key(caller))
            .collect();
        if let Err(cycle) = topological_sort(sources, |node| {
            edges.get(&node).cloned().unwrap_or_default()
        }) {
            let path = cycle
                .0
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(LinkerError::InliningCycle(path));
        }

        tracing::debug!(
            inlined_references = decisions.len(),
            inlined_semantics = inlined.len(),
            "inlineability analysis finished"
        );
        Ok(InlineabilityAnalysis { decisions, inlined })
    }

    fn decide(
        &self,
        caller: MethodSemantic,
        target: MethodSemantic,
        reachable_references: usize,
        reference: &ResolvedAspectReference,
    ) -> Option<InlinerKind> {
        let index = &self.ctx.index;
        let skip = |reason: &str| {
            tracing::trace!(%caller, %target, reason, "reference not inlined");
            None::<InlinerKind>
        };

        if !reference.is_inlineable() {
            return skip("not inlineable here");
        }
        if !self.reachable.contains(caller)
            || index
                .flags(caller.symbol())
                .contains(DeclarationFlags::NOT_INLINING_DESTINATION)
        {
            return skip("caller is not an inlining destination");
        }
        if target.kind() == SymbolSemanticKind::Final {
            return skip("final semantic");
        }
        if target == caller {
            return skip("recursive reference");
        }
        if self.bodies.body(index, target).is_none() {
            return skip("target has no body");
        }
        if !index.is_override(target.symbol()) && !index.is_override_target(target.symbol()) {
            return skip("target is not part of an override chain");
        }
        if index
            .flags(target.symbol())
            .contains(DeclarationFlags::NOT_INLINEABLE)
        {
            return skip("target is not inlineable");
        }
        if self.roots.contains(target) || self.roots.contains(reference.target.semantic) {
            return skip("target is a root");
        }
        if reachable_references != 1 {
            return skip("target has more than one reference");
        }
        if index.declaring_type(caller.symbol()) != index.declaring_type(target.symbol()) {
            return skip("declared in another type");
        }

        let target_data = index.symbol(target.symbol());
        match InlinerKind::select(reference, target_data) {
            Some(kind) => Some(kind),
            None => skip("no inliner for the statement shape"),
        }
    }
}
