//! Analysis step: from the intermediate compilation to a substitution plan.
//!
//! Stages run in order, each one reading what the previous produced:
//!
//! 1. [`bodies`] - synthesize `Final` trampolines and `Base` empty bodies
//! 2. [`references`] - collect and resolve aspect references of every body (parallel)
//! 3. [`reachability`] - find the semantics that survive
//! 4. [`inlineability`] - choose the references replaced by their callee
//! 5. [`inlining`] - plan the inlinings of every destination (parallel)
//! 6. [`substitutions`] - turn plans into per-context node substitutions (parallel)

pub mod bodies;
pub mod body;
pub mod inlineability;
pub mod inlining;
pub mod reachability;
mod registry;
pub mod references;
pub mod resolver;
pub mod substitutions;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

pub use bodies::SyntheticBodies;
pub use body::{BodyAnalysis, BodyAnalyzer};
pub use inlineability::{InlineabilityAnalysis, InlineabilityAnalyzer};
pub use inlining::{DestinationPlan, InliningPlanner, InliningSpecification};
pub use reachability::ReachabilityAnalyzer;
pub use references::{ReceiverKind, ReferenceCache, ResolvedAspectReference};
pub use registry::LinkerAnalysisRegistry;
pub use resolver::AspectReferenceResolver;
pub use substitutions::{
    ContextSubstitutions, ReferenceRenaming, RenamedReceiver, ReturnSubstitution, Substitution,
};

use super::context::LinkerContext;
use super::error::LinkerError;
use super::semantic::{MethodSemantic, SemanticSet, SymbolSemantic, SymbolSemanticKind};

pub struct LinkerAnalysisStep;

impl LinkerAnalysisStep {
    pub fn run(
        ctx: &LinkerContext<'_>,
        additional_roots: &[SymbolSemantic],
    ) -> Result<LinkerAnalysisRegistry, LinkerError> {
        let _span = tracing::debug_span!("linker_analysis").entered();
        let index = &ctx.index;

        // Stage 1
        let bodies = SyntheticBodies::build(ctx);
        ctx.check_cancelled()?;

        // Stage 2
        let semantics = Self::semantics_with_bodies(ctx, &bodies);
        let reference_cache = ReferenceCache::default();
        let counts = ctx.map_items(&semantics, |semantic| {
            let Some(body) = bodies.body(index, *semantic) else {
                return Ok(0);
            };
            let resolver = AspectReferenceResolver::new(index);
            let collected = reference_cache.get_or_collect(*semantic, || {
                references::collect_references(&resolver, *semantic, body)
            });
            Ok(collected.len())
        })?;
        tracing::debug!(
            bodies = semantics.len(),
            references = counts.iter().sum::<usize>(),
            "aspect references collected"
        );

        // Stage 3
        let mut extra_roots = additional_roots.to_vec();
        for (semantic, count) in semantics.iter().zip(&counts) {
            let symbol = semantic.symbol();
            if *count > 0
                && semantic.kind() == SymbolSemanticKind::Default
                && !index.is_override(symbol)
                && !index.is_override_target(symbol)
            {
                extra_roots.push(semantic.semantic());
            }
        }
        let roots = reachability::collect_roots(ctx, &extra_roots);
        let reachable = ReachabilityAnalyzer::new(index, &reference_cache)
            .run(ctx, roots.iter().copied())?;
        let mut root_set = SemanticSet::new(ctx.comparer().clone());
        for root in roots {
            root_set.insert(root);
        }

        // Stage 4
        let inlineability =
            InlineabilityAnalyzer::new(ctx, &reference_cache, &bodies, &reachable, &root_set)
                .run()?;
        ctx.check_cancelled()?;

        // Stage 5
        let body_analyzer = BodyAnalyzer::default();
        let planner =
            InliningPlanner::new(ctx, &reference_cache, &bodies, &inlineability, &body_analyzer);
        let destinations = planner.destinations(&reachable);
        let plans = ctx.map_items(&destinations, |destination| planner.plan(*destination))?;
        tracing::debug!(destinations = plans.len(), "inlining planned");

        // Stage 6
        let generator = substitutions::SubstitutionGenerator::new(
            ctx,
            &reference_cache,
            &bodies,
            &inlineability,
            &body_analyzer,
        );
        let generated = ctx.map_items(&plans, |plan| generator.generate(plan))?;

        let mut context_substitutions = FxHashMap::default();
        let mut base_references = FxHashSet::default();
        for destination in generated {
            for diagnostic in destination.diagnostics {
                ctx.diagnostics.report(diagnostic);
            }
            base_references.extend(destination.base_references);
            context_substitutions.extend(destination.contexts);
        }

        let plans: IndexMap<MethodSemantic, DestinationPlan, FxBuildHasher> = plans
            .into_iter()
            .map(|plan| (plan.destination, plan))
            .collect();
        tracing::debug!(
            reachable = reachable.len(),
            inlined = inlineability.inlined().len(),
            contexts = context_substitutions.len(),
            "linker analysis finished"
        );

        Ok(LinkerAnalysisRegistry {
            reachable,
            inlineability,
            bodies,
            plans,
            substitutions: context_substitutions,
            base_references,
        })
    }

    /// Method semantics that have a body: declared `Default` bodies in
    /// symbol order, then the synthesized ones.
    fn semantics_with_bodies(
        ctx: &LinkerContext<'_>,
        bodies: &SyntheticBodies,
    ) -> Vec<MethodSemantic> {
        let index = &ctx.index;
        let compilation = ctx.compilation();
        let declared = compilation
            .symbols()
            .iter()
            .filter(|data| data.is_method_like() && ctx.comparer().canonical(data.id) == data.id)
            .map(|data| MethodSemantic::new(data.id, SymbolSemanticKind::Default))
            .filter(|semantic| bodies.get(*semantic).is_none())
            .filter(|semantic| bodies.body(index, *semantic).is_some());
        declared.chain(bodies.semantics()).collect()
    }
}
