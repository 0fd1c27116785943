//! Inlining plan of each destination.
//!
//! A destination is a semantic that is emitted as code of its own. Its body
//! is walked reference by reference; each inlined reference opens a new
//! context (a rendering of the callee inside this destination), which is
//! walked in turn. Ordinals are handed out in pre-order, so a context's
//! parent always has a smaller ordinal.
//!
//! Inlining is *simple* while every replaced statement is a `return` (or
//! the caller is a `Final` trampoline): the callee's returns can stay
//! returns. Anywhere else it is *complex*: returns store into a variable
//! and jump to a label placed after the inlined body. Complex mode is
//! inherited by every nested context.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{Name, NodeId};
use crate::syntax::walk;

use super::super::context::LinkerContext;
use super::super::error::LinkerError;
use super::super::inliners::InlinerKind;
use super::super::naming::NameScope;
use super::super::semantic::{
    InliningContextIdentifier, MethodSemantic, SemanticSet, SymbolSemanticKind,
};
use super::body::{BodyAnalysis, BodyAnalyzer};
use super::bodies::SyntheticBodies;
use super::inlineability::InlineabilityAnalysis;
use super::references::{ReferenceCache, ResolvedAspectReference};

#[derive(Clone, Debug)]
pub struct InliningSpecification {
    pub destination: MethodSemantic,
    /// Pre-order number of this inlining within the destination, from 1.
    pub ordinal: u32,
    /// Ordinal of the enclosing inlining; `None` for the destination body.
    pub parent_ordinal: Option<u32>,
    pub reference: ResolvedAspectReference,
    pub inliner: InlinerKind,
    /// Statement of the parent context that the inlined body replaces.
    pub replaced_statement: NodeId,
    pub simple: bool,
    /// Local receiving the callee's return value.
    pub return_variable: Option<Name>,
    /// Label returns jump to.
    pub return_label: Option<Name>,
    /// This inlining places `return_label` after its body. Otherwise the
    /// label belongs to an enclosing inlining.
    pub declares_label: bool,
    /// Every return jumps, including the ones at the end of the body.
    pub jump_on_every_return: bool,
    pub target: MethodSemantic,
    /// Renames of the callee's locals and labels within the destination.
    pub local_renames: FxHashMap<Name, Name>,
}

impl InliningSpecification {
    pub fn context(&self) -> InliningContextIdentifier {
        InliningContextIdentifier::inlined(self.destination, self.ordinal)
    }

    pub fn parent_context(&self) -> InliningContextIdentifier {
        match self.parent_ordinal {
            Some(ordinal) => InliningContextIdentifier::inlined(self.destination, ordinal),
            None => InliningContextIdentifier::root(self.destination),
        }
    }

    /// Whether a return of the callee at `statement` needs a jump.
    pub fn return_jumps(&self, analysis: &BodyAnalysis, statement: NodeId) -> bool {
        !self.simple && (self.jump_on_every_return || !analysis.flows_to_exit(statement))
    }
}

#[derive(Clone, Debug)]
pub struct DestinationPlan {
    pub destination: MethodSemantic,
    /// Inlinings in pre-order.
    pub inlinings: Vec<Arc<InliningSpecification>>,
}

impl DestinationPlan {
    /// Every context of the destination with the semantic rendered in it,
    /// the destination body first.
    pub fn contexts(
        &self,
    ) -> impl Iterator<Item = (InliningContextIdentifier, MethodSemantic)> + '_ {
        let root = InliningContextIdentifier::root(self.destination);
        std::iter::once((root, self.destination)).chain(
            self.inlinings
                .iter()
                .map(|inlining| (inlining.context(), inlining.target)),
        )
    }

    pub fn inlining(
        &self,
        context: InliningContextIdentifier,
    ) -> Option<&Arc<InliningSpecification>> {
        let ordinal = context.inlining_id?;
        self.inlinings
            .get(ordinal.checked_sub(1)? as usize)
            .filter(|inlining| inlining.ordinal == ordinal)
    }
}

struct Frame {
    context: InliningContextIdentifier,
    semantic: MethodSemantic,
    simple: bool,
    return_variable: Option<Name>,
    return_label: Option<Name>,
    jump_on_every_return: bool,
    renames: FxHashMap<Name, Name>,
    analysis: Arc<BodyAnalysis>,
}

struct PlanState {
    destination: MethodSemantic,
    scope: NameScope,
    next_ordinal: u32,
    inlinings: Vec<Arc<InliningSpecification>>,
}

pub struct InliningPlanner<'r, 'a> {
    ctx: &'r LinkerContext<'a>,
    references: &'r ReferenceCache,
    bodies: &'r SyntheticBodies,
    inlineability: &'r InlineabilityAnalysis,
    body_analyzer: &'r BodyAnalyzer,
}

impl<'r, 'a> InliningPlanner<'r, 'a> {
    pub fn new(
        ctx: &'r LinkerContext<'a>,
        references: &'r ReferenceCache,
        bodies: &'r SyntheticBodies,
        inlineability: &'r InlineabilityAnalysis,
        body_analyzer: &'r BodyAnalyzer,
    ) -> Self {
        Self {
            ctx,
            references,
            bodies,
            inlineability,
            body_analyzer,
        }
    }

    /// Reachable method semantics that are rendered on their own and have a
    /// body.
    ///
    /// An inlined accessor is still rendered when a sibling accessor of the
    /// same version keeps the property or event in the output.
    pub fn destinations(&self, reachable: &SemanticSet) -> Vec<MethodSemantic> {
        let index = &self.ctx.index;
        let compilation = index.compilation();
        let standalone = |method: MethodSemantic| {
            reachable.contains(method.semantic()) && !self.inlineability.is_inlined(method)
        };
        let member_kept = |method: MethodSemantic| {
            let data = index.symbol(method.symbol());
            let Some(owner) = data.associated_member.filter(|_| data.is_accessor()) else {
                return false;
            };
            index.symbol(owner).accessors.iter().any(|sibling| {
                method
                    .semantic()
                    .with_symbol(index.comparer().canonical(sibling))
                    .as_method(compilation)
                    .is_some_and(&standalone)
            })
        };

        reachable
            .iter()
            .filter_map(|semantic| semantic.as_method(compilation))
            .filter(|method| standalone(*method) || member_kept(*method))
            .filter(|method| self.bodies.body(index, *method).is_some())
            .collect()
    }

    pub fn plan(&self, destination: MethodSemantic) -> Result<DestinationPlan, LinkerError> {
        let index = &self.ctx.index;
        let body = self
            .bodies
            .body(index, destination)
            .ok_or_else(|| LinkerError::missing("body", destination))?;
        let parameters = &index.symbol(destination.symbol()).parameters;

        let mut state = PlanState {
            destination,
            scope: NameScope::for_body(parameters, body),
            next_ordinal: 0,
            inlinings: Vec::new(),
        };
        let root = Frame {
            context: InliningContextIdentifier::root(destination),
            semantic: destination,
            simple: true,
            return_variable: None,
            return_label: None,
            jump_on_every_return: false,
            renames: FxHashMap::default(),
            analysis: self.body_analyzer.analyze(destination, body),
        };
        self.plan_frame(&mut state, &root)?;

        tracing::trace!(%destination, inlinings = state.inlinings.len(), "destination planned");
        Ok(DestinationPlan {
            destination,
            inlinings: state.inlinings,
        })
    }

    fn plan_frame(&self, state: &mut PlanState, frame: &Frame) -> Result<(), LinkerError> {
        let index = &self.ctx.index;
        let compilation = index.compilation();

        for reference in self.references.get(frame.semantic).iter() {
            let Some(inliner) = self.inlineability.inliner_for(reference) else {
                continue;
            };
            let Some(target) = reference.target_method(compilation) else {
                continue;
            };
            let Some(target_body) = self.bodies.body(index, target) else {
                continue;
            };
            let target_analysis = self.body_analyzer.analyze(target, target_body);
            let replaced = &reference.statement;

            state.next_ordinal += 1;
            let ordinal = state.next_ordinal;
            let simple = frame.simple
                && (replaced.is_return() || frame.semantic.kind() == SymbolSemanticKind::Final);

            let mut declares_label = false;
            let mut jump_on_every_return = false;
            let (return_variable, return_label) = if simple {
                (None, None)
            } else if replaced.is_return() && !frame.simple {
                // The callee's value is the frame's value.
                let variable = frame.return_variable.clone();
                if frame.jump_on_every_return || !frame.analysis.flows_to_exit(replaced.id) {
                    let label = frame
                        .return_label
                        .clone()
                        .ok_or_else(|| LinkerError::missing("return label", frame.context))?;
                    jump_on_every_return = true;
                    (variable, Some(label))
                } else {
                    let label = self.allocate_label(state, &target_analysis);
                    declares_label = label.is_some();
                    (variable, label)
                }
            } else {
                let variable = inliner
                    .inliner()
                    .return_variable(replaced)
                    .map(|name| frame.renames.get(&name).cloned().unwrap_or(name));
                let label = self.allocate_label(state, &target_analysis);
                declares_label = label.is_some();
                (variable, label)
            };

            let mut renames = FxHashMap::default();
            // Arguments pass the caller's names through.
            for parameter in &index.symbol(target.symbol()).parameters {
                if let Some(renamed) = frame.renames.get(&parameter.name) {
                    renames.insert(parameter.name.clone(), renamed.clone());
                }
            }
            for name in walk::declared_locals(target_body)
                .into_iter()
                .chain(walk::declared_labels(target_body))
            {
                let fresh = state.scope.fresh_local(&name);
                if fresh != name {
                    renames.insert(name, fresh);
                }
            }

            let inlining = Arc::new(InliningSpecification {
                destination: state.destination,
                ordinal,
                parent_ordinal: frame.context.inlining_id,
                reference: reference.clone(),
                inliner,
                replaced_statement: replaced.id,
                simple,
                return_variable,
                return_label,
                declares_label,
                jump_on_every_return,
                target,
                local_renames: renames,
            });
            tracing::trace!(
                context = %inlining.context(),
                %target,
                simple,
                label = ?inlining.return_label,
                "inlining planned"
            );
            state.inlinings.push(Arc::clone(&inlining));

            let child = Frame {
                context: inlining.context(),
                semantic: target,
                simple,
                return_variable: inlining.return_variable.clone(),
                return_label: inlining.return_label.clone(),
                jump_on_every_return,
                renames: inlining.local_renames.clone(),
                analysis: target_analysis,
            };
            self.plan_frame(state, &child)?;
        }
        Ok(())
    }

    /// A fresh label when some return of the callee cannot fall through.
    fn allocate_label(&self, state: &mut PlanState, analysis: &BodyAnalysis) -> Option<Name> {
        analysis
            .has_non_exiting_return()
            .then(|| state.scope.fresh_label(&self.ctx.options.return_label_prefix))
    }
}
