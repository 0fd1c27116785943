//! Node substitutions per inlining context.
//!
//! The rewriter does not re-derive anything: every node it changes while
//! rendering a context is looked up here. When several substitutions target
//! the same node the first registered wins; inlinings are registered before
//! return rewrites so that a replaced `return this.M();` is inlined rather
//! than rewritten.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::{Name, NodeId, SymbolId};

use super::super::context::LinkerContext;
use super::super::diagnostics::{self, Diagnostic};
use super::super::error::LinkerError;
use super::super::naming::{empty_member_name, source_member_name};
use super::super::semantic::{InliningContextIdentifier, MethodSemantic, SymbolSemanticKind};
use super::body::BodyAnalyzer;
use super::bodies::SyntheticBodies;
use super::inlineability::InlineabilityAnalysis;
use super::inlining::{DestinationPlan, InliningSpecification};
use super::references::{ReceiverKind, ReferenceCache, ResolvedAspectReference};

#[derive(Clone, Debug)]
pub enum Substitution {
    /// Replace a statement with the inlined callee body.
    Inlining(Arc<InliningSpecification>),
    /// Replace a `return` of an inlined body.
    Return(ReturnSubstitution),
    /// Point an aspect reference at the member emitted for its target.
    Renaming(ReferenceRenaming),
}

/// `return e;` becomes `variable = e;` (or `_ = e;`) followed by `goto label;`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnSubstitution {
    pub variable: Option<Name>,
    pub goto: Option<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenamedReceiver {
    Keep,
    /// `base.Member`.
    Base,
    /// `((I)this).Member` for explicit interface implementations.
    InterfaceCast(Name),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceRenaming {
    pub name: Name,
    pub receiver: RenamedReceiver,
    /// The member the renamed access binds to.
    pub symbol: SymbolId,
}

#[derive(Clone, Debug, Default)]
pub struct ContextSubstitutions {
    nodes: FxHashMap<NodeId, Substitution>,
    local_renames: FxHashMap<Name, Name>,
}

impl ContextSubstitutions {
    pub fn get(&self, node: NodeId) -> Option<&Substitution> {
        self.nodes.get(&node)
    }

    pub fn local_rename(&self, name: &str) -> Option<&Name> {
        self.local_renames.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.local_renames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn insert(&mut self, node: NodeId, substitution: Substitution) {
        self.nodes.entry(node).or_insert(substitution);
    }
}

/// Substitutions of one destination.
#[derive(Debug, Default)]
pub struct DestinationSubstitutions {
    pub contexts: Vec<(InliningContextIdentifier, ContextSubstitutions)>,
    /// Members whose `Base` semantic is referenced and not inlined.
    pub base_references: FxHashSet<SymbolId>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct SubstitutionGenerator<'r, 'a> {
    ctx: &'r LinkerContext<'a>,
    references: &'r ReferenceCache,
    bodies: &'r SyntheticBodies,
    inlineability: &'r InlineabilityAnalysis,
    body_analyzer: &'r BodyAnalyzer,
}

impl<'r, 'a> SubstitutionGenerator<'r, 'a> {
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

    pub fn generate(
        &self,
        plan: &DestinationPlan,
    ) -> Result<DestinationSubstitutions, LinkerError> {
        let mut output = DestinationSubstitutions::default();

        for (context, semantic) in plan.contexts() {
            let mut substitutions = ContextSubstitutions::default();

            for inlining in &plan.inlinings {
                if inlining.parent_context() == context {
                    substitutions.insert(
                        inlining.replaced_statement,
                        Substitution::Inlining(Arc::clone(inlining)),
                    );
                }
            }

            if let Some(inlining) = plan.inlining(context) {
                self.add_returns(inlining, &mut substitutions)?;
                substitutions.local_renames = inlining.local_renames.clone();
            }

            for reference in self.references.get(semantic).iter() {
                if self.inlineability.inliner_for(reference).is_some() {
                    continue;
                }
                let renaming = self.renaming(reference, &mut output);
                substitutions.insert(
                    reference.symbol_source_node,
                    Substitution::Renaming(renaming),
                );
            }

            if !substitutions.is_empty() {
                output.contexts.push((context, substitutions));
            }
        }
        Ok(output)
    }

    fn add_returns(
        &self,
        inlining: &InliningSpecification,
        substitutions: &mut ContextSubstitutions,
    ) -> Result<(), LinkerError> {
        if inlining.simple {
            return Ok(());
        }
        let index = &self.ctx.index;
        let body = self
            .bodies
            .body(index, inlining.target)
            .ok_or_else(|| LinkerError::missing("body", inlining.target))?;
        let analysis = self.body_analyzer.analyze(inlining.target, body);

        for statement in &analysis.returns {
            let goto = if inlining.return_jumps(&analysis, *statement) {
                let label = inlining
                    .return_label
                    .clone()
                    .ok_or_else(|| LinkerError::missing("return label", inlining.context()))?;
                Some(label)
            } else {
                None
            };
            substitutions.insert(
                *statement,
                Substitution::Return(ReturnSubstitution {
                    variable: inlining.return_variable.clone(),
                    goto,
                }),
            );
        }
        Ok(())
    }

    /// The member a non-inlined reference ends up calling.
    fn renaming(
        &self,
        reference: &ResolvedAspectReference,
        output: &mut DestinationSubstitutions,
    ) -> ReferenceRenaming {
        let index = &self.ctx.index;
        let options = self.ctx.options;
        let target = reference.target.semantic;
        let member = target.symbol;
        let data = index.symbol(member);

        let interface_receiver = || match &data.explicit_interface {
            Some(interface) => RenamedReceiver::InterfaceCast(interface.clone()),
            None => RenamedReceiver::Keep,
        };

        match target.kind {
            SymbolSemanticKind::Final => ReferenceRenaming {
                name: data.name.clone(),
                receiver: interface_receiver(),
                symbol: member,
            },
            SymbolSemanticKind::Base if index.is_language_override(member) => {
                output.base_references.insert(member);
                if !matches!(reference.receiver, ReceiverKind::This | ReceiverKind::Base) {
                    output.diagnostics.push(
                        diagnostics::base_receiver_not_this(
                            &index.display_name(member),
                            &reference.receiver_text,
                        )
                        .with_symbol(member)
                        .with_node(reference.symbol_source_node)
                        .with_span(reference.span),
                    );
                }
                let overridden = data.overridden_member.unwrap_or(member);
                ReferenceRenaming {
                    name: index.symbol(overridden).name.clone(),
                    receiver: RenamedReceiver::Base,
                    symbol: overridden,
                }
            }
            SymbolSemanticKind::Base => {
                output.base_references.insert(member);
                ReferenceRenaming {
                    name: empty_member_name(&data.name, options),
                    receiver: RenamedReceiver::Keep,
                    symbol: member,
                }
            }
            SymbolSemanticKind::Default if index.is_override_target(member) => ReferenceRenaming {
                name: source_member_name(&data.name, options),
                receiver: RenamedReceiver::Keep,
                symbol: member,
            },
            SymbolSemanticKind::Default if index.is_override(member) => ReferenceRenaming {
                name: data.name.clone(),
                receiver: RenamedReceiver::Keep,
                symbol: member,
            },
            SymbolSemanticKind::Default => ReferenceRenaming {
                name: data.name.clone(),
                receiver: interface_receiver(),
                symbol: member,
            },
        }
    }
}

/// Whether any context of `destination` substitutes something.
pub(crate) fn has_any(
    substitutions: &FxHashMap<InliningContextIdentifier, ContextSubstitutions>,
    destination: MethodSemantic,
) -> bool {
    substitutions
        .iter()
        .any(|(context, substitutions)| {
            context.destination == destination && !substitutions.is_empty()
        })
}
