//! Resolution of aspect references to the semantic they target.

use crate::base::SymbolId;
use crate::model::SymbolKind;
use crate::syntax::{
    AspectReferenceOrder, AspectReferenceSpecification, AspectReferenceTargetKind, AssignOp, Expr,
    SymbolBinding,
};

use super::super::introductions::IntroductionIndex;
use super::super::semantic::{AspectReferenceTarget, SymbolSemantic, SymbolSemanticKind};

pub struct AspectReferenceResolver<'r, 'a> {
    index: &'r IntroductionIndex<'a>,
}

impl<'r, 'a> AspectReferenceResolver<'r, 'a> {
    pub fn new(index: &'r IntroductionIndex<'a>) -> Self {
        Self { index }
    }

    /// Resolve an annotated member access.
    ///
    /// `assignment` is the operator when the access is the target of an
    /// assignment, which selects the setter or event accessor. Returns the
    /// referenced symbol with the resolved target, or `None` when the
    /// binding is missing or ambiguous.
    pub fn resolve(
        &self,
        expr: &Expr,
        specification: &AspectReferenceSpecification,
        assignment: Option<AssignOp>,
    ) -> Option<(SymbolId, AspectReferenceTarget)> {
        let Some(bound) = expr.binding.symbol() else {
            match &expr.binding {
                SymbolBinding::Candidates(candidates) => {
                    tracing::trace!(
                        node = %expr.id,
                        candidates = candidates.len(),
                        "ambiguous aspect reference dropped"
                    );
                }
                _ => tracing::trace!(node = %expr.id, "unbound aspect reference dropped"),
            }
            return None;
        };

        let index = self.index;
        let referenced = index.comparer().canonical(bound);
        let data = index.symbol(referenced);

        let (member, target_kind) = if data.is_accessor() {
            (index.member_of(referenced), index.target_kind_of(referenced))
        } else {
            let kind = match (data.kind, specification.target_kind, assignment) {
                (_, kind, _) if kind != AspectReferenceTargetKind::Itself => kind,
                (SymbolKind::Method(_), _, _) => AspectReferenceTargetKind::Itself,
                (SymbolKind::Property, _, Some(AssignOp::Assign)) => {
                    AspectReferenceTargetKind::PropertySet
                }
                (SymbolKind::Property, _, _) => AspectReferenceTargetKind::PropertyGet,
                (SymbolKind::Event, _, Some(AssignOp::SubAssign)) => {
                    AspectReferenceTargetKind::EventRemove
                }
                (SymbolKind::Event, _, _) => AspectReferenceTargetKind::EventAdd,
                (SymbolKind::Field | SymbolKind::NamedType, _, _) => {
                    tracing::trace!(
                        node = %expr.id,
                        symbol = %referenced,
                        "aspect reference to unversioned symbol dropped"
                    );
                    return None;
                }
            };
            (referenced, kind)
        };

        // An override stands for the member it overrides.
        let member = if index.is_override(member) {
            index.override_target(member)?
        } else {
            member
        };

        let semantic = self.resolve_member(member, target_kind, specification);
        tracing::trace!(
            node = %expr.id,
            %semantic,
            order = ?specification.order,
            "aspect reference resolved"
        );
        Some((referenced, AspectReferenceTarget::new(semantic, target_kind)))
    }

    fn resolve_member(
        &self,
        member: SymbolId,
        target_kind: AspectReferenceTargetKind,
        specification: &AspectReferenceSpecification,
    ) -> SymbolSemantic {
        let index = self.index;

        if !index.is_override_target(member) {
            return match specification.order {
                AspectReferenceOrder::Base if index.is_language_override(member) => {
                    index.semantic(member, SymbolSemanticKind::Base)
                }
                _ => index.semantic(member, SymbolSemanticKind::Default),
            };
        }

        // Overrides that declare the accessor being referenced.
        let declaring = index.with_target_kind(member, target_kind).unwrap_or(member);
        let last_override_before = |inclusive: bool| {
            index.overrides(declaring).into_iter().rev().find(|candidate| {
                index.layer(*candidate).is_some_and(|layer| {
                    if inclusive {
                        layer <= specification.layer
                    } else {
                        layer < specification.layer
                    }
                })
            })
        };

        let override_version = |candidate: SymbolId| {
            index.semantic(index.member_of(candidate), SymbolSemanticKind::Default)
        };

        match specification.order {
            AspectReferenceOrder::Base => self.base_semantic(member),
            AspectReferenceOrder::Previous => last_override_before(false)
                .map(override_version)
                .unwrap_or_else(|| self.base_semantic(member)),
            AspectReferenceOrder::Current => last_override_before(true)
                .map(override_version)
                .unwrap_or_else(|| self.base_semantic(member)),
            AspectReferenceOrder::Final => index.semantic(member, SymbolSemanticKind::Final),
        }
    }

    /// The version before any layer: the declaration's own code if it has
    /// any, the base implementation otherwise.
    fn base_semantic(&self, member: SymbolId) -> SymbolSemantic {
        let kind = if self.index.has_own_implementation(member) {
            SymbolSemanticKind::Default
        } else {
            SymbolSemanticKind::Base
        };
        self.index.semantic(member, kind)
    }
}
