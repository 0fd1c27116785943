use crate::model::SymbolData;
use crate::syntax::{AspectReferenceTargetKind, AssignOp};

use super::super::analysis::ResolvedAspectReference;
use super::{Inliner, expression_of, has_inlineable_receiver, is_value_assignment};

fn is_accessor_statement(
    reference: &ResolvedAspectReference,
    target: &SymbolData,
    kind: AspectReferenceTargetKind,
    op: AssignOp,
) -> bool {
    reference.target.target_kind == kind
        && has_inlineable_receiver(reference)
        && expression_of(&reference.statement)
            .is_some_and(|expr| is_value_assignment(expr, op, reference, target))
}

/// `this.E += value;`
pub struct EventAddValueInliner;

impl Inliner for EventAddValueInliner {
    fn name(&self) -> &'static str {
        "event add value"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_accessor_statement(
            reference,
            target,
            AspectReferenceTargetKind::EventAdd,
            AssignOp::AddAssign,
        )
    }
}

/// `this.E -= value;`
pub struct EventRemoveValueInliner;

impl Inliner for EventRemoveValueInliner {
    fn name(&self) -> &'static str {
        "event remove value"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_accessor_statement(
            reference,
            target,
            AspectReferenceTargetKind::EventRemove,
            AssignOp::SubAssign,
        )
    }
}
