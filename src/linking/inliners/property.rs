use crate::base::Name;
use crate::model::SymbolData;
use crate::syntax::{AspectReferenceTargetKind, AssignOp, Stmt};

use super::super::analysis::ResolvedAspectReference;
use super::super::error::LinkerError;
use super::{
    InlineRequest, Inliner, assigned_local, declaration_prelude, declared_initializer,
    declared_local, expression_of, has_inlineable_receiver, is_reference_access,
    is_value_assignment, local_assignment, returned_value,
};

fn is_getter_reference(reference: &ResolvedAspectReference) -> bool {
    reference.target.target_kind == AspectReferenceTargetKind::PropertyGet
        && has_inlineable_receiver(reference)
}

/// `return this.P;`
pub struct PropertyGetReturnInliner;

impl Inliner for PropertyGetReturnInliner {
    fn name(&self) -> &'static str {
        "property get return"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, _target: &SymbolData) -> bool {
        is_getter_reference(reference)
            && returned_value(&reference.statement)
                .is_some_and(|value| is_reference_access(value, reference))
    }
}

/// `var x = this.P;`
pub struct PropertyGetLocalDeclarationInliner;

impl Inliner for PropertyGetLocalDeclarationInliner {
    fn name(&self) -> &'static str {
        "property get local declaration"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, _target: &SymbolData) -> bool {
        is_getter_reference(reference)
            && declared_initializer(&reference.statement)
                .is_some_and(|init| is_reference_access(init, reference))
    }

    fn return_variable(&self, statement: &Stmt) -> Option<Name> {
        declared_local(statement)
    }

    fn prelude(&self, request: &InlineRequest<'_>) -> Result<Option<Stmt>, LinkerError> {
        declaration_prelude(request)
    }
}

/// `x = this.P;`
pub struct PropertyGetAssignmentInliner;

impl Inliner for PropertyGetAssignmentInliner {
    fn name(&self) -> &'static str {
        "property get assignment"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, _target: &SymbolData) -> bool {
        is_getter_reference(reference)
            && local_assignment(&reference.statement)
                .is_some_and(|(_, value)| is_reference_access(value, reference))
    }

    fn return_variable(&self, statement: &Stmt) -> Option<Name> {
        assigned_local(statement)
    }
}

/// `this.P = value;`
pub struct PropertySetValueInliner;

impl Inliner for PropertySetValueInliner {
    fn name(&self) -> &'static str {
        "property set value"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        reference.target.target_kind == AspectReferenceTargetKind::PropertySet
            && has_inlineable_receiver(reference)
            && expression_of(&reference.statement).is_some_and(|expr| {
                is_value_assignment(expr, AssignOp::Assign, reference, target)
            })
    }
}
