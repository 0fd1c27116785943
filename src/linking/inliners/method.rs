use crate::base::Name;
use crate::model::SymbolData;
use crate::syntax::{AspectReferenceTargetKind, Stmt};

use super::super::analysis::ResolvedAspectReference;
use super::super::error::LinkerError;
use super::{
    InlineRequest, Inliner, assigned_local, declaration_prelude, declared_initializer,
    declared_local, expression_of, has_inlineable_receiver, is_pass_through_invocation,
    local_assignment, returned_value,
};

fn is_method_reference(reference: &ResolvedAspectReference) -> bool {
    reference.target.target_kind == AspectReferenceTargetKind::Itself
        && has_inlineable_receiver(reference)
}

/// `return this.M(a);`
pub struct MethodReturnInliner;

impl Inliner for MethodReturnInliner {
    fn name(&self) -> &'static str {
        "method return"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_method_reference(reference)
            && !target.returns_void()
            && returned_value(&reference.statement)
                .is_some_and(|value| is_pass_through_invocation(value, reference, target))
    }
}

/// `var x = this.M(a);`
pub struct MethodLocalDeclarationInliner;

impl Inliner for MethodLocalDeclarationInliner {
    fn name(&self) -> &'static str {
        "method local declaration"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_method_reference(reference)
            && !target.returns_void()
            && declared_initializer(&reference.statement)
                .is_some_and(|init| is_pass_through_invocation(init, reference, target))
    }

    fn return_variable(&self, statement: &Stmt) -> Option<Name> {
        declared_local(statement)
    }

    fn prelude(&self, request: &InlineRequest<'_>) -> Result<Option<Stmt>, LinkerError> {
        declaration_prelude(request)
    }
}

/// `x = this.M(a);` and `_ = this.M(a);`
pub struct MethodAssignmentInliner;

impl Inliner for MethodAssignmentInliner {
    fn name(&self) -> &'static str {
        "method assignment"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_method_reference(reference)
            && !target.returns_void()
            && local_assignment(&reference.statement)
                .is_some_and(|(_, value)| is_pass_through_invocation(value, reference, target))
    }

    fn return_variable(&self, statement: &Stmt) -> Option<Name> {
        assigned_local(statement)
    }
}

/// `this.M(a);`
pub struct MethodInvocationInliner;

impl Inliner for MethodInvocationInliner {
    fn name(&self) -> &'static str {
        "method invocation"
    }

    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool {
        is_method_reference(reference)
            && expression_of(&reference.statement)
                .is_some_and(|expr| is_pass_through_invocation(expr, reference, target))
    }
}
