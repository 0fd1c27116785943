//! Inliners: statement shapes that can host an inlined body.
//!
//! Each inliner recognizes one shape of the statement containing an aspect
//! reference (`return this.M(a);`, `var x = this.P;`, `this.E += value;`,
//! ...) and produces the replacement statement once the callee body has been
//! rendered. The callee body always becomes a flattenable block; the
//! inliner decides what goes in front of it.

mod event;
mod method;
mod property;

use std::fmt;

use crate::base::Name;
use crate::model::SymbolData;
use crate::syntax::{AssignOp, Block, Expr, ExprKind, Stmt, StmtKind, SyntaxFactory};

use super::analysis::{InliningSpecification, ReceiverKind, ResolvedAspectReference};
use super::error::LinkerError;

pub use event::{EventAddValueInliner, EventRemoveValueInliner};
pub use method::{
    MethodAssignmentInliner, MethodInvocationInliner, MethodLocalDeclarationInliner,
    MethodReturnInliner,
};
pub use property::{
    PropertyGetAssignmentInliner, PropertyGetLocalDeclarationInliner, PropertyGetReturnInliner,
    PropertySetValueInliner,
};

/// Everything an inliner needs to produce the replacement statement.
pub struct InlineRequest<'r> {
    pub specification: &'r InliningSpecification,
    /// The statement being replaced, as it appears in the source body.
    pub statement: &'r Stmt,
    /// The callee body, already rendered in the inlining's own context.
    pub linked_body: Block,
    /// The method symbol being inlined.
    pub target: &'r SymbolData,
    pub factory: &'r SyntaxFactory,
}

pub trait Inliner: Sync {
    fn name(&self) -> &'static str;

    /// Whether the statement around `reference` has this inliner's shape.
    fn can_inline(&self, reference: &ResolvedAspectReference, target: &SymbolData) -> bool;

    /// The local the callee's return value is stored in, if any.
    fn return_variable(&self, _statement: &Stmt) -> Option<Name> {
        None
    }

    /// Statement placed before the inlined body.
    fn prelude(&self, _request: &InlineRequest<'_>) -> Result<Option<Stmt>, LinkerError> {
        Ok(None)
    }

    /// `{ prelude; { body } label: ; }`, all flattenable.
    fn inline(&self, request: InlineRequest<'_>) -> Result<Stmt, LinkerError> {
        let f = request.factory;
        let specification = request.specification;

        let mut statements = Vec::with_capacity(3);
        if let Some(prelude) = self.prelude(&request)? {
            statements.push(prelude);
        }
        let body = Block {
            flattenable: true,
            ..request.linked_body
        };
        statements.push(f.block_stmt(body));
        if specification.declares_label {
            let label = specification.return_label.clone().ok_or_else(|| {
                LinkerError::missing("return label", specification.context())
            })?;
            statements.push(f.labeled(label, f.empty()));
        }

        let mut replacement = f.block_stmt(f.flattenable_block(statements));
        replacement.trivia = request.statement.trivia.clone();
        Ok(replacement)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InlinerKind {
    MethodReturn,
    MethodLocalDeclaration,
    MethodAssignment,
    MethodInvocation,
    PropertyGetReturn,
    PropertyGetLocalDeclaration,
    PropertyGetAssignment,
    PropertySetValue,
    EventAddValue,
    EventRemoveValue,
}

impl InlinerKind {
    /// Every inliner, in the order they are tried.
    pub const ALL: [InlinerKind; 10] = [
        InlinerKind::MethodReturn,
        InlinerKind::MethodLocalDeclaration,
        InlinerKind::MethodAssignment,
        InlinerKind::MethodInvocation,
        InlinerKind::PropertyGetReturn,
        InlinerKind::PropertyGetLocalDeclaration,
        InlinerKind::PropertyGetAssignment,
        InlinerKind::PropertySetValue,
        InlinerKind::EventAddValue,
        InlinerKind::EventRemoveValue,
    ];

    pub fn inliner(self) -> &'static dyn Inliner {
        match self {
            InlinerKind::MethodReturn => &MethodReturnInliner,
            InlinerKind::MethodLocalDeclaration => &MethodLocalDeclarationInliner,
            InlinerKind::MethodAssignment => &MethodAssignmentInliner,
            InlinerKind::MethodInvocation => &MethodInvocationInliner,
            InlinerKind::PropertyGetReturn => &PropertyGetReturnInliner,
            InlinerKind::PropertyGetLocalDeclaration => &PropertyGetLocalDeclarationInliner,
            InlinerKind::PropertyGetAssignment => &PropertyGetAssignmentInliner,
            InlinerKind::PropertySetValue => &PropertySetValueInliner,
            InlinerKind::EventAddValue => &EventAddValueInliner,
            InlinerKind::EventRemoveValue => &EventRemoveValueInliner,
        }
    }

    /// The first inliner claiming the shape of `reference`.
    pub fn select(reference: &ResolvedAspectReference, target: &SymbolData) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.inliner().can_inline(reference, target))
    }
}

impl fmt::Display for InlinerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inliner().name())
    }
}

// ============================================================================
// SHAPE HELPERS
// ============================================================================

/// Inlining needs the body to run against the same instance (or type). A
/// receiver the aspect marked as custom is another instance even when it
/// reads as `this`.
fn has_inlineable_receiver(reference: &ResolvedAspectReference) -> bool {
    !reference.has_custom_receiver()
        && matches!(reference.receiver, ReceiverKind::This | ReceiverKind::TypeName)
}

/// `expr` is the reference's invocation, passing the callee's own
/// parameters through unchanged.
fn is_pass_through_invocation(
    expr: &Expr,
    reference: &ResolvedAspectReference,
    target: &SymbolData,
) -> bool {
    if expr.id != reference.root_node {
        return false;
    }
    let ExprKind::Invoke { callee, args } = &expr.kind else {
        return false;
    };
    callee.id == reference.symbol_source_node
        && args.len() == target.parameters.len()
        && args
            .iter()
            .zip(&target.parameters)
            .all(|(arg, param)| arg.as_ident() == Some(&param.name))
}

/// `expr` is the reference's member access itself.
fn is_reference_access(expr: &Expr, reference: &ResolvedAspectReference) -> bool {
    expr.id == reference.root_node && expr.id == reference.symbol_source_node
}

/// `target op value` where `target` is the reference and `value` is the
/// accessor's `value` parameter.
fn is_value_assignment(
    expr: &Expr,
    op: AssignOp,
    reference: &ResolvedAspectReference,
    target: &SymbolData,
) -> bool {
    let ExprKind::Assign {
        op: found,
        target: assigned,
        value,
    } = &expr.kind
    else {
        return false;
    };
    let Some(parameter) = target.parameters.first() else {
        return false;
    };
    *found == op
        && expr.id == reference.root_node
        && assigned.id == reference.symbol_source_node
        && value.as_ident() == Some(&parameter.name)
}

/// The expression of an expression statement.
fn expression_of(statement: &Stmt) -> Option<&Expr> {
    match &statement.kind {
        StmtKind::Expr(expr) => Some(expr),
        _ => None,
    }
}

/// The value of a `return e;` statement.
fn returned_value(statement: &Stmt) -> Option<&Expr> {
    match &statement.kind {
        StmtKind::Return(Some(value)) => Some(value),
        _ => None,
    }
}

/// The initializer of `T x = e;` or `var x = e;`.
fn declared_initializer(statement: &Stmt) -> Option<&Expr> {
    match &statement.kind {
        StmtKind::LocalDecl {
            init: Some(init), ..
        } => Some(init),
        _ => None,
    }
}

/// `x = e` as an expression statement: the local and the value.
fn local_assignment(statement: &Stmt) -> Option<(&Expr, &Expr)> {
    match &expression_of(statement)?.kind {
        ExprKind::Assign {
            op: AssignOp::Assign,
            target,
            value,
        } if target.as_ident().is_some() => Some((target, value)),
        _ => None,
    }
}

/// Return variable of `x = e;`; the discard `_` stores nothing.
fn assigned_local(statement: &Stmt) -> Option<Name> {
    let (target, _) = local_assignment(statement)?;
    if target.is_discard() {
        None
    } else {
        target.as_ident().cloned()
    }
}

fn declared_local(statement: &Stmt) -> Option<Name> {
    match &statement.kind {
        StmtKind::LocalDecl { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// `T x;` declaring the return variable ahead of the inlined body.
fn declaration_prelude(request: &InlineRequest<'_>) -> Result<Option<Stmt>, LinkerError> {
    let StmtKind::LocalDecl { ty, .. } = &request.statement.kind else {
        return Err(LinkerError::unexpected_syntax(
            request.statement.id,
            "local declaration",
            format!("{:?}", request.statement.kind),
        ));
    };
    let variable = request
        .specification
        .return_variable
        .clone()
        .ok_or_else(|| LinkerError::missing("return variable", request.specification.context()))?;
    let ty = ty.clone().unwrap_or_else(|| request.target.return_type.clone());
    Ok(Some(request.factory.local(Some(ty), variable, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{AspectLayerId, CompilationId, SymbolId};
    use crate::linking::analysis::references::collect_references;
    use crate::linking::analysis::resolver::AspectReferenceResolver;
    use crate::linking::introductions::IntroductionIndex;
    use crate::linking::semantic::SymbolSemantic;
    use crate::model::{AccessorSpec, CompilationBuilder, InjectionRegistry, MethodSpec};
    use crate::syntax::{
        AspectReferenceFlags, AspectReferenceOrder, AspectReferenceSpecification, SymbolBinding,
    };
    use rstest::rstest;

    fn previous() -> AspectReferenceSpecification {
        AspectReferenceSpecification::new(AspectLayerId(1), AspectReferenceOrder::Previous)
    }

    /// Build `C` with `int M(int a)`, property `P`, event `E` and an override
    /// `Host` whose body is produced by `statement`, then select an inliner
    /// for the single reference found in it.
    fn select_for(
        statement: impl FnOnce(&SyntaxFactory, SymbolId, SymbolId, SymbolId) -> Stmt,
    ) -> Option<InlinerKind> {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let f = builder.factory();
        let ty = builder.add_type("C");
        let m = builder.add_method(
            ty,
            MethodSpec::new("M")
                .returns("int")
                .param("a", "int")
                .body(f.block(vec![f.ret(Some(f.ident("a")))])),
        );
        let p = builder
            .add_property(
                ty,
                "P",
                "int",
                vec![AccessorSpec::get(None), AccessorSpec::set(None)],
                None,
            )
            .property;
        let e = builder.add_event(ty, "E", "Handler", vec![]).event;
        let host = builder.add_method(ty, MethodSpec::new("Host").returns("int").param("a", "int"));
        let body = f.block(vec![statement(&f, m, p, e)]);
        builder.set_body(host, body);
        let compilation = builder.build();
        let registry = InjectionRegistry::builder(&compilation)
            .add_override(m, host, AspectLayerId(1))
            .build();

        let index = IntroductionIndex::new(&compilation, &registry);
        let resolver = AspectReferenceResolver::new(&index);
        let host_semantic = SymbolSemantic::default(host)
            .as_method(&compilation)
            .expect("method");
        let references = collect_references(
            &resolver,
            host_semantic,
            compilation.method_body(host).expect("body"),
        );
        assert_eq!(references.len(), 1, "one reference expected");
        let reference = &references[0];
        let target = reference
            .target_method(&compilation)
            .map(|semantic| compilation.symbol(semantic.symbol()))
            .expect("method target");
        InlinerKind::select(reference, target)
    }

    fn call(f: &SyntaxFactory, m: SymbolId, arg: &str) -> Expr {
        let callee = f
            .member(f.this(), "M")
            .with_binding(SymbolBinding::Resolved(m))
            .with_aspect_reference(previous());
        f.invoke(callee, vec![f.ident(arg)])
    }

    fn access(f: &SyntaxFactory, symbol: SymbolId, name: &str) -> Expr {
        f.member(f.this(), name)
            .with_binding(SymbolBinding::Resolved(symbol))
            .with_aspect_reference(previous())
    }

    #[rstest]
    #[case::method_return("return", Some(InlinerKind::MethodReturn))]
    #[case::method_local("local", Some(InlinerKind::MethodLocalDeclaration))]
    #[case::method_assignment("assign", Some(InlinerKind::MethodAssignment))]
    #[case::method_discard("discard", Some(InlinerKind::MethodAssignment))]
    #[case::method_invocation("invoke", Some(InlinerKind::MethodInvocation))]
    #[case::nested_in_expression("nested", None)]
    fn test_method_shapes(#[case] shape: &str, #[case] expected: Option<InlinerKind>) {
        let selected = select_for(|f, m, _, _| match shape {
            "return" => f.ret(Some(call(f, m, "a"))),
            "local" => f.local(None, "x", Some(call(f, m, "a"))),
            "assign" => f.expr_stmt(f.assign(f.ident("x"), call(f, m, "a"))),
            "discard" => f.expr_stmt(f.assign(f.discard(), call(f, m, "a"))),
            "invoke" => f.expr_stmt(call(f, m, "a")),
            _ => f.ret(Some(f.binary(
                crate::syntax::BinaryOp::Add,
                call(f, m, "a"),
                f.int(1),
            ))),
        });
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_arguments_must_pass_parameters_through() {
        let selected = select_for(|f, m, _, _| f.ret(Some(call(f, m, "b"))));
        assert_eq!(selected, None);
    }

    #[rstest]
    #[case::get_return("return", Some(InlinerKind::PropertyGetReturn))]
    #[case::get_local("local", Some(InlinerKind::PropertyGetLocalDeclaration))]
    #[case::get_assign("assign", Some(InlinerKind::PropertyGetAssignment))]
    #[case::set_value("set", Some(InlinerKind::PropertySetValue))]
    #[case::set_other("set_other", None)]
    fn test_property_shapes(#[case] shape: &str, #[case] expected: Option<InlinerKind>) {
        let selected = select_for(|f, _, p, _| match shape {
            "return" => f.ret(Some(access(f, p, "P"))),
            "local" => f.local(None, "x", Some(access(f, p, "P"))),
            "assign" => f.expr_stmt(f.assign(f.ident("x"), access(f, p, "P"))),
            "set" => f.expr_stmt(f.assign(access(f, p, "P"), f.ident("value"))),
            _ => f.expr_stmt(f.assign(access(f, p, "P"), f.int(3))),
        });
        assert_eq!(selected, expected);
    }

    #[rstest]
    #[case::add(AssignOp::AddAssign, InlinerKind::EventAddValue)]
    #[case::remove(AssignOp::SubAssign, InlinerKind::EventRemoveValue)]
    fn test_event_shapes(#[case] op: AssignOp, #[case] expected: InlinerKind) {
        let selected = select_for(|f, _, _, e| {
            f.expr_stmt(f.assign_op(op, access(f, e, "E"), f.ident("value")))
        });
        assert_eq!(selected, Some(expected));
    }

    #[test]
    fn test_custom_receiver_is_not_inlined() {
        let selected = select_for(|f, m, _, _| {
            let callee = f
                .member(f.ident("other"), "M")
                .with_binding(SymbolBinding::Resolved(m))
                .with_aspect_reference(previous().with_flags(
                    AspectReferenceFlags::INLINEABLE | AspectReferenceFlags::CUSTOM_RECEIVER,
                ));
            f.ret(Some(f.invoke(callee, vec![f.ident("a")])))
        });
        assert_eq!(selected, None);
    }

    #[test]
    fn test_every_kind_has_a_distinct_name() {
        let names: rustc_hash::FxHashSet<_> =
            InlinerKind::ALL.iter().map(|kind| kind.inliner().name()).collect();
        assert_eq!(names.len(), InlinerKind::ALL.len());
    }
}
