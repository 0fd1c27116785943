//! Aspect reference collection.
//!
//! Walks the body of a method semantic, resolves every annotated member
//! access with the [`AspectReferenceResolver`] and records where the
//! reference sits: the root node an inliner replaces, the enclosing
//! statement, the receiver and whether it is nested in a local function or
//! lambda.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::base::{Name, NodeId, SymbolId, TextRange};
use crate::model::Compilation;
use crate::syntax::{
    AspectReferenceFlags, AspectReferenceSpecification, AspectReferenceTargetKind, Block, Expr,
    ExprKind, Stmt, StmtKind, print_expr,
};

use super::super::semantic::{AspectReferenceTarget, MethodSemantic};
use super::resolver::AspectReferenceResolver;

/// How the referenced member is accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReceiverKind {
    This,
    Base,
    /// Static access through the type name.
    TypeName,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAspectReference {
    /// The semantic whose body contains the reference.
    pub containing_semantic: MethodSemantic,
    /// Innermost local function (or `<lambda>`) containing the reference.
    pub containing_local_function: Option<Name>,
    /// The symbol the node is bound to, before normalization.
    pub original_symbol: SymbolId,
    pub target: AspectReferenceTarget,
    /// Node an inliner replaces: the invocation, the assignment or the access.
    pub root_node: NodeId,
    /// The annotated member access.
    pub symbol_source_node: NodeId,
    pub receiver: ReceiverKind,
    /// Printed receiver, for diagnostics.
    pub receiver_text: String,
    /// Innermost statement containing the reference.
    pub statement: Stmt,
    pub specification: AspectReferenceSpecification,
    pub span: Option<TextRange>,
}

impl ResolvedAspectReference {
    /// The annotation allows inlining and the reference is not nested in a
    /// local function or lambda.
    pub fn is_inlineable(&self) -> bool {
        self.specification.is_inlineable() && self.containing_local_function.is_none()
    }

    pub fn has_custom_receiver(&self) -> bool {
        self.specification
            .flags
            .contains(AspectReferenceFlags::CUSTOM_RECEIVER)
    }

    pub fn target_method(&self, compilation: &Compilation) -> Option<MethodSemantic> {
        self.target.method_semantic(compilation)
    }

    /// Find the root expression inside the stored statement.
    pub fn root_expr(&self) -> Option<&Expr> {
        find_expr_in_stmt(&self.statement, self.root_node)
    }
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Collect the aspect references of `body`, in source order.
pub fn collect_references(
    resolver: &AspectReferenceResolver<'_, '_>,
    containing: MethodSemantic,
    body: &Block,
) -> Vec<ResolvedAspectReference> {
    let mut collector = ReferenceCollector {
        resolver,
        containing,
        local_functions: Vec::new(),
        statements: Vec::new(),
        references: Vec::new(),
    };
    collector.collect_block(body);
    collector.references
}

struct ReferenceCollector<'c, 'r, 'a, 'b> {
    resolver: &'c AspectReferenceResolver<'r, 'a>,
    containing: MethodSemantic,
    local_functions: Vec<Name>,
    statements: Vec<&'b Stmt>,
    references: Vec<ResolvedAspectReference>,
}

impl<'b> ReferenceCollector<'_, '_, '_, 'b> {
    fn collect_block(&mut self, block: &'b Block) {
        for stmt in &block.statements {
            self.collect_stmt(stmt);
        }
    }

    fn collect_stmt(&mut self, stmt: &'b Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.collect_block(block),
            StmtKind::Expr(expr) => self.in_statement(stmt, |this| this.collect_expr(expr, None)),
            StmtKind::LocalDecl { init, .. } => {
                if let Some(init) = init {
                    self.in_statement(stmt, |this| this.collect_expr(init, None));
                }
            }
            StmtKind::Return(value) | StmtKind::Throw(value) => {
                if let Some(value) = value {
                    self.in_statement(stmt, |this| this.collect_expr(value, None));
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.in_statement(stmt, |this| this.collect_expr(cond, None));
                self.collect_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.collect_stmt(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.in_statement(stmt, |this| this.collect_expr(cond, None));
                self.collect_stmt(body);
            }
            StmtKind::Labeled { stmt: inner, .. } => self.collect_stmt(inner),
            StmtKind::LocalFunction { name, body, .. } => {
                self.local_functions.push(name.clone());
                self.collect_block(body);
                self.local_functions.pop();
            }
            StmtKind::Goto(_) | StmtKind::Empty => {}
        }
    }

    fn in_statement(&mut self, stmt: &'b Stmt, f: impl FnOnce(&mut Self)) {
        self.statements.push(stmt);
        f(self);
        self.statements.pop();
    }

    fn collect_expr(&mut self, expr: &'b Expr, parent: Option<&'b Expr>) {
        if let Some(specification) = &expr.aspect_reference {
            self.record(expr, parent, specification);
        }

        match &expr.kind {
            ExprKind::Literal(_)
            | ExprKind::Default
            | ExprKind::Ident(_)
            | ExprKind::This
            | ExprKind::Base
            | ExprKind::TypeName(_) => {}
            ExprKind::Member { target, .. } => self.collect_expr(target, Some(expr)),
            ExprKind::Invoke { callee, args } => {
                self.collect_expr(callee, Some(expr));
                for arg in args {
                    self.collect_expr(arg, Some(expr));
                }
            }
            ExprKind::Assign { target, value, .. } => {
                self.collect_expr(target, Some(expr));
                self.collect_expr(value, Some(expr));
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.collect_expr(lhs, Some(expr));
                self.collect_expr(rhs, Some(expr));
            }
            ExprKind::Unary { operand, .. } => self.collect_expr(operand, Some(expr)),
            ExprKind::Cast { expr: inner, .. } | ExprKind::Paren(inner) => {
                self.collect_expr(inner, Some(expr))
            }
            ExprKind::Lambda { body, .. } => {
                self.local_functions.push(Name::new("<lambda>"));
                self.collect_block(body);
                self.local_functions.pop();
            }
        }
    }

    fn record(
        &mut self,
        expr: &'b Expr,
        parent: Option<&'b Expr>,
        specification: &AspectReferenceSpecification,
    ) {
        let ExprKind::Member { target: receiver, .. } = &expr.kind else {
            tracing::trace!(
                node = %expr.id,
                "aspect reference annotation on a non-member node ignored"
            );
            return;
        };
        let Some(statement) = self.statements.last().copied() else {
            tracing::trace!(node = %expr.id, "aspect reference outside of a statement ignored");
            return;
        };

        // Operator of the assignment this access is the target of.
        let assignment = parent.and_then(|parent| match &parent.kind {
            ExprKind::Assign { op, target, .. } if target.id == expr.id => Some(*op),
            _ => None,
        });

        let Some((original_symbol, target)) =
            self.resolver.resolve(expr, specification, assignment)
        else {
            return;
        };

        let root_node = match (target.target_kind, parent) {
            (AspectReferenceTargetKind::Itself, Some(parent)) => match &parent.kind {
                ExprKind::Invoke { callee, .. } if callee.id == expr.id => parent.id,
                _ => expr.id,
            },
            (AspectReferenceTargetKind::PropertyGet, _) => expr.id,
            (_, Some(parent)) if assignment.is_some() => parent.id,
            _ => expr.id,
        };

        let receiver_kind = match &receiver.kind {
            ExprKind::This => ReceiverKind::This,
            ExprKind::Base => ReceiverKind::Base,
            ExprKind::TypeName(_) => ReceiverKind::TypeName,
            _ => ReceiverKind::Other,
        };

        self.references.push(ResolvedAspectReference {
            containing_semantic: self.containing,
            containing_local_function: self.local_functions.last().cloned(),
            original_symbol,
            target,
            root_node,
            symbol_source_node: expr.id,
            receiver: receiver_kind,
            receiver_text: print_expr(receiver),
            statement: statement.clone(),
            specification: *specification,
            span: expr.span,
        });
    }
}

fn find_expr_in_stmt(stmt: &Stmt, id: NodeId) -> Option<&Expr> {
    match &stmt.kind {
        StmtKind::Expr(expr) => find_expr(expr, id),
        StmtKind::LocalDecl { init, .. } => init.as_ref().and_then(|init| find_expr(init, id)),
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            value.as_ref().and_then(|value| find_expr(value, id))
        }
        StmtKind::If { cond, .. } | StmtKind::While { cond, .. } => find_expr(cond, id),
        _ => None,
    }
}

fn find_expr(expr: &Expr, id: NodeId) -> Option<&Expr> {
    if expr.id == id {
        return Some(expr);
    }
    match &expr.kind {
        ExprKind::Member { target, .. } => find_expr(target, id),
        ExprKind::Invoke { callee, args } => {
            find_expr(callee, id).or_else(|| args.iter().find_map(|arg| find_expr(arg, id)))
        }
        ExprKind::Assign { target, value, .. } => {
            find_expr(target, id).or_else(|| find_expr(value, id))
        }
        ExprKind::Binary { lhs, rhs, .. } => find_expr(lhs, id).or_else(|| find_expr(rhs, id)),
        ExprKind::Unary { operand, .. } => find_expr(operand, id),
        ExprKind::Cast { expr, .. } | ExprKind::Paren(expr) => find_expr(expr, id),
        _ => None,
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// References per method semantic, filled concurrently.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    references: RwLock<FxHashMap<MethodSemantic, Arc<[ResolvedAspectReference]>>>,
}

impl ReferenceCache {
    /// Cached references of `semantic`, computing them on a miss.
    ///
    /// Two threads may compute the same entry; the first insert wins.
    pub fn get_or_collect(
        &self,
        semantic: MethodSemantic,
        collect: impl FnOnce() -> Vec<ResolvedAspectReference>,
    ) -> Arc<[ResolvedAspectReference]> {
        if let Some(references) = self.references.read().get(&semantic) {
            return Arc::clone(references);
        }
        let computed: Arc<[ResolvedAspectReference]> = collect().into();
        Arc::clone(
            self.references
                .write()
                .entry(semantic)
                .or_insert(computed),
        )
    }

    /// References of `semantic`; empty when its body has none or was never collected.
    pub fn get(&self, semantic: MethodSemantic) -> Arc<[ResolvedAspectReference]> {
        self.references
            .read()
            .get(&semantic)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.references.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.read().is_empty()
    }
}
