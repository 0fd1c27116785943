//! Read-only traversal of bodies.
//!
//! [`Visitor`] has one hook per node category; the default implementations
//! recurse through the matching `walk_*` function, so an implementor only
//! overrides the hooks it cares about and calls `walk_*` to keep descending.

use crate::base::{Name, NodeId};

use super::ast::{Block, Expr, ExprKind, Stmt, StmtKind};

pub trait Visitor {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for stmt in &block.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(block) => visitor.visit_block(block),
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::LocalDecl { init, .. } => {
            if let Some(init) = init {
                visitor.visit_expr(init);
            }
        }
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::While { cond, body } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(body);
        }
        StmtKind::Labeled { stmt, .. } => visitor.visit_stmt(stmt),
        StmtKind::LocalFunction { body, .. } => visitor.visit_block(body),
        StmtKind::Goto(_) | StmtKind::Empty => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::Default
        | ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Base
        | ExprKind::TypeName(_) => {}
        ExprKind::Member { target, .. } => visitor.visit_expr(target),
        ExprKind::Invoke { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Assign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Cast { expr, .. } | ExprKind::Paren(expr) => visitor.visit_expr(expr),
        ExprKind::Lambda { body, .. } => visitor.visit_block(body),
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// Names of locals declared in `block`, in declaration order.
///
/// Local functions and lambdas are separate scopes and are not entered.
pub fn declared_locals(block: &Block) -> Vec<Name> {
    struct Collector(Vec<Name>);

    impl Visitor for Collector {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            match &stmt.kind {
                StmtKind::LocalDecl { name, .. } => {
                    if !self.0.contains(name) {
                        self.0.push(name.clone());
                    }
                    walk_stmt(self, stmt);
                }
                StmtKind::LocalFunction { .. } => {}
                _ => walk_stmt(self, stmt),
            }
        }

        fn visit_expr(&mut self, expr: &Expr) {
            if !matches!(expr.kind, ExprKind::Lambda { .. }) {
                walk_expr(self, expr);
            }
        }
    }

    let mut collector = Collector(Vec::new());
    collector.visit_block(block);
    collector.0
}

/// Labels declared anywhere in `block`.
pub fn declared_labels(block: &Block) -> Vec<Name> {
    struct Collector(Vec<Name>);

    impl Visitor for Collector {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::Labeled { label, .. } = &stmt.kind {
                self.0.push(label.clone());
            }
            walk_stmt(self, stmt);
        }
    }

    let mut collector = Collector(Vec::new());
    collector.visit_block(block);
    collector.0
}

/// Find a statement by id.
pub fn find_statement(block: &Block, id: NodeId) -> Option<&Stmt> {
    fn in_stmt(stmt: &Stmt, id: NodeId) -> Option<&Stmt> {
        if stmt.id == id {
            return Some(stmt);
        }
        match &stmt.kind {
            StmtKind::Block(block) | StmtKind::LocalFunction { body: block, .. } => {
                find_statement(block, id)
            }
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => in_stmt(then_branch, id)
                .or_else(|| else_branch.as_deref().and_then(|e| in_stmt(e, id))),
            StmtKind::While { body, .. } => in_stmt(body, id),
            StmtKind::Labeled { stmt, .. } => in_stmt(stmt, id),
            _ => None,
        }
    }

    block.statements.iter().find_map(|stmt| in_stmt(stmt, id))
}
