//! Control-flow facts about bodies that drive return rewriting.
//!
//! A `return` *flows to exit* when it is the last thing the body executes on
//! its path: removing it would fall off the end of the body anyway. Only
//! returns that do not flow to exit need a jump when the body is inlined.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::NodeId;
use crate::syntax::walk::{self, Visitor};
use crate::syntax::{Block, Expr, ExprKind, Stmt, StmtKind};

use super::super::semantic::MethodSemantic;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BodyAnalysis {
    /// Return statements of the body itself, in source order.
    pub returns: Vec<NodeId>,
    flowing_to_exit: FxHashSet<NodeId>,
}

impl BodyAnalysis {
    pub fn analyze(body: &Block) -> Self {
        let mut collector = ReturnCollector::default();
        collector.visit_block(body);

        let mut flowing_to_exit = FxHashSet::default();
        mark_tail_block(body, &mut flowing_to_exit);

        Self {
            returns: collector.returns,
            flowing_to_exit,
        }
    }

    pub fn flows_to_exit(&self, statement: NodeId) -> bool {
        self.flowing_to_exit.contains(&statement)
    }

    /// Some return needs a jump to leave the body.
    pub fn has_non_exiting_return(&self) -> bool {
        self.returns
            .iter()
            .any(|statement| !self.flowing_to_exit.contains(statement))
    }
}

#[derive(Default)]
struct ReturnCollector {
    returns: Vec<NodeId>,
}

impl Visitor for ReturnCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Return(_) => self.returns.push(stmt.id),
            // Returns of nested functions leave those functions only.
            StmtKind::LocalFunction { .. } => {}
            _ => walk::walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if !matches!(expr.kind, ExprKind::Lambda { .. }) {
            walk::walk_expr(self, expr);
        }
    }
}

fn mark_tail_block(block: &Block, out: &mut FxHashSet<NodeId>) {
    let last = block
        .statements
        .iter()
        .rev()
        .find(|stmt| !matches!(stmt.kind, StmtKind::Empty));
    if let Some(last) = last {
        mark_tail_stmt(last, out);
    }
}

fn mark_tail_stmt(stmt: &Stmt, out: &mut FxHashSet<NodeId>) {
    match &stmt.kind {
        StmtKind::Return(_) => {
            out.insert(stmt.id);
        }
        StmtKind::Block(block) => mark_tail_block(block, out),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            mark_tail_stmt(then_branch, out);
            if let Some(else_branch) = else_branch {
                mark_tail_stmt(else_branch, out);
            }
        }
        StmtKind::Labeled { stmt, .. } => mark_tail_stmt(stmt, out),
        // Falling out of a loop body goes back to the condition.
        _ => {}
    }
}

/// Body analyses per method semantic, computed on demand.
#[derive(Debug, Default)]
pub struct BodyAnalyzer {
    cache: RwLock<FxHashMap<MethodSemantic, Arc<BodyAnalysis>>>,
}

impl BodyAnalyzer {
    pub fn analyze(&self, semantic: MethodSemantic, body: &Block) -> Arc<BodyAnalysis> {
        if let Some(analysis) = self.cache.read().get(&semantic) {
            return Arc::clone(analysis);
        }
        let analysis = Arc::new(BodyAnalysis::analyze(body));
        Arc::clone(self.cache.write().entry(semantic).or_insert(analysis))
    }
}
