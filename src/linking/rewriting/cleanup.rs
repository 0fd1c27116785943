//! Cleanup of linked bodies.
//!
//! Inlining leaves scaffolding behind: flattenable blocks, labels nobody
//! jumps to, jumps to the very next statement, empty statements and
//! suppressions meant for the intermediate compilation only. This pass
//! removes it without changing what the body does.

use rustc_hash::FxHashMap;

use crate::base::Name;
use crate::syntax::{Block, Expr, ExprKind, Stmt, StmtKind};

pub fn cleanup_body(mut body: Block) -> Block {
    for_each_block(&mut body, &mut flatten);
    for_each_block(&mut body, &mut drop_empty_statements);

    let uses = count_label_uses(&body);
    for_each_block(&mut body, &mut |block| remove_jumps_to_next(block, &uses));

    let uses = count_label_uses(&body);
    for_each_block(&mut body, &mut |block| unwrap_unused_labels(block, &uses));
    for_each_block(&mut body, &mut drop_empty_statements);

    strip_trailing_return(&mut body);
    body
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// Apply `f` to every block, innermost first.
fn for_each_block(block: &mut Block, f: &mut impl FnMut(&mut Block)) {
    for stmt in &mut block.statements {
        for_each_block_in_stmt(stmt, f);
    }
    f(block);
}

fn for_each_block_in_stmt(stmt: &mut Stmt, f: &mut impl FnMut(&mut Block)) {
    stmt.trivia.retain(|trivia| !trivia.is_suppression());
    match &mut stmt.kind {
        StmtKind::Block(block) | StmtKind::LocalFunction { body: block, .. } => {
            for_each_block(block, f)
        }
        StmtKind::Expr(expr) => for_each_block_in_expr(expr, f),
        StmtKind::LocalDecl { init, .. } => {
            if let Some(init) = init {
                for_each_block_in_expr(init, f);
            }
        }
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            if let Some(value) = value {
                for_each_block_in_expr(value, f);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            for_each_block_in_expr(cond, f);
            for_each_block_in_stmt(then_branch, f);
            if let Some(else_branch) = else_branch {
                for_each_block_in_stmt(else_branch, f);
            }
        }
        StmtKind::While { cond, body } => {
            for_each_block_in_expr(cond, f);
            for_each_block_in_stmt(body, f);
        }
        StmtKind::Labeled { stmt, .. } => for_each_block_in_stmt(stmt, f),
        StmtKind::Goto(_) | StmtKind::Empty => {}
    }
}

fn for_each_block_in_expr(expr: &mut Expr, f: &mut impl FnMut(&mut Block)) {
    match &mut expr.kind {
        ExprKind::Lambda { body, .. } => for_each_block(body, f),
        ExprKind::Member { target, .. } => for_each_block_in_expr(target, f),
        ExprKind::Invoke { callee, args } => {
            for_each_block_in_expr(callee, f);
            for arg in args {
                for_each_block_in_expr(arg, f);
            }
        }
        ExprKind::Assign { target, value, .. } => {
            for_each_block_in_expr(target, f);
            for_each_block_in_expr(value, f);
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            for_each_block_in_expr(lhs, f);
            for_each_block_in_expr(rhs, f);
        }
        ExprKind::Unary { operand, .. } => for_each_block_in_expr(operand, f),
        ExprKind::Cast { expr, .. } | ExprKind::Paren(expr) => for_each_block_in_expr(expr, f),
        ExprKind::Literal(_)
        | ExprKind::Default
        | ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Base
        | ExprKind::TypeName(_) => {}
    }
}

// ============================================================================
// PASSES
// ============================================================================

/// Splice flattenable blocks into the enclosing statement list. A
/// flattenable block in a branch position keeps its braces.
fn flatten(block: &mut Block) {
    let statements = std::mem::take(&mut block.statements);
    for mut stmt in statements {
        match stmt.kind {
            StmtKind::Block(inner) if inner.flattenable => {
                let mut spliced = inner.statements;
                if !stmt.trivia.is_empty() {
                    match spliced.first_mut() {
                        Some(first) => {
                            let mut trivia = std::mem::take(&mut stmt.trivia);
                            trivia.append(&mut first.trivia);
                            first.trivia = trivia;
                        }
                        None => spliced.push(Stmt {
                            kind: StmtKind::Empty,
                            ..stmt
                        }),
                    }
                }
                block.statements.extend(spliced);
            }
            _ => {
                unflatten_branches(&mut stmt);
                block.statements.push(stmt);
            }
        }
    }
}

fn unflatten_branches(stmt: &mut Stmt) {
    let unflatten = |branch: &mut Stmt| {
        if let StmtKind::Block(block) = &mut branch.kind {
            block.flattenable = false;
        }
    };
    match &mut stmt.kind {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            unflatten(then_branch);
            if let Some(else_branch) = else_branch {
                unflatten(else_branch);
            }
        }
        StmtKind::While { body, .. } => unflatten(body),
        StmtKind::Labeled { stmt, .. } => unflatten(stmt),
        _ => {}
    }
}

fn drop_empty_statements(block: &mut Block) {
    block.statements.retain(|stmt| !stmt.is_empty());
}

fn count_label_uses(body: &Block) -> FxHashMap<Name, usize> {
    struct Counter(FxHashMap<Name, usize>);

    impl crate::syntax::Visitor for Counter {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::Goto(label) = &stmt.kind {
                *self.0.entry(label.clone()).or_default() += 1;
            }
            crate::syntax::walk::walk_stmt(self, stmt);
        }
    }

    let mut counter = Counter(FxHashMap::default());
    crate::syntax::Visitor::visit_block(&mut counter, body);
    counter.0
}

/// `goto L; L: s` where this is the only jump to `L` becomes `s`.
fn remove_jumps_to_next(block: &mut Block, uses: &FxHashMap<Name, usize>) {
    let mut index = 0;
    while index + 1 < block.statements.len() {
        let current = &block.statements[index].kind;
        let next = &block.statements[index + 1].kind;
        let jumps_to_next = match (current, next) {
            (StmtKind::Goto(target), StmtKind::Labeled { label, .. }) => {
                target == label && uses.get(label).copied() == Some(1)
            }
            _ => false,
        };
        if jumps_to_next {
            let jump = block.statements.remove(index);
            let labeled = &mut block.statements[index];
            unwrap_label(labeled);
            let mut trivia = jump.trivia;
            trivia.append(&mut labeled.trivia);
            labeled.trivia = trivia;
        } else {
            index += 1;
        }
    }
}

fn unwrap_unused_labels(block: &mut Block, uses: &FxHashMap<Name, usize>) {
    for stmt in &mut block.statements {
        while let StmtKind::Labeled { label, .. } = &stmt.kind {
            if uses.contains_key(label) {
                break;
            }
            unwrap_label(stmt);
        }
    }
}

fn unwrap_label(stmt: &mut Stmt) {
    let kind = std::mem::replace(&mut stmt.kind, StmtKind::Empty);
    match kind {
        StmtKind::Labeled { stmt: inner, .. } => {
            let mut inner = *inner;
            let mut trivia = std::mem::take(&mut stmt.trivia);
            trivia.append(&mut inner.trivia);
            inner.trivia = trivia;
            *stmt = inner;
        }
        kind => stmt.kind = kind,
    }
}

/// A body ending in `return;` ends the same way without it.
fn strip_trailing_return(body: &mut Block) {
    let trailing = body
        .statements
        .last()
        .is_some_and(|stmt| matches!(stmt.kind, StmtKind::Return(None)) && stmt.trivia.is_empty());
    if trailing {
        body.statements.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{PrintOptions, SyntaxFactory, Trivia, print_block};

    fn printed(block: &Block) -> String {
        print_block(block, &PrintOptions::default())
    }

    #[test]
    fn test_flattens_nested_inlined_blocks() {
        let f = SyntaxFactory::new();
        let inner = f.flattenable_block(vec![f.expr_stmt(f.ident("b"))]);
        let outer = f.flattenable_block(vec![f.expr_stmt(f.ident("a")), f.block_stmt(inner)]);
        let body = f.block(vec![f.block_stmt(outer), f.expr_stmt(f.ident("c"))]);

        let cleaned = cleanup_body(body);
        assert_eq!(cleaned.statements.len(), 3);
        assert!(
            cleaned
                .statements
                .iter()
                .all(|stmt| matches!(stmt.kind, StmtKind::Expr(_)))
        );
    }

    #[test]
    fn test_jump_to_next_statement_is_removed() {
        let f = SyntaxFactory::new();
        let body = f.block(vec![
            f.expr_stmt(f.assign(f.ident("r"), f.int(1))),
            f.goto("L"),
            f.labeled("L", f.empty()),
            f.ret(Some(f.ident("r"))),
        ]);

        let cleaned = cleanup_body(body);
        let text = printed(&cleaned);
        assert!(!text.contains("goto"), "{text}");
        assert!(!text.contains("L:"), "{text}");
        assert_eq!(cleaned.statements.len(), 2);
    }

    #[test]
    fn test_label_with_other_jumps_is_kept() {
        let f = SyntaxFactory::new();
        let body = f.block(vec![
            f.if_stmt(f.ident("c"), f.block_stmt(f.block(vec![f.goto("L")])), None),
            f.expr_stmt(f.ident("x")),
            f.goto("L"),
            f.labeled("L", f.empty()),
        ]);

        let text = printed(&cleanup_body(body));
        assert!(text.contains("goto L;"), "{text}");
        assert!(text.contains("L:"), "{text}");
    }

    #[test]
    fn test_unused_label_is_unwrapped_and_trailing_return_stripped() {
        let f = SyntaxFactory::new();
        let body = f.block(vec![
            f.labeled("Unused", f.expr_stmt(f.ident("x"))),
            f.ret(None),
        ]);

        let cleaned = cleanup_body(body);
        assert_eq!(cleaned.statements.len(), 1);
        assert!(matches!(cleaned.statements[0].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_suppressions_dropped_comments_kept() {
        let f = SyntaxFactory::new();
        let body = f.block(vec![
            f.expr_stmt(f.ident("x"))
                .with_trivia(Trivia::Suppression("CS0162".into()))
                .with_trivia(Trivia::Comment("kept".into())),
        ]);

        let cleaned = cleanup_body(body);
        assert_eq!(
            cleaned.statements[0].trivia,
            vec![Trivia::Comment("kept".into())]
        );
    }

    #[test]
    fn test_branch_blocks_keep_their_braces() {
        let f = SyntaxFactory::new();
        let inlined = f.flattenable_block(vec![f.expr_stmt(f.ident("a")), f.ret(None)]);
        let body = f.block(vec![
            f.if_stmt(f.ident("c"), f.block_stmt(inlined), None),
            f.expr_stmt(f.ident("b")),
        ]);

        let cleaned = cleanup_body(body);
        let StmtKind::If { then_branch, .. } = &cleaned.statements[0].kind else {
            panic!("expected if");
        };
        let StmtKind::Block(block) = &then_branch.kind else {
            panic!("expected block");
        };
        assert!(!block.flattenable);
        assert_eq!(block.statements.len(), 2);
    }
}
