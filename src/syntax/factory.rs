//! Syntax Factory
//!
//! The only place new syntax nodes are created. The factory owns the node id
//! counter so that every node of a compilation, including the ones the linker
//! synthesizes, has a distinct id. Allocation is atomic: the factory can be
//! shared by parallel rewriting tasks.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::base::{Name, NodeId, SymbolId};

use super::annotations::Trivia;
use super::ast::{
    AssignOp, BinaryOp, Block, Expr, ExprKind, Literal, Parameter, Stmt, StmtKind, SymbolBinding,
    TypeRef, UnaryOp,
};

#[derive(Debug)]
pub struct SyntaxFactory {
    next_id: AtomicU32,
}

impl Default for SyntaxFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxFactory {
    pub fn new() -> Self {
        Self::starting_at(NodeId(1))
    }

    /// A factory whose first allocated id is `first`.
    pub fn starting_at(first: NodeId) -> Self {
        Self {
            next_id: AtomicU32::new(first.0),
        }
    }

    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next allocation would return.
    pub fn peek_next_id(&self) -> NodeId {
        NodeId(self.next_id.load(Ordering::Relaxed))
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    pub fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            kind,
            binding: SymbolBinding::Unbound,
            aspect_reference: None,
            span: None,
        }
    }

    pub fn ident(&self, name: impl Into<Name>) -> Expr {
        self.expr(ExprKind::Ident(name.into()))
    }

    pub fn discard(&self) -> Expr {
        self.ident("_")
    }

    pub fn this(&self) -> Expr {
        self.expr(ExprKind::This)
    }

    pub fn base(&self) -> Expr {
        self.expr(ExprKind::Base)
    }

    pub fn type_name(&self, name: impl Into<Name>) -> Expr {
        self.expr(ExprKind::TypeName(name.into()))
    }

    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn string(&self, value: impl Into<String>) -> Expr {
        self.expr(ExprKind::Literal(Literal::Str(value.into())))
    }

    pub fn bool(&self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn null(&self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Null))
    }

    pub fn default_literal(&self) -> Expr {
        self.expr(ExprKind::Default)
    }

    pub fn member(&self, target: Expr, name: impl Into<Name>) -> Expr {
        self.expr(ExprKind::Member {
            target: Box::new(target),
            name: name.into(),
        })
    }

    /// A member access whose symbol is already known.
    pub fn bound_member(&self, target: Expr, name: impl Into<Name>, symbol: SymbolId) -> Expr {
        self.member(target, name)
            .with_binding(SymbolBinding::Resolved(symbol))
    }

    pub fn invoke(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Invoke {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn assign(&self, target: Expr, value: Expr) -> Expr {
        self.assign_op(AssignOp::Assign, target, value)
    }

    pub fn assign_op(&self, op: AssignOp, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn not(&self, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        })
    }

    pub fn cast(&self, ty: TypeRef, expr: Expr) -> Expr {
        self.expr(ExprKind::Cast {
            ty,
            expr: Box::new(expr),
        })
    }

    pub fn paren(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Paren(Box::new(expr)))
    }

    pub fn lambda(&self, params: Vec<Name>, body: Block) -> Expr {
        self.expr(ExprKind::Lambda { params, body })
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    pub fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            kind,
            trivia: Vec::new(),
            span: None,
        }
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn local(&self, ty: Option<TypeRef>, name: impl Into<Name>, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::LocalDecl {
            ty,
            name: name.into(),
            init,
        })
    }

    pub fn ret(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn if_stmt(&self, cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn while_stmt(&self, cond: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::While {
            cond,
            body: Box::new(body),
        })
    }

    pub fn labeled(&self, label: impl Into<Name>, stmt: Stmt) -> Stmt {
        self.stmt(StmtKind::Labeled {
            label: label.into(),
            stmt: Box::new(stmt),
        })
    }

    pub fn goto(&self, label: impl Into<Name>) -> Stmt {
        self.stmt(StmtKind::Goto(label.into()))
    }

    pub fn throw(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Throw(value))
    }

    pub fn empty(&self) -> Stmt {
        self.stmt(StmtKind::Empty)
    }

    pub fn comment(&self, text: impl Into<String>) -> Stmt {
        self.empty().with_trivia(Trivia::Comment(text.into()))
    }

    pub fn local_function(
        &self,
        name: impl Into<Name>,
        params: Vec<Parameter>,
        return_type: TypeRef,
        body: Block,
    ) -> Stmt {
        self.stmt(StmtKind::LocalFunction {
            name: name.into(),
            params,
            return_type,
            body,
        })
    }

    pub fn block(&self, statements: Vec<Stmt>) -> Block {
        Block {
            id: self.next_id(),
            statements,
            flattenable: false,
        }
    }

    /// A block the cleanup pass merges into its parent.
    pub fn flattenable_block(&self, statements: Vec<Stmt>) -> Block {
        Block {
            flattenable: true,
            ..self.block(statements)
        }
    }

    pub fn block_stmt(&self, block: Block) -> Stmt {
        self.stmt(StmtKind::Block(block))
    }
}
