//! Rendering of a body in one inlining context.
//!
//! The rewriter copies the body, replacing every node that has a
//! substitution registered for its context. Inlining a statement renders
//! the callee body in the inlining's own context first, so a whole chain of
//! inlined versions is produced by one recursive descent.

use crate::base::Name;
use crate::syntax::{Block, Expr, ExprKind, Stmt, StmtKind, SymbolBinding, TypeRef};

use super::super::analysis::{
    ContextSubstitutions, InliningSpecification, LinkerAnalysisRegistry, ReferenceRenaming,
    RenamedReceiver, ReturnSubstitution, Substitution,
};
use super::super::context::LinkerContext;
use super::super::error::LinkerError;
use super::super::inliners::InlineRequest;
use super::super::semantic::InliningContextIdentifier;

pub struct SubstitutingRewriter<'r, 'a> {
    ctx: &'r LinkerContext<'a>,
    registry: &'r LinkerAnalysisRegistry,
    context: InliningContextIdentifier,
    substitutions: Option<&'r ContextSubstitutions>,
}

impl<'r, 'a> SubstitutingRewriter<'r, 'a> {
    pub fn new(
        ctx: &'r LinkerContext<'a>,
        registry: &'r LinkerAnalysisRegistry,
        context: InliningContextIdentifier,
    ) -> Self {
        Self {
            ctx,
            registry,
            context,
            substitutions: registry.substitutions(context),
        }
    }

    pub fn rewrite_body(&self, body: &Block) -> Result<Block, LinkerError> {
        self.rewrite_block(body)
    }

    fn substitution(&self, node: crate::base::NodeId) -> Option<&'r Substitution> {
        self.substitutions?.get(node)
    }

    fn rename_local(&self, name: &Name) -> Name {
        self.substitutions
            .and_then(|substitutions| substitutions.local_rename(name))
            .cloned()
            .unwrap_or_else(|| name.clone())
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn rewrite_block(&self, block: &Block) -> Result<Block, LinkerError> {
        let statements = block
            .statements
            .iter()
            .map(|stmt| self.rewrite_stmt(stmt))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Block {
            id: block.id,
            statements,
            flattenable: block.flattenable,
        })
    }

    fn rewrite_stmt(&self, stmt: &Stmt) -> Result<Stmt, LinkerError> {
        match self.substitution(stmt.id) {
            Some(Substitution::Inlining(inlining)) => return self.inline(inlining, stmt),
            Some(Substitution::Return(substitution)) => {
                return self.rewrite_return(stmt, substitution);
            }
            Some(Substitution::Renaming(_)) | None => {}
        }

        let kind = match &stmt.kind {
            StmtKind::Block(block) => StmtKind::Block(self.rewrite_block(block)?),
            StmtKind::Expr(expr) => StmtKind::Expr(self.rewrite_expr(expr)?),
            StmtKind::LocalDecl { ty, name, init } => StmtKind::LocalDecl {
                ty: ty.clone(),
                name: self.rename_local(name),
                init: init.as_ref().map(|init| self.rewrite_expr(init)).transpose()?,
            },
            StmtKind::Return(value) => StmtKind::Return(self.rewrite_optional(value.as_ref())?),
            StmtKind::Throw(value) => StmtKind::Throw(self.rewrite_optional(value.as_ref())?),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => StmtKind::If {
                cond: self.rewrite_expr(cond)?,
                then_branch: Box::new(self.rewrite_stmt(then_branch)?),
                else_branch: else_branch
                    .as_deref()
                    .map(|stmt| self.rewrite_stmt(stmt).map(Box::new))
                    .transpose()?,
            },
            StmtKind::While { cond, body } => StmtKind::While {
                cond: self.rewrite_expr(cond)?,
                body: Box::new(self.rewrite_stmt(body)?),
            },
            StmtKind::Labeled { label, stmt: inner } => StmtKind::Labeled {
                label: self.rename_local(label),
                stmt: Box::new(self.rewrite_stmt(inner)?),
            },
            StmtKind::Goto(label) => StmtKind::Goto(self.rename_local(label)),
            StmtKind::LocalFunction {
                name,
                params,
                return_type,
                body,
            } => StmtKind::LocalFunction {
                name: name.clone(),
                params: params.clone(),
                return_type: return_type.clone(),
                body: self.rewrite_block(body)?,
            },
            StmtKind::Empty => StmtKind::Empty,
        };

        Ok(Stmt {
            id: stmt.id,
            kind,
            trivia: stmt.trivia.clone(),
            span: stmt.span,
        })
    }

    fn inline(&self, inlining: &InliningSpecification, stmt: &Stmt) -> Result<Stmt, LinkerError> {
        let index = &self.ctx.index;
        let body = self
            .registry
            .body(index, inlining.target)
            .ok_or_else(|| LinkerError::missing("body", inlining.target))?;

        let child = SubstitutingRewriter::new(self.ctx, self.registry, inlining.context());
        let linked_body = child.rewrite_body(body)?;
        tracing::trace!(context = %self.context, inlined = %inlining.context(), "body inlined");

        inlining.inliner.inliner().inline(InlineRequest {
            specification: inlining,
            statement: stmt,
            linked_body,
            target: index.symbol(inlining.target.symbol()),
            factory: &self.ctx.factory,
        })
    }

    /// `return e;` → `{ v = e; goto L; }`, flattened later.
    fn rewrite_return(
        &self,
        stmt: &Stmt,
        substitution: &ReturnSubstitution,
    ) -> Result<Stmt, LinkerError> {
        let f = &self.ctx.factory;
        let StmtKind::Return(value) = &stmt.kind else {
            return Err(LinkerError::unexpected_syntax(
                stmt.id,
                "return statement",
                format!("{:?}", stmt.kind),
            ));
        };

        let mut statements = Vec::with_capacity(2);
        if let Some(value) = value {
            let value = self.rewrite_expr(value)?;
            let target = match &substitution.variable {
                Some(variable) => f.ident(variable.clone()),
                None => f.discard(),
            };
            statements.push(f.expr_stmt(f.assign(target, value)));
        }
        if let Some(label) = &substitution.goto {
            statements.push(f.goto(label.clone()));
        }

        let mut replacement = f.block_stmt(f.flattenable_block(statements));
        replacement.trivia = stmt.trivia.clone();
        replacement.span = stmt.span;
        Ok(replacement)
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn rewrite_optional(&self, expr: Option<&Expr>) -> Result<Option<Expr>, LinkerError> {
        expr.map(|expr| self.rewrite_expr(expr)).transpose()
    }

    fn rewrite_expr(&self, expr: &Expr) -> Result<Expr, LinkerError> {
        if let Some(Substitution::Renaming(renaming)) = self.substitution(expr.id) {
            return self.rename_reference(expr, renaming);
        }

        let boxed = |expr: &Expr| self.rewrite_expr(expr).map(Box::new);
        let kind = match &expr.kind {
            ExprKind::Ident(name) => ExprKind::Ident(self.rename_local(name)),
            ExprKind::Member { target, name } => ExprKind::Member {
                target: boxed(target)?,
                name: name.clone(),
            },
            ExprKind::Invoke { callee, args } => ExprKind::Invoke {
                callee: boxed(callee)?,
                args: args
                    .iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .collect::<Result<_, _>>()?,
            },
            ExprKind::Assign { op, target, value } => ExprKind::Assign {
                op: *op,
                target: boxed(target)?,
                value: boxed(value)?,
            },
            ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op: *op,
                lhs: boxed(lhs)?,
                rhs: boxed(rhs)?,
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: boxed(operand)?,
            },
            ExprKind::Cast { ty, expr: inner } => ExprKind::Cast {
                ty: ty.clone(),
                expr: boxed(inner)?,
            },
            ExprKind::Paren(inner) => ExprKind::Paren(boxed(inner)?),
            ExprKind::Lambda { params, body } => ExprKind::Lambda {
                params: params.clone(),
                body: self.rewrite_block(body)?,
            },
            kind @ (ExprKind::Literal(_)
            | ExprKind::Default
            | ExprKind::This
            | ExprKind::Base
            | ExprKind::TypeName(_)) => kind.clone(),
        };

        Ok(Expr {
            id: expr.id,
            kind,
            binding: expr.binding.clone(),
            aspect_reference: None,
            span: expr.span,
        })
    }

    fn rename_reference(
        &self,
        expr: &Expr,
        renaming: &ReferenceRenaming,
    ) -> Result<Expr, LinkerError> {
        let f = &self.ctx.factory;
        let ExprKind::Member { target, .. } = &expr.kind else {
            return Err(LinkerError::unexpected_syntax(
                expr.id,
                "member access",
                format!("{:?}", expr.kind),
            ));
        };

        let receiver = match &renaming.receiver {
            RenamedReceiver::Keep => self.rewrite_expr(target)?,
            RenamedReceiver::Base => f.base(),
            RenamedReceiver::InterfaceCast(interface) => {
                let receiver = self.rewrite_expr(target)?;
                f.paren(f.cast(TypeRef::new(interface.clone()), receiver))
            }
        };

        Ok(Expr {
            id: expr.id,
            kind: ExprKind::Member {
                target: Box::new(receiver),
                name: renaming.name.clone(),
            },
            binding: SymbolBinding::Resolved(renaming.symbol),
            aspect_reference: None,
            span: expr.span,
        })
    }
}
