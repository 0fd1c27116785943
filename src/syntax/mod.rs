//! Syntax: the body/AST substrate the linker rewrites.
//!
//! - [`ast`] - Declarations, statements and expressions with stable [`NodeId`](crate::base::NodeId)s
//! - [`annotations`] - Aspect reference annotations and trivia left by the injection phase
//! - [`SyntaxFactory`] - Node construction and id allocation
//! - [`walk`] - Read-only visitor and body queries
//! - [`printer`] - Deterministic text rendering

pub mod annotations;
pub mod ast;
mod factory;
pub mod printer;
pub mod walk;

pub use annotations::{
    AspectReferenceFlags, AspectReferenceOrder, AspectReferenceSpecification,
    AspectReferenceTargetKind, Trivia,
};
pub use ast::{
    AccessorDecl, AccessorKind, AssignOp, BinaryOp, Block, ConstructorDecl, EventDecl, Expr,
    ExprKind, FieldDecl, Literal, MemberDecl, MemberKind, MethodDecl, Modifiers, Parameter,
    PropertyDecl, Stmt, StmtKind, SymbolBinding, TypeDecl, TypeRef, UnaryOp, Visibility,
};
pub use factory::SyntaxFactory;
pub use printer::{PrintOptions, print_block, print_expr, print_member, print_stmt, print_type};
pub use walk::Visitor;
