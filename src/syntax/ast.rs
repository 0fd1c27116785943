//! Syntax tree of the intermediate compilation.
//!
//! The tree models the subset of a C#-like language the linker has to reason
//! about: member declarations, statement bodies and the expressions that can
//! host aspect references. Every statement, expression and block carries a
//! [`NodeId`] so that analysis results can be keyed by node.

use crate::base::{Name, NodeId, SymbolId, TextRange};

use super::annotations::{AspectReferenceSpecification, Trivia};

// ============================================================================
// TYPES & SIGNATURES
// ============================================================================

/// A reference to a type by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: Name,
}

impl TypeRef {
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into() }
    }

    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn is_void(&self) -> bool {
        self.name == "void"
    }
}

/// A parameter of a method, constructor, local function or accessor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: Name,
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<Name>, ty: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new(ty),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }
}

/// Declaration modifiers.
///
/// `visibility` is `None` for explicit interface implementations, which
/// cannot carry one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            visibility: Some(Visibility::Public),
            is_static: false,
            is_abstract: false,
            is_virtual: false,
            is_override: false,
        }
    }
}

impl Modifiers {
    pub fn private() -> Self {
        Self {
            visibility: Some(Visibility::Private),
            ..Self::default()
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// What the semantic model knows about the symbol an expression denotes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymbolBinding {
    #[default]
    Unbound,
    Resolved(SymbolId),
    /// Overload resolution did not settle; the remaining candidates.
    Candidates(Vec<SymbolId>),
}

impl SymbolBinding {
    /// The bound symbol, or the sole remaining candidate.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            SymbolBinding::Resolved(symbol) => Some(*symbol),
            SymbolBinding::Candidates(candidates) if candidates.len() == 1 => Some(candidates[0]),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
}

impl AssignOp {
    pub fn token(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Eq,
    NotEq,
    Lt,
    Gt,
    And,
    Or,
}

impl BinaryOp {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::NotEq => 3,
            BinaryOp::Lt | BinaryOp::Gt => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul => 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// The `default` literal.
    Default,
    /// A local, parameter or discard (`_`).
    Ident(Name),
    This,
    Base,
    /// A type used as the receiver of a static member access.
    TypeName(Name),
    Member {
        target: Box<Expr>,
        name: Name,
    },
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    Paren(Box<Expr>),
    Lambda {
        params: Vec<Name>,
        body: Block,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub binding: SymbolBinding,
    pub aspect_reference: Option<AspectReferenceSpecification>,
    pub span: Option<TextRange>,
}

impl Expr {
    pub fn with_binding(mut self, binding: SymbolBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_aspect_reference(mut self, specification: AspectReferenceSpecification) -> Self {
        self.aspect_reference = Some(specification);
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = Some(span);
        self
    }

    /// The identifier text if this is a plain identifier.
    pub fn as_ident(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_discard(&self) -> bool {
        self.as_ident().is_some_and(|name| name == "_")
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Stmt>,
    /// Produced by inlining; merged into the enclosing block during cleanup.
    pub flattenable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Block(Block),
    Expr(Expr),
    LocalDecl {
        /// `None` stands for `var`.
        ty: Option<TypeRef>,
        name: Name,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Labeled {
        label: Name,
        stmt: Box<Stmt>,
    },
    Goto(Name),
    Throw(Option<Expr>),
    LocalFunction {
        name: Name,
        params: Vec<Parameter>,
        return_type: TypeRef,
        body: Block,
    },
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub trivia: Vec<Trivia>,
    pub span: Option<TextRange>,
}

impl Stmt {
    pub fn with_trivia(mut self, trivia: Trivia) -> Self {
        self.trivia.push(trivia);
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, StmtKind::Empty) && self.trivia.is_empty()
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
    Add,
    Remove,
}

impl AccessorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessorKind::Get => "get",
            AccessorKind::Set => "set",
            AccessorKind::Add => "add",
            AccessorKind::Remove => "remove",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccessorDecl {
    pub id: NodeId,
    pub symbol: SymbolId,
    pub kind: AccessorKind,
    /// `None` for auto-implemented accessors.
    pub body: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub params: Vec<Parameter>,
    pub return_type: TypeRef,
    /// `None` for abstract or extern methods.
    pub body: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstructorDecl {
    pub params: Vec<Parameter>,
    pub body: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub ty: TypeRef,
    pub accessors: Vec<AccessorDecl>,
    pub initializer: Option<Expr>,
}

impl PropertyDecl {
    pub fn is_auto(&self) -> bool {
        !self.accessors.is_empty() && self.accessors.iter().all(|a| a.body.is_none())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventDecl {
    pub ty: TypeRef,
    /// Empty for field-like events.
    pub accessors: Vec<AccessorDecl>,
    pub initializer: Option<Expr>,
}

impl EventDecl {
    pub fn is_field_like(&self) -> bool {
        self.accessors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub ty: TypeRef,
    pub initializer: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemberKind {
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Property(PropertyDecl),
    Event(EventDecl),
    Field(FieldDecl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberDecl {
    pub id: NodeId,
    pub symbol: SymbolId,
    pub name: Name,
    pub modifiers: Modifiers,
    /// Interface name for explicit interface implementations.
    pub explicit_interface: Option<Name>,
    pub kind: MemberKind,
    pub trivia: Vec<Trivia>,
    pub span: Option<TextRange>,
}

impl MemberDecl {
    pub fn accessors(&self) -> &[AccessorDecl] {
        match &self.kind {
            MemberKind::Property(property) => &property.accessors,
            MemberKind::Event(event) => &event.accessors,
            _ => &[],
        }
    }

    pub fn accessors_mut(&mut self) -> Option<&mut Vec<AccessorDecl>> {
        match &mut self.kind {
            MemberKind::Property(property) => Some(&mut property.accessors),
            MemberKind::Event(event) => Some(&mut event.accessors),
            _ => None,
        }
    }

    /// Body of a method or constructor.
    pub fn body(&self) -> Option<&Block> {
        match &self.kind {
            MemberKind::Method(method) => method.body.as_ref(),
            MemberKind::Constructor(ctor) => ctor.body.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub id: NodeId,
    pub symbol: SymbolId,
    pub name: Name,
    pub members: Vec<MemberDecl>,
}
