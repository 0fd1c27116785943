//! Semantic model of the intermediate compilation.
//!
//! The linker never binds names itself: it asks the model. A [`Compilation`]
//! owns the symbol table and the declaration syntax, and answers the
//! questions the linker has about symbols (kind, declaring type, accessors,
//! body). The [`IntroductionRegistry`] describes what the injection phase
//! added on top of the source program.

mod builder;
mod comparer;
mod registry;
mod symbols;

pub use builder::{AccessorSpec, CompilationBuilder, EventSymbols, MethodSpec, PropertySymbols};
pub use comparer::SymbolComparer;
pub use registry::{
    DeclarationFlags, InjectedMember, InjectedMemberKind, InjectionRegistry,
    InjectionRegistryBuilder, IntroductionRegistry,
};
pub use symbols::{AccessorSymbols, MethodKind, SymbolData, SymbolKind};

use rustc_hash::FxHashMap;

use crate::base::{CompilationId, NodeId, SymbolId};
use crate::syntax::{AccessorDecl, Block, MemberDecl, SyntaxFactory, TypeDecl};

/// Where a symbol's declaration lives in [`Compilation::types`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DeclarationLocation {
    pub(crate) ty: usize,
    pub(crate) member: Option<usize>,
    pub(crate) accessor: Option<usize>,
}

/// The intermediate compilation: symbols plus declaration syntax.
#[derive(Clone, Debug)]
pub struct Compilation {
    id: CompilationId,
    symbols: Vec<SymbolData>,
    types: Vec<TypeDecl>,
    locations: FxHashMap<SymbolId, DeclarationLocation>,
    next_node_id: NodeId,
}

impl Compilation {
    pub(crate) fn new(
        id: CompilationId,
        symbols: Vec<SymbolData>,
        types: Vec<TypeDecl>,
        next_node_id: NodeId,
    ) -> Self {
        let locations = index_declarations(&types);
        Self {
            id,
            symbols,
            types,
            locations,
            next_node_id,
        }
    }

    pub fn id(&self) -> CompilationId {
        self.id
    }

    pub fn symbols(&self) -> &[SymbolData] {
        &self.symbols
    }

    /// Symbol data for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this compilation.
    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.index()]
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&SymbolData> {
        self.symbols.get(id.index())
    }

    /// Type declarations in declaration order.
    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    pub fn type_decl(&self, symbol: SymbolId) -> Option<&TypeDecl> {
        let location = self.locations.get(&symbol)?;
        if location.member.is_some() {
            return None;
        }
        self.types.get(location.ty)
    }

    /// Declaration of a member; accessors map to their owning member.
    pub fn member_decl(&self, symbol: SymbolId) -> Option<&MemberDecl> {
        let location = self.locations.get(&symbol)?;
        self.types.get(location.ty)?.members.get(location.member?)
    }

    pub fn accessor_decl(&self, symbol: SymbolId) -> Option<&AccessorDecl> {
        let location = self.locations.get(&symbol)?;
        let member = self.types.get(location.ty)?.members.get(location.member?)?;
        member.accessors().get(location.accessor?)
    }

    /// Body of a method, constructor or accessor, when it has one.
    pub fn method_body(&self, symbol: SymbolId) -> Option<&Block> {
        let location = self.locations.get(&symbol)?;
        if location.accessor.is_some() {
            return self.accessor_decl(symbol)?.body.as_ref();
        }
        self.member_decl(symbol)?.body()
    }

    pub fn declaring_type(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.get_symbol(symbol)?.containing_type
    }

    /// The first node id not used by any declaration of this compilation.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// A factory allocating ids after every existing node.
    pub fn syntax_factory(&self) -> SyntaxFactory {
        SyntaxFactory::starting_at(self.next_node_id)
    }
}

fn index_declarations(types: &[TypeDecl]) -> FxHashMap<SymbolId, DeclarationLocation> {
    let mut locations = FxHashMap::default();
    for (ty_index, ty) in types.iter().enumerate() {
        locations.insert(
            ty.symbol,
            DeclarationLocation {
                ty: ty_index,
                member: None,
                accessor: None,
            },
        );
        for (member_index, member) in ty.members.iter().enumerate() {
            locations.insert(
                member.symbol,
                DeclarationLocation {
                    ty: ty_index,
                    member: Some(member_index),
                    accessor: None,
                },
            );
            for (accessor_index, accessor) in member.accessors().iter().enumerate() {
                locations.insert(
                    accessor.symbol,
                    DeclarationLocation {
                        ty: ty_index,
                        member: Some(member_index),
                        accessor: Some(accessor_index),
                    },
                );
            }
        }
    }
    locations
}
