//! Programmatic construction of a [`Compilation`].
//!
//! Source parsing is not part of the crate; hosts (and tests) describe the
//! intermediate program through this builder. Bodies are built with the
//! shared [`SyntaxFactory`] returned by [`CompilationBuilder::factory`] so
//! that every node id is unique within the compilation.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{CompilationId, Name, SymbolId};
use crate::syntax::{
    AccessorDecl, AccessorKind, Block, ConstructorDecl, EventDecl, Expr, FieldDecl, MemberDecl,
    MemberKind, MethodDecl, Modifiers, Parameter, PropertyDecl, SyntaxFactory, TypeDecl, TypeRef,
    Visibility,
};

use super::symbols::{MethodKind, SymbolData, SymbolKind};
use super::{Compilation, DeclarationLocation};

// ============================================================================
// MEMBER SPECS
// ============================================================================

/// Shape of a method declaration.
#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub name: Name,
    pub params: Vec<Parameter>,
    pub return_type: TypeRef,
    pub modifiers: Modifiers,
    pub body: Option<Block>,
    pub explicit_interface: Option<Name>,
    pub overridden_member: Option<SymbolId>,
}

impl MethodSpec {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::void(),
            modifiers: Modifiers::default(),
            body: None,
            explicit_interface: None,
            overridden_member: None,
        }
    }

    pub fn returns(mut self, ty: impl Into<Name>) -> Self {
        self.return_type = TypeRef::new(ty);
        self
    }

    pub fn param(mut self, name: impl Into<Name>, ty: impl Into<Name>) -> Self {
        self.params.push(Parameter::new(name, ty));
        self
    }

    pub fn body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn private(self) -> Self {
        self.modifiers(Modifiers::private())
    }

    pub fn static_(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Explicit implementation of `interface`; drops the visibility modifier.
    pub fn explicit(mut self, interface: impl Into<Name>) -> Self {
        self.explicit_interface = Some(interface.into());
        self.modifiers.visibility = None;
        self
    }

    /// Language override of a base-class member.
    pub fn overriding(mut self, base_member: SymbolId) -> Self {
        self.overridden_member = Some(base_member);
        self.modifiers.is_override = true;
        self
    }
}

/// One accessor of a property or event.
#[derive(Clone, Debug)]
pub struct AccessorSpec {
    pub kind: AccessorKind,
    pub body: Option<Block>,
    /// Synthesized rather than written in source.
    pub implicit: bool,
}

impl AccessorSpec {
    pub fn new(kind: AccessorKind, body: Option<Block>) -> Self {
        Self {
            kind,
            body,
            implicit: false,
        }
    }

    pub fn get(body: Option<Block>) -> Self {
        Self::new(AccessorKind::Get, body)
    }

    pub fn set(body: Option<Block>) -> Self {
        Self::new(AccessorKind::Set, body)
    }

    pub fn add(body: Option<Block>) -> Self {
        Self::new(AccessorKind::Add, body)
    }

    pub fn remove(body: Option<Block>) -> Self {
        Self::new(AccessorKind::Remove, body)
    }

    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }
}

/// Symbols created for a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertySymbols {
    pub property: SymbolId,
    pub get: Option<SymbolId>,
    pub set: Option<SymbolId>,
}

/// Symbols created for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSymbols {
    pub event: SymbolId,
    pub add: SymbolId,
    pub remove: SymbolId,
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct CompilationBuilder {
    id: CompilationId,
    factory: Arc<SyntaxFactory>,
    symbols: Vec<SymbolData>,
    types: Vec<TypeDecl>,
    locations: FxHashMap<SymbolId, DeclarationLocation>,
}

impl CompilationBuilder {
    pub fn new(id: CompilationId) -> Self {
        Self {
            id,
            factory: Arc::new(SyntaxFactory::new()),
            symbols: Vec::new(),
            types: Vec::new(),
            locations: FxHashMap::default(),
        }
    }

    /// The factory every body of this compilation must be built with.
    pub fn factory(&self) -> Arc<SyntaxFactory> {
        Arc::clone(&self.factory)
    }

    pub fn add_type(&mut self, name: impl Into<Name>) -> SymbolId {
        let name = name.into();
        let symbol = self.push_symbol(SymbolData::new(
            SymbolId(0),
            name.clone(),
            SymbolKind::NamedType,
        ));
        self.locations.insert(
            symbol,
            DeclarationLocation {
                ty: self.types.len(),
                member: None,
                accessor: None,
            },
        );
        self.types.push(TypeDecl {
            id: self.factory.next_id(),
            symbol,
            name,
            members: Vec::new(),
        });
        symbol
    }

    pub fn add_method(&mut self, ty: SymbolId, spec: MethodSpec) -> SymbolId {
        let mut data = SymbolData::new(
            SymbolId(0),
            spec.name.clone(),
            SymbolKind::Method(MethodKind::Ordinary),
        );
        data.containing_type = Some(ty);
        data.parameters = spec.params.clone();
        data.return_type = spec.return_type.clone();
        data.is_static = spec.modifiers.is_static;
        data.is_abstract = spec.modifiers.is_abstract;
        data.overridden_member = spec.overridden_member;
        data.explicit_interface = spec.explicit_interface.clone();
        let symbol = self.push_symbol(data);

        let decl = MemberDecl {
            id: self.factory.next_id(),
            symbol,
            name: spec.name,
            modifiers: spec.modifiers,
            explicit_interface: spec.explicit_interface,
            kind: MemberKind::Method(MethodDecl {
                params: spec.params,
                return_type: spec.return_type,
                body: spec.body,
            }),
            trivia: Vec::new(),
            span: None,
        };
        self.push_member(ty, decl);
        symbol
    }

    pub fn add_constructor(
        &mut self,
        ty: SymbolId,
        params: Vec<Parameter>,
        body: Option<Block>,
    ) -> SymbolId {
        self.push_constructor(ty, MethodKind::Constructor, params, body, Modifiers::default())
    }

    pub fn add_static_constructor(&mut self, ty: SymbolId, body: Option<Block>) -> SymbolId {
        let modifiers = Modifiers {
            visibility: None,
            is_static: true,
            ..Modifiers::default()
        };
        self.push_constructor(ty, MethodKind::StaticConstructor, Vec::new(), body, modifiers)
    }

    fn push_constructor(
        &mut self,
        ty: SymbolId,
        kind: MethodKind,
        params: Vec<Parameter>,
        body: Option<Block>,
        modifiers: Modifiers,
    ) -> SymbolId {
        let name = self.symbols[ty.index()].name.clone();
        let mut data = SymbolData::new(SymbolId(0), name.clone(), SymbolKind::Method(kind));
        data.containing_type = Some(ty);
        data.parameters = params.clone();
        data.is_static = modifiers.is_static;
        let symbol = self.push_symbol(data);

        let decl = MemberDecl {
            id: self.factory.next_id(),
            symbol,
            name,
            modifiers,
            explicit_interface: None,
            kind: MemberKind::Constructor(ConstructorDecl { params, body }),
            trivia: Vec::new(),
            span: None,
        };
        self.push_member(ty, decl);
        symbol
    }

    /// Declare a property. Accessors without bodies make it an auto-property.
    pub fn add_property(
        &mut self,
        ty: SymbolId,
        name: impl Into<Name>,
        property_type: impl Into<Name>,
        accessors: Vec<AccessorSpec>,
        initializer: Option<Expr>,
    ) -> PropertySymbols {
        self.add_property_with(
            ty,
            name,
            property_type,
            Modifiers::default(),
            accessors,
            initializer,
        )
    }

    pub fn add_property_with(
        &mut self,
        ty: SymbolId,
        name: impl Into<Name>,
        property_type: impl Into<Name>,
        modifiers: Modifiers,
        accessors: Vec<AccessorSpec>,
        initializer: Option<Expr>,
    ) -> PropertySymbols {
        let name = name.into();
        let property_type = TypeRef::new(property_type);
        let is_auto = !accessors.is_empty() && accessors.iter().all(|a| a.body.is_none());

        let mut data = SymbolData::new(SymbolId(0), name.clone(), SymbolKind::Property);
        data.containing_type = Some(ty);
        data.return_type = property_type.clone();
        data.is_static = modifiers.is_static;
        data.is_auto_property = is_auto;
        let property = self.push_symbol(data);

        let accessor_decls = self.push_accessors(ty, property, &name, &property_type, accessors);
        let decl = MemberDecl {
            id: self.factory.next_id(),
            symbol: property,
            name,
            modifiers,
            explicit_interface: None,
            kind: MemberKind::Property(PropertyDecl {
                ty: property_type,
                accessors: accessor_decls,
                initializer,
            }),
            trivia: Vec::new(),
            span: None,
        };
        self.push_member(ty, decl);

        let accessors = self.symbols[property.index()].accessors;
        PropertySymbols {
            property,
            get: accessors.get,
            set: accessors.set,
        }
    }

    /// Declare an event. No accessors declares a field-like event.
    pub fn add_event(
        &mut self,
        ty: SymbolId,
        name: impl Into<Name>,
        event_type: impl Into<Name>,
        accessors: Vec<AccessorSpec>,
    ) -> EventSymbols {
        self.add_event_with(ty, name, event_type, Modifiers::default(), None, accessors)
    }

    pub fn add_event_with(
        &mut self,
        ty: SymbolId,
        name: impl Into<Name>,
        event_type: impl Into<Name>,
        modifiers: Modifiers,
        explicit_interface: Option<Name>,
        accessors: Vec<AccessorSpec>,
    ) -> EventSymbols {
        let name = name.into();
        let event_type = TypeRef::new(event_type);
        let field_like = accessors.is_empty();

        let mut data = SymbolData::new(SymbolId(0), name.clone(), SymbolKind::Event);
        data.containing_type = Some(ty);
        data.return_type = event_type.clone();
        data.is_static = modifiers.is_static;
        data.is_event_field = field_like;
        data.explicit_interface = explicit_interface.clone();
        let event = self.push_symbol(data);

        let accessor_decls = if field_like {
            // Field-like events get compiler-generated accessors without syntax.
            for kind in [AccessorKind::Add, AccessorKind::Remove] {
                let symbol = self.push_accessor_symbol(ty, event, &name, &event_type, kind, true);
                self.symbols[event.index()].accessors.set_kind(kind, symbol);
            }
            Vec::new()
        } else {
            self.push_accessors(ty, event, &name, &event_type, accessors)
        };

        let decl = MemberDecl {
            id: self.factory.next_id(),
            symbol: event,
            name,
            modifiers,
            explicit_interface,
            kind: MemberKind::Event(EventDecl {
                ty: event_type,
                accessors: accessor_decls,
                initializer: None,
            }),
            trivia: Vec::new(),
            span: None,
        };
        self.push_member(ty, decl);

        let accessors = self.symbols[event.index()].accessors;
        EventSymbols {
            event,
            add: accessors.add.unwrap_or(event),
            remove: accessors.remove.unwrap_or(event),
        }
    }

    pub fn add_field(
        &mut self,
        ty: SymbolId,
        name: impl Into<Name>,
        field_type: impl Into<Name>,
        initializer: Option<Expr>,
    ) -> SymbolId {
        let name = name.into();
        let field_type = TypeRef::new(field_type);
        let mut data = SymbolData::new(SymbolId(0), name.clone(), SymbolKind::Field);
        data.containing_type = Some(ty);
        data.return_type = field_type.clone();
        let symbol = self.push_symbol(data);

        let decl = MemberDecl {
            id: self.factory.next_id(),
            symbol,
            name,
            modifiers: Modifiers {
                visibility: Some(Visibility::Private),
                ..Modifiers::default()
            },
            explicit_interface: None,
            kind: MemberKind::Field(FieldDecl {
                ty: field_type,
                initializer,
            }),
            trivia: Vec::new(),
            span: None,
        };
        self.push_member(ty, decl);
        symbol
    }

    /// A constructed handle for `definition`, as a generic instantiation yields.
    pub fn add_constructed(&mut self, definition: SymbolId) -> SymbolId {
        let mut data = self.symbols[definition.index()].clone();
        data.original_definition = Some(definition);
        self.push_symbol(data)
    }

    /// Replace the body of a method, constructor or accessor declared earlier.
    ///
    /// Lets bodies reference members declared after their owner.
    pub fn set_body(&mut self, symbol: SymbolId, body: Block) -> bool {
        let Some(location) = self.locations.get(&symbol).copied() else {
            return false;
        };
        let Some(member) = location
            .member
            .and_then(|index| self.types.get_mut(location.ty)?.members.get_mut(index))
        else {
            return false;
        };

        if let Some(index) = location.accessor {
            let Some(accessor) = member.accessors_mut().and_then(|a| a.get_mut(index)) else {
                return false;
            };
            accessor.body = Some(body);
            return true;
        }

        match &mut member.kind {
            MemberKind::Method(method) => method.body = Some(body),
            MemberKind::Constructor(ctor) => ctor.body = Some(body),
            _ => return false,
        }
        true
    }

    pub fn build(self) -> Compilation {
        Compilation::new(self.id, self.symbols, self.types, self.factory.peek_next_id())
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn push_symbol(&mut self, mut data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        data.id = id;
        self.symbols.push(data);
        id
    }

    fn push_member(&mut self, ty: SymbolId, decl: MemberDecl) {
        let Some(location) = self.locations.get(&ty).copied() else {
            return;
        };
        let members = &mut self.types[location.ty].members;
        let member_index = members.len();
        self.locations.insert(
            decl.symbol,
            DeclarationLocation {
                ty: location.ty,
                member: Some(member_index),
                accessor: None,
            },
        );
        for (accessor_index, accessor) in decl.accessors().iter().enumerate() {
            self.locations.insert(
                accessor.symbol,
                DeclarationLocation {
                    ty: location.ty,
                    member: Some(member_index),
                    accessor: Some(accessor_index),
                },
            );
        }
        members.push(decl);
    }

    fn push_accessors(
        &mut self,
        ty: SymbolId,
        owner: SymbolId,
        owner_name: &Name,
        owner_type: &TypeRef,
        accessors: Vec<AccessorSpec>,
    ) -> Vec<AccessorDecl> {
        accessors
            .into_iter()
            .map(|spec| {
                let symbol = self.push_accessor_symbol(
                    ty,
                    owner,
                    owner_name,
                    owner_type,
                    spec.kind,
                    spec.implicit,
                );
                self.symbols[owner.index()].accessors.set_kind(spec.kind, symbol);
                AccessorDecl {
                    id: self.factory.next_id(),
                    symbol,
                    kind: spec.kind,
                    body: spec.body,
                }
            })
            .collect()
    }

    fn push_accessor_symbol(
        &mut self,
        ty: SymbolId,
        owner: SymbolId,
        owner_name: &Name,
        owner_type: &TypeRef,
        kind: AccessorKind,
        implicit: bool,
    ) -> SymbolId {
        let name = format!("{}_{}", kind.keyword(), owner_name);
        let mut data = SymbolData::new(
            SymbolId(0),
            name,
            SymbolKind::Method(MethodKind::from_accessor(kind)),
        );
        data.containing_type = Some(ty);
        data.associated_member = Some(owner);
        data.is_static = self.symbols[owner.index()].is_static;
        data.is_implicitly_declared = implicit;
        match kind {
            AccessorKind::Get => data.return_type = owner_type.clone(),
            AccessorKind::Set | AccessorKind::Add | AccessorKind::Remove => {
                data.parameters = vec![Parameter {
                    name: Name::new("value"),
                    ty: owner_type.clone(),
                }];
            }
        }
        self.push_symbol(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_declaration_is_indexed() {
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
        let compilation = builder.build();

        let data = compilation.symbol(m);
        assert_eq!(data.name, "M");
        assert_eq!(data.containing_type, Some(ty));
        assert_eq!(compilation.member_decl(m).map(|d| d.symbol), Some(m));
        assert_eq!(compilation.method_body(m).map(|b| b.statements.len()), Some(1));
        assert_eq!(compilation.type_decl(ty).map(|t| t.members.len()), Some(1));
        assert!(compilation.next_node_id() > compilation.types()[0].members[0].id);
    }

    #[test]
    fn test_property_accessors() {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let f = builder.factory();
        let ty = builder.add_type("C");
        let p = builder.add_property(
            ty,
            "P",
            "int",
            vec![
                AccessorSpec::get(Some(f.block(vec![f.ret(Some(f.int(1)))]))),
                AccessorSpec::set(None),
            ],
            None,
        );
        let compilation = builder.build();

        let get = p.get.expect("getter");
        let set = p.set.expect("setter");
        assert_eq!(compilation.symbol(get).associated_member, Some(p.property));
        assert_eq!(compilation.symbol(get).name, "get_P");
        assert!(compilation.method_body(get).is_some());
        assert!(compilation.method_body(set).is_none());
        assert!(!compilation.symbol(p.property).is_auto_property);
        assert_eq!(compilation.member_decl(set).map(|d| d.symbol), Some(p.property));
    }

    #[test]
    fn test_field_like_event_has_accessor_symbols() {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let ty = builder.add_type("C");
        let e = builder.add_event(ty, "Changed", "EventHandler", vec![]);
        let compilation = builder.build();

        let event = compilation.symbol(e.event);
        assert!(event.is_event_field);
        assert_eq!(event.accessors.add, Some(e.add));
        assert!(compilation.symbol(e.remove).is_implicitly_declared);
        assert!(compilation.accessor_decl(e.add).is_none());
    }

    #[test]
    fn test_set_body_after_declaration() {
        let mut builder = CompilationBuilder::new(CompilationId(0));
        let f = builder.factory();
        let ty = builder.add_type("C");
        let m = builder.add_method(ty, MethodSpec::new("M"));
        assert!(builder.set_body(m, f.block(vec![])));
        assert!(!builder.set_body(ty, f.block(vec![])));
        let compilation = builder.build();
        assert!(compilation.method_body(m).is_some());
    }
}
