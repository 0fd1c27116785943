//! Symbol data: what the semantic model knows about each declaration.

use crate::base::{Name, SymbolId};
use crate::syntax::{AccessorKind, AspectReferenceTargetKind, Parameter, TypeRef};

/// The kind of method-like symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    StaticConstructor,
    PropertyGet,
    PropertySet,
    EventAdd,
    EventRemove,
}

impl MethodKind {
    pub fn is_accessor(self) -> bool {
        self.accessor_target_kind().is_some()
    }

    /// Target kind an accessor is normalized to; `None` for non-accessors.
    pub fn accessor_target_kind(self) -> Option<AspectReferenceTargetKind> {
        match self {
            MethodKind::PropertyGet => Some(AspectReferenceTargetKind::PropertyGet),
            MethodKind::PropertySet => Some(AspectReferenceTargetKind::PropertySet),
            MethodKind::EventAdd => Some(AspectReferenceTargetKind::EventAdd),
            MethodKind::EventRemove => Some(AspectReferenceTargetKind::EventRemove),
            _ => None,
        }
    }

    pub fn is_constructor(self) -> bool {
        matches!(self, MethodKind::Constructor | MethodKind::StaticConstructor)
    }

    pub fn accessor_kind(self) -> Option<AccessorKind> {
        match self {
            MethodKind::PropertyGet => Some(AccessorKind::Get),
            MethodKind::PropertySet => Some(AccessorKind::Set),
            MethodKind::EventAdd => Some(AccessorKind::Add),
            MethodKind::EventRemove => Some(AccessorKind::Remove),
            _ => None,
        }
    }

    pub fn from_accessor(kind: AccessorKind) -> Self {
        match kind {
            AccessorKind::Get => MethodKind::PropertyGet,
            AccessorKind::Set => MethodKind::PropertySet,
            AccessorKind::Add => MethodKind::EventAdd,
            AccessorKind::Remove => MethodKind::EventRemove,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    NamedType,
    Method(MethodKind),
    Property,
    Event,
    Field,
}

impl SymbolKind {
    pub fn is_method(self) -> bool {
        matches!(self, SymbolKind::Method(_))
    }

    pub fn method_kind(self) -> Option<MethodKind> {
        match self {
            SymbolKind::Method(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            SymbolKind::NamedType => "type",
            SymbolKind::Method(MethodKind::Constructor | MethodKind::StaticConstructor) => {
                "constructor"
            }
            SymbolKind::Method(kind) if kind.is_accessor() => "accessor",
            SymbolKind::Method(_) => "method",
            SymbolKind::Property => "property",
            SymbolKind::Event => "event",
            SymbolKind::Field => "field",
        }
    }
}

/// Accessor symbols of a property or event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessorSymbols {
    pub get: Option<SymbolId>,
    pub set: Option<SymbolId>,
    pub add: Option<SymbolId>,
    pub remove: Option<SymbolId>,
}

impl AccessorSymbols {
    pub fn for_target_kind(&self, kind: AspectReferenceTargetKind) -> Option<SymbolId> {
        match kind {
            AspectReferenceTargetKind::Itself => None,
            AspectReferenceTargetKind::PropertyGet => self.get,
            AspectReferenceTargetKind::PropertySet => self.set,
            AspectReferenceTargetKind::EventAdd => self.add,
            AspectReferenceTargetKind::EventRemove => self.remove,
        }
    }

    pub fn for_accessor_kind(&self, kind: AccessorKind) -> Option<SymbolId> {
        match kind {
            AccessorKind::Get => self.get,
            AccessorKind::Set => self.set,
            AccessorKind::Add => self.add,
            AccessorKind::Remove => self.remove,
        }
    }

    /// Declared accessors in get/set/add/remove order.
    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        [self.get, self.set, self.add, self.remove]
            .into_iter()
            .flatten()
    }

    pub fn set_kind(&mut self, kind: AccessorKind, symbol: SymbolId) {
        match kind {
            AccessorKind::Get => self.get = Some(symbol),
            AccessorKind::Set => self.set = Some(symbol),
            AccessorKind::Add => self.add = Some(symbol),
            AccessorKind::Remove => self.remove = Some(symbol),
        }
    }
}

/// A symbol of the intermediate compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolData {
    pub id: SymbolId,
    pub name: Name,
    pub kind: SymbolKind,
    /// Declaring type; `None` for types.
    pub containing_type: Option<SymbolId>,
    /// Owning property or event of an accessor.
    pub associated_member: Option<SymbolId>,
    pub accessors: AccessorSymbols,
    pub parameters: Vec<Parameter>,
    /// Return type of methods, type of properties, events and fields.
    pub return_type: TypeRef,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Base-class member this symbol overrides in the language sense.
    pub overridden_member: Option<SymbolId>,
    /// Definition this symbol was constructed from (generic instantiation).
    pub original_definition: Option<SymbolId>,
    pub is_event_field: bool,
    pub is_auto_property: bool,
    /// Synthesized by the compiler or the injection phase, not written in source.
    pub is_implicitly_declared: bool,
    pub explicit_interface: Option<Name>,
}

impl SymbolData {
    pub fn new(id: SymbolId, name: impl Into<Name>, kind: SymbolKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            containing_type: None,
            associated_member: None,
            accessors: AccessorSymbols::default(),
            parameters: Vec::new(),
            return_type: TypeRef::void(),
            is_static: false,
            is_abstract: false,
            overridden_member: None,
            original_definition: None,
            is_event_field: false,
            is_auto_property: false,
            is_implicitly_declared: false,
            explicit_interface: None,
        }
    }

    pub fn method_kind(&self) -> Option<MethodKind> {
        self.kind.method_kind()
    }

    pub fn is_accessor(&self) -> bool {
        self.method_kind().is_some_and(MethodKind::is_accessor)
    }

    pub fn is_method_like(&self) -> bool {
        self.kind.is_method()
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_normalization_kinds() {
        assert_eq!(
            MethodKind::PropertySet.accessor_target_kind(),
            Some(AspectReferenceTargetKind::PropertySet)
        );
        assert_eq!(MethodKind::Ordinary.accessor_target_kind(), None);
        assert!(MethodKind::EventRemove.is_accessor());
        assert!(!MethodKind::Constructor.is_accessor());
    }

    #[test]
    fn test_accessor_symbols_iterate_in_declaration_order() {
        let mut accessors = AccessorSymbols::default();
        accessors.set_kind(AccessorKind::Set, SymbolId(5));
        accessors.set_kind(AccessorKind::Get, SymbolId(4));
        assert_eq!(accessors.iter().collect::<Vec<_>>(), vec![SymbolId(4), SymbolId(5)]);
        assert_eq!(
            accessors.for_target_kind(AspectReferenceTargetKind::PropertyGet),
            Some(SymbolId(4))
        );
    }
}
