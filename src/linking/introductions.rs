//! Accessor-aware view over the introduction registry.
//!
//! The registry speaks in member-level symbols. The linker mostly deals in
//! method-level symbols (an accessor rather than its property), so every
//! query here first lifts an accessor to its owner and maps results back to
//! the accessor of the same kind.

use rustc_hash::FxHashMap;

use crate::base::{AspectLayerId, SymbolId};
use crate::model::{
    Compilation, DeclarationFlags, IntroductionRegistry, MethodKind, SymbolComparer, SymbolData,
    SymbolKind,
};
use crate::syntax::AspectReferenceTargetKind;

use super::semantic::{MethodSemantic, SymbolSemantic, SymbolSemanticKind};

#[derive(Clone, Copy, Debug, Default)]
struct InjectedInfo {
    layer: AspectLayerId,
    flags: DeclarationFlags,
}

pub struct IntroductionIndex<'a> {
    compilation: &'a Compilation,
    registry: &'a dyn IntroductionRegistry,
    comparer: SymbolComparer,
    injected: FxHashMap<SymbolId, InjectedInfo>,
}

impl<'a> IntroductionIndex<'a> {
    pub fn new(compilation: &'a Compilation, registry: &'a dyn IntroductionRegistry) -> Self {
        let comparer = SymbolComparer::for_compilation(compilation);
        let mut injected = FxHashMap::default();
        for member in registry.get_injected_members() {
            match registry.get_symbol_for_injected_member(member) {
                Some(symbol) => {
                    injected.insert(
                        comparer.canonical(symbol),
                        InjectedInfo {
                            layer: member.layer,
                            flags: member.flags,
                        },
                    );
                }
                None => {
                    tracing::trace!(
                        declaration = %member.declaration,
                        "injected member without symbol"
                    );
                }
            }
        }

        Self {
            compilation,
            registry,
            comparer,
            injected,
        }
    }

    pub fn compilation(&self) -> &'a Compilation {
        self.compilation
    }

    pub fn comparer(&self) -> &SymbolComparer {
        &self.comparer
    }

    pub fn symbol(&self, symbol: SymbolId) -> &'a SymbolData {
        self.compilation.symbol(symbol)
    }

    // ========================================================================
    // ACCESSOR NORMALIZATION
    // ========================================================================

    /// The member owning `symbol`: the property or event of an accessor,
    /// the symbol itself otherwise.
    pub fn member_of(&self, symbol: SymbolId) -> SymbolId {
        let symbol = self.comparer.canonical(symbol);
        let data = self.compilation.symbol(symbol);
        match (data.is_accessor(), data.associated_member) {
            (true, Some(owner)) => self.comparer.canonical(owner),
            _ => symbol,
        }
    }

    /// The accessor kind `symbol` stands for, `Itself` for non-accessors.
    pub fn target_kind_of(&self, symbol: SymbolId) -> AspectReferenceTargetKind {
        self.compilation
            .symbol(symbol)
            .method_kind()
            .and_then(MethodKind::accessor_target_kind)
            .unwrap_or(AspectReferenceTargetKind::Itself)
    }

    /// The symbol of `member` matching `kind`: an accessor, or the member itself.
    pub fn with_target_kind(
        &self,
        member: SymbolId,
        kind: AspectReferenceTargetKind,
    ) -> Option<SymbolId> {
        match kind {
            AspectReferenceTargetKind::Itself => Some(member),
            kind => self.compilation.symbol(member).accessors.for_target_kind(kind),
        }
    }

    /// Map a member-level result back to the accessor `symbol` is.
    fn project(&self, symbol: SymbolId, member: SymbolId) -> Option<SymbolId> {
        self.with_target_kind(member, self.target_kind_of(symbol))
    }

    // ========================================================================
    // REGISTRY QUERIES
    // ========================================================================

    pub fn is_override_target(&self, symbol: SymbolId) -> bool {
        self.registry.is_override_target(self.member_of(symbol))
    }

    pub fn is_override(&self, symbol: SymbolId) -> bool {
        self.registry.is_override(self.member_of(symbol))
    }

    pub fn override_target(&self, symbol: SymbolId) -> Option<SymbolId> {
        let target = self.registry.get_override_target(self.member_of(symbol))?;
        self.project(symbol, self.comparer.canonical(target))
    }

    /// Overrides of `symbol`, earliest layer first. Accessor queries skip
    /// overrides that do not declare the accessor.
    pub fn overrides(&self, symbol: SymbolId) -> Vec<SymbolId> {
        self.registry
            .get_overrides(self.member_of(symbol))
            .into_iter()
            .filter_map(|member| self.project(symbol, self.comparer.canonical(member)))
            .collect()
    }

    pub fn last_override(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.overrides(symbol).last().copied()
    }

    /// Member-level override targets in registration order.
    pub fn overridden_members(&self) -> Vec<SymbolId> {
        self.registry
            .get_overridden_members()
            .into_iter()
            .map(|symbol| self.comparer.canonical(symbol))
            .collect()
    }

    pub fn layer(&self, symbol: SymbolId) -> Option<AspectLayerId> {
        self.injected.get(&self.member_of(symbol)).map(|info| info.layer)
    }

    pub fn flags(&self, symbol: SymbolId) -> DeclarationFlags {
        self.injected
            .get(&self.member_of(symbol))
            .map(|info| info.flags)
            .unwrap_or_default()
    }

    /// Injected members with their flags, in registration order.
    pub fn injected_members(&self) -> impl Iterator<Item = (SymbolId, DeclarationFlags)> + '_ {
        self.registry
            .get_injected_members()
            .iter()
            .filter_map(|member| {
                let symbol = self.registry.get_symbol_for_injected_member(member)?;
                Some((self.comparer.canonical(symbol), member.flags))
            })
    }

    // ========================================================================
    // DECLARATION FACTS
    // ========================================================================

    /// Event with field semantics, declared as such or marked by the injector.
    pub fn is_event_field(&self, symbol: SymbolId) -> bool {
        let member = self.member_of(symbol);
        let data = self.compilation.symbol(member);
        data.kind == SymbolKind::Event
            && (data.is_event_field || self.flags(member).contains(DeclarationFlags::EVENT_FIELD))
    }

    pub fn is_auto_property(&self, symbol: SymbolId) -> bool {
        self.compilation.symbol(self.member_of(symbol)).is_auto_property
    }

    /// Accessors without syntax body backed by compiler-generated storage.
    pub fn has_storage_semantics(&self, symbol: SymbolId) -> bool {
        self.is_auto_property(symbol) || self.is_event_field(symbol)
    }

    /// Overrides a base-class member in the language sense.
    pub fn is_language_override(&self, symbol: SymbolId) -> bool {
        self.compilation
            .symbol(self.member_of(symbol))
            .overridden_member
            .is_some()
    }

    /// The declaration carries code of its own (a body or storage).
    pub fn has_own_implementation(&self, symbol: SymbolId) -> bool {
        let member = self.member_of(symbol);
        let data = self.compilation.symbol(member);
        if data.is_abstract {
            return false;
        }
        match data.kind {
            SymbolKind::Method(_) => self.compilation.method_body(member).is_some(),
            SymbolKind::Property | SymbolKind::Event => {
                self.has_storage_semantics(member)
                    || data
                        .accessors
                        .iter()
                        .any(|accessor| self.compilation.method_body(accessor).is_some())
            }
            SymbolKind::Field => true,
            SymbolKind::NamedType => false,
        }
    }

    /// Constructors and their overrides cannot be emitted on their own.
    pub fn has_standalone_emission(&self, symbol: SymbolId) -> bool {
        let target = self.override_target(symbol).unwrap_or(symbol);
        !self
            .compilation
            .symbol(target)
            .method_kind()
            .is_some_and(MethodKind::is_constructor)
    }

    /// Setter the compiler declared on the first override of a getter-only
    /// auto-property. It has no syntax and writes the original storage.
    pub fn implicit_setter(&self, member: SymbolId) -> Option<SymbolId> {
        let data = self.compilation.symbol(member);
        if data.kind != SymbolKind::Property
            || !self.is_auto_property(member)
            || data.accessors.set.is_some()
        {
            return None;
        }
        let first = *self.overrides(member).first()?;
        let setter = self.compilation.symbol(first).accessors.set?;
        let setter = self.comparer.canonical(setter);
        self.compilation
            .symbol(setter)
            .is_implicitly_declared
            .then_some(setter)
    }

    /// Whether `(symbol, kind)` names a version that exists.
    pub fn is_valid(&self, semantic: SymbolSemantic) -> bool {
        let data = self.compilation.symbol(semantic.symbol);
        if data.kind == SymbolKind::NamedType {
            return false;
        }
        match semantic.kind {
            SymbolSemanticKind::Default => true,
            SymbolSemanticKind::Base => {
                self.is_override_target(semantic.symbol)
                    || self.is_language_override(semantic.symbol)
            }
            SymbolSemanticKind::Final => self.is_override_target(semantic.symbol),
        }
    }

    /// Construct a semantic, asserting that the combination exists.
    ///
    /// # Panics
    ///
    /// Panics on an invalid combination; callers derive kinds from the
    /// registry, so this is a programming error.
    pub fn semantic(&self, symbol: SymbolId, kind: SymbolSemanticKind) -> SymbolSemantic {
        let semantic = SymbolSemantic::new(self.comparer.canonical(symbol), kind);
        assert!(
            self.is_valid(semantic),
            "invalid semantic {semantic} for {} {}",
            self.compilation.symbol(symbol).kind.display(),
            self.compilation.symbol(symbol).name
        );
        semantic
    }

    /// [`Self::semantic`] for a method-like symbol.
    ///
    /// # Panics
    ///
    /// Panics when the combination is invalid or the symbol is not a method,
    /// constructor or accessor.
    pub fn method_semantic(&self, symbol: SymbolId, kind: SymbolSemanticKind) -> MethodSemantic {
        let semantic = self.semantic(symbol, kind);
        assert!(
            self.compilation.symbol(semantic.symbol).is_method_like(),
            "{semantic} is not a method semantic"
        );
        MethodSemantic::new(semantic.symbol, kind)
    }

    pub fn declaring_type(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.compilation
            .declaring_type(symbol)
            .map(|ty| self.comparer.canonical(ty))
    }

    /// Qualified display name, `C.M`.
    pub fn display_name(&self, symbol: SymbolId) -> String {
        let data = self.compilation.symbol(symbol);
        match data.containing_type {
            Some(ty) => format!("{}.{}", self.compilation.symbol(ty).name, data.name),
            None => data.name.to_string(),
        }
    }
}
