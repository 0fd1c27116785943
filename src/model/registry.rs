//! Introduction registry: what the injection phase added to the program.
//!
//! The linker consumes the registry through [`IntroductionRegistry`] only.
//! [`InjectionRegistry`] is the in-memory implementation hosts and tests
//! build with [`InjectionRegistry::builder`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::base::{AspectLayerId, NodeId, SymbolId};

use super::Compilation;

// ============================================================================
// DECLARATION FLAGS
// ============================================================================

/// Linker-relevant flags of an injected declaration.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeclarationFlags(u8);

impl DeclarationFlags {
    pub const NONE: Self = Self(0);
    /// An explicit interface event implemented with field semantics.
    pub const EVENT_FIELD: Self = Self(1);
    /// The declaration has an initializer that is not part of its syntax.
    pub const HAS_HIDDEN_INITIALIZER: Self = Self(1 << 1);
    /// Nothing may be inlined into this declaration.
    pub const NOT_INLINING_DESTINATION: Self = Self(1 << 2);
    /// This declaration may not be inlined anywhere.
    pub const NOT_INLINEABLE: Self = Self(1 << 3);
    /// The declaration is kept even when nothing references it.
    pub const NOT_DISCARDABLE: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for DeclarationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DeclarationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for DeclarationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(DeclarationFlags, &str); 5] = [
            (DeclarationFlags::EVENT_FIELD, "EVENT_FIELD"),
            (DeclarationFlags::HAS_HIDDEN_INITIALIZER, "HAS_HIDDEN_INITIALIZER"),
            (DeclarationFlags::NOT_INLINING_DESTINATION, "NOT_INLINING_DESTINATION"),
            (DeclarationFlags::NOT_INLINEABLE, "NOT_INLINEABLE"),
            (DeclarationFlags::NOT_DISCARDABLE, "NOT_DISCARDABLE"),
        ];
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>();
        f.write_str(&names.join(" | "))
    }
}

// ============================================================================
// INJECTED MEMBERS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectedMemberKind {
    /// A new member the aspect introduced.
    Introduction,
    /// One aspect's version of an existing member.
    Override { target: SymbolId },
}

/// A member declaration added by the injection phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InjectedMember {
    /// Declaration node in the intermediate compilation.
    pub declaration: NodeId,
    pub layer: AspectLayerId,
    pub kind: InjectedMemberKind,
    pub flags: DeclarationFlags,
}

impl InjectedMember {
    pub fn override_target(&self) -> Option<SymbolId> {
        match self.kind {
            InjectedMemberKind::Override { target } => Some(target),
            InjectedMemberKind::Introduction => None,
        }
    }
}

/// Read-only view of the injection results.
///
/// All queries take member-level symbols (methods, constructors, properties,
/// events); accessors are answered through their owning member by the caller.
pub trait IntroductionRegistry: Send + Sync {
    /// The member has at least one override layer.
    fn is_override_target(&self, symbol: SymbolId) -> bool;

    /// The member is one aspect's override of another member.
    fn is_override(&self, symbol: SymbolId) -> bool;

    /// The member an override overrides.
    fn get_override_target(&self, symbol: SymbolId) -> Option<SymbolId>;

    /// Overrides of a target, earliest layer first.
    fn get_overrides(&self, symbol: SymbolId) -> Vec<SymbolId>;

    fn get_last_override(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.get_overrides(symbol).last().copied()
    }

    /// Every override target, in registration order.
    fn get_overridden_members(&self) -> Vec<SymbolId>;

    fn get_injected_members(&self) -> &[InjectedMember];

    fn get_symbol_for_injected_member(&self, member: &InjectedMember) -> Option<SymbolId>;
}

// ============================================================================
// IN-MEMORY REGISTRY
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct InjectionRegistry {
    members: Vec<InjectedMember>,
    symbols: FxHashMap<NodeId, SymbolId>,
    overrides: IndexMap<SymbolId, Vec<(AspectLayerId, SymbolId)>, FxBuildHasher>,
    targets: FxHashMap<SymbolId, SymbolId>,
}

impl InjectionRegistry {
    pub fn builder(compilation: &Compilation) -> InjectionRegistryBuilder<'_> {
        InjectionRegistryBuilder {
            compilation,
            registry: InjectionRegistry::default(),
        }
    }
}

impl IntroductionRegistry for InjectionRegistry {
    fn is_override_target(&self, symbol: SymbolId) -> bool {
        self.overrides.contains_key(&symbol)
    }

    fn is_override(&self, symbol: SymbolId) -> bool {
        self.targets.contains_key(&symbol)
    }

    fn get_override_target(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.targets.get(&symbol).copied()
    }

    fn get_overrides(&self, symbol: SymbolId) -> Vec<SymbolId> {
        self.overrides
            .get(&symbol)
            .map(|overrides| overrides.iter().map(|(_, symbol)| *symbol).collect())
            .unwrap_or_default()
    }

    fn get_overridden_members(&self) -> Vec<SymbolId> {
        self.overrides.keys().copied().collect()
    }

    fn get_injected_members(&self) -> &[InjectedMember] {
        &self.members
    }

    fn get_symbol_for_injected_member(&self, member: &InjectedMember) -> Option<SymbolId> {
        self.symbols.get(&member.declaration).copied()
    }
}

pub struct InjectionRegistryBuilder<'a> {
    compilation: &'a Compilation,
    registry: InjectionRegistry,
}

impl InjectionRegistryBuilder<'_> {
    /// Register `override_symbol` as the version of `target` contributed by `layer`.
    pub fn add_override(
        &mut self,
        target: SymbolId,
        override_symbol: SymbolId,
        layer: AspectLayerId,
    ) -> &mut Self {
        self.add_override_with_flags(target, override_symbol, layer, DeclarationFlags::NONE)
    }

    pub fn add_override_with_flags(
        &mut self,
        target: SymbolId,
        override_symbol: SymbolId,
        layer: AspectLayerId,
        flags: DeclarationFlags,
    ) -> &mut Self {
        if self.push_member(
            override_symbol,
            layer,
            InjectedMemberKind::Override { target },
            flags,
        ) {
            let overrides = self.registry.overrides.entry(target).or_default();
            // Stable: equal layers keep registration order.
            let position = overrides.partition_point(|(existing, _)| *existing <= layer);
            overrides.insert(position, (layer, override_symbol));
            self.registry.targets.insert(override_symbol, target);
        }
        self
    }

    /// Register a member the aspect introduced.
    pub fn add_introduction(
        &mut self,
        symbol: SymbolId,
        layer: AspectLayerId,
        flags: DeclarationFlags,
    ) -> &mut Self {
        self.push_member(symbol, layer, InjectedMemberKind::Introduction, flags);
        self
    }

    fn push_member(
        &mut self,
        symbol: SymbolId,
        layer: AspectLayerId,
        kind: InjectedMemberKind,
        flags: DeclarationFlags,
    ) -> bool {
        let Some(declaration) = self.compilation.member_decl(symbol).map(|decl| decl.id) else {
            tracing::warn!(%symbol, "injected member has no declaration, ignoring");
            return false;
        };
        self.registry.members.push(InjectedMember {
            declaration,
            layer,
            kind,
            flags,
        });
        self.registry.symbols.insert(declaration, symbol);
        true
    }

    pub fn build(&mut self) -> InjectionRegistry {
        std::mem::take(&mut self.registry)
    }
}
