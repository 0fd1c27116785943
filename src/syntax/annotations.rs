//! Annotations attached to syntax by the injection phase.
//!
//! The linker never infers these; it only reads them. An aspect reference
//! annotation marks a member access that denotes "some version" of a member
//! rather than a literal symbol.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::base::AspectLayerId;

/// Which version of the referenced member an aspect reference denotes,
/// relative to the aspect layer that produced the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AspectReferenceOrder {
    /// The member as written in source, before any aspect layer.
    Base,
    /// The closest version contributed by a strictly earlier layer.
    Previous,
    /// The closest version contributed by this layer or an earlier one.
    Current,
    /// The fully composed member as seen by external callers.
    Final,
}

/// Which part of the referenced member is targeted.
///
/// Accessor references are normalized so that the symbol is always the
/// owning property or event and this kind says which accessor is meant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AspectReferenceTargetKind {
    /// The member itself (methods, constructors, fields).
    Itself,
    PropertyGet,
    PropertySet,
    EventAdd,
    EventRemove,
}

impl AspectReferenceTargetKind {
    pub fn is_property_accessor(self) -> bool {
        matches!(self, Self::PropertyGet | Self::PropertySet)
    }

    pub fn is_event_accessor(self) -> bool {
        matches!(self, Self::EventAdd | Self::EventRemove)
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::Itself => "self",
            Self::PropertyGet => "get",
            Self::PropertySet => "set",
            Self::EventAdd => "add",
            Self::EventRemove => "remove",
        }
    }
}

/// Flags carried by an aspect reference annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AspectReferenceFlags(u8);

impl AspectReferenceFlags {
    pub const NONE: Self = Self(0);
    /// The injection phase allows the reference to be inlined.
    pub const INLINEABLE: Self = Self(1);
    /// The reference is invoked on a receiver the template chose explicitly.
    pub const CUSTOM_RECEIVER: Self = Self(1 << 1);

    /// Returns true if every flag in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for AspectReferenceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AspectReferenceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The annotation placed on a member access that refers to another version
/// of a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AspectReferenceSpecification {
    /// Layer of the code containing the reference.
    pub layer: AspectLayerId,
    pub order: AspectReferenceOrder,
    pub target_kind: AspectReferenceTargetKind,
    pub flags: AspectReferenceFlags,
}

impl AspectReferenceSpecification {
    pub fn new(layer: AspectLayerId, order: AspectReferenceOrder) -> Self {
        Self {
            layer,
            order,
            target_kind: AspectReferenceTargetKind::Itself,
            flags: AspectReferenceFlags::INLINEABLE,
        }
    }

    pub fn with_target_kind(mut self, target_kind: AspectReferenceTargetKind) -> Self {
        self.target_kind = target_kind;
        self
    }

    pub fn with_flags(mut self, flags: AspectReferenceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_inlineable(&self) -> bool {
        self.flags.contains(AspectReferenceFlags::INLINEABLE)
    }
}

impl fmt::Display for AspectReferenceSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{} ({})",
            self.order,
            self.layer,
            self.target_kind.display()
        )
    }
}

/// Trivia kept on statements and members.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// A line comment, printed as `// text`.
    Comment(String),
    /// A diagnostic suppression emitted for the intermediate compilation only.
    Suppression(crate::base::Name),
}

impl Trivia {
    pub fn is_suppression(&self) -> bool {
        matches!(self, Trivia::Suppression(_))
    }
}
