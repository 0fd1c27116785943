//! Names of emitted members, and per-destination name allocation.

use rustc_hash::FxHashSet;

use crate::base::Name;
use crate::syntax::{Block, Parameter, walk};

use super::options::LinkerOptions;

/// `M` → `M_Source`.
pub fn source_member_name(name: &str, options: &LinkerOptions) -> Name {
    Name::from(format!("{name}{}", options.source_suffix))
}

/// `M` → `M_Empty`.
pub fn empty_member_name(name: &str, options: &LinkerOptions) -> Name {
    Name::from(format!("{name}{}", options.empty_suffix))
}

/// Identifiers in use within one destination body.
///
/// Every inlined body shares its destination's scope: inlined locals are
/// renamed when they collide with anything already declared there, and
/// return labels are numbered per destination.
#[derive(Clone, Debug, Default)]
pub struct NameScope {
    used: FxHashSet<Name>,
    next_label: u32,
}

impl NameScope {
    /// Scope seeded with the parameters, locals and labels of a body.
    pub fn for_body(params: &[Parameter], body: &Block) -> Self {
        let mut scope = Self::default();
        for param in params {
            scope.reserve(param.name.clone());
        }
        scope.reserve_body(body);
        scope
    }

    pub fn reserve(&mut self, name: Name) -> bool {
        self.used.insert(name)
    }

    pub fn reserve_body(&mut self, body: &Block) {
        for name in walk::declared_locals(body)
            .into_iter()
            .chain(walk::declared_labels(body))
        {
            self.reserve(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// `name` if free, otherwise the first free `name_N`. The result is reserved.
    pub fn fresh_local(&mut self, name: &Name) -> Name {
        if self.reserve(name.clone()) {
            return name.clone();
        }
        let mut n = 1u32;
        loop {
            let candidate = Name::from(format!("{name}_{n}"));
            if self.reserve(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Next return label, `{prefix}_{N}` with N counting from 1.
    pub fn fresh_label(&mut self, prefix: &str) -> Name {
        loop {
            self.next_label += 1;
            let candidate = Name::from(format!("{prefix}_{}", self.next_label));
            if self.reserve(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxFactory;

    #[test]
    fn test_member_names() {
        let options = LinkerOptions::default();
        assert_eq!(source_member_name("M", &options), "M_Source");
        assert_eq!(empty_member_name("P", &options), "P_Empty");
    }

    #[test]
    fn test_fresh_local_renames_on_collision() {
        let f = SyntaxFactory::new();
        let body = f.block(vec![
            f.local(None, "x", Some(f.int(1))),
            f.local(None, "x_1", Some(f.int(2))),
        ]);
        let mut scope = NameScope::for_body(&[Parameter::new("a", "int")], &body);

        assert_eq!(scope.fresh_local(&Name::new("y")), "y");
        assert_eq!(scope.fresh_local(&Name::new("x")), "x_2");
        assert_eq!(scope.fresh_local(&Name::new("a")), "a_1");
    }

    #[test]
    fn test_labels_are_numbered_per_scope() {
        let mut scope = NameScope::default();
        assert_eq!(scope.fresh_label("__aspect_return"), "__aspect_return_1");
        assert_eq!(scope.fresh_label("__aspect_return"), "__aspect_return_2");

        let mut other = NameScope::default();
        assert_eq!(other.fresh_label("__aspect_return"), "__aspect_return_1");
    }
}
