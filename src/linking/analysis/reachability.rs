//! Which semantics survive linking.
//!
//! A depth-first search over semantics. Roots are the versions external code
//! can observe; edges follow aspect references and the link between a
//! property or event and its accessors.

use crate::model::{DeclarationFlags, SymbolKind};
use crate::syntax::MemberKind;

use super::super::context::LinkerContext;
use super::super::error::LinkerError;
use super::super::introductions::IntroductionIndex;
use super::super::semantic::{SemanticSet, SymbolSemantic, SymbolSemanticKind};
use super::references::ReferenceCache;

/// Entry points of the reachability search, in a deterministic order.
///
/// `additional` comes first, as supplied by the caller; it also carries the
/// `Default` semantics of ordinary members whose bodies contain aspect
/// references.
pub fn collect_roots(
    ctx: &LinkerContext<'_>,
    additional: &[SymbolSemantic],
) -> Vec<SymbolSemantic> {
    let index = &ctx.index;
    // Caller-supplied roots are checked like every other semantic.
    let mut roots: Vec<SymbolSemantic> = additional
        .iter()
        .map(|root| index.semantic(root.symbol, root.kind))
        .collect();

    for member in index.overridden_members() {
        roots.push(index.semantic(member, SymbolSemanticKind::Final));

        let has_initializer = match index.compilation().member_decl(member) {
            Some(decl) => match &decl.kind {
                MemberKind::Property(property) => property.initializer.is_some(),
                MemberKind::Event(event) => event.initializer.is_some(),
                _ => false,
            },
            None => false,
        };
        // The initializer of the original storage still runs.
        if has_initializer && index.has_storage_semantics(member) {
            roots.push(SymbolSemantic::default(member));
        }

        // Assignments in constructors go through the setter an override
        // gives a getter-only auto-property.
        if let Some(setter) = index.implicit_setter(member) {
            roots.push(SymbolSemantic::default(setter));
        }
    }

    for (symbol, flags) in index.injected_members() {
        if flags.contains(DeclarationFlags::NOT_DISCARDABLE)
            || flags.contains(DeclarationFlags::HAS_HIDDEN_INITIALIZER)
        {
            roots.push(SymbolSemantic::default(symbol));
        }
    }

    roots
}

pub struct ReachabilityAnalyzer<'r, 'a> {
    index: &'r IntroductionIndex<'a>,
    references: &'r ReferenceCache,
}

impl<'r, 'a> ReachabilityAnalyzer<'r, 'a> {
    pub fn new(index: &'r IntroductionIndex<'a>, references: &'r ReferenceCache) -> Self {
        Self { index, references }
    }

    /// Every semantic reachable from `roots`, in discovery order.
    pub fn run(
        &self,
        ctx: &LinkerContext<'_>,
        roots: impl IntoIterator<Item = SymbolSemantic>,
    ) -> Result<SemanticSet, LinkerError> {
        let index = self.index;
        let mut visited = SemanticSet::new(index.comparer().clone());

        let mut stack: Vec<SymbolSemantic> = roots.into_iter().collect();
        stack.reverse();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            ctx.check_cancelled()?;

            let data = index.symbol(current.symbol);
            match data.kind {
                SymbolKind::Property | SymbolKind::Event => {
                    for accessor in data.accessors.iter() {
                        stack.push(current.with_symbol(accessor));
                    }
                }
                SymbolKind::Method(kind) if kind.is_accessor() => {
                    if let Some(owner) = data.associated_member {
                        stack.push(current.with_symbol(owner));
                    }
                    self.push_references(current, &mut stack);
                }
                SymbolKind::Method(_) => self.push_references(current, &mut stack),
                SymbolKind::Field => {}
                SymbolKind::NamedType => {
                    return Err(LinkerError::unexpected_symbol(
                        current.symbol,
                        "type",
                        "reachability",
                    ));
                }
            }
        }

        tracing::debug!(reachable = visited.len(), "reachability analysis finished");
        Ok(visited)
    }

    fn push_references(&self, current: SymbolSemantic, stack: &mut Vec<SymbolSemantic>) {
        let index = self.index;
        let Some(method) = current.as_method(index.compilation()) else {
            return;
        };
        let declaring_type = index.declaring_type(current.symbol);

        // Pushed in reverse so the first reference is visited first.
        for reference in self.references.get(method).iter().rev() {
            let target = reference.target.semantic;
            if index.declaring_type(target.symbol) != declaring_type {
                tracing::trace!(
                    from = %current,
                    to = %target,
                    "reference across types not followed"
                );
                continue;
            }
            if let Some(target_method) = reference.target_method(index.compilation()) {
                stack.push(target_method.semantic());
            }
            stack.push(target);
        }
    }
}
