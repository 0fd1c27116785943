//! Member emission: what each declaration of the intermediate compilation
//! becomes in the linked output.
//!
//! An overridden member turns into up to three declarations:
//!
//! - the member itself, carrying the `Final` body (fully inlined chain or
//!   trampoline to the last override)
//! - `<Name>_Source`, the original code, when something still calls it
//! - `<Name>_Empty`, the no-op base implementation, when something still
//!   calls it
//!
//! Overrides survive as private members only while a call to them remains.
//! Every other member is copied, rewritten when one of its bodies has
//! substitutions.

use crate::base::SymbolId;
use crate::model::SymbolKind;
use crate::syntax::{
    AccessorDecl, Block, EventDecl, MemberDecl, MemberKind, Modifiers, PropertyDecl, TypeDecl,
    Visibility,
};

use super::super::analysis::LinkerAnalysisRegistry;
use super::super::context::LinkerContext;
use super::super::diagnostics::{self, Diagnostic};
use super::super::error::LinkerError;
use super::super::naming::{empty_member_name, source_member_name};
use super::super::semantic::{
    InliningContextIdentifier, MethodSemantic, SymbolSemantic, SymbolSemanticKind,
};
use super::cleanup::cleanup_body;
use super::substituting::SubstitutingRewriter;

/// One linked type with the diagnostics its members produced.
#[derive(Debug)]
pub struct LinkedType {
    pub decl: TypeDecl,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct MemberLinker<'r, 'a> {
    ctx: &'r LinkerContext<'a>,
    registry: &'r LinkerAnalysisRegistry,
}

impl<'r, 'a> MemberLinker<'r, 'a> {
    pub fn new(ctx: &'r LinkerContext<'a>, registry: &'r LinkerAnalysisRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn link_type(&self, decl: &TypeDecl) -> Result<LinkedType, LinkerError> {
        let index = &self.ctx.index;
        let mut members = Vec::with_capacity(decl.members.len());
        let mut diagnostics = Vec::new();

        for member in &decl.members {
            let symbol = index.comparer().canonical(member.symbol);
            if index.is_override_target(symbol) {
                self.link_overridden(member, symbol, &mut members, &mut diagnostics)?;
            } else if index.is_override(symbol) {
                if let Some(linked) = self.link_override(member, symbol, &mut diagnostics)? {
                    members.push(linked);
                }
            } else {
                members.push(self.link_ordinary(member, symbol)?);
            }
        }

        tracing::trace!(
            ty = %decl.name,
            before = decl.members.len(),
            after = members.len(),
            "type linked"
        );
        Ok(LinkedType {
            decl: TypeDecl {
                id: decl.id,
                symbol: decl.symbol,
                name: decl.name.clone(),
                members,
            },
            diagnostics,
        })
    }

    // ========================================================================
    // OVERRIDDEN MEMBERS
    // ========================================================================

    fn link_overridden(
        &self,
        member: &MemberDecl,
        symbol: SymbolId,
        members: &mut Vec<MemberDecl>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), LinkerError> {
        let index = &self.ctx.index;
        let options = self.ctx.options;

        members.push(self.with_bodies(member, symbol, SymbolSemanticKind::Final, false)?);

        if self.needs_stub(symbol, SymbolSemanticKind::Default, diagnostics, member) {
            let source = if index.has_storage_semantics(symbol) {
                self.storage_stub(member)
            } else {
                self.with_bodies(member, symbol, SymbolSemanticKind::Default, true)?
            };
            members.push(MemberDecl {
                name: source_member_name(&member.name, options),
                ..source
            });
        }

        if !index.is_language_override(symbol)
            && self.needs_stub(symbol, SymbolSemanticKind::Base, diagnostics, member)
        {
            let empty = self.with_bodies(member, symbol, SymbolSemanticKind::Base, true)?;
            members.push(MemberDecl {
                name: empty_member_name(&member.name, options),
                ..empty
            });
        }
        Ok(())
    }

    /// Whether a `kind` version of `symbol` must be emitted as its own
    /// member. Reports when it must but cannot.
    fn needs_stub(
        &self,
        symbol: SymbolId,
        kind: SymbolSemanticKind,
        diagnostics: &mut Vec<Diagnostic>,
        member: &MemberDecl,
    ) -> bool {
        let index = &self.ctx.index;
        let needed = self.method_symbols(symbol).into_iter().any(|method| {
            let semantic = SymbolSemantic::new(method, kind);
            self.registry.is_reachable(semantic) && !self.registry.is_inlined(semantic)
        });
        if needed && !index.has_standalone_emission(symbol) {
            diagnostics.push(self.must_be_inlined(symbol, member));
            return false;
        }
        needed
    }

    /// The original declaration of an auto-property or field-like event,
    /// carrying the storage and its initializer.
    fn storage_stub(&self, member: &MemberDecl) -> MemberDecl {
        let kind = match &member.kind {
            MemberKind::Property(property) => MemberKind::Property(PropertyDecl {
                ty: property.ty.clone(),
                accessors: property
                    .accessors
                    .iter()
                    .map(|accessor| AccessorDecl {
                        body: None,
                        ..accessor.clone()
                    })
                    .collect(),
                initializer: property.initializer.clone(),
            }),
            MemberKind::Event(event) => MemberKind::Event(EventDecl {
                ty: event.ty.clone(),
                accessors: Vec::new(),
                initializer: event.initializer.clone(),
            }),
            kind => kind.clone(),
        };
        MemberDecl {
            id: self.ctx.factory.next_id(),
            symbol: member.symbol,
            name: member.name.clone(),
            modifiers: private_modifiers(&member.modifiers),
            explicit_interface: None,
            kind,
            trivia: Vec::new(),
            span: None,
        }
    }

    // ========================================================================
    // OVERRIDES
    // ========================================================================

    fn link_override(
        &self,
        member: &MemberDecl,
        symbol: SymbolId,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<MemberDecl>, LinkerError> {
        if !self.needs_stub(symbol, SymbolSemanticKind::Default, diagnostics, member) {
            tracing::trace!(member = %member.name, "override dropped");
            return Ok(None);
        }
        if self.ctx.index.has_storage_semantics(symbol) {
            return Ok(Some(self.storage_stub(member)));
        }
        self.with_bodies(member, symbol, SymbolSemanticKind::Default, true)
            .map(Some)
    }

    // ========================================================================
    // ORDINARY MEMBERS
    // ========================================================================

    fn link_ordinary(
        &self,
        member: &MemberDecl,
        symbol: SymbolId,
    ) -> Result<MemberDecl, LinkerError> {
        let rewritten = self.method_symbols(symbol).into_iter().any(|method| {
            self.registry
                .has_any_substitutions(MethodSemantic::new(method, SymbolSemanticKind::Default))
        });
        if !rewritten {
            return Ok(member.clone());
        }

        let mut linked = member.clone();
        match &mut linked.kind {
            MemberKind::Method(method) => {
                method.body = self.render_if_substituted(symbol, method.body.take())?;
            }
            MemberKind::Constructor(ctor) => {
                ctor.body = self.render_if_substituted(symbol, ctor.body.take())?;
            }
            MemberKind::Property(PropertyDecl { accessors, .. })
            | MemberKind::Event(EventDecl { accessors, .. }) => {
                for accessor in accessors {
                    let method = self.ctx.index.comparer().canonical(accessor.symbol);
                    accessor.body = self.render_if_substituted(method, accessor.body.take())?;
                }
            }
            MemberKind::Field(_) => {}
        }
        Ok(linked)
    }

    fn render_if_substituted(
        &self,
        method: SymbolId,
        body: Option<Block>,
    ) -> Result<Option<Block>, LinkerError> {
        let semantic = MethodSemantic::new(method, SymbolSemanticKind::Default);
        if !self.registry.has_any_substitutions(semantic) {
            return Ok(body);
        }
        match self.render(semantic)? {
            Some(rendered) => Ok(Some(rendered)),
            None => Ok(body),
        }
    }

    // ========================================================================
    // BODIES
    // ========================================================================

    /// `member` with every body replaced by the linked `kind` version.
    /// Stubs are private and implement no interface.
    fn with_bodies(
        &self,
        member: &MemberDecl,
        symbol: SymbolId,
        kind: SymbolSemanticKind,
        stub: bool,
    ) -> Result<MemberDecl, LinkerError> {
        let linked_kind = match &member.kind {
            MemberKind::Method(method) => {
                let mut method = method.clone();
                method.body = self.render(MethodSemantic::new(symbol, kind))?;
                MemberKind::Method(method)
            }
            MemberKind::Constructor(ctor) => {
                let mut ctor = ctor.clone();
                ctor.body = self.render(MethodSemantic::new(symbol, kind))?;
                MemberKind::Constructor(ctor)
            }
            MemberKind::Property(property) => MemberKind::Property(PropertyDecl {
                ty: property.ty.clone(),
                accessors: self.linked_accessors(member, symbol, kind)?,
                initializer: None,
            }),
            MemberKind::Event(event) => MemberKind::Event(EventDecl {
                ty: event.ty.clone(),
                accessors: self.linked_accessors(member, symbol, kind)?,
                initializer: None,
            }),
            MemberKind::Field(_) => {
                return Err(LinkerError::unexpected_symbol(symbol, "field", "linking"));
            }
        };

        Ok(MemberDecl {
            id: if stub { self.ctx.factory.next_id() } else { member.id },
            symbol: member.symbol,
            name: member.name.clone(),
            modifiers: if stub {
                private_modifiers(&member.modifiers)
            } else {
                member.modifiers
            },
            explicit_interface: if stub {
                None
            } else {
                member.explicit_interface.clone()
            },
            kind: linked_kind,
            trivia: if stub { Vec::new() } else { member.trivia.clone() },
            span: if stub { None } else { member.span },
        })
    }

    /// One accessor declaration per accessor symbol. Field-like events have
    /// no accessor syntax, so theirs are synthesized.
    fn linked_accessors(
        &self,
        member: &MemberDecl,
        symbol: SymbolId,
        kind: SymbolSemanticKind,
    ) -> Result<Vec<AccessorDecl>, LinkerError> {
        let index = &self.ctx.index;
        let mut accessors = Vec::new();
        for accessor in index.symbol(symbol).accessors.iter() {
            let accessor = index.comparer().canonical(accessor);
            let accessor_kind = index
                .symbol(accessor)
                .method_kind()
                .and_then(|kind| kind.accessor_kind())
                .ok_or_else(|| {
                    LinkerError::unexpected_symbol(accessor, "non-accessor", "linking")
                })?;
            let existing = member
                .accessors()
                .iter()
                .find(|decl| index.comparer().equals(decl.symbol, accessor));

            accessors.push(AccessorDecl {
                id: existing.map_or_else(|| self.ctx.factory.next_id(), |decl| decl.id),
                symbol: accessor,
                kind: accessor_kind,
                body: self.render(MethodSemantic::new(accessor, kind))?,
            });
        }
        Ok(accessors)
    }

    /// The body of `semantic` rewritten in its root context.
    fn render(&self, semantic: MethodSemantic) -> Result<Option<Block>, LinkerError> {
        self.ctx.check_cancelled()?;
        let Some(body) = self.registry.body(&self.ctx.index, semantic) else {
            return Ok(None);
        };
        let context = InliningContextIdentifier::root(semantic);
        let rewriter = SubstitutingRewriter::new(self.ctx, self.registry, context);
        let linked = rewriter.rewrite_body(body)?;
        if self.ctx.options.cleanup {
            Ok(Some(cleanup_body(linked)))
        } else {
            Ok(Some(linked))
        }
    }

    /// Method-level symbols of a member: itself or its accessors.
    fn method_symbols(&self, symbol: SymbolId) -> Vec<SymbolId> {
        let index = &self.ctx.index;
        let data = index.symbol(symbol);
        match data.kind {
            SymbolKind::Method(_) => vec![symbol],
            SymbolKind::Property | SymbolKind::Event => data
                .accessors
                .iter()
                .map(|accessor| index.comparer().canonical(accessor))
                .collect(),
            SymbolKind::Field | SymbolKind::NamedType => Vec::new(),
        }
    }

    fn must_be_inlined(&self, symbol: SymbolId, member: &MemberDecl) -> Diagnostic {
        diagnostics::must_be_inlined(&self.ctx.index.display_name(symbol))
            .with_symbol(symbol)
            .with_node(member.id)
            .with_span(member.span)
    }
}

fn private_modifiers(modifiers: &Modifiers) -> Modifiers {
    Modifiers {
        visibility: Some(Visibility::Private),
        is_static: modifiers.is_static,
        is_abstract: false,
        is_virtual: false,
        is_override: false,
    }
}
