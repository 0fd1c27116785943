//! Bodies of every method semantic.
//!
//! `Default` bodies are the declarations' own syntax. `Final` and `Base`
//! bodies do not exist in the input and are synthesized here, once, before
//! any analysis runs:
//!
//! - `Final` is a trampoline to the last override, annotated like an
//!   aspect reference so that the chain is analyzed (and inlined) like any
//!   other reference.
//! - `Base` of a member that is not a language override is an empty
//!   implementation. A language override has no `Base` body; references to
//!   it become `base.Member` calls instead.
//! - The setter an override implicitly gives a getter-only auto-property
//!   has no syntax. Its `Default` body writes the original storage.

use rustc_hash::FxHashMap;

use crate::base::{AspectLayerId, SymbolId};
use crate::syntax::{
    AspectReferenceOrder, AspectReferenceSpecification, AspectReferenceTargetKind, AssignOp, Block,
    Expr, Stmt, SymbolBinding,
};

use super::super::context::LinkerContext;
use super::super::introductions::IntroductionIndex;
use super::super::semantic::{MethodSemantic, SymbolSemanticKind};

#[derive(Clone, Debug, Default)]
pub struct SyntheticBodies {
    bodies: FxHashMap<MethodSemantic, Block>,
}

impl SyntheticBodies {
    /// Synthesize `Final` and `Base` bodies of every overridden member.
    ///
    /// Runs sequentially so that synthesized node ids are stable.
    pub fn build(ctx: &LinkerContext<'_>) -> Self {
        let index = &ctx.index;
        let mut bodies = FxHashMap::default();

        for member in index.overridden_members() {
            let data = index.symbol(member);
            let methods: Vec<SymbolId> = if data.is_method_like() {
                vec![member]
            } else {
                data.accessors.iter().collect()
            };

            for method in methods {
                let final_semantic = index.method_semantic(method, SymbolSemanticKind::Final);
                bodies.insert(final_semantic, trampoline(ctx, method));

                if !index.is_language_override(method) {
                    let base_semantic = index.method_semantic(method, SymbolSemanticKind::Base);
                    bodies.insert(base_semantic, empty_body(ctx, method));
                }
            }

            let implicit_setter = index
                .implicit_setter(member)
                .filter(|setter| index.compilation().method_body(*setter).is_none());
            if let Some(setter) = implicit_setter {
                let semantic = index.method_semantic(setter, SymbolSemanticKind::Default);
                bodies.insert(semantic, storage_write(ctx, member, setter));
            }
        }

        tracing::debug!(count = bodies.len(), "synthesized bodies");
        Self { bodies }
    }

    pub fn get(&self, semantic: MethodSemantic) -> Option<&Block> {
        self.bodies.get(&semantic)
    }

    /// Synthesized semantics, sorted.
    pub fn semantics(&self) -> Vec<MethodSemantic> {
        let mut semantics: Vec<_> = self.bodies.keys().copied().collect();
        semantics.sort();
        semantics
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// The body `semantic` is rendered from, synthesized or declared.
    ///
    /// Accessors with storage semantics (auto-properties, field-like events)
    /// have no `Default` body even when the injector gave them syntax.
    pub fn body<'s>(
        &'s self,
        index: &IntroductionIndex<'s>,
        semantic: MethodSemantic,
    ) -> Option<&'s Block> {
        match semantic.kind() {
            SymbolSemanticKind::Default => {
                let symbol = semantic.symbol();
                if index.symbol(symbol).is_accessor() && index.has_storage_semantics(symbol) {
                    return None;
                }
                index
                    .compilation()
                    .method_body(symbol)
                    .or_else(|| self.get(semantic))
            }
            SymbolSemanticKind::Base | SymbolSemanticKind::Final => self.get(semantic),
        }
    }
}

/// `Final` body: forward to the last override that declares this method.
fn trampoline(ctx: &LinkerContext<'_>, method: SymbolId) -> Block {
    let index = &ctx.index;
    let f = &ctx.factory;
    let data = index.symbol(method);
    let target_kind = index.target_kind_of(method);

    let (callee, specification) = match index.last_override(method) {
        Some(last) => {
            let layer = index.layer(last).unwrap_or_default();
            (
                index.member_of(last),
                AspectReferenceSpecification::new(layer, AspectReferenceOrder::Current),
            )
        }
        // No layer declares this accessor: forward to what came before.
        None => (
            index.member_of(method),
            AspectReferenceSpecification::new(AspectLayerId::default(), AspectReferenceOrder::Base),
        ),
    };

    let member = f
        .member(receiver(ctx, method), index.symbol(callee).name.clone())
        .with_binding(SymbolBinding::Resolved(callee))
        .with_aspect_reference(specification.with_target_kind(target_kind));

    let statement = match target_kind {
        AspectReferenceTargetKind::Itself => {
            let args = data
                .parameters
                .iter()
                .map(|param| f.ident(param.name.clone()))
                .collect();
            let call = f.invoke(member, args);
            if data.returns_void() {
                f.expr_stmt(call)
            } else {
                f.ret(Some(call))
            }
        }
        AspectReferenceTargetKind::PropertyGet => f.ret(Some(member)),
        AspectReferenceTargetKind::PropertySet => {
            f.expr_stmt(f.assign(member, value_argument(ctx, method)))
        }
        AspectReferenceTargetKind::EventAdd => {
            f.expr_stmt(f.assign_op(AssignOp::AddAssign, member, value_argument(ctx, method)))
        }
        AspectReferenceTargetKind::EventRemove => {
            f.expr_stmt(f.assign_op(AssignOp::SubAssign, member, value_argument(ctx, method)))
        }
    };

    f.block(vec![statement])
}

/// `this.P = value;` resolved to the storage of `property`.
fn storage_write(ctx: &LinkerContext<'_>, property: SymbolId, setter: SymbolId) -> Block {
    let f = &ctx.factory;
    let specification =
        AspectReferenceSpecification::new(AspectLayerId::default(), AspectReferenceOrder::Base)
            .with_target_kind(AspectReferenceTargetKind::PropertySet);
    let storage = f
        .member(receiver(ctx, setter), ctx.index.symbol(property).name.clone())
        .with_binding(SymbolBinding::Resolved(property))
        .with_aspect_reference(specification);
    f.block(vec![f.expr_stmt(f.assign(storage, value_argument(ctx, setter)))])
}

/// `this`, or the type name for static members.
fn receiver(ctx: &LinkerContext<'_>, method: SymbolId) -> Expr {
    let index = &ctx.index;
    let data = index.symbol(method);
    if data.is_static {
        let ty = data
            .containing_type
            .map(|ty| index.symbol(ty).name.clone())
            .unwrap_or_default();
        ctx.factory.type_name(ty)
    } else {
        ctx.factory.this()
    }
}

fn value_argument(ctx: &LinkerContext<'_>, accessor: SymbolId) -> Expr {
    let name = ctx
        .index
        .symbol(accessor)
        .parameters
        .first()
        .map(|param| param.name.clone())
        .unwrap_or_else(|| "value".into());
    ctx.factory.ident(name)
}

/// `Base` body of a member without a base-class implementation.
fn empty_body(ctx: &LinkerContext<'_>, method: SymbolId) -> Block {
    let f = &ctx.factory;
    let statements: Vec<Stmt> = if ctx.index.symbol(method).returns_void() {
        Vec::new()
    } else {
        vec![f.ret(Some(f.default_literal()))]
    };
    f.block(statements)
}
