//! Program fixtures: original members plus the overrides aspects add to them.

use weaver::base::{AspectLayerId, CompilationId, SymbolId};
use weaver::model::{Compilation, CompilationBuilder, InjectionRegistry, MethodSpec};
use weaver::syntax::{AspectReferenceOrder, BinaryOp, Block, SyntaxFactory};

use super::aspect_ref;

/// Overrides of one member, earliest layer first.
pub struct OverrideChain {
    pub target: SymbolId,
    pub overrides: Vec<(SymbolId, u32)>,
}

/// `int {name}(int a) { return a + 1; }` with `layers` overrides, each
/// returning the previous version.
pub fn forwarding_chain(
    builder: &mut CompilationBuilder,
    ty: SymbolId,
    name: &str,
    layers: u32,
) -> OverrideChain {
    let f = builder.factory();
    let target = builder.add_method(
        ty,
        MethodSpec::new(name)
            .returns("int")
            .param("a", "int")
            .body(f.block(vec![f.ret(Some(f.binary(
                BinaryOp::Add,
                f.ident("a"),
                f.int(1),
            )))])),
    );

    let overrides = (1..=layers)
        .map(|layer| {
            let body = forward_to_previous(&f, target, name, layer);
            let symbol = builder.add_method(
                ty,
                MethodSpec::new(format!("{name}_A{layer}"))
                    .returns("int")
                    .param("a", "int")
                    .body(body),
            );
            (symbol, layer)
        })
        .collect();

    OverrideChain { target, overrides }
}

/// `{ return this.M(a); }` denoting the version before `layer`.
pub fn forward_to_previous(f: &SyntaxFactory, target: SymbolId, name: &str, layer: u32) -> Block {
    let call = f.invoke(
        aspect_ref(f, f.this(), name, target, layer, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    f.block(vec![f.ret(Some(call))])
}

pub fn register(compilation: &Compilation, chains: &[OverrideChain]) -> InjectionRegistry {
    let mut builder = InjectionRegistry::builder(compilation);
    for chain in chains {
        for (symbol, layer) in &chain.overrides {
            builder.add_override(chain.target, *symbol, AspectLayerId(*layer));
        }
    }
    builder.build()
}

/// Several types, each with a few overridden methods of varying depth.
pub fn many_types(types: usize) -> (Compilation, InjectionRegistry) {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let mut chains = Vec::new();
    for t in 0..types {
        let ty = builder.add_type(format!("T{t}"));
        for (m, layers) in [1u32, 2, 3].into_iter().enumerate() {
            chains.push(forwarding_chain(&mut builder, ty, &format!("M{m}"), layers));
        }
    }
    let compilation = builder.build();
    let registry = register(&compilation, &chains);
    (compilation, registry)
}
