//! Shared fixtures for linker integration tests.

pub mod fixtures;

use tokio_util::sync::CancellationToken;
use weaver::base::{AspectLayerId, SymbolId};
use weaver::linking::{AspectLinker, LinkerInput, LinkerOptions, LinkerOutput};
use weaver::model::{Compilation, IntroductionRegistry};
use weaver::syntax::{
    AspectReferenceOrder, AspectReferenceSpecification, Expr, PrintOptions, SymbolBinding,
    SyntaxFactory, print_member,
};

/// `receiver.name` bound to `symbol` and annotated as an aspect reference.
pub fn aspect_ref(
    f: &SyntaxFactory,
    receiver: Expr,
    name: &str,
    symbol: SymbolId,
    layer: u32,
    order: AspectReferenceOrder,
) -> Expr {
    f.member(receiver, name)
        .with_binding(SymbolBinding::Resolved(symbol))
        .with_aspect_reference(AspectReferenceSpecification::new(AspectLayerId(layer), order))
}

/// Link sequentially with default options.
pub fn link(compilation: &Compilation, registry: &dyn IntroductionRegistry) -> LinkerOutput {
    link_with(compilation, registry, LinkerOptions::sequential())
}

pub fn link_with(
    compilation: &Compilation,
    registry: &dyn IntroductionRegistry,
    options: LinkerOptions,
) -> LinkerOutput {
    let input = LinkerInput::new(compilation, registry);
    AspectLinker::new(options)
        .link(&input, &CancellationToken::new())
        .expect("linking should succeed")
}

/// Link a prepared input sequentially.
pub fn link_input(input: &LinkerInput<'_>) -> LinkerOutput {
    AspectLinker::new(LinkerOptions::sequential())
        .link(input, &CancellationToken::new())
        .expect("linking should succeed")
}

/// Member names of a linked type, in output order.
pub fn member_names(output: &LinkerOutput, ty: &str) -> Vec<String> {
    output
        .type_decl(ty)
        .unwrap_or_else(|| panic!("type {ty} should be in the output"))
        .members
        .iter()
        .map(|member| member.name.to_string())
        .collect()
}

/// Printed text of one linked member.
pub fn member_text(output: &LinkerOutput, ty: &str, name: &str) -> String {
    let member = output
        .type_decl(ty)
        .and_then(|decl| decl.members.iter().find(|member| member.name == name))
        .unwrap_or_else(|| panic!("member {ty}.{name} should be in the output"));
    print_member(member, &PrintOptions::default())
}

/// Codes of the reported diagnostics, in order.
pub fn diagnostic_codes(output: &LinkerOutput) -> Vec<&'static str> {
    output.diagnostics.iter().map(|d| d.code).collect()
}
