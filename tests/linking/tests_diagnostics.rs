//! Diagnostics and aborted runs.

use tokio_util::sync::CancellationToken;
use weaver::base::{AspectLayerId, CompilationId};
use weaver::linking::diagnostics::codes;
use weaver::linking::{AspectLinker, LinkerError, LinkerInput, LinkerOptions};
use weaver::model::{CompilationBuilder, DeclarationFlags, InjectionRegistry, MethodSpec};
use weaver::syntax::{
    AspectReferenceFlags, AspectReferenceOrder, AspectReferenceSpecification, Modifiers,
    Parameter, SymbolBinding,
};

use crate::helpers::fixtures::{forwarding_chain, register};
use crate::helpers::{aspect_ref, diagnostic_codes, link, member_names, member_text};

#[test]
fn test_base_call_through_other_receiver_is_reported() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();

    let base_type = builder.add_type("B");
    let virtual_modifiers = Modifiers {
        is_virtual: true,
        ..Modifiers::default()
    };
    let b_n = builder.add_method(
        base_type,
        MethodSpec::new("N")
            .modifiers(virtual_modifiers)
            .body(f.block(vec![])),
    );

    let derived = builder.add_type("D");
    let d_n = builder.add_method(
        derived,
        MethodSpec::new("N")
            .overriding(b_n)
            .body(f.block(vec![f.expr_stmt(f.invoke(f.ident("Log"), vec![]))])),
    );
    let m = builder.add_method(derived, MethodSpec::new("M").body(f.block(vec![])));
    let callee = f
        .member(f.ident("other"), "N")
        .with_binding(SymbolBinding::Resolved(d_n))
        .with_aspect_reference(
            AspectReferenceSpecification::new(AspectLayerId(1), AspectReferenceOrder::Base)
                .with_flags(
                    AspectReferenceFlags::INLINEABLE | AspectReferenceFlags::CUSTOM_RECEIVER,
                ),
        );
    let m_a = builder.add_method(
        derived,
        MethodSpec::new("M_A").body(f.block(vec![f.expr_stmt(f.invoke(callee, vec![]))])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert_eq!(diagnostic_codes(&output), vec![codes::BASE_RECEIVER_NOT_THIS]);
    assert!(output.has_errors());
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.symbol, Some(d_n));
    assert!(diagnostic.message.contains("'D.N'"), "{}", diagnostic.message);
    assert!(diagnostic.message.contains("'other'"), "{}", diagnostic.message);

    let text = member_text(&output, "D", "M");
    assert!(text.contains("base.N();"), "{text}");
}

#[test]
fn test_constructor_override_that_cannot_be_inlined_is_reported() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let ctor = builder.add_constructor(
        ty,
        vec![Parameter::new("a", "int")],
        Some(f.block(vec![f.expr_stmt(f.invoke(f.ident("Init"), vec![]))])),
    );
    let call = f.invoke(
        aspect_ref(&f, f.this(), "C", ctor, 1, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let c_a = builder.add_method(
        ty,
        MethodSpec::new("C_A")
            .param("a", "int")
            .body(f.block(vec![f.expr_stmt(call)])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override_with_flags(ctor, c_a, AspectLayerId(1), DeclarationFlags::NOT_INLINEABLE)
        .build();

    let output = link(&compilation, &registry);

    assert_eq!(diagnostic_codes(&output), vec![codes::MUST_BE_INLINED]);
    assert_eq!(output.diagnostics[0].symbol, Some(c_a));
    assert!(
        output.diagnostics[0].message.contains("'C.C_A'"),
        "{}",
        output.diagnostics[0].message
    );
    assert!(!member_names(&output, "C").iter().any(|name| name == "C_A"));
}

#[test]
fn test_clean_run_reports_nothing() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 3);
    let compilation = builder.build();
    let registry = register(&compilation, &[chain]);

    let output = link(&compilation, &registry);

    assert!(!output.has_errors());
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_cancelled_run_produces_no_output() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 2);
    let compilation = builder.build();
    let registry = register(&compilation, &[chain]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let input = LinkerInput::new(&compilation, &registry);
    let result = AspectLinker::new(LinkerOptions::default()).link(&input, &cancel);

    assert!(matches!(result, Err(LinkerError::Cancelled)));
}
