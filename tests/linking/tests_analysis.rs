//! Analysis results: reachability and the inlining plan.

use rstest::rstest;
use tokio_util::sync::CancellationToken;
use weaver::base::{AspectLayerId, CompilationId};
use weaver::linking::{
    DiagnosticCollector, LinkerAnalysisStep, LinkerContext, LinkerInput, LinkerOptions,
    SymbolSemantic, SymbolSemanticKind,
};
use weaver::model::{CompilationBuilder, InjectionRegistry, MethodSpec};
use weaver::syntax::{AspectReferenceOrder, BinaryOp};

use crate::helpers::fixtures::{forward_to_previous, forwarding_chain, register};
use crate::helpers::{aspect_ref, link, link_input, member_names, member_text};

#[test]
fn test_inlining_stays_complex_below_a_complex_frame() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 1);
    let m = chain.target;
    let m_a1 = chain.overrides[0].0;

    // Layer 2 stores the previous result in a local before returning it.
    let call = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 2, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let m_a2 = builder.add_method(
        ty,
        MethodSpec::new("M_A2").returns("int").param("a", "int").body(f.block(vec![
            f.local(None, "r", Some(call)),
            f.ret(Some(f.ident("r"))),
        ])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a1, AspectLayerId(1))
        .add_override(m, m_a2, AspectLayerId(2))
        .build();

    let options = LinkerOptions::sequential();
    let cancel = CancellationToken::new();
    let collector = DiagnosticCollector::new();
    let ctx = LinkerContext::new(&compilation, &registry, &options, &cancel, &collector);
    let analysis = LinkerAnalysisStep::run(&ctx, &[]).expect("analysis should succeed");

    let destination = SymbolSemantic::final_(m)
        .as_method(&compilation)
        .expect("M is a method");
    let plan = analysis.plan(destination).expect("Final M is a destination");
    let simple: Vec<bool> = plan.inlinings.iter().map(|inlining| inlining.simple).collect();
    assert_eq!(simple, vec![true, false, false]);

    let targets: Vec<_> = plan
        .inlinings
        .iter()
        .map(|inlining| inlining.target.symbol())
        .collect();
    assert_eq!(targets, vec![m_a2, m_a1, m]);

    assert!(analysis.is_inlined(SymbolSemantic::default(m_a1)));
    assert!(analysis.is_inlined(SymbolSemantic::default(m)));
    assert!(analysis.is_reachable(SymbolSemantic::final_(m)));
}

#[test]
fn test_target_referenced_twice_keeps_its_source() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 0);
    let m = chain.target;

    let first = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 1, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let second = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 1, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let m_a = builder.add_method(
        ty,
        MethodSpec::new("M_A").returns("int").param("a", "int").body(f.block(vec![f.ret(
            Some(f.binary(BinaryOp::Add, first, second)),
        )])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert_eq!(member_names(&output, "C"), vec!["M", "M_Source"]);
    let text = member_text(&output, "C", "M");
    assert!(
        text.contains("return this.M_Source(a) + this.M_Source(a);"),
        "{text}"
    );
}

#[test]
fn test_non_discardable_override_is_not_inlined() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 2);
    let m_a1 = chain.overrides[0].0;
    let compilation = builder.build();
    let registry = register(&compilation, &[chain]);

    let input = LinkerInput::new(&compilation, &registry)
        .with_non_discardable(SymbolSemantic::default(m_a1));
    let output = link_input(&input);

    assert_eq!(member_names(&output, "C"), vec!["M", "M_A1"]);
    let final_text = member_text(&output, "C", "M");
    assert!(final_text.contains("return this.M_A1(a);"), "{final_text}");
    let kept = member_text(&output, "C", "M_A1");
    assert!(kept.starts_with("private int M_A1(int a)"), "{kept}");
    assert!(kept.contains("return a + 1;"), "{kept}");
}

#[rstest]
#[case::final_without_overrides(SymbolSemanticKind::Final)]
#[case::base_without_overrides(SymbolSemanticKind::Base)]
#[should_panic(expected = "invalid semantic")]
fn test_invalid_non_discardable_semantic_fails_fast(#[case] kind: SymbolSemanticKind) {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let plain = builder.add_method(ty, MethodSpec::new("N").body(f.block(vec![])));
    let compilation = builder.build();
    let registry = InjectionRegistry::default();

    let input = LinkerInput::new(&compilation, &registry)
        .with_non_discardable(SymbolSemantic::new(plain, kind));
    link_input(&input);
}

#[test]
fn test_layer_references_resolve_to_earlier_overrides() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 1);
    let m = chain.target;
    let m_a1 = chain.overrides[0].0;
    // No layer 2: the version before layer 3 is layer 1.
    let m_a3 = builder.add_method(
        ty,
        MethodSpec::new("M_A3")
            .returns("int")
            .param("a", "int")
            .body(forward_to_previous(&f, m, "M", 3)),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a1, AspectLayerId(1))
        .add_override(m, m_a3, AspectLayerId(3))
        .build();

    let options = LinkerOptions::sequential();
    let cancel = CancellationToken::new();
    let collector = DiagnosticCollector::new();
    let ctx = LinkerContext::new(&compilation, &registry, &options, &cancel, &collector);
    let analysis = LinkerAnalysisStep::run(&ctx, &[]).expect("analysis should succeed");

    let destination = SymbolSemantic::final_(m)
        .as_method(&compilation)
        .expect("M is a method");
    let plan = analysis.plan(destination).expect("Final M is a destination");
    let targets: Vec<_> = plan
        .inlinings
        .iter()
        .map(|inlining| inlining.target.symbol())
        .collect();
    assert_eq!(targets, vec![m_a3, m_a1, m]);
    assert!(plan.inlinings.iter().all(|inlining| inlining.simple));
}
