//! Linking of method override chains.

use rstest::rstest;
use weaver::base::{AspectLayerId, CompilationId};
use weaver::linking::LinkerOptions;
use weaver::model::{
    AccessorSpec, CompilationBuilder, DeclarationFlags, InjectionRegistry, MethodSpec,
};
use weaver::syntax::{
    AspectReferenceFlags, AspectReferenceOrder, AspectReferenceSpecification, BinaryOp,
    PrintOptions, SymbolBinding, print_member,
};

use crate::helpers::fixtures::{forwarding_chain, many_types, register};
use crate::helpers::{aspect_ref, link, link_with, member_names, member_text};

// ============================================================================
// OVERRIDE CHAINS
// ============================================================================

#[test]
fn test_stacked_overrides_collapse_into_final_member() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 2);
    let compilation = builder.build();
    let registry = register(&compilation, &[chain]);

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["M"]);
    let text = member_text(&output, "C", "M");
    assert!(text.starts_with("public int M(int a)"), "{text}");
    assert!(text.contains("return a + 1;"), "{text}");
    assert!(!text.contains("M_A"), "{text}");
}

#[test]
fn test_stacked_void_overrides_interleave_around_the_original() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let log = |text: &str| f.expr_stmt(f.invoke(f.ident("Log"), vec![f.string(text)]));
    let m = builder.add_method(ty, MethodSpec::new("M").body(f.block(vec![log("original")])));

    // `Log(pre); this.M(); Log(post);` at the override's own layer.
    let wrapping = |layer: u32, pre: &str, post: &str| {
        let next = f.invoke(
            aspect_ref(&f, f.this(), "M", m, layer, AspectReferenceOrder::Previous),
            vec![],
        );
        f.block(vec![log(pre), f.expr_stmt(next), log(post)])
    };
    let m_a = builder.add_method(
        ty,
        MethodSpec::new("M_A").private().body(wrapping(1, "A-pre", "A-post")),
    );
    let m_b = builder.add_method(
        ty,
        MethodSpec::new("M_B").private().body(wrapping(2, "B-pre", "B-post")),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .add_override(m, m_b, AspectLayerId(2))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["M"]);

    let text = member_text(&output, "C", "M");
    let positions: Vec<usize> = ["B-pre", "A-pre", "original", "A-post", "B-post"]
        .iter()
        .map(|marker| {
            text.find(marker)
                .unwrap_or_else(|| panic!("{marker} should be in {text}"))
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{text}");
    assert!(!text.contains("goto"), "{text}");
    assert!(!text.contains("this.M"), "{text}");
}

#[rstest]
#[case::implicit_setter(true, vec!["P", "P_Source", "P_A"])]
#[case::explicit_setter(false, vec!["P", "P_Source"])]
fn test_implicit_setter_of_first_override_stays_reachable(
    #[case] implicit: bool,
    #[case] expected: Vec<&str>,
) {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let p = builder.add_property(ty, "P", "int", vec![AccessorSpec::get(None)], Some(f.int(5)));

    let read = aspect_ref(&f, f.this(), "P", p.property, 1, AspectReferenceOrder::Previous);
    let setter = if implicit {
        AccessorSpec::set(None).implicit()
    } else {
        AccessorSpec::set(Some(f.block(vec![])))
    };
    let p_a = builder.add_property(
        ty,
        "P_A",
        "int",
        vec![AccessorSpec::get(Some(f.block(vec![f.ret(Some(read))]))), setter],
        None,
    );
    // The last override never calls the previous one, so nothing reaches
    // `P_A` through its getter.
    let p_b = builder.add_property(
        ty,
        "P_B",
        "int",
        vec![AccessorSpec::get(Some(f.block(vec![f.ret(Some(f.int(42)))])))],
        None,
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(p.property, p_a.property, AspectLayerId(1))
        .add_override(p.property, p_b.property, AspectLayerId(2))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), expected);
    if implicit {
        let override_text = member_text(&output, "C", "P_A");
        assert!(override_text.contains("this.P_Source = value;"), "{override_text}");
    }
}

#[test]
fn test_non_inlineable_override_is_kept_private() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let m = builder.add_method(
        ty,
        MethodSpec::new("M")
            .returns("int")
            .param("a", "int")
            .body(f.block(vec![f.ret(Some(f.binary(
                BinaryOp::Add,
                f.ident("a"),
                f.int(1),
            )))])),
    );
    // `return this.M(a) * 2;` has no inliner.
    let call = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 1, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let m_a1 = builder.add_method(
        ty,
        MethodSpec::new("M_A1")
            .returns("int")
            .param("a", "int")
            .body(f.block(vec![f.ret(Some(f.binary(BinaryOp::Mul, call, f.int(2))))])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override_with_flags(m, m_a1, AspectLayerId(1), DeclarationFlags::NOT_INLINEABLE)
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["M", "M_Source", "M_A1"]);

    let final_text = member_text(&output, "C", "M");
    assert!(final_text.contains("return this.M_A1(a);"), "{final_text}");

    let override_text = member_text(&output, "C", "M_A1");
    assert!(override_text.starts_with("private int M_A1(int a)"), "{override_text}");
    assert!(override_text.contains("return this.M_Source(a) * 2;"), "{override_text}");

    let source_text = member_text(&output, "C", "M_Source");
    assert!(source_text.starts_with("private int M_Source(int a)"), "{source_text}");
    assert!(source_text.contains("return a + 1;"), "{source_text}");
}

#[test]
fn test_forwarding_override_links_to_the_original_text() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let m = builder.add_method(
        ty,
        MethodSpec::new("M").body(f.block(vec![f.expr_stmt(f.invoke(f.ident("Log"), vec![]))])),
    );
    let call = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 1, AspectReferenceOrder::Previous),
        vec![],
    );
    let m_a = builder.add_method(ty, MethodSpec::new("M_A").body(f.block(vec![f.expr_stmt(call)])));
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert_eq!(member_names(&output, "C"), vec!["M"]);
    let original = compilation.member_decl(m).expect("declaration of M");
    assert_eq!(
        member_text(&output, "C", "M"),
        print_member(original, &PrintOptions::default())
    );
}

#[test]
fn test_unimplemented_target_calls_empty_stub() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let m = builder.add_method(ty, MethodSpec::new("M"));
    let callee = f
        .member(f.this(), "M")
        .with_binding(SymbolBinding::Resolved(m))
        .with_aspect_reference(
            AspectReferenceSpecification::new(AspectLayerId(1), AspectReferenceOrder::Base)
                .with_flags(AspectReferenceFlags::NONE),
        );
    let call = f.invoke(callee, vec![]);
    let m_a = builder.add_method(ty, MethodSpec::new("M_A").body(f.block(vec![f.expr_stmt(call)])));
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["M", "M_Empty"]);
    let final_text = member_text(&output, "C", "M");
    assert!(final_text.contains("this.M_Empty();"), "{final_text}");
    let empty_text = member_text(&output, "C", "M_Empty");
    assert!(empty_text.starts_with("private void M_Empty()"), "{empty_text}");
}

#[rstest]
#[case::same_instance(AspectReferenceFlags::INLINEABLE, vec!["M"])]
#[case::custom_receiver(
    AspectReferenceFlags::INLINEABLE | AspectReferenceFlags::CUSTOM_RECEIVER,
    vec!["M", "M_Source"]
)]
fn test_custom_receiver_is_never_inlined(
    #[case] flags: AspectReferenceFlags,
    #[case] expected: Vec<&str>,
) {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let m = builder.add_method(
        ty,
        MethodSpec::new("M")
            .returns("int")
            .param("a", "int")
            .body(f.block(vec![f.ret(Some(f.binary(
                BinaryOp::Add,
                f.ident("a"),
                f.int(1),
            )))])),
    );
    let callee = f
        .member(f.this(), "M")
        .with_binding(SymbolBinding::Resolved(m))
        .with_aspect_reference(
            AspectReferenceSpecification::new(AspectLayerId(1), AspectReferenceOrder::Previous)
                .with_flags(flags),
        );
    let m_a = builder.add_method(
        ty,
        MethodSpec::new("M_A")
            .private()
            .returns("int")
            .param("a", "int")
            .body(f.block(vec![f.ret(Some(f.invoke(callee, vec![f.ident("a")])))])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), expected);
    let final_text = member_text(&output, "C", "M");
    if flags.contains(AspectReferenceFlags::CUSTOM_RECEIVER) {
        assert!(final_text.contains("return this.M_Source(a);"), "{final_text}");
    } else {
        assert!(final_text.contains("return a + 1;"), "{final_text}");
    }
}

// ============================================================================
// RETURN LABELS
// ============================================================================

#[rstest]
#[case::early_return(true)]
#[case::both_branches_return(false)]
fn test_return_label_only_for_non_exiting_returns(#[case] early_return: bool) {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");

    let cond = f.binary(BinaryOp::Gt, f.ident("a"), f.int(0));
    let then_branch = f.block_stmt(f.block(vec![f.ret(Some(f.int(1)))]));
    let statements = if early_return {
        vec![f.if_stmt(cond, then_branch, None), f.ret(Some(f.int(2)))]
    } else {
        let else_branch = f.block_stmt(f.block(vec![f.ret(Some(f.int(2)))]));
        vec![f.if_stmt(cond, then_branch, Some(else_branch))]
    };
    let m = builder.add_method(
        ty,
        MethodSpec::new("M")
            .returns("int")
            .param("a", "int")
            .body(f.block(statements)),
    );

    let call = f.invoke(
        aspect_ref(&f, f.this(), "M", m, 1, AspectReferenceOrder::Previous),
        vec![f.ident("a")],
    );
    let m_a = builder.add_method(
        ty,
        MethodSpec::new("M_A").returns("int").param("a", "int").body(f.block(vec![
            f.local(None, "r", Some(call)),
            f.ret(Some(f.binary(BinaryOp::Add, f.ident("r"), f.int(10)))),
        ])),
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(m, m_a, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert_eq!(member_names(&output, "C"), vec!["M"]);
    let text = member_text(&output, "C", "M");
    assert!(text.contains("int r;"), "{text}");
    assert!(text.contains("r = 1;"), "{text}");
    assert!(text.contains("r = 2;"), "{text}");
    assert!(text.contains("return r + 10;"), "{text}");
    if early_return {
        assert!(text.contains("goto __aspect_return_1;"), "{text}");
        assert!(text.contains("__aspect_return_1: ;"), "{text}");
    } else {
        assert!(!text.contains("goto"), "{text}");
        assert!(!text.contains("__aspect_return"), "{text}");
    }
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_parallel_and_sequential_output_match() {
    let (compilation, registry) = many_types(8);

    let sequential = link_with(&compilation, &registry, LinkerOptions::sequential());
    let parallel = link_with(&compilation, &registry, LinkerOptions::default());

    let options = LinkerOptions::default();
    assert_eq!(sequential.print(&options), parallel.print(&options));
    assert_eq!(sequential.diagnostics, parallel.diagnostics);
    for t in 0..8 {
        assert_eq!(member_names(&parallel, &format!("T{t}")), vec!["M0", "M1", "M2"]);
    }
}

#[test]
fn test_without_cleanup_inlined_blocks_remain() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let ty = builder.add_type("C");
    let chain = forwarding_chain(&mut builder, ty, "M", 1);
    let compilation = builder.build();
    let registry = register(&compilation, &[chain]);

    let options = LinkerOptions {
        cleanup: false,
        ..LinkerOptions::sequential()
    };
    let output = link_with(&compilation, &registry, options);

    let text = member_text(&output, "C", "M");
    assert!(text.contains("return a + 1;"), "{text}");
}
