//! Properties and events whose original declaration is storage.

use weaver::base::{AspectLayerId, CompilationId};
use weaver::model::{AccessorSpec, CompilationBuilder, DeclarationFlags, InjectionRegistry};
use weaver::syntax::{AspectReferenceOrder, AssignOp, Modifiers};

use crate::helpers::{aspect_ref, link, member_names, member_text};

#[test]
fn test_auto_property_moves_to_source_stub() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let p = builder.add_property(
        ty,
        "P",
        "int",
        vec![AccessorSpec::get(None), AccessorSpec::set(None)],
        Some(f.int(5)),
    );

    let read = aspect_ref(&f, f.this(), "P", p.property, 1, AspectReferenceOrder::Previous);
    let write = aspect_ref(&f, f.this(), "P", p.property, 1, AspectReferenceOrder::Previous);
    let p_a = builder.add_property(
        ty,
        "P_A",
        "int",
        vec![
            AccessorSpec::get(Some(f.block(vec![f.ret(Some(read))]))),
            AccessorSpec::set(Some(f.block(vec![
                f.expr_stmt(f.assign(write, f.ident("value"))),
            ]))),
        ],
        None,
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(p.property, p_a.property, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["P", "P_Source"]);

    let final_text = member_text(&output, "C", "P");
    assert!(final_text.contains("return this.P_Source;"), "{final_text}");
    assert!(final_text.contains("this.P_Source = value;"), "{final_text}");
    assert!(!final_text.contains("= 5"), "{final_text}");

    let source_text = member_text(&output, "C", "P_Source");
    assert_eq!(source_text.trim_end(), "private int P_Source { get; set; } = 5;");
}

#[test]
fn test_explicit_interface_event_field_keeps_interface_name() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let explicit = Modifiers {
        visibility: None,
        ..Modifiers::default()
    };
    let e = builder.add_event_with(
        ty,
        "E",
        "Handler",
        explicit,
        Some("INotify".into()),
        vec![
            AccessorSpec::add(Some(f.block(vec![]))),
            AccessorSpec::remove(Some(f.block(vec![]))),
        ],
    );

    let accessor_body = |op: AssignOp| {
        let event = aspect_ref(&f, f.this(), "E", e.event, 2, AspectReferenceOrder::Previous);
        f.block(vec![f.expr_stmt(f.assign_op(op, event, f.ident("value")))])
    };
    let e_a = builder.add_event(
        ty,
        "E_A",
        "Handler",
        vec![
            AccessorSpec::add(Some(accessor_body(AssignOp::AddAssign))),
            AccessorSpec::remove(Some(accessor_body(AssignOp::SubAssign))),
        ],
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_introduction(e.event, AspectLayerId(1), DeclarationFlags::EVENT_FIELD)
        .add_override(e.event, e_a.event, AspectLayerId(2))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["E", "E_Source"]);

    let final_text = member_text(&output, "C", "E");
    assert!(final_text.starts_with("event Handler INotify.E"), "{final_text}");
    assert!(final_text.contains("this.E_Source += value;"), "{final_text}");
    assert!(final_text.contains("this.E_Source -= value;"), "{final_text}");

    let source_text = member_text(&output, "C", "E_Source");
    assert_eq!(source_text.trim_end(), "private event Handler E_Source;");
}

#[test]
fn test_kept_override_accessors_target_original_storage() {
    let mut builder = CompilationBuilder::new(CompilationId(0));
    let f = builder.factory();
    let ty = builder.add_type("C");
    let p = builder.add_property(ty, "P", "int", vec![AccessorSpec::get(None)], Some(f.int(5)));

    // The override only declares a getter; the compiler adds `set;`.
    let read = aspect_ref(&f, f.this(), "P", p.property, 1, AspectReferenceOrder::Previous);
    let p_a = builder.add_property(
        ty,
        "P_A",
        "int",
        vec![
            AccessorSpec::get(Some(f.block(vec![f.ret(Some(read))]))),
            AccessorSpec::set(None).implicit(),
        ],
        None,
    );
    let compilation = builder.build();
    let registry = InjectionRegistry::builder(&compilation)
        .add_override(p.property, p_a.property, AspectLayerId(1))
        .build();

    let output = link(&compilation, &registry);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(member_names(&output, "C"), vec!["P", "P_Source", "P_A"]);

    let final_text = member_text(&output, "C", "P");
    assert!(final_text.contains("return this.P_Source;"), "{final_text}");

    // The getter was inlined into `P` and is rendered again for the kept
    // override, with the same retargeting.
    let override_text = member_text(&output, "C", "P_A");
    assert!(override_text.starts_with("private int P_A"), "{override_text}");
    assert!(override_text.contains("return this.P_Source;"), "{override_text}");
    assert!(!override_text.contains("return this.P;"), "{override_text}");
    assert!(override_text.contains("this.P_Source = value;"), "{override_text}");
    assert!(!override_text.contains("set;"), "{override_text}");

    let source_text = member_text(&output, "C", "P_Source");
    assert_eq!(source_text.trim_end(), "private int P_Source { get; } = 5;");
}
