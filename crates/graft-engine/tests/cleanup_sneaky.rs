use graft_ast::printer::print_unit;
use graft_ast::{NodeArena, NodeIndex, Primitive, UnitBuilder};
use graft_common::diagnostic_codes;
use graft_common::Diagnostic;
use graft_engine::TransformEngine;

fn run(arena: &mut NodeArena, unit: NodeIndex) -> (Vec<Diagnostic>, String) {
    let engine = TransformEngine::new();
    let problems = engine.run_on(arena, unit);
    let text = print_unit(arena, unit);
    (problems, text)
}

/// `void run() { @graft.Cleanup R r = open(); use(r); done(); }`
fn cleanup_unit(value: Option<&str>, quietly: bool) -> (NodeArena, NodeIndex) {
    let mut b = UnitBuilder::new("Res.java", "demo");
    let class = b.class("Res");

    let r_ty = b.named_ref("R");
    let open = b.ident("open");
    let init = b.call(open, vec![]);
    let local = b.local("r", r_ty, init);
    let ann = b.annotate(local, "graft.Cleanup");
    if let Some(name) = value {
        let v = b.lit_str(name);
        b.annotation_arg(ann, "value", v);
    }
    if quietly {
        let v = b.lit_bool(true);
        b.annotation_arg(ann, "quietly", v);
    }

    let use_callee = b.ident("use");
    let r_ref = b.ident("r");
    let use_call = b.call(use_callee, vec![r_ref]);
    let s1 = b.expr_stmt(use_call);
    let done_callee = b.ident("done");
    let done_call = b.call(done_callee, vec![]);
    let s2 = b.expr_stmt(done_call);

    let body = b.block(vec![local, s1, s2]);
    let void_ty = b.primitive(Primitive::Void);
    b.method(class, "run", void_ty, body);
    b.finish()
}

#[test]
fn cleanup_wraps_the_tail_of_the_block() {
    let (mut arena, unit) = cleanup_unit(None, false);
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty(), "unexpected diagnostics: {problems:?}");
    assert!(text.contains("R r = open();"));
    assert!(text.contains("try {"));
    assert!(text.contains("use(r);"));
    assert!(text.contains("done();"));
    assert!(text.contains("} finally {"));
    // The implicit close is typed through the standard contract.
    assert!(text.contains("if (r instanceof java.io.Closeable) {"));
    assert!(text.contains("(java.io.Closeable) r.close();"));

    // The declaration stays outside the protected region.
    let decl = text.find("R r = open();").expect("declaration");
    let guard = text.find("try {").expect("try");
    assert!(decl < guard);
}

#[test]
fn cleanup_honors_a_custom_method_name() {
    let (mut arena, unit) = cleanup_unit(Some("dispose"), false);
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty());
    // A named method gets a plain null guard, not the closeable cast.
    assert!(text.contains("if (r != null) {"));
    assert!(text.contains("r.dispose();"));
    assert!(!text.contains("close"));
}

#[test]
fn cleanup_written_close_skips_the_closeable_cast() {
    let (mut arena, unit) = cleanup_unit(Some("close"), false);
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty());
    assert!(text.contains("if (r != null) {"));
    assert!(text.contains("r.close();"));
    assert!(!text.contains("instanceof"));
}

#[test]
fn cleanup_quietly_swallows_only_the_invocation() {
    let (mut arena, unit) = cleanup_unit(None, true);
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty());
    assert!(text.contains("if (r instanceof java.io.Closeable) {"));
    assert!(text.contains("(java.io.Closeable) r.close();"));
    assert!(text.contains("} catch (java.io.IOException $ex) {"));

    // The swallowing try sits inside the guard, after the finally.
    let fin = text.find("} finally {").expect("finally");
    let guard = text[fin..]
        .find("if (r instanceof java.io.Closeable) {")
        .expect("instanceof guard");
    let inner = text[fin..].find("try {").expect("inner try");
    assert!(guard < inner);
}

#[test]
fn cleanup_requires_an_initializer() {
    let mut b = UnitBuilder::new("Res.java", "demo");
    let class = b.class("Res");
    let r_ty = b.named_ref("R");
    let local = b.local("r", r_ty, NodeIndex::NONE);
    b.annotate(local, "graft.Cleanup");
    let body = b.block(vec![local]);
    let void_ty = b.primitive(Primitive::Void);
    b.method(class, "run", void_ty, body);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::ILLEGAL_SITE);
    assert!(!text.contains("try {"));
}

#[test]
fn cleanup_warns_on_reassignment_in_the_tail() {
    let mut b = UnitBuilder::new("Res.java", "demo");
    let class = b.class("Res");
    let r_ty = b.named_ref("R");
    let open = b.ident("open");
    let init = b.call(open, vec![]);
    let local = b.local("r", r_ty, init);
    b.annotate(local, "graft.Cleanup");
    let target = b.ident("r");
    let null = b.lit_null();
    let assign = {
        use graft_common::Span;
        b.arena_mut().add_assign(target, null, Span::EMPTY)
    };
    let s1 = b.expr_stmt(assign);
    let body = b.block(vec![local, s1]);
    let void_ty = b.primitive(Primitive::Void);
    b.method(class, "run", void_ty, body);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::BAD_OPTIONS);
    // Warned, but still transformed.
    assert!(text.contains("} finally {"));
}

#[test]
fn cleanup_rejects_non_local_hosts() {
    let mut b = UnitBuilder::new("Res.java", "demo");
    let class = b.class("Res");
    b.annotate(class, "graft.Cleanup");
    let (mut arena, unit) = b.finish();

    let (problems, _) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::ILLEGAL_SITE);
}

#[test]
fn sneaky_throws_wraps_the_whole_body() {
    let mut b = UnitBuilder::new("Risky.java", "demo");
    let class = b.class("Risky");
    let callee = b.ident("work");
    let call = b.call(callee, vec![]);
    let s1 = b.expr_stmt(call);
    let body = b.block(vec![s1]);
    let void_ty = b.primitive(Primitive::Void);
    let m = b.method(class, "run", void_ty, body);
    b.annotate(m, "graft.SneakyThrows");
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty(), "unexpected diagnostics: {problems:?}");
    assert!(text.contains("try {"));
    assert!(text.contains("work();"));
    assert!(text.contains("} catch (java.lang.Throwable $ex) {"));
    assert!(text.contains("throw graft.Graft.sneakyThrow($ex);"));
}

#[test]
fn sneaky_throws_catches_each_listed_exception() {
    let mut b = UnitBuilder::new("Risky.java", "demo");
    let class = b.class("Risky");
    let callee = b.ident("work");
    let call = b.call(callee, vec![]);
    let s1 = b.expr_stmt(call);
    let body = b.block(vec![s1]);
    let void_ty = b.primitive(Primitive::Void);
    let m = b.method(class, "run", void_ty, body);
    let ann = b.annotate(m, "graft.SneakyThrows");
    let io = b.class_literal("java.io.IOException");
    let interrupted = b.class_literal("java.lang.InterruptedException");
    let list = b.array_literal(vec![io, interrupted]);
    b.annotation_arg(ann, "value", list);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("} catch (java.io.IOException $ex) {"));
    assert!(text.contains("} catch (java.lang.InterruptedException $ex) {"));
    assert!(!text.contains("java.lang.Throwable"));
}

#[test]
fn sneaky_throws_leaves_constructor_delegation_in_place() {
    let mut b = UnitBuilder::new("Risky.java", "demo");
    let class = b.class("Risky");
    let sup = {
        use graft_common::Span;
        b.arena_mut().add_super(Span::EMPTY)
    };
    let delegation = b.call(sup, vec![]);
    let s1 = b.expr_stmt(delegation);
    let callee = b.ident("work");
    let call = b.call(callee, vec![]);
    let s2 = b.expr_stmt(call);
    let body = b.block(vec![s1, s2]);
    let ctor = b.constructor(class, body);
    b.annotate(ctor, "graft.SneakyThrows");
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    let sup_call = text.find("super();").expect("delegation");
    let guard = text.find("try {").expect("try");
    assert!(sup_call < guard, "delegation must stay outside the wrap");
    assert!(text.contains("work();"));
}

#[test]
fn sneaky_throws_rejects_bodyless_methods() {
    let mut b = UnitBuilder::new("Risky.java", "demo");
    let class = b.class("Risky");
    let void_ty = b.primitive(Primitive::Void);
    let m = b.method(class, "run", void_ty, NodeIndex::NONE);
    b.annotate(m, "graft.SneakyThrows");
    let (mut arena, unit) = b.finish();

    let (problems, _) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::ILLEGAL_SITE);
}
