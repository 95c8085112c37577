use graft_ast::printer::print_unit;
use graft_ast::{NodeArena, NodeFlags, NodeIndex, Primitive, UnitBuilder};
use graft_common::diagnostic_codes;
use graft_common::Diagnostic;
use graft_engine::TransformEngine;

/// `public class Point { int a; long b; String c; }` with the equality
/// marker attached to the class.
fn point_unit() -> (NodeArena, NodeIndex, NodeIndex) {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    b.modifiers(class, NodeFlags::PUBLIC);
    b.annotate(class, "graft.EqualsAndHashCode");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let long_ty = b.primitive(Primitive::Long);
    b.field(class, "b", long_ty);
    let str_ty = b.named_ref("java.lang.String");
    b.field(class, "c", str_ty);
    let (arena, unit) = b.finish();
    (arena, unit, class)
}

fn run(arena: &mut NodeArena, unit: NodeIndex) -> (Vec<Diagnostic>, String) {
    let engine = TransformEngine::new();
    let problems = engine.run_on(arena, unit);
    let text = print_unit(arena, unit);
    (problems, text)
}

#[test]
fn generates_the_equality_trio() {
    let (mut arena, unit, _) = point_unit();
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty(), "unexpected diagnostics: {problems:?}");
    assert!(text.contains("public boolean equals(java.lang.Object o) {"));
    assert!(text.contains("protected boolean canEqual(java.lang.Object other) {"));
    assert!(text.contains("public int hashCode() {"));
    assert!(text.contains("@java.lang.SuppressWarnings(\"all\")"));
}

#[test]
fn hash_code_mixes_each_field_shape() {
    let (mut arena, unit, _) = point_unit();
    let (_, text) = run(&mut arena, unit);

    assert!(text.contains("final int PRIME = 31;"));
    assert!(text.contains("int result = 1;"));
    // int field mixes directly.
    assert!(text.contains("result = result * PRIME + this.a;"));
    // long field goes through a word fold.
    assert!(text.contains("final long $b = this.b;"));
    assert!(text.contains("result = result * PRIME + (int) $b >>> 32 ^ $b;"));
    // reference field goes through a null-safe temp.
    assert!(text.contains("final java.lang.Object $c = this.c;"));
    assert!(text.contains("result = result * PRIME + $c == null ? 0 : $c.hashCode();"));
    assert!(text.contains("return result;"));
}

#[test]
fn equals_narrows_and_compares_by_shape() {
    let (mut arena, unit, _) = point_unit();
    let (_, text) = run(&mut arena, unit);

    assert!(text.contains("if (o == this) {"));
    assert!(text.contains("if (!o instanceof Point) {"));
    assert!(text.contains("final Point other = (Point) o;"));
    assert!(text.contains("if (!other.canEqual((java.lang.Object) this)) {"));
    assert!(text.contains("if (this.a != other.a) {"));
    assert!(text.contains("if (this.b != other.b) {"));
    assert!(text.contains("final java.lang.Object this$c = this.c;"));
    assert!(text.contains("final java.lang.Object other$c = other.c;"));
    assert!(text.contains("if (this$c == null ? other$c != null : !this$c.equals(other$c)) {"));
    assert!(text.contains("return other instanceof Point;"));
}

#[test]
fn final_leaf_type_skips_can_equal() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    b.modifiers(class, NodeFlags::PUBLIC | NodeFlags::FINAL);
    b.annotate(class, "graft.EqualsAndHashCode");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(!text.contains("canEqual"));
    assert!(text.contains("public boolean equals(java.lang.Object o) {"));
}

#[test]
fn user_written_method_blocks_generation() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    b.annotate(class, "graft.EqualsAndHashCode");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let bool_ty = b.primitive(Primitive::Boolean);
    let f = b.lit_bool(false);
    let ret = b.return_stmt(f);
    let body = b.block(vec![ret]);
    b.method(class, "equals", bool_ty, body);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::MEMBER_EXISTS);
    assert!(!text.contains("hashCode"));
}

#[test]
fn exclude_drops_a_field() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    let ann = b.annotate(class, "graft.EqualsAndHashCode");
    let excluded = b.lit_str("c");
    b.annotation_arg(ann, "exclude", excluded);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let str_ty = b.named_ref("java.lang.String");
    b.field(class, "c", str_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("result = result * PRIME + this.a;"));
    assert!(!text.contains("$c"));
}

#[test]
fn of_wins_over_exclude_with_a_warning() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    let ann = b.annotate(class, "graft.EqualsAndHashCode");
    let of = b.lit_str("a");
    b.annotation_arg(ann, "of", of);
    let exclude = b.lit_str("a");
    b.annotation_arg(ann, "exclude", exclude);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::BAD_OPTIONS);
    // 'of' picked the field even though 'exclude' named it.
    assert!(text.contains("result = result * PRIME + this.a;"));
}

#[test]
fn call_super_without_superclass_is_an_error() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point");
    let ann = b.annotate(class, "graft.EqualsAndHashCode");
    let yes = b.lit_bool(true);
    b.annotation_arg(ann, "callSuper", yes);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "a", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::BAD_OPTIONS);
    assert!(!text.contains("hashCode"));
}

#[test]
fn subclass_without_call_super_warns_and_skips_super() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point3D");
    b.extends(class, "demo.Point");
    b.annotate(class, "graft.EqualsAndHashCode");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "z", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::BAD_OPTIONS);
    assert!(text.contains("public int hashCode() {"));
    assert!(!text.contains("super.equals"));
    assert!(!text.contains("super.hashCode"));
}

#[test]
fn call_super_mixes_the_superclass() {
    let mut b = UnitBuilder::new("Point.java", "demo");
    let class = b.class("Point3D");
    b.extends(class, "demo.Point");
    let ann = b.annotate(class, "graft.EqualsAndHashCode");
    let yes = b.lit_bool(true);
    b.annotation_arg(ann, "callSuper", yes);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "z", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("if (!super.equals(o)) {"));
    assert!(text.contains("result = result * PRIME + super.hashCode();"));
}

#[test]
fn second_full_pass_changes_nothing() {
    let (mut arena, unit, _) = point_unit();
    let engine = TransformEngine::new();

    let first = engine.run_on(&mut arena, unit);
    let after_first = print_unit(&arena, unit);
    let second = engine.run_on(&mut arena, unit);
    let after_second = print_unit(&arena, unit);

    assert!(first.is_empty());
    assert!(second.is_empty());
    assert_eq!(after_first, after_second);
}
