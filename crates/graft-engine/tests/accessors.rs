use graft_ast::printer::print_unit;
use graft_ast::{NodeArena, NodeFlags, NodeIndex, Primitive, UnitBuilder};
use graft_common::diagnostic_codes;
use graft_common::{Diagnostic, DiagnosticCategory};
use graft_engine::TransformEngine;

fn run(arena: &mut NodeArena, unit: NodeIndex) -> (Vec<Diagnostic>, String) {
    let engine = TransformEngine::new();
    let problems = engine.run_on(arena, unit);
    let text = print_unit(arena, unit);
    (problems, text)
}

/// `class Size { int width; boolean active; static int count; }` with the
/// given marker on the type itself.
fn size_unit(marker: &str) -> (NodeArena, NodeIndex) {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    b.annotate(class, marker);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "width", int_ty);
    let bool_ty = b.primitive(Primitive::Boolean);
    b.field(class, "active", bool_ty);
    let int_ty = b.primitive(Primitive::Int);
    let count = b.field(class, "count", int_ty);
    b.modifiers(count, NodeFlags::STATIC);
    b.finish()
}

#[test]
fn type_level_getter_covers_every_instance_field() {
    let (mut arena, unit) = size_unit("graft.Getter");
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty(), "unexpected diagnostics: {problems:?}");
    assert!(text.contains("public int getWidth() {"));
    assert!(text.contains("return this.width;"));
    assert!(text.contains("public boolean isActive() {"));
    assert!(text.contains("return this.active;"));
    assert!(!text.contains("getCount"));
}

#[test]
fn type_level_setter_covers_every_instance_field() {
    let (mut arena, unit) = size_unit("graft.Setter");
    let (problems, text) = run(&mut arena, unit);

    assert!(problems.is_empty());
    assert!(text.contains("public void setWidth(int width) {"));
    assert!(text.contains("this.width = width;"));
    assert!(text.contains("public void setActive(boolean active) {"));
    assert!(!text.contains("setCount"));
}

#[test]
fn field_level_marker_targets_one_field() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let int_ty = b.primitive(Primitive::Int);
    let width = b.field(class, "width", int_ty);
    b.annotate(width, "graft.Getter");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "height", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("public int getWidth() {"));
    assert!(!text.contains("getHeight"));
}

#[test]
fn an_is_spelled_boolean_keeps_its_suffix() {
    let mut b = UnitBuilder::new("Door.java", "demo");
    let class = b.class("Door");
    b.annotate(class, "graft.Getter");
    b.annotate(class, "graft.Setter");
    let bool_ty = b.primitive(Primitive::Boolean);
    b.field(class, "isOpen", bool_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("public boolean isOpen() {"));
    assert!(text.contains("return this.isOpen;"));
    assert!(text.contains("public void setOpen(boolean isOpen) {"));
    assert!(text.contains("this.isOpen = isOpen;"));
}

#[test]
fn field_level_getter_warns_when_the_method_exists() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let int_ty = b.primitive(Primitive::Int);
    let width = b.field(class, "width", int_ty);
    b.annotate(width, "graft.Getter");
    let int_ty = b.primitive(Primitive::Int);
    let body = b.block(vec![]);
    b.method(class, "getWidth", int_ty, body);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::MEMBER_EXISTS);
    assert_eq!(problems[0].category, DiagnosticCategory::Warning);
    assert_eq!(text.matches("getWidth").count(), 1);
}

#[test]
fn type_level_getter_skips_existing_accessors_quietly() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    b.annotate(class, "graft.Getter");
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "width", int_ty);
    let bool_ty = b.primitive(Primitive::Boolean);
    b.field(class, "active", bool_ty);
    let int_ty = b.primitive(Primitive::Int);
    let body = b.block(vec![]);
    b.method(class, "getWidth", int_ty, body);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty(), "unexpected diagnostics: {problems:?}");
    assert_eq!(text.matches("getWidth").count(), 1);
    assert!(text.contains("public boolean isActive() {"));
}

#[test]
fn final_fields_get_no_setter() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    b.annotate(class, "graft.Setter");
    let int_ty = b.primitive(Primitive::Int);
    let width = b.field(class, "width", int_ty);
    b.modifiers(width, NodeFlags::FINAL);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "height", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    // Type-level coverage passes over finals without complaint.
    assert!(problems.is_empty());
    assert!(!text.contains("setWidth"));
    assert!(text.contains("public void setHeight(int height) {"));
}

#[test]
fn field_level_setter_on_a_final_field_warns() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let int_ty = b.primitive(Primitive::Int);
    let width = b.field(class, "width", int_ty);
    b.modifiers(width, NodeFlags::FINAL);
    b.annotate(width, "graft.Setter");
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].category, DiagnosticCategory::Warning);
    assert!(!text.contains("setWidth"));
}

#[test]
fn access_level_is_honored_positionally() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let ann = b.annotate(class, "graft.Getter");
    let level = b.select("AccessLevel.PROTECTED");
    b.annotation_arg(ann, "", level);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "width", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(text.contains("protected int getWidth() {"));
}

#[test]
fn access_level_none_disables_the_marker() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let ann = b.annotate(class, "graft.Getter");
    let off = b.select("AccessLevel.NONE");
    b.annotation_arg(ann, "value", off);
    let int_ty = b.primitive(Primitive::Int);
    b.field(class, "width", int_ty);
    let (mut arena, unit) = b.finish();

    let (problems, text) = run(&mut arena, unit);
    assert!(problems.is_empty());
    assert!(!text.contains("getWidth"));
}

#[test]
fn accessor_markers_reject_method_hosts() {
    let mut b = UnitBuilder::new("Size.java", "demo");
    let class = b.class("Size");
    let void_ty = b.primitive(Primitive::Void);
    let body = b.block(vec![]);
    let m = b.method(class, "run", void_ty, body);
    b.annotate(m, "graft.Getter");
    let (mut arena, unit) = b.finish();

    let (problems, _) = run(&mut arena, unit);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, diagnostic_codes::ILLEGAL_SITE);
}
