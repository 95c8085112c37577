//! `graft.Getter` / `graft.Setter`: accessor synthesis on a field or on a
//! whole type.
//!
//! A type-level marker covers every eligible instance field and skips
//! quietly where an accessor already exists; a field-level marker covers
//! that one field and warns when it cannot deliver. Accessor names follow
//! the bean convention, with the `is` prefix for primitive booleans and a
//! field already spelled `isX` keeping its own name as the getter.

use graft_ast::{NodeFlags, NodeIndex, Primitive};
use graft_common::{diagnostic_codes, Span};

use crate::dispatch::TransformContext;
use crate::handlers::util::{self, FieldShape, MemberExists};
use crate::registry::{Handler, HandlerError};
use crate::synth::{clone_subtree, inject_method, Synth};
use crate::tree::{Kind, TreeId};
use crate::values::AnnotationValues;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Getter,
    Setter,
}

pub struct HandleAccessor {
    mode: Mode,
}

impl HandleAccessor {
    pub fn getter() -> HandleAccessor {
        HandleAccessor { mode: Mode::Getter }
    }

    pub fn setter() -> HandleAccessor {
        HandleAccessor { mode: Mode::Setter }
    }
}

impl Handler for HandleAccessor {
    fn handle(
        &self,
        values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError> {
        let ann_node = cx.tree.node(site);
        let span = cx.arena.get(ann_node).map(|n| n.span).unwrap_or(Span::EMPTY);

        let host = cx.tree.parent(site);
        let host_kind = host.and_then(|h| cx.tree.kind(h));
        let (fields, whine) = match host_kind {
            Some(Kind::Field) => {
                let field = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);
                (vec![field], true)
            }
            Some(Kind::Type) => {
                let type_decl = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);
                (util::instance_fields(cx.arena, type_decl), false)
            }
            _ => {
                cx.error(
                    span,
                    diagnostic_codes::ILLEGAL_SITE,
                    "accessor markers are only supported on a type or field",
                );
                return Ok(());
            }
        };

        let Some(access) = util::parse_access_level(&values.str_value("value")) else {
            // AccessLevel.NONE turns the marker off.
            return Ok(());
        };

        let Some(type_decl) = util::host_of_kind(cx, site, Kind::Type) else {
            return Ok(());
        };

        for field in fields {
            if self.mode == Mode::Setter && cx.arena.flags(field).contains(NodeFlags::FINAL) {
                if whine {
                    cx.warning(
                        span,
                        diagnostic_codes::ILLEGAL_SITE,
                        "not generating a setter: the field is final",
                    );
                }
                continue;
            }

            let field_name = util::field_name(cx.arena, field);
            let boolean = matches!(
                util::field_shape(cx.arena, field),
                FieldShape::Primitive(Primitive::Boolean)
            );
            let accessor = match self.mode {
                Mode::Getter => getter_name(&field_name, boolean),
                Mode::Setter => setter_name(&field_name, boolean),
            };

            match util::method_exists(cx.arena, type_decl, &accessor) {
                MemberExists::ExistsByUser => {
                    if whine {
                        cx.warning(
                            span,
                            diagnostic_codes::MEMBER_EXISTS,
                            format!("not generating {accessor}: a method with that name already exists"),
                        );
                    }
                    continue;
                }
                MemberExists::ExistsByGeneration => continue,
                MemberExists::NotExists => {}
            }

            let field_type = cx
                .arena
                .get_variable(field)
                .map(|v| v.type_ref)
                .unwrap_or(NodeIndex::NONE);
            let cloned = clone_subtree(cx.arena, field_type, ann_node);
            let method = match self.mode {
                Mode::Getter => build_getter(cx, ann_node, &accessor, &field_name, cloned, access),
                Mode::Setter => build_setter(cx, ann_node, &accessor, &field_name, cloned, access),
            };
            inject_method(cx.arena, type_decl, method, ann_node);
        }

        cx.resync();
        Ok(())
    }
}

/// `<access> <Type> <name>() { return this.f; }`
fn build_getter(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    name: &str,
    field_name: &str,
    return_type: NodeIndex,
    access: NodeFlags,
) -> NodeIndex {
    let mut s = Synth::new(cx.arena, source);
    let this = s.this_();
    let value = s.select(this, field_name);
    let ret = s.return_stmt(value);
    let body = s.block(vec![ret]);
    s.method(name, return_type, body, access)
}

/// `<access> void <name>(final <Type> f) { this.f = f; }`
fn build_setter(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    name: &str,
    field_name: &str,
    param_type: NodeIndex,
    access: NodeFlags,
) -> NodeIndex {
    let mut s = Synth::new(cx.arena, source);
    let this = s.this_();
    let target = s.select(this, field_name);
    let value = s.ident(field_name);
    let assign = s.assign(target, value);
    let stmt = s.expr_stmt(assign);
    let body = s.block(vec![stmt]);
    let void = s.primitive(Primitive::Void);
    let method = s.method(name, void, body, access);
    let param = s.parameter(method, field_name, param_type);
    s.add_flags(param, NodeFlags::FINAL);
    method
}

fn getter_name(field: &str, boolean: bool) -> String {
    if boolean {
        if keeps_is_prefix(field) {
            return field.to_string();
        }
        return format!("is{}", capitalize(field));
    }
    format!("get{}", capitalize(field))
}

fn setter_name(field: &str, boolean: bool) -> String {
    if boolean && keeps_is_prefix(field) {
        return format!("set{}", &field[2..]);
    }
    format!("set{}", capitalize(field))
}

/// A primitive-boolean field already spelled `isX` keeps its own written
/// suffix rather than picking up a second prefix.
fn keeps_is_prefix(field: &str) -> bool {
    field
        .strip_prefix("is")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_lowercase())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
