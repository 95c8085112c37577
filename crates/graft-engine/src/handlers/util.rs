//! Shared handler plumbing: member-existence checks, field selection,
//! access-level parsing.

use graft_ast::{NodeArena, NodeFlags, NodeIndex, Primitive, SyntaxKind};

use crate::dispatch::TransformContext;
use crate::tree::{Kind, TreeId};

/// Tri-state existence check. Members produced by earlier marker expansion
/// are distinguished from user-written ones so handlers can skip quietly
/// instead of warning about their own output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberExists {
    NotExists,
    ExistsByGeneration,
    ExistsByUser,
}

pub fn method_exists(arena: &NodeArena, type_decl: NodeIndex, name: &str) -> MemberExists {
    let Some(data) = arena.get_type_decl(type_decl) else {
        return MemberExists::NotExists;
    };
    for method in data.methods.iter() {
        let Some(m) = arena.get_method(method) else {
            continue;
        };
        if m.name.is_some() && arena.resolve_atom(m.name) == name {
            return if arena.is_generated(method) {
                MemberExists::ExistsByGeneration
            } else {
                MemberExists::ExistsByUser
            };
        }
    }
    MemberExists::NotExists
}

pub fn constructor_exists(arena: &NodeArena, type_decl: NodeIndex) -> MemberExists {
    let Some(data) = arena.get_type_decl(type_decl) else {
        return MemberExists::NotExists;
    };
    for method in data.methods.iter() {
        if !arena.is_constructor(method) {
            continue;
        }
        if arena.flags(method).contains(NodeFlags::DEFAULT_CONSTRUCTOR) {
            continue;
        }
        return if arena.is_generated(method) {
            MemberExists::ExistsByGeneration
        } else {
            MemberExists::ExistsByUser
        };
    }
    MemberExists::NotExists
}

pub fn host_of_kind(cx: &TransformContext<'_>, site: TreeId, kind: Kind) -> Option<NodeIndex> {
    let parent = cx.tree.parent(site)?;
    if cx.tree.kind(parent) == Some(kind) {
        return Some(cx.tree.node(parent));
    }
    cx.tree.ancestor_of_kind(parent, kind).map(|t| cx.tree.node(t))
}

/// Enclosing-chain-qualified name (`Outer.Inner`), the spelling needed for
/// instanceof tests and casts against a nested type.
pub fn qualified_type_name(arena: &NodeArena, type_decl: NodeIndex) -> String {
    let mut segments = Vec::new();
    let mut current = type_decl;
    while current.is_some() {
        let Some(data) = arena.get_type_decl(current) else {
            break;
        };
        if data.name.is_some() {
            segments.push(arena.resolve_atom(data.name).to_string());
        }
        current = data.enclosing;
    }
    segments.reverse();
    segments.join(".")
}

pub fn type_name(arena: &NodeArena, type_decl: NodeIndex) -> String {
    arena
        .get_type_decl(type_decl)
        .filter(|d| d.name.is_some())
        .map(|d| arena.resolve_atom(d.name).to_string())
        .unwrap_or_default()
}

/// Instance fields eligible for generated member logic: not static, not
/// transient, and not compiler-reserved (`$`-prefixed) names.
pub fn instance_fields(arena: &NodeArena, type_decl: NodeIndex) -> Vec<NodeIndex> {
    let Some(data) = arena.get_type_decl(type_decl) else {
        return Vec::new();
    };
    data.fields
        .iter()
        .filter(|&f| {
            let flags = arena.flags(f);
            if flags.contains(NodeFlags::STATIC) || flags.contains(NodeFlags::TRANSIENT) {
                return false;
            }
            match arena.get_variable(f) {
                Some(v) if v.name.is_some() => !arena.resolve_atom(v.name).starts_with('$'),
                _ => false,
            }
        })
        .collect()
}

pub fn field_name(arena: &NodeArena, field: NodeIndex) -> String {
    arena
        .get_variable(field)
        .filter(|v| v.name.is_some())
        .map(|v| arena.resolve_atom(v.name).to_string())
        .unwrap_or_default()
}

/// Whether a field carries an annotation with the given simple or
/// qualified written name.
pub fn has_annotation_named(arena: &NodeArena, decl: NodeIndex, simple: &str) -> bool {
    let annotations = match arena.kind(decl) {
        Some(SyntaxKind::FieldDecl | SyntaxKind::Parameter | SyntaxKind::LocalDecl) => arena
            .get_variable(decl)
            .map(|v| v.annotations.clone())
            .unwrap_or_default(),
        Some(SyntaxKind::MethodDecl) => arena
            .get_method(decl)
            .map(|m| m.annotations.clone())
            .unwrap_or_default(),
        Some(SyntaxKind::TypeDecl) => arena
            .get_type_decl(decl)
            .map(|t| t.annotations.clone())
            .unwrap_or_default(),
        _ => return false,
    };
    annotations.iter().any(|ann| {
        let Some(data) = arena.get_annotation(ann) else {
            return false;
        };
        if data.resolved_fqn.is_some() {
            let fqn = arena.resolve_atom(data.resolved_fqn);
            if fqn == simple || fqn.rsplit('.').next() == Some(simple) {
                return true;
            }
        }
        match arena.named_ref_text(data.type_ref) {
            Some(text) => text == simple || text.rsplit('.').next() == Some(simple),
            None => false,
        }
    })
}

/// Shape query on a field's declared type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldShape {
    Primitive(Primitive),
    /// Array; true when elements are themselves arrays or reference types,
    /// which switches hashing and comparison to the deep variants.
    Array { deep: bool },
    Reference,
}

pub fn field_shape(arena: &NodeArena, field: NodeIndex) -> FieldShape {
    let type_ref = match arena.get_variable(field) {
        Some(v) => v.type_ref,
        None => return FieldShape::Reference,
    };
    match arena.kind(type_ref) {
        Some(SyntaxKind::PrimitiveTypeRef) => match arena.get_primitive_ref(type_ref) {
            Some(p) => FieldShape::Primitive(p.primitive),
            None => FieldShape::Reference,
        },
        Some(SyntaxKind::ArrayTypeRef) => {
            let element = arena
                .get_array_ref(type_ref)
                .map(|a| a.element)
                .unwrap_or(NodeIndex::NONE);
            let deep = !matches!(arena.kind(element), Some(SyntaxKind::PrimitiveTypeRef));
            FieldShape::Array { deep }
        }
        _ => FieldShape::Reference,
    }
}

/// Source-language access level named by a constructor marker's `access`
/// option. `None` disables generation entirely.
pub fn parse_access_level(raw: &str) -> Option<NodeFlags> {
    let simple = raw.rsplit('.').next().unwrap_or(raw);
    match simple {
        "PUBLIC" | "MODULE" => Some(NodeFlags::PUBLIC),
        "PROTECTED" => Some(NodeFlags::PROTECTED),
        "PACKAGE" => Some(NodeFlags::empty()),
        "PRIVATE" => Some(NodeFlags::PRIVATE),
        "NONE" => None,
        _ => Some(NodeFlags::PUBLIC),
    }
}

#[cfg(test)]
mod tests {
    use graft_ast::UnitBuilder;

    use super::*;

    #[test]
    fn static_and_dollar_fields_are_not_instance_fields() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        let int_ty = b.primitive(Primitive::Int);
        let keep = b.field(class, "x", int_ty);
        let int_ty = b.primitive(Primitive::Int);
        let skipped = b.field(class, "counter", int_ty);
        b.modifiers(skipped, NodeFlags::STATIC);
        let int_ty = b.primitive(Primitive::Int);
        b.field(class, "$synthetic", int_ty);
        let (arena, _) = b.finish();

        assert_eq!(instance_fields(&arena, class), vec![keep]);
    }

    #[test]
    fn access_levels_map_to_flags() {
        assert_eq!(parse_access_level("AccessLevel.PRIVATE"), Some(NodeFlags::PRIVATE));
        assert_eq!(parse_access_level("PACKAGE"), Some(NodeFlags::empty()));
        assert_eq!(parse_access_level("AccessLevel.NONE"), None);
    }
}
