//! Written-name resolution for annotation sites.
//!
//! During outline passes the host has not bound type references yet, so a
//! marker must be recognized from its written text plus the unit's import
//! table. The heuristic deliberately mirrors source-language scoping
//! without consulting a classpath:
//!
//! 1. a host-resolved binding on the annotation node wins outright;
//! 2. a fully-qualified written name matches exactly or not at all;
//! 3. an explicit single-type import binds the simple name, even when it
//!    binds it to something that is not a marker;
//! 4. a marker living in the unit's own package matches unqualified use;
//! 5. wildcard imports are tried in source order, first hit wins.

use graft_ast::{NodeArena, NodeIndex};

use crate::registry::{MarkerKind, TypeLibrary};

/// Resolve the marker named by `annotation` within `unit`, or `None` when
/// the written name does not denote a known marker.
pub fn resolve_marker(
    arena: &NodeArena,
    unit: NodeIndex,
    annotation: NodeIndex,
    library: &TypeLibrary,
) -> Option<MarkerKind> {
    let ann = arena.get_annotation(annotation)?;

    if ann.resolved_fqn.is_some() {
        let fqn = arena.resolve_atom(ann.resolved_fqn);
        return if library.contains(fqn) {
            MarkerKind::from_fqn(fqn)
        } else {
            None
        };
    }

    let written = arena.named_ref_text(ann.type_ref)?;
    if written.contains('.') {
        return if library.contains(&written) {
            MarkerKind::from_fqn(&written)
        } else {
            None
        };
    }

    let candidates = library.candidates_for_simple(&written);
    if candidates.is_empty() {
        return None;
    }

    let unit_data = arena.get_unit(unit)?;
    let suffix = format!(".{written}");

    // Explicit imports bind the simple name exclusively: a non-marker
    // explicit import shadows every other candidate.
    for import in unit_data.imports.iter() {
        let Some(data) = arena.get_import(import) else {
            continue;
        };
        if data.wildcard || data.qualified.is_none() {
            continue;
        }
        let qualified = arena.resolve_atom(data.qualified);
        if qualified.ends_with(&suffix) {
            return candidates
                .iter()
                .find(|&&fqn| fqn == qualified)
                .and_then(|&fqn| MarkerKind::from_fqn(fqn));
        }
    }

    if unit_data.package_name.is_some() {
        let package = arena.resolve_atom(unit_data.package_name);
        let local = format!("{package}.{written}");
        if let Some(&fqn) = candidates.iter().find(|&&fqn| fqn == local) {
            return MarkerKind::from_fqn(fqn);
        }
    }

    for import in unit_data.imports.iter() {
        let Some(data) = arena.get_import(import) else {
            continue;
        };
        if !data.wildcard || data.qualified.is_none() {
            continue;
        }
        let prefix = arena.resolve_atom(data.qualified);
        let expanded = format!("{prefix}.{written}");
        if let Some(&fqn) = candidates.iter().find(|&&fqn| fqn == expanded) {
            return MarkerKind::from_fqn(fqn);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use graft_ast::UnitBuilder;

    use super::*;
    use crate::registry::builtin_registry;

    #[test]
    fn qualified_written_name_matches_exactly() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        let class = b.class("A");
        b.annotate(class, "graft.Cleanup");
        let (arena, unit) = b.finish();
        let ann = arena.get_type_decl(class).unwrap().annotations.iter().next().unwrap();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            Some(MarkerKind::Cleanup),
        );
    }

    #[test]
    fn simple_name_needs_an_import() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        let class = b.class("A");
        b.annotate(class, "Cleanup");
        let (arena, unit) = b.finish();
        let ann = arena.get_type_decl(class).unwrap().annotations.iter().next().unwrap();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            None,
        );
    }

    #[test]
    fn explicit_import_binds_simple_name() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        b.import("graft.Cleanup", false);
        let class = b.class("A");
        b.annotate(class, "Cleanup");
        let (arena, unit) = b.finish();
        let ann = arena.get_type_decl(class).unwrap().annotations.iter().next().unwrap();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            Some(MarkerKind::Cleanup),
        );
    }

    #[test]
    fn foreign_explicit_import_shadows_wildcard() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        b.import("com.acme.Cleanup", false);
        b.import("graft", true);
        let class = b.class("A");
        b.annotate(class, "Cleanup");
        let (arena, unit) = b.finish();
        let ann = arena.get_type_decl(class).unwrap().annotations.iter().next().unwrap();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            None,
        );
    }

    #[test]
    fn wildcard_import_resolves_in_source_order() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        b.import("graft", true);
        let class = b.class("A");
        b.annotate(class, "SneakyThrows");
        let (arena, unit) = b.finish();
        let ann = arena.get_type_decl(class).unwrap().annotations.iter().next().unwrap();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            Some(MarkerKind::SneakyThrows),
        );
    }

    #[test]
    fn host_resolved_binding_bypasses_imports() {
        let mut b = UnitBuilder::new("A.java", "com.example");
        let class = b.class("A");
        let ann = b.annotate(class, "Whatever");
        b.resolve_annotation(ann, "graft.PrintTree");
        let (arena, unit) = b.finish();
        assert_eq!(
            resolve_marker(&arena, unit, ann, builtin_registry().library()),
            Some(MarkerKind::PrintTree),
        );
    }
}
