//! Traversal and handler dispatch.
//!
//! The engine owns per-unit bookkeeping keyed by file name: which
//! annotation sites have already been handled, which types asked for
//! default-member suppression, and the diagnostics accumulated since the
//! last run. A unit may be transformed several times as the host re-parses
//! it; the handled set is what makes repeat runs idempotent. State lives
//! until the host signals the unit is done via [`TransformEngine::finish_unit`].
//!
//! A faulty handler never takes down the traversal. Faults, both returned
//! errors and panics, are caught at the dispatch boundary, logged, and
//! surfaced as diagnostics on the site that caused them.

use std::panic::{self, AssertUnwindSafe};

use dashmap::DashMap;
use graft_ast::{NodeArena, NodeIndex, ParseState};
use graft_common::{diagnostic_codes, Diagnostic, DiagnosticCategory, Span};
use rustc_hash::FxHashSet;
use tracing::{debug, error};

use crate::registry::{builtin_registry, HandlerRegistry, Registration};
use crate::resolver::resolve_marker;
use crate::tree::{Kind, TreeId, UnitTree};
use crate::values;

/// Everything a handler may touch while running. Borrows are scoped to a
/// single handler invocation; the dispatcher re-synchronizes the wrapper
/// tree afterwards.
pub struct TransformContext<'a> {
    pub arena: &'a mut NodeArena,
    pub tree: &'a mut UnitTree,
    pub unit: NodeIndex,
    pub file_name: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
    suppressed_defaults: &'a mut FxHashSet<NodeIndex>,
}

impl TransformContext<'_> {
    pub fn error(&mut self, span: Span, code: u32, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(self.file_name, span, message, code));
    }

    pub fn warning(&mut self, span: Span, code: u32, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(self.file_name, span, message, code));
    }

    pub fn message(&mut self, span: Span, code: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            category: DiagnosticCategory::Message,
            code,
            file: self.file_name.to_string(),
            start: span.start,
            length: span.len(),
            message_text: message.into(),
        });
    }

    /// Re-synchronize the wrapper tree after structural surgery, so that
    /// later lookups within the same handler see the new shape.
    pub fn resync(&mut self) {
        self.tree.rebuild(self.arena, self.unit);
    }

    /// Ask the host not to synthesize default members (the implicit
    /// no-argument constructor) for this type.
    pub fn suppress_default_members(&mut self, type_decl: NodeIndex) {
        self.suppressed_defaults.insert(type_decl);
    }

    pub fn defaults_suppressed(&self, type_decl: NodeIndex) -> bool {
        self.suppressed_defaults.contains(&type_decl)
    }
}

#[derive(Default)]
struct UnitState {
    handled: FxHashSet<NodeIndex>,
    suppressed_defaults: FxHashSet<NodeIndex>,
    diagnostics: Vec<Diagnostic>,
}

/// Which annotation sites a pass considers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pass {
    /// Every marker except the diagnostic one, so generated members exist
    /// before anything prints the tree.
    Primary,
    /// The diagnostic marker only, after all structural work.
    Diagnostic,
    /// Member-synthesis markers for one type, driven by the host's
    /// build-members callback.
    BuildMembers(NodeIndex),
}

pub struct TransformEngine {
    registry: &'static HandlerRegistry,
    units: DashMap<String, UnitState>,
}

impl Default for TransformEngine {
    fn default() -> TransformEngine {
        TransformEngine::new()
    }
}

impl TransformEngine {
    pub fn new() -> TransformEngine {
        TransformEngine::with_registry(builtin_registry())
    }

    pub fn with_registry(registry: &'static HandlerRegistry) -> TransformEngine {
        TransformEngine {
            registry,
            units: DashMap::new(),
        }
    }

    /// Transform one compilation unit. Runs registered visitors, then the
    /// primary annotation pass, then the diagnostic pass. Returns the
    /// diagnostics accumulated by this run.
    pub fn run_on(&self, arena: &mut NodeArena, unit: NodeIndex) -> Vec<Diagnostic> {
        let Some(file_name) = arena.get_unit(unit).map(|u| u.file_name.clone()) else {
            error!("run_on called with a non-unit node");
            return Vec::new();
        };
        debug!(file = %file_name, state = ?arena.parse_state(), "transforming unit");

        // State is taken out of the map for the duration of the run so no
        // map entry lock is held across handler calls.
        let mut state = self
            .units
            .remove(&file_name)
            .map(|(_, s)| s)
            .unwrap_or_default();
        let mut tree = UnitTree::build(arena, unit);

        for visitor in self.registry.visitors() {
            let mut cx = TransformContext {
                arena,
                tree: &mut tree,
                unit,
                file_name: &file_name,
                diagnostics: &mut state.diagnostics,
                suppressed_defaults: &mut state.suppressed_defaults,
            };
            let name = visitor.name();
            if panic::catch_unwind(AssertUnwindSafe(|| visitor.visit(&mut cx))).is_err() {
                error!(visitor = name, "visitor panicked, continuing traversal");
            }
            tree.rebuild(arena, unit);
        }

        self.annotation_pass(arena, unit, &file_name, &mut tree, &mut state, Pass::Primary);
        self.annotation_pass(
            arena,
            unit,
            &file_name,
            &mut tree,
            &mut state,
            Pass::Diagnostic,
        );

        let out = std::mem::take(&mut state.diagnostics);
        self.units.insert(file_name, state);
        out
    }

    /// Host callback: a type's field and method lists are being built.
    /// Runs only the handlers that deferred until this point, scoped to
    /// annotations on the given type.
    pub fn run_on_build_members(
        &self,
        arena: &mut NodeArena,
        unit: NodeIndex,
        type_decl: NodeIndex,
    ) -> Vec<Diagnostic> {
        let Some(file_name) = arena.get_unit(unit).map(|u| u.file_name.clone()) else {
            error!("run_on_build_members called with a non-unit node");
            return Vec::new();
        };
        let mut state = self
            .units
            .remove(&file_name)
            .map(|(_, s)| s)
            .unwrap_or_default();
        let mut tree = UnitTree::build(arena, unit);

        self.annotation_pass(
            arena,
            unit,
            &file_name,
            &mut tree,
            &mut state,
            Pass::BuildMembers(type_decl),
        );

        let out = std::mem::take(&mut state.diagnostics);
        self.units.insert(file_name, state);
        out
    }

    /// Whether default-member synthesis was suppressed for a type.
    /// Consulted by hosts before generating the implicit constructor.
    pub fn defaults_suppressed(&self, file_name: &str, type_decl: NodeIndex) -> bool {
        self.units
            .get(file_name)
            .is_some_and(|s| s.suppressed_defaults.contains(&type_decl))
    }

    /// The host is done with a unit; drop its bookkeeping.
    pub fn finish_unit(&self, file_name: &str) {
        self.units.remove(file_name);
    }

    pub fn pending_units(&self) -> usize {
        self.units.len()
    }

    fn annotation_pass(
        &self,
        arena: &mut NodeArena,
        unit: NodeIndex,
        file_name: &str,
        tree: &mut UnitTree,
        state: &mut UnitState,
        pass: Pass,
    ) {
        // Snapshot the sites up front; arena indexes stay valid across
        // surgery even when wrapper ids do not.
        let sites: Vec<NodeIndex> = tree
            .walk()
            .into_iter()
            .filter(|&id| tree.kind(id) == Some(Kind::Annotation))
            .map(|id| tree.node(id))
            .collect();

        for site in sites {
            // A site unlinked by earlier surgery in this pass is gone.
            let Some(id) = tree.find(site) else {
                continue;
            };
            let Some(marker) = resolve_marker(arena, unit, site, self.registry.library()) else {
                continue;
            };
            let Some(registration) = self.registry.lookup(marker) else {
                continue;
            };
            match pass {
                Pass::Primary if marker.is_diagnostic() => continue,
                Pass::Diagnostic if !marker.is_diagnostic() => continue,
                Pass::BuildMembers(type_decl) => {
                    if !registration.flags.defer_until_build_members {
                        continue;
                    }
                    let host = tree
                        .ancestor_of_kind(id, Kind::Type)
                        .map(|t| tree.node(t))
                        .unwrap_or(NodeIndex::NONE);
                    if host != type_decl {
                        continue;
                    }
                }
                _ => {}
            }

            let outline = arena.parse_state() == ParseState::Outline;
            if !matches!(pass, Pass::BuildMembers(_)) && registration.flags.defer_until_build_members
            {
                // Not this entry point's job; give the handler an early
                // look during outline parsing so it can influence the host
                // before members exist.
                if outline && !state.handled.contains(&site) {
                    self.pre_handle(arena, unit, file_name, tree, state, site, registration);
                }
                continue;
            }
            if registration.flags.defer_until_post_diet && outline {
                // Full handling waits for method bodies; the handler still
                // gets a lightweight early look at the outline.
                if !state.handled.contains(&site) {
                    self.pre_handle(arena, unit, file_name, tree, state, site, registration);
                }
                continue;
            }

            // Handled is set first: a site is consumed exactly once even
            // when its handler faults.
            if !state.handled.insert(site) {
                continue;
            }

            let values = match values::decode(arena, site, marker.schema()) {
                Ok(v) => v,
                Err(e) => {
                    state.diagnostics.push(Diagnostic::error(
                        file_name,
                        e.span,
                        format!("{marker}: {e}"),
                        diagnostic_codes::VALUE_DECODE,
                    ));
                    continue;
                }
            };

            let mut cx = TransformContext {
                arena,
                tree,
                unit,
                file_name,
                diagnostics: &mut state.diagnostics,
                suppressed_defaults: &mut state.suppressed_defaults,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                registration.handler.handle(&values, id, &mut cx)
            }));
            let span = arena.get(site).map(|n| n.span).unwrap_or(Span::EMPTY);
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(fault)) => {
                    error!(%marker, %fault, "handler failed");
                    state.diagnostics.push(Diagnostic::error(
                        file_name,
                        span,
                        format!("{marker}: {fault}"),
                        diagnostic_codes::HANDLER_FAULT,
                    ));
                }
                Err(_) => {
                    error!(%marker, "handler panicked, continuing traversal");
                    state.diagnostics.push(Diagnostic::error(
                        file_name,
                        span,
                        format!("{marker}: internal handler fault"),
                        diagnostic_codes::HANDLER_FAULT,
                    ));
                }
            }
            tree.rebuild(arena, unit);
        }
    }

    fn pre_handle(
        &self,
        arena: &mut NodeArena,
        unit: NodeIndex,
        file_name: &str,
        tree: &mut UnitTree,
        state: &mut UnitState,
        site: NodeIndex,
        registration: &Registration,
    ) {
        // Decode problems are reported by the real handling later, not here.
        let Ok(values) = values::decode(arena, site, registration.marker.schema()) else {
            return;
        };
        let Some(id) = tree.find(site) else {
            return;
        };
        let mut cx = TransformContext {
            arena,
            tree,
            unit,
            file_name,
            diagnostics: &mut state.diagnostics,
            suppressed_defaults: &mut state.suppressed_defaults,
        };
        if panic::catch_unwind(AssertUnwindSafe(|| {
            registration.handler.pre_handle(&values, id, &mut cx)
        }))
        .is_err()
        {
            error!(marker = %registration.marker, "pre-handle panicked, continuing");
        }
    }
}

/// Convenience: the annotation site's host declaration, the node the
/// marker decorates.
pub fn annotated_host(tree: &UnitTree, site: TreeId) -> Option<TreeId> {
    tree.parent(site)
}

#[cfg(test)]
mod tests {
    use graft_ast::UnitBuilder;
    use once_cell::sync::Lazy;

    use super::*;
    use crate::registry::{
        Handler, HandlerError, HandlerRegistry, MarkerKind, SchedulingFlags, TreeVisitor,
    };
    use crate::values::AnnotationValues;

    struct PanickyHandler;

    impl Handler for PanickyHandler {
        fn handle(
            &self,
            _values: &AnnotationValues,
            _site: TreeId,
            _cx: &mut TransformContext<'_>,
        ) -> Result<(), HandlerError> {
            panic!("boom");
        }
    }

    static PANICKY: Lazy<HandlerRegistry> = Lazy::new(|| {
        HandlerRegistry::discover(
            vec![Registration {
                marker: MarkerKind::Cleanup,
                flags: SchedulingFlags::default(),
                handler: Box::new(PanickyHandler),
            }],
            Vec::new(),
        )
    });

    struct EarlyLookHandler;

    impl Handler for EarlyLookHandler {
        fn pre_handle(
            &self,
            _values: &AnnotationValues,
            _site: TreeId,
            cx: &mut TransformContext<'_>,
        ) {
            cx.message(Span::EMPTY, 0, "early look");
        }

        fn handle(
            &self,
            _values: &AnnotationValues,
            _site: TreeId,
            cx: &mut TransformContext<'_>,
        ) -> Result<(), HandlerError> {
            cx.message(Span::EMPTY, 0, "full handling");
            Ok(())
        }
    }

    static POST_DIET: Lazy<HandlerRegistry> = Lazy::new(|| {
        HandlerRegistry::discover(
            vec![Registration {
                marker: MarkerKind::Cleanup,
                flags: SchedulingFlags {
                    defer_until_post_diet: true,
                    ..Default::default()
                },
                handler: Box::new(EarlyLookHandler),
            }],
            Vec::new(),
        )
    });

    #[test]
    fn deferred_handler_gets_a_pre_pass_during_outline() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        b.annotate(class, "graft.Cleanup");
        let b = b.outline_parse();
        let (mut arena, unit) = b.finish();

        let engine = TransformEngine::with_registry(&POST_DIET);
        let outline_problems = engine.run_on(&mut arena, unit);
        let texts: Vec<&str> = outline_problems
            .iter()
            .map(|d| d.message_text.as_str())
            .collect();
        assert_eq!(texts, vec!["early look"]);

        arena.set_parse_state(ParseState::Full);
        let full_problems = engine.run_on(&mut arena, unit);
        let texts: Vec<&str> = full_problems
            .iter()
            .map(|d| d.message_text.as_str())
            .collect();
        assert_eq!(texts, vec!["full handling"]);
    }

    struct CountingVisitor;

    impl TreeVisitor for CountingVisitor {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn visit(&self, cx: &mut TransformContext<'_>) {
            let count = cx.tree.len();
            cx.message(Span::EMPTY, 0, format!("visited {count} wrappers"));
        }
    }

    static WITH_VISITOR: Lazy<HandlerRegistry> =
        Lazy::new(|| HandlerRegistry::discover(Vec::new(), vec![Box::new(CountingVisitor)]));

    #[test]
    fn visitors_run_before_the_annotation_passes() {
        let mut b = UnitBuilder::new("A.java", "p");
        b.class("A");
        let (mut arena, unit) = b.finish();

        let engine = TransformEngine::with_registry(&WITH_VISITOR);
        let problems = engine.run_on(&mut arena, unit);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message_text.starts_with("visited "));
    }

    #[test]
    fn panicking_handler_becomes_a_diagnostic() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        b.annotate(class, "graft.Cleanup");
        let (mut arena, unit) = b.finish();

        let engine = TransformEngine::with_registry(&PANICKY);
        let problems = engine.run_on(&mut arena, unit);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].code, diagnostic_codes::HANDLER_FAULT);
    }

    #[test]
    fn sites_are_consumed_exactly_once() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        b.annotate(class, "graft.Cleanup");
        let (mut arena, unit) = b.finish();

        let engine = TransformEngine::with_registry(&PANICKY);
        let first = engine.run_on(&mut arena, unit);
        let second = engine.run_on(&mut arena, unit);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty(), "second run must not re-handle the site");
    }

    #[test]
    fn finish_unit_forgets_handled_sites() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        b.annotate(class, "graft.Cleanup");
        let (mut arena, unit) = b.finish();

        let engine = TransformEngine::with_registry(&PANICKY);
        engine.run_on(&mut arena, unit);
        assert_eq!(engine.pending_units(), 1);
        engine.finish_unit("A.java");
        assert_eq!(engine.pending_units(), 0);

        let again = engine.run_on(&mut arena, unit);
        assert_eq!(again.len(), 1, "fresh state handles the site anew");
    }
}
