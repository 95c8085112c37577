//! `graft.Cleanup`: guaranteed resource cleanup for a local variable.
//!
//! Every statement following the annotated declaration in its block is
//! moved into a `try` whose `finally` invokes the cleanup method behind a
//! guard: an instanceof test against the standard closeable contract for
//! the implicit `close`, a null check for an explicitly named method. The
//! surrounding block's statement list is rebuilt in full before being
//! swapped in.

use graft_ast::{BinaryOp, NodeArena, NodeIndex, NodeList, SyntaxKind};
use graft_common::{diagnostic_codes, Span};

use crate::dispatch::TransformContext;
use crate::registry::{Handler, HandlerError};
use crate::synth::Synth;
use crate::tree::{Kind, TreeId};
use crate::values::AnnotationValues;

pub struct HandleCleanup;

impl Handler for HandleCleanup {
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
        if !matches!(host_kind, Some(Kind::Local | Kind::Argument)) {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@Cleanup is legal only on local variable declarations",
            );
            return Ok(());
        }
        let on_argument = host_kind == Some(Kind::Argument);
        let local = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);

        let cleanup_name = values.str_value("value");
        if cleanup_name.is_empty() {
            cx.error(
                values.span_of("value").unwrap_or(span),
                diagnostic_codes::BAD_OPTIONS,
                "cleanup method name cannot be the empty string",
            );
            return Ok(());
        }
        let quietly = values.bool_value("quietly");
        // The implicit `close` carries a Closeable contract; a written
        // method name only promises the call itself is safe on non-null.
        let default_close = cleanup_name == "close" && !values.is_explicit("value");

        let (has_initializer, name) = match cx.arena.get_variable(local) {
            Some(v) => (v.initializer.is_some(), v.name),
            None => return Ok(()),
        };
        // A method argument is in scope and initialized by the caller; the
        // local form must bind its resource at the declaration.
        if !on_argument && !has_initializer {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@Cleanup variable declarations need to be initialized",
            );
            return Ok(());
        }
        if name.is_none() {
            return Ok(());
        }
        let var_name = cx.arena.resolve_atom(name).to_string();

        let Some(method) = cx
            .tree
            .find(local)
            .and_then(|id| cx.tree.ancestor_of_kind(id, Kind::Method))
            .map(|id| cx.tree.node(id))
        else {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@Cleanup is legal only on local variable declarations inside a method",
            );
            return Ok(());
        };
        let body = cx
            .arena
            .get_method(method)
            .map(|m| m.body)
            .unwrap_or(NodeIndex::NONE);
        // The argument form guards the whole body; the local form guards
        // everything after its declaration statement.
        let (block, kept, following) = if on_argument {
            let statements: Vec<NodeIndex> = match cx.arena.get_block(body) {
                Some(b) => b.statements.iter().collect(),
                None => return Ok(()),
            };
            (body, Vec::new(), statements)
        } else {
            let Some(block) = find_owning_block(cx.arena, body, local) else {
                return Ok(());
            };
            let statements: Vec<NodeIndex> = match cx.arena.get_block(block) {
                Some(b) => b.statements.iter().collect(),
                None => return Ok(()),
            };
            let Some(position) = statements.iter().position(|&s| s == local) else {
                return Ok(());
            };
            let following = statements[position + 1..].to_vec();
            (block, statements[..=position].to_vec(), following)
        };

        for &stmt in &following {
            warn_on_reassignment(cx, stmt, &var_name);
        }

        let mut s = Synth::new(cx.arena, ann_node);
        let try_block = s.block(following.clone());
        let finally_block =
            build_cleanup_block(&mut s, &var_name, &cleanup_name, quietly, default_close);
        let guarded = s.try_stmt(try_block, vec![], finally_block);

        let mut rebuilt = kept;
        rebuilt.push(guarded);
        if let Some(b) = cx.arena.get_block_mut(block) {
            b.statements = NodeList::of(rebuilt);
        }

        cx.resync();
        Ok(())
    }
}

/// The finally body. The implicit default cleanup is typed through the
/// standard contract: `if (var instanceof java.io.Closeable)
/// ((java.io.Closeable) var).close();` (instanceof is false for null, so
/// no separate null guard). An explicitly named method cannot assume that
/// contract and gets `if (var != null) var.<name>();` instead. With
/// `quietly`, only the invocation is wrapped in a swallowing catch.
fn build_cleanup_block(
    s: &mut Synth<'_>,
    var_name: &str,
    cleanup_name: &str,
    quietly: bool,
    default_close: bool,
) -> NodeIndex {
    let receiver = if default_close {
        let closeable = s.named_ref("java.io.Closeable");
        let var_ref = s.ident(var_name);
        s.cast(closeable, var_ref)
    } else {
        s.ident(var_name)
    };
    let callee = s.select(receiver, cleanup_name);
    let call = s.call(callee, vec![]);
    let invoke = s.expr_stmt(call);

    let body = if quietly {
        let inner = s.block(vec![invoke]);
        let ex_ty = s.named_ref("java.io.IOException");
        let param = s.parameter_decl("$ex", ex_ty);
        let empty = s.block(vec![]);
        let catch = s.catch_clause(param, empty);
        let swallowed = s.try_stmt(inner, vec![catch], NodeIndex::NONE);
        s.block(vec![swallowed])
    } else {
        s.block(vec![invoke])
    };

    let guard = if default_close {
        let var_ref = s.ident(var_name);
        let closeable = s.named_ref("java.io.Closeable");
        s.instanceof(var_ref, closeable)
    } else {
        let var_ref = s.ident(var_name);
        let null = s.lit_null();
        s.binary(BinaryOp::Ne, var_ref, null)
    };
    let guarded = s.if_stmt(guard, body, NodeIndex::NONE);
    s.block(vec![guarded])
}

/// Depth-first search for the block whose statement list directly contains
/// the annotated local.
fn find_owning_block(arena: &NodeArena, block: NodeIndex, local: NodeIndex) -> Option<NodeIndex> {
    if !matches!(
        arena.kind(block),
        Some(SyntaxKind::Block | SyntaxKind::InitializerBlock)
    ) {
        return None;
    }
    let statements: Vec<NodeIndex> = arena.get_block(block)?.statements.iter().collect();
    if statements.contains(&local) {
        return Some(block);
    }
    for stmt in statements {
        for child in arena.children_of(stmt) {
            if let Some(found) = find_owning_block(arena, child, local) {
                return Some(found);
            }
        }
        if let Some(found) = find_owning_block(arena, stmt, local) {
            return Some(found);
        }
    }
    None
}

/// Reassigning a managed resource makes the cleanup run against the wrong
/// object; flag every write to the variable in the guarded region.
fn warn_on_reassignment(cx: &mut TransformContext<'_>, root: NodeIndex, var_name: &str) {
    let mut pending = vec![root];
    let mut offenders: Vec<Span> = Vec::new();
    while let Some(node) = pending.pop() {
        if cx.arena.kind(node) == Some(SyntaxKind::Assign) {
            if let Some(assign) = cx.arena.get_assign(node) {
                let target = assign.target;
                if cx.arena.kind(target) == Some(SyntaxKind::Identifier) {
                    if let Some(ident) = cx.arena.get_identifier(target) {
                        if ident.name.is_some() && cx.arena.resolve_atom(ident.name) == var_name {
                            let span = cx
                                .arena
                                .get(node)
                                .map(|n| n.span)
                                .unwrap_or(Span::EMPTY);
                            offenders.push(span);
                        }
                    }
                }
            }
        }
        pending.extend(cx.arena.children_of(node));
    }
    for span in offenders {
        cx.warning(
            span,
            diagnostic_codes::BAD_OPTIONS,
            "assigning a cleanup-managed variable to something else is a bad idea",
        );
    }
}
