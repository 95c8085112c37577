//! `graft.SneakyThrows`: rethrow checked exceptions without declaring them.
//!
//! The method body is wrapped in one try/catch per named exception type,
//! nested innermost-first so earlier names catch closest to the code. Each
//! catch rethrows through the runtime's unchecked bypass, which launders
//! the checked type past the verifier. A leading explicit `super(...)` or
//! `this(...)` delegation in a constructor must stay outside the try.

use graft_ast::{NodeIndex, NodeList, SyntaxKind};
use graft_common::{diagnostic_codes, Span};

use crate::dispatch::TransformContext;
use crate::registry::{Handler, HandlerError};
use crate::synth::Synth;
use crate::tree::{Kind, TreeId};
use crate::values::AnnotationValues;

const BYPASS_HELPER: &str = "graft.Graft.sneakyThrow";

pub struct HandleSneakyThrows;

impl Handler for HandleSneakyThrows {
    fn handle(
        &self,
        values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError> {
        let ann_node = cx.tree.node(site);
        let span = cx.arena.get(ann_node).map(|n| n.span).unwrap_or(Span::EMPTY);

        let host = cx.tree.parent(site);
        if host.map(|h| cx.tree.kind(h)) != Some(Some(Kind::Method)) {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@SneakyThrows is legal only on methods and constructors",
            );
            return Ok(());
        }
        let method = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);

        let body = cx
            .arena
            .get_method(method)
            .map(|m| m.body)
            .unwrap_or(NodeIndex::NONE);
        if body.is_none() {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@SneakyThrows can only be used on concrete methods",
            );
            return Ok(());
        }

        let statements: Vec<NodeIndex> = match cx.arena.get_block(body) {
            Some(b) => b.statements.iter().collect(),
            None => return Ok(()),
        };
        if statements.is_empty() {
            return Ok(());
        }

        let mut exceptions = values.string_list("value");
        if exceptions.is_empty() {
            exceptions.push("java.lang.Throwable".to_string());
        }

        // Constructors must run their delegation before anything else; the
        // verifier rejects a super() inside a try.
        let split = if cx.arena.is_constructor(method)
            && is_delegation_call(cx.arena, statements[0])
        {
            1
        } else {
            0
        };
        let (prefix, wrapped) = statements.split_at(split);
        if wrapped.is_empty() {
            return Ok(());
        }

        let mut s = Synth::new(cx.arena, ann_node);
        let mut current = s.block(wrapped.to_vec());
        for exception in &exceptions {
            let catch = bypass_catch(&mut s, exception);
            let guarded = s.try_stmt(current, vec![catch], NodeIndex::NONE);
            current = s.block(vec![guarded]);
        }

        let inner: Vec<NodeIndex> = match cx.arena.get_block(current) {
            Some(b) => b.statements.iter().collect(),
            None => vec![current],
        };
        let mut rebuilt: Vec<NodeIndex> = prefix.to_vec();
        rebuilt.extend(inner);
        if let Some(b) = cx.arena.get_block_mut(body) {
            b.statements = NodeList::of(rebuilt);
        }

        cx.resync();
        Ok(())
    }
}

/// `catch (final ExceptionType $ex) { throw graft.Graft.sneakyThrow($ex); }`
fn bypass_catch(s: &mut Synth<'_>, exception: &str) -> NodeIndex {
    let ex_ty = s.named_ref(exception);
    let param = s.parameter_decl("$ex", ex_ty);
    s.add_flags(param, graft_ast::NodeFlags::FINAL);
    let callee = s.dotted(BYPASS_HELPER);
    let ex_ref = s.ident("$ex");
    let laundered = s.call(callee, vec![ex_ref]);
    let rethrow = s.throw_stmt(laundered);
    let block = s.block(vec![rethrow]);
    s.catch_clause(param, block)
}

/// First-statement `super(...)` or `this(...)` in a constructor body.
fn is_delegation_call(arena: &graft_ast::NodeArena, stmt: NodeIndex) -> bool {
    let Some(SyntaxKind::ExpressionStatement) = arena.kind(stmt) else {
        return false;
    };
    let Some(expr) = arena.get_expr_stmt(stmt).map(|e| e.expression) else {
        return false;
    };
    let Some(SyntaxKind::Call) = arena.kind(expr) else {
        return false;
    };
    let Some(callee) = arena.get_call(expr).map(|c| c.callee) else {
        return false;
    };
    matches!(arena.kind(callee), Some(SyntaxKind::Super | SyntaxKind::This))
}
