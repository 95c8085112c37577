//! Synthesis of generated tree fragments.
//!
//! Every node created here carries the span of the marker that caused it
//! and an entry in the arena's generated-by side table. Handlers build
//! fragments through [`Synth`], then splice them into declaration lists
//! with [`inject_field`] and [`inject_method`]; splices construct the new
//! child list fully before swapping it in.

use graft_ast::{
    BinaryOp, NodeArena, NodeIndex, NodeList, Primitive, SyntaxKind, UnaryOp,
};
use graft_ast::LiteralValue;
use graft_ast::NodeFlags;
use graft_common::Span;

/// Node factory bound to one provenance source. All products share the
/// source node's span so host diagnostics point at the marker.
pub struct Synth<'a> {
    pub arena: &'a mut NodeArena,
    source: NodeIndex,
    span: Span,
}

impl<'a> Synth<'a> {
    pub fn new(arena: &'a mut NodeArena, source: NodeIndex) -> Synth<'a> {
        let span = arena.get(source).map(|n| n.span).unwrap_or(Span::EMPTY);
        Synth {
            arena,
            source,
            span,
        }
    }

    pub fn source(&self) -> NodeIndex {
        self.source
    }

    fn mark(&mut self, node: NodeIndex) -> NodeIndex {
        self.arena.set_generated_by(node, self.source);
        node
    }

    pub fn add_flags(&mut self, node: NodeIndex, flags: NodeFlags) {
        if let Some(n) = self.arena.get_mut(node) {
            n.flags |= flags;
        }
    }

    // ---- type references ----

    pub fn named_ref(&mut self, dotted: &str) -> NodeIndex {
        let segments = dotted
            .split('.')
            .map(|s| self.arena.intern(s))
            .collect::<Vec<_>>();
        let node = self
            .arena
            .add_named_type_ref(segments, NodeList::new(), self.span);
        self.mark(node)
    }

    pub fn primitive(&mut self, primitive: Primitive) -> NodeIndex {
        let node = self.arena.add_primitive_type_ref(primitive, self.span);
        self.mark(node)
    }

    pub fn array_of(&mut self, element: NodeIndex) -> NodeIndex {
        let node = self.arena.add_array_type_ref(element, self.span);
        self.mark(node)
    }

    pub fn wildcard(&mut self) -> NodeIndex {
        let node = self.arena.add_wildcard_type_ref(self.span);
        self.mark(node)
    }

    // ---- expressions ----

    pub fn ident(&mut self, name: &str) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_identifier(atom, self.span);
        self.mark(node)
    }

    pub fn this_(&mut self) -> NodeIndex {
        let node = self.arena.add_this(self.span);
        self.mark(node)
    }

    pub fn super_(&mut self) -> NodeIndex {
        let node = self.arena.add_super(self.span);
        self.mark(node)
    }

    pub fn select(&mut self, base: NodeIndex, name: &str) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_select(base, atom, self.span);
        self.mark(node)
    }

    /// Build `a.b.c` from a dotted path, an identifier for the head and a
    /// select chain for the rest.
    pub fn dotted(&mut self, path: &str) -> NodeIndex {
        let mut parts = path.split('.');
        let head = match parts.next() {
            Some(h) => h,
            None => return NodeIndex::NONE,
        };
        let mut node = self.ident(head);
        for part in parts {
            node = self.select(node, part);
        }
        node
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        let node = self.arena.add_call(callee, NodeList::of(args), self.span);
        self.mark(node)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeIndex, rhs: NodeIndex) -> NodeIndex {
        let node = self.arena.add_binary(op, lhs, rhs, self.span);
        self.mark(node)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        let node = self.arena.add_unary(op, operand, self.span);
        self.mark(node)
    }

    pub fn conditional(
        &mut self,
        condition: NodeIndex,
        then_expr: NodeIndex,
        else_expr: NodeIndex,
    ) -> NodeIndex {
        let node = self
            .arena
            .add_conditional(condition, then_expr, else_expr, self.span);
        self.mark(node)
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        let node = self.arena.add_assign(target, value, self.span);
        self.mark(node)
    }

    pub fn cast(&mut self, type_ref: NodeIndex, expression: NodeIndex) -> NodeIndex {
        let node = self.arena.add_cast(type_ref, expression, self.span);
        self.mark(node)
    }

    pub fn instanceof(&mut self, expression: NodeIndex, type_ref: NodeIndex) -> NodeIndex {
        let node = self.arena.add_instanceof(expression, type_ref, self.span);
        self.mark(node)
    }

    pub fn new_(&mut self, type_ref: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        let node = self.arena.add_new(type_ref, NodeList::of(args), self.span);
        self.mark(node)
    }

    pub fn class_literal(&mut self, dotted: &str) -> NodeIndex {
        let type_ref = self.named_ref(dotted);
        let node = self.arena.add_class_literal(type_ref, self.span);
        self.mark(node)
    }

    pub fn lit_int(&mut self, value: i64) -> NodeIndex {
        let node = self.arena.add_literal(LiteralValue::Int(value), self.span);
        self.mark(node)
    }

    pub fn lit_bool(&mut self, value: bool) -> NodeIndex {
        let node = self.arena.add_literal(LiteralValue::Bool(value), self.span);
        self.mark(node)
    }

    pub fn lit_str(&mut self, value: &str) -> NodeIndex {
        let node = self
            .arena
            .add_literal(LiteralValue::Str(value.to_string()), self.span);
        self.mark(node)
    }

    pub fn lit_null(&mut self) -> NodeIndex {
        let node = self.arena.add_literal(LiteralValue::Null, self.span);
        self.mark(node)
    }

    // ---- statements ----

    pub fn block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        let node = self.arena.add_block(NodeList::of(statements), self.span);
        self.mark(node)
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    ) -> NodeIndex {
        let node = self
            .arena
            .add_if(condition, then_branch, else_branch, self.span);
        self.mark(node)
    }

    pub fn try_stmt(
        &mut self,
        block: NodeIndex,
        catches: Vec<NodeIndex>,
        finally_block: NodeIndex,
    ) -> NodeIndex {
        let node = self
            .arena
            .add_try(block, NodeList::of(catches), finally_block, self.span);
        self.mark(node)
    }

    pub fn catch_clause(&mut self, parameter: NodeIndex, block: NodeIndex) -> NodeIndex {
        let node = self.arena.add_catch(parameter, block, self.span);
        self.mark(node)
    }

    pub fn expr_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        let node = self.arena.add_expression_statement(expression, self.span);
        self.mark(node)
    }

    pub fn return_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        let node = self.arena.add_return(expression, self.span);
        self.mark(node)
    }

    pub fn throw_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        let node = self.arena.add_throw(expression, self.span);
        self.mark(node)
    }

    pub fn local(&mut self, name: &str, type_ref: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_local(atom, type_ref, initializer, self.span);
        self.mark(node)
    }

    // ---- members ----

    pub fn field(&mut self, name: &str, type_ref: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_field(atom, type_ref, initializer, self.span);
        self.mark(node)
    }

    /// Free-standing parameter, for catch clauses.
    pub fn parameter_decl(&mut self, name: &str, type_ref: NodeIndex) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_parameter(atom, type_ref, self.span);
        self.mark(node)
    }

    pub fn parameter(&mut self, method: NodeIndex, name: &str, type_ref: NodeIndex) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_parameter(atom, type_ref, self.span);
        self.mark(node);
        if let Some(data) = self.arena.get_method_mut(method) {
            data.parameters.push(node);
        }
        node
    }

    pub fn method(
        &mut self,
        name: &str,
        return_type: NodeIndex,
        body: NodeIndex,
        flags: NodeFlags,
    ) -> NodeIndex {
        let atom = self.arena.intern(name);
        let node = self.arena.add_method(atom, return_type, body, self.span);
        self.mark(node);
        if let Some(n) = self.arena.get_mut(node) {
            n.flags |= flags | NodeFlags::GENERATED;
        }
        node
    }

    /// Constructor member. The name slot carries the enclosing type's name.
    pub fn constructor(&mut self, type_name: &str, body: NodeIndex, flags: NodeFlags) -> NodeIndex {
        let node = self.method(type_name, NodeIndex::NONE, body, flags | NodeFlags::CONSTRUCTOR);
        node
    }

    pub fn thrown(&mut self, method: NodeIndex, type_ref: NodeIndex) {
        if let Some(data) = self.arena.get_method_mut(method) {
            data.thrown.push(type_ref);
        }
    }

    /// Marker-style annotation, optionally with one positional string
    /// argument, attached to nothing yet.
    pub fn annotation(&mut self, fqn: &str, positional: Option<&str>) -> NodeIndex {
        let type_ref = self.named_ref(fqn);
        let node = self.arena.add_annotation(type_ref, self.span);
        self.mark(node);
        let fqn_atom = self.arena.intern(fqn);
        if let Some(data) = self.arena.get_annotation_mut(node) {
            data.resolved_fqn = fqn_atom;
        }
        if let Some(text) = positional {
            let value = self.lit_str(text);
            let arg = self
                .arena
                .add_annotation_arg(graft_common::Atom::NONE, value, self.span);
            self.mark(arg);
            if let Some(data) = self.arena.get_annotation_mut(node) {
                data.args.push(arg);
            }
        }
        node
    }
}

/// Deep clone of a subtree, dispatched on node kind. Clones are marked as
/// generated by `source`. Structural declarations (units, types, imports)
/// are never cloned; asking for one is an engine bug and yields `NONE`.
pub fn clone_subtree(arena: &mut NodeArena, node: NodeIndex, source: NodeIndex) -> NodeIndex {
    if node.is_none() {
        return NodeIndex::NONE;
    }
    let Some(n) = arena.get(node) else {
        return NodeIndex::NONE;
    };
    let kind = n.kind;
    let span = n.span;
    let flags = n.flags;

    let clone = match kind {
        SyntaxKind::PrimitiveTypeRef => {
            let primitive = match arena.get_primitive_ref(node) {
                Some(d) => d.primitive,
                None => return NodeIndex::NONE,
            };
            arena.add_primitive_type_ref(primitive, span)
        }
        SyntaxKind::NamedTypeRef => {
            let (segments, type_args) = match arena.get_named_ref(node) {
                Some(d) => (d.segments.clone(), d.type_args.clone()),
                None => return NodeIndex::NONE,
            };
            let cloned_args = type_args
                .iter()
                .map(|a| clone_subtree(arena, a, source))
                .collect::<NodeList>();
            arena.add_named_type_ref(segments, cloned_args, span)
        }
        SyntaxKind::ArrayTypeRef => {
            let element = match arena.get_array_ref(node) {
                Some(d) => d.element,
                None => return NodeIndex::NONE,
            };
            let element = clone_subtree(arena, element, source);
            arena.add_array_type_ref(element, span)
        }
        SyntaxKind::WildcardTypeRef => arena.add_wildcard_type_ref(span),
        SyntaxKind::Annotation => {
            let (type_ref, args, resolved_fqn) = match arena.get_annotation(node) {
                Some(d) => (d.type_ref, d.args.clone(), d.resolved_fqn),
                None => return NodeIndex::NONE,
            };
            let type_ref = clone_subtree(arena, type_ref, source);
            let args = args
                .iter()
                .map(|a| clone_subtree(arena, a, source))
                .collect::<NodeList>();
            let clone = arena.add_annotation(type_ref, span);
            if let Some(data) = arena.get_annotation_mut(clone) {
                data.args = args;
                data.resolved_fqn = resolved_fqn;
            }
            clone
        }
        SyntaxKind::AnnotationArg => {
            let (name, value) = match arena.get_annotation_arg(node) {
                Some(d) => (d.name, d.value),
                None => return NodeIndex::NONE,
            };
            let value = clone_subtree(arena, value, source);
            arena.add_annotation_arg(name, value, span)
        }
        SyntaxKind::Identifier => {
            let name = match arena.get_identifier(node) {
                Some(d) => d.name,
                None => return NodeIndex::NONE,
            };
            arena.add_identifier(name, span)
        }
        SyntaxKind::Select => {
            let (base, name) = match arena.get_select(node) {
                Some(d) => (d.base, d.name),
                None => return NodeIndex::NONE,
            };
            let base = clone_subtree(arena, base, source);
            arena.add_select(base, name, span)
        }
        SyntaxKind::Literal => {
            let value = match arena.get_literal(node) {
                Some(d) => d.value.clone(),
                None => return NodeIndex::NONE,
            };
            arena.add_literal(value, span)
        }
        SyntaxKind::Binary => {
            let (op, lhs, rhs) = match arena.get_binary(node) {
                Some(d) => (d.op, d.lhs, d.rhs),
                None => return NodeIndex::NONE,
            };
            let lhs = clone_subtree(arena, lhs, source);
            let rhs = clone_subtree(arena, rhs, source);
            arena.add_binary(op, lhs, rhs, span)
        }
        SyntaxKind::Unary => {
            let (op, operand) = match arena.get_unary(node) {
                Some(d) => (d.op, d.operand),
                None => return NodeIndex::NONE,
            };
            let operand = clone_subtree(arena, operand, source);
            arena.add_unary(op, operand, span)
        }
        SyntaxKind::Conditional => {
            let (c, t, e) = match arena.get_conditional(node) {
                Some(d) => (d.condition, d.then_expr, d.else_expr),
                None => return NodeIndex::NONE,
            };
            let c = clone_subtree(arena, c, source);
            let t = clone_subtree(arena, t, source);
            let e = clone_subtree(arena, e, source);
            arena.add_conditional(c, t, e, span)
        }
        SyntaxKind::Call => {
            let (callee, args) = match arena.get_call(node) {
                Some(d) => (d.callee, d.args.clone()),
                None => return NodeIndex::NONE,
            };
            let callee = clone_subtree(arena, callee, source);
            let args = args
                .iter()
                .map(|a| clone_subtree(arena, a, source))
                .collect::<NodeList>();
            arena.add_call(callee, args, span)
        }
        SyntaxKind::New => {
            let (type_ref, args) = match arena.get_new(node) {
                Some(d) => (d.type_ref, d.args.clone()),
                None => return NodeIndex::NONE,
            };
            let type_ref = clone_subtree(arena, type_ref, source);
            let args = args
                .iter()
                .map(|a| clone_subtree(arena, a, source))
                .collect::<NodeList>();
            arena.add_new(type_ref, args, span)
        }
        SyntaxKind::InstanceOf => {
            let (expression, type_ref) = match arena.get_instanceof(node) {
                Some(d) => (d.expression, d.type_ref),
                None => return NodeIndex::NONE,
            };
            let expression = clone_subtree(arena, expression, source);
            let type_ref = clone_subtree(arena, type_ref, source);
            arena.add_instanceof(expression, type_ref, span)
        }
        SyntaxKind::Cast => {
            let (type_ref, expression) = match arena.get_cast(node) {
                Some(d) => (d.type_ref, d.expression),
                None => return NodeIndex::NONE,
            };
            let type_ref = clone_subtree(arena, type_ref, source);
            let expression = clone_subtree(arena, expression, source);
            arena.add_cast(type_ref, expression, span)
        }
        SyntaxKind::Assign => {
            let (target, value) = match arena.get_assign(node) {
                Some(d) => (d.target, d.value),
                None => return NodeIndex::NONE,
            };
            let target = clone_subtree(arena, target, source);
            let value = clone_subtree(arena, value, source);
            arena.add_assign(target, value, span)
        }
        SyntaxKind::ArrayLiteral => {
            let elements = match arena.get_array_literal(node) {
                Some(d) => d.elements.clone(),
                None => return NodeIndex::NONE,
            };
            let elements = elements
                .iter()
                .map(|e| clone_subtree(arena, e, source))
                .collect::<NodeList>();
            arena.add_array_literal(elements, span)
        }
        SyntaxKind::ClassLiteral => {
            let type_ref = match arena.get_class_literal(node) {
                Some(d) => d.type_ref,
                None => return NodeIndex::NONE,
            };
            let type_ref = clone_subtree(arena, type_ref, source);
            arena.add_class_literal(type_ref, span)
        }
        SyntaxKind::This => arena.add_this(span),
        SyntaxKind::Super => arena.add_super(span),
        SyntaxKind::Block => {
            let statements = match arena.get_block(node) {
                Some(d) => d.statements.clone(),
                None => return NodeIndex::NONE,
            };
            let statements = statements
                .iter()
                .map(|s| clone_subtree(arena, s, source))
                .collect::<NodeList>();
            arena.add_block(statements, span)
        }
        SyntaxKind::ExpressionStatement => {
            let expression = match arena.get_expr_stmt(node) {
                Some(d) => d.expression,
                None => return NodeIndex::NONE,
            };
            let expression = clone_subtree(arena, expression, source);
            arena.add_expression_statement(expression, span)
        }
        SyntaxKind::ReturnStatement => {
            let expression = match arena.get_return(node) {
                Some(d) => d.expression,
                None => return NodeIndex::NONE,
            };
            let expression = clone_subtree(arena, expression, source);
            arena.add_return(expression, span)
        }
        SyntaxKind::ThrowStatement => {
            let expression = match arena.get_throw(node) {
                Some(d) => d.expression,
                None => return NodeIndex::NONE,
            };
            let expression = clone_subtree(arena, expression, source);
            arena.add_throw(expression, span)
        }
        SyntaxKind::IfStatement => {
            let (c, t, e) = match arena.get_if(node) {
                Some(d) => (d.condition, d.then_branch, d.else_branch),
                None => return NodeIndex::NONE,
            };
            let c = clone_subtree(arena, c, source);
            let t = clone_subtree(arena, t, source);
            let e = clone_subtree(arena, e, source);
            arena.add_if(c, t, e, span)
        }
        SyntaxKind::TryStatement => {
            let (block, catches, finally_block) = match arena.get_try(node) {
                Some(d) => (d.block, d.catches.clone(), d.finally_block),
                None => return NodeIndex::NONE,
            };
            let block = clone_subtree(arena, block, source);
            let catches = catches
                .iter()
                .map(|c| clone_subtree(arena, c, source))
                .collect::<NodeList>();
            let finally_block = clone_subtree(arena, finally_block, source);
            arena.add_try(block, catches, finally_block, span)
        }
        SyntaxKind::CatchClause => {
            let (parameter, block) = match arena.get_catch(node) {
                Some(d) => (d.parameter, d.block),
                None => return NodeIndex::NONE,
            };
            let parameter = clone_subtree(arena, parameter, source);
            let block = clone_subtree(arena, block, source);
            arena.add_catch(parameter, block, span)
        }
        SyntaxKind::FieldDecl | SyntaxKind::Parameter | SyntaxKind::LocalDecl => {
            let (name, type_ref, initializer, annotations) = match arena.get_variable(node) {
                Some(d) => (d.name, d.type_ref, d.initializer, d.annotations.clone()),
                None => return NodeIndex::NONE,
            };
            let type_ref = clone_subtree(arena, type_ref, source);
            let initializer = clone_subtree(arena, initializer, source);
            let annotations = annotations
                .iter()
                .map(|a| clone_subtree(arena, a, source))
                .collect::<NodeList>();
            let clone = match kind {
                SyntaxKind::FieldDecl => arena.add_field(name, type_ref, initializer, span),
                SyntaxKind::Parameter => arena.add_parameter(name, type_ref, span),
                _ => arena.add_local(name, type_ref, initializer, span),
            };
            if let Some(data) = arena.get_variable_mut(clone) {
                data.annotations = annotations;
            }
            clone
        }
        _ => {
            tracing::warn!(?kind, "refusing to clone a structural declaration");
            return NodeIndex::NONE;
        }
    };

    if let Some(n) = arena.get_mut(clone) {
        n.flags = flags;
    }
    arena.set_generated_by(clone, source);
    clone
}

fn tag_suppress_warnings(arena: &mut NodeArena, member: NodeIndex, source: NodeIndex) {
    let mut synth = Synth::new(arena, source);
    let ann = synth.annotation("java.lang.SuppressWarnings", Some("all"));
    match arena.kind(member) {
        Some(SyntaxKind::FieldDecl) => {
            if let Some(data) = arena.get_variable_mut(member) {
                data.annotations.push(ann);
            }
        }
        Some(SyntaxKind::MethodDecl) => {
            if let Some(data) = arena.get_method_mut(member) {
                data.annotations.push(ann);
            }
        }
        _ => {}
    }
}

/// Insert a generated field before the first previously generated field,
/// keeping user-written fields ahead of all synthetic ones and synthetic
/// fields in generation order.
pub fn inject_field(
    arena: &mut NodeArena,
    type_decl: NodeIndex,
    field: NodeIndex,
    source: NodeIndex,
) {
    tag_suppress_warnings(arena, field, source);
    let Some(data) = arena.get_type_decl(type_decl) else {
        return;
    };
    let old = data.fields.clone();

    let mut rebuilt: Vec<NodeIndex> = Vec::with_capacity(old.len() + 1);
    let mut inserted = false;
    for existing in old.iter() {
        if !inserted && arena.is_generated(existing) {
            rebuilt.push(field);
            inserted = true;
        }
        rebuilt.push(existing);
    }
    if !inserted {
        rebuilt.push(field);
    }

    if let Some(data) = arena.get_type_decl_mut(type_decl) {
        data.fields = NodeList::of(rebuilt);
    }
}

/// Append a generated method. Injecting a constructor removes any default
/// constructor the host synthesized earlier; the replacement list is built
/// in full before the swap.
pub fn inject_method(
    arena: &mut NodeArena,
    type_decl: NodeIndex,
    method: NodeIndex,
    source: NodeIndex,
) {
    tag_suppress_warnings(arena, method, source);
    let injecting_constructor = arena.is_constructor(method);

    let Some(data) = arena.get_type_decl(type_decl) else {
        return;
    };
    let old = data.methods.clone();

    let mut rebuilt: Vec<NodeIndex> = Vec::with_capacity(old.len() + 1);
    for existing in old.iter() {
        if injecting_constructor
            && arena
                .flags(existing)
                .contains(NodeFlags::DEFAULT_CONSTRUCTOR)
        {
            continue;
        }
        rebuilt.push(existing);
    }
    rebuilt.push(method);

    if let Some(data) = arena.get_type_decl_mut(type_decl) {
        data.methods = NodeList::of(rebuilt);
    }
}

#[cfg(test)]
mod tests {
    use graft_ast::UnitBuilder;

    use super::*;

    #[test]
    fn clone_is_deep_and_marked_generated() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        let source = b.annotate(class, "graft.Cleanup");
        let callee = b.select("r.close");
        let call = b.call(callee, vec![]);
        let stmt = b.expr_stmt(call);
        let (mut arena, _) = b.finish();

        let clone = clone_subtree(&mut arena, stmt, source);
        assert_ne!(clone, stmt);
        assert!(arena.is_generated(clone));
        assert_eq!(arena.generated_by(clone), Some(source));

        let orig_expr = arena.get_expr_stmt(stmt).unwrap().expression;
        let clone_expr = arena.get_expr_stmt(clone).unwrap().expression;
        assert_ne!(orig_expr, clone_expr, "child was aliased, not cloned");
    }

    #[test]
    fn injected_field_lands_before_generated_peers() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        let source = b.annotate(class, "graft.EqualsAndHashCode");
        let int_ty = b.primitive(Primitive::Int);
        let user = b.field(class, "x", int_ty);
        let (mut arena, _) = b.finish();

        let mut synth = Synth::new(&mut arena, source);
        let ty = synth.primitive(Primitive::Long);
        let first = synth.field("$a", ty, NodeIndex::NONE);
        inject_field(&mut arena, class, first, source);

        let mut synth = Synth::new(&mut arena, source);
        let ty = synth.primitive(Primitive::Long);
        let second = synth.field("$b", ty, NodeIndex::NONE);
        inject_field(&mut arena, class, second, source);

        let fields: Vec<_> = arena.get_type_decl(class).unwrap().fields.iter().collect();
        // Each injection lands before the first generated peer, so the
        // user field stays put and later injections slot in ahead of
        // earlier ones.
        assert_eq!(fields, vec![user, second, first]);
    }

    #[test]
    fn constructor_injection_removes_default_constructor() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        let source = b.annotate(class, "graft.AllArgsConstructor");
        b.default_constructor(class);
        let (mut arena, _) = b.finish();

        let mut synth = Synth::new(&mut arena, source);
        let body = synth.block(vec![]);
        let ctor = synth.constructor("A", body, NodeFlags::PUBLIC);
        inject_method(&mut arena, class, ctor, source);

        let methods: Vec<_> = arena
            .get_type_decl(class)
            .unwrap()
            .methods
            .iter()
            .collect();
        assert_eq!(methods, vec![ctor]);
    }

    #[test]
    fn injected_members_carry_suppress_warnings() {
        let mut b = UnitBuilder::new("A.java", "p");
        let class = b.class("A");
        let source = b.annotate(class, "graft.AllArgsConstructor");
        let (mut arena, _) = b.finish();

        let mut synth = Synth::new(&mut arena, source);
        let body = synth.block(vec![]);
        let method = synth.method("hashCode", NodeIndex::NONE, body, NodeFlags::PUBLIC);
        inject_method(&mut arena, class, method, source);

        let anns = arena.get_method(method).unwrap().annotations.clone();
        assert_eq!(anns.len(), 1);
        let ann = anns.iter().next().unwrap();
        let fqn = arena.get_annotation(ann).unwrap().resolved_fqn;
        assert_eq!(arena.resolve_atom(fqn), "java.lang.SuppressWarnings");
    }
}
