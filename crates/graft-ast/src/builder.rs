//! Convenience layer for assembling compilation units.
//!
//! The host's parser is out of scope here; hosts (and our own tests) build
//! units through this API instead. Spans are synthesized as a monotonically
//! increasing cursor so every node gets a distinct, ordered location.

use graft_common::{Atom, Span};

use crate::arena::{NodeArena, ParseState};
use crate::node::*;
use crate::node_flags::NodeFlags;

pub struct UnitBuilder {
    arena: NodeArena,
    unit: NodeIndex,
    cursor: u32,
}

impl UnitBuilder {
    pub fn new(file_name: &str, package_name: &str) -> UnitBuilder {
        let mut arena = NodeArena::new();
        let package = if package_name.is_empty() {
            Atom::NONE
        } else {
            arena.intern(package_name)
        };
        let unit = arena.add_compilation_unit(file_name, package, Span::EMPTY);
        UnitBuilder {
            arena,
            unit,
            cursor: 0,
        }
    }

    pub fn unit(&self) -> NodeIndex {
        self.unit
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn finish(mut self) -> (NodeArena, NodeIndex) {
        let end = self.cursor;
        if let Some(node) = self.arena.get_mut(self.unit) {
            node.span = Span::new(0, end);
        }
        (self.arena, self.unit)
    }

    pub fn outline_parse(mut self) -> UnitBuilder {
        self.arena.set_parse_state(ParseState::Outline);
        self
    }

    fn next_span(&mut self) -> Span {
        let start = self.cursor;
        self.cursor += 4;
        Span::new(start, start + 4)
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.arena.intern(text)
    }

    // ---- declarations ----

    pub fn import(&mut self, qualified: &str, wildcard: bool) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(qualified);
        let import = self.arena.add_import(atom, wildcard, span);
        if let Some(unit) = self.arena.get_unit_mut(self.unit) {
            unit.imports.push(import);
        }
        import
    }

    pub fn class(&mut self, name: &str) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        let decl = self.arena.add_type_decl(atom, span);
        if let Some(unit) = self.arena.get_unit_mut(self.unit) {
            unit.types.push(decl);
        }
        decl
    }

    pub fn nested_class(&mut self, enclosing: NodeIndex, name: &str) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        let decl = self.arena.add_type_decl(atom, span);
        if let Some(data) = self.arena.get_type_decl_mut(decl) {
            data.enclosing = enclosing;
        }
        decl
    }

    pub fn extends(&mut self, type_decl: NodeIndex, superclass: &str) {
        let super_ref = self.named_ref(superclass);
        if let Some(data) = self.arena.get_type_decl_mut(type_decl) {
            data.extends = super_ref;
        }
    }

    pub fn field(&mut self, type_decl: NodeIndex, name: &str, type_ref: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        let field = self.arena.add_field(atom, type_ref, NodeIndex::NONE, span);
        if let Some(data) = self.arena.get_type_decl_mut(type_decl) {
            data.fields.push(field);
        }
        field
    }

    pub fn field_with_init(
        &mut self,
        type_decl: NodeIndex,
        name: &str,
        type_ref: NodeIndex,
        initializer: NodeIndex,
    ) -> NodeIndex {
        let field = self.field(type_decl, name, type_ref);
        if let Some(var) = self.arena.get_variable_mut(field) {
            var.initializer = initializer;
        }
        field
    }

    pub fn method(
        &mut self,
        type_decl: NodeIndex,
        name: &str,
        return_type: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        let method = self.arena.add_method(atom, return_type, body, span);
        if let Some(data) = self.arena.get_type_decl_mut(type_decl) {
            data.methods.push(method);
        }
        method
    }

    pub fn constructor(&mut self, type_decl: NodeIndex, body: NodeIndex) -> NodeIndex {
        let name = match self.arena.get_type_decl(type_decl) {
            Some(data) => data.name,
            None => Atom::NONE,
        };
        let span = self.next_span();
        let method = self.arena.add_method(name, NodeIndex::NONE, body, span);
        self.arena.set_flags(method, NodeFlags::CONSTRUCTOR);
        if let Some(data) = self.arena.get_type_decl_mut(type_decl) {
            data.methods.push(method);
        }
        method
    }

    /// The no-arg constructor the host synthesizes for a class that
    /// declares none.
    pub fn default_constructor(&mut self, type_decl: NodeIndex) -> NodeIndex {
        let body = self.block(vec![]);
        let ctor = self.constructor(type_decl, body);
        self.arena
            .set_flags(ctor, NodeFlags::DEFAULT_CONSTRUCTOR | NodeFlags::PUBLIC);
        ctor
    }

    pub fn parameter(&mut self, method: NodeIndex, name: &str, type_ref: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        let param = self.arena.add_parameter(atom, type_ref, span);
        if let Some(data) = self.arena.get_method_mut(method) {
            data.parameters.push(param);
        }
        param
    }

    pub fn modifiers(&mut self, node: NodeIndex, flags: NodeFlags) {
        self.arena.set_flags(node, flags);
    }

    // ---- annotations ----

    pub fn annotate(&mut self, target: NodeIndex, written_type: &str) -> NodeIndex {
        let type_ref = self.named_ref(written_type);
        let span = self.next_span();
        let annotation = self.arena.add_annotation(type_ref, span);
        match self.arena.kind(target) {
            Some(SyntaxKind::TypeDecl) => {
                if let Some(data) = self.arena.get_type_decl_mut(target) {
                    data.annotations.push(annotation);
                }
            }
            Some(SyntaxKind::MethodDecl) => {
                if let Some(data) = self.arena.get_method_mut(target) {
                    data.annotations.push(annotation);
                }
            }
            Some(SyntaxKind::FieldDecl) | Some(SyntaxKind::Parameter) | Some(SyntaxKind::LocalDecl) => {
                if let Some(data) = self.arena.get_variable_mut(target) {
                    data.annotations.push(annotation);
                }
            }
            _ => {}
        }
        annotation
    }

    pub fn annotation_arg(&mut self, annotation: NodeIndex, name: &str, value: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        let atom = if name.is_empty() {
            Atom::NONE
        } else {
            self.arena.intern(name)
        };
        let arg = self.arena.add_annotation_arg(atom, value, span);
        if let Some(data) = self.arena.get_annotation_mut(annotation) {
            data.args.push(arg);
        }
        arg
    }

    /// Mark an annotation as already resolved by the host's binder.
    pub fn resolve_annotation(&mut self, annotation: NodeIndex, fqn: &str) {
        let atom = self.arena.intern(fqn);
        if let Some(data) = self.arena.get_annotation_mut(annotation) {
            data.resolved_fqn = atom;
        }
    }

    // ---- type references ----

    pub fn named_ref(&mut self, dotted: &str) -> NodeIndex {
        let span = self.next_span();
        let segments: Vec<Atom> = dotted.split('.').map(|s| self.arena.intern(s)).collect();
        self.arena.add_named_type_ref(segments, NodeList::new(), span)
    }

    pub fn primitive(&mut self, primitive: Primitive) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_primitive_type_ref(primitive, span)
    }

    pub fn array_of(&mut self, element: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_array_type_ref(element, span)
    }

    // ---- statements ----

    pub fn block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_block(NodeList::of(statements), span)
    }

    pub fn local(&mut self, name: &str, type_ref: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        self.arena.add_local(atom, type_ref, initializer, span)
    }

    pub fn expr_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_expression_statement(expression, span)
    }

    pub fn return_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_return(expression, span)
    }

    // ---- expressions ----

    pub fn ident(&mut self, name: &str) -> NodeIndex {
        let span = self.next_span();
        let atom = self.arena.intern(name);
        self.arena.add_identifier(atom, span)
    }

    /// Dotted access chain, e.g. `sys.io.Streams.close`.
    pub fn select(&mut self, dotted: &str) -> NodeIndex {
        let span = self.next_span();
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let first_atom = self.arena.intern(first);
        let mut expr = self.arena.add_identifier(first_atom, span);
        for part in parts {
            let atom = self.arena.intern(part);
            expr = self.arena.add_select(expr, atom, span);
        }
        expr
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_call(callee, NodeList::of(args), span)
    }

    pub fn lit_int(&mut self, value: i64) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_literal(LiteralValue::Int(value), span)
    }

    pub fn lit_bool(&mut self, value: bool) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_literal(LiteralValue::Bool(value), span)
    }

    pub fn lit_str(&mut self, value: &str) -> NodeIndex {
        let span = self.next_span();
        self.arena
            .add_literal(LiteralValue::Str(value.to_string()), span)
    }

    pub fn lit_null(&mut self) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_literal(LiteralValue::Null, span)
    }

    pub fn array_literal(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        let span = self.next_span();
        self.arena.add_array_literal(NodeList::of(elements), span)
    }

    pub fn class_literal(&mut self, dotted: &str) -> NodeIndex {
        let type_ref = self.named_ref(dotted);
        let span = self.next_span();
        self.arena.add_class_literal(type_ref, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_unit_with_one_class() {
        let mut b = UnitBuilder::new("Point.java", "demo");
        let class = b.class("Point");
        let int_ty = b.primitive(Primitive::Int);
        b.field(class, "x", int_ty);
        let (arena, unit) = b.finish();

        let unit_data = arena.get_unit(unit).unwrap();
        assert_eq!(unit_data.types.len(), 1);
        let decl = arena.get_type_decl(class).unwrap();
        assert_eq!(arena.resolve_atom(decl.name), "Point");
        assert_eq!(decl.fields.len(), 1);
    }

    #[test]
    fn annotation_attaches_to_local() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let res_ty = b.named_ref("Resource");
        let open = b.ident("open");
        let init = b.call(open, vec![]);
        let local = b.local("r", res_ty, init);
        let ann = b.annotate(local, "Cleanup");
        let (arena, _) = b.finish();

        let var = arena.get_variable(local).unwrap();
        assert_eq!(var.annotations.nodes.as_slice(), &[ann]);
    }

    #[test]
    fn spans_are_monotonic() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let a = b.class("A");
        let c = b.class("C");
        let (arena, _) = b.finish();
        let sa = arena.get(a).unwrap().span;
        let sc = arena.get(c).unwrap().span;
        assert!(sa.end <= sc.start);
    }
}
