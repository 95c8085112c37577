//! NodeArena creation methods (add_* methods).
//!
//! One arena per compilation unit. Nodes are appended and never removed;
//! splicing rewrites parent child lists, so an orphaned node simply becomes
//! unreachable and is reclaimed with the arena.

use graft_common::{Atom, Interner, Span};
use rustc_hash::FxHashMap;

use crate::node::*;
use crate::node_flags::NodeFlags;

/// Host parse state for a unit. Outline ("diet") parses carry structural
/// declarations but leave method bodies at `NodeIndex::NONE`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseState {
    Outline,
    Full,
}

#[derive(Debug)]
pub struct NodeArena {
    pub(crate) nodes: Vec<Node>,
    pub(crate) interner: Interner,
    parse_state: ParseState,

    // Per-kind payload pools, indexed by Node::data_index.
    pub(crate) units: Vec<UnitData>,
    pub(crate) imports: Vec<ImportData>,
    pub(crate) type_decls: Vec<TypeDeclData>,
    pub(crate) variables: Vec<VariableData>,
    pub(crate) methods: Vec<MethodData>,
    pub(crate) annotations: Vec<AnnotationData>,
    pub(crate) annotation_args: Vec<AnnotationArgData>,
    pub(crate) primitive_refs: Vec<PrimitiveTypeRefData>,
    pub(crate) named_refs: Vec<NamedTypeRefData>,
    pub(crate) array_refs: Vec<ArrayTypeRefData>,
    pub(crate) blocks: Vec<BlockData>,
    pub(crate) ifs: Vec<IfData>,
    pub(crate) trys: Vec<TryData>,
    pub(crate) catches: Vec<CatchData>,
    pub(crate) expr_stmts: Vec<ExprStmtData>,
    pub(crate) returns: Vec<ReturnData>,
    pub(crate) throws: Vec<ThrowData>,
    pub(crate) identifiers: Vec<IdentifierData>,
    pub(crate) selects: Vec<SelectData>,
    pub(crate) literals: Vec<LiteralData>,
    pub(crate) binaries: Vec<BinaryData>,
    pub(crate) unaries: Vec<UnaryData>,
    pub(crate) conditionals: Vec<ConditionalData>,
    pub(crate) calls: Vec<CallData>,
    pub(crate) news: Vec<NewData>,
    pub(crate) instanceofs: Vec<InstanceOfData>,
    pub(crate) casts: Vec<CastData>,
    pub(crate) assigns: Vec<AssignData>,
    pub(crate) array_literals: Vec<ArrayLiteralData>,
    pub(crate) class_literals: Vec<ClassLiteralData>,

    /// Side table: synthesized node -> the source node whose marker
    /// produced it. Dense-id keyed, discarded with the arena.
    generated_by: FxHashMap<NodeIndex, NodeIndex>,
}

impl Default for NodeArena {
    fn default() -> NodeArena {
        NodeArena {
            nodes: Vec::new(),
            interner: Interner::new(),
            parse_state: ParseState::Full,
            units: Vec::new(),
            imports: Vec::new(),
            type_decls: Vec::new(),
            variables: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            annotation_args: Vec::new(),
            primitive_refs: Vec::new(),
            named_refs: Vec::new(),
            array_refs: Vec::new(),
            blocks: Vec::new(),
            ifs: Vec::new(),
            trys: Vec::new(),
            catches: Vec::new(),
            expr_stmts: Vec::new(),
            returns: Vec::new(),
            throws: Vec::new(),
            identifiers: Vec::new(),
            selects: Vec::new(),
            literals: Vec::new(),
            binaries: Vec::new(),
            unaries: Vec::new(),
            conditionals: Vec::new(),
            calls: Vec::new(),
            news: Vec::new(),
            instanceofs: Vec::new(),
            casts: Vec::new(),
            assigns: Vec::new(),
            array_literals: Vec::new(),
            class_literals: Vec::new(),
            generated_by: FxHashMap::default(),
        }
    }
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    pub fn parse_state(&self) -> ParseState {
        self.parse_state
    }

    /// Host notification: the unit transitioned between outline and full
    /// parse. Wrapper layers re-synchronize off the returned old state.
    pub fn set_parse_state(&mut self, state: ParseState) -> ParseState {
        std::mem::replace(&mut self.parse_state, state)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ---- generated-by side table ----

    pub fn set_generated_by(&mut self, node: NodeIndex, source: NodeIndex) {
        if let Some(n) = self.get_mut(node) {
            n.flags |= NodeFlags::GENERATED;
        }
        self.generated_by.insert(node, source);
    }

    pub fn generated_by(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.generated_by.get(&node).copied()
    }

    pub fn is_generated(&self, node: NodeIndex) -> bool {
        self.get(node).is_some_and(|n| n.is_generated())
    }

    // ---- node creation ----

    fn push_node(&mut self, kind: SyntaxKind, span: Span, data_index: u32) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            flags: NodeFlags::empty(),
            data_index,
        });
        index
    }

    pub fn add_compilation_unit(
        &mut self,
        file_name: impl Into<String>,
        package_name: Atom,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.units.len() as u32;
        self.units.push(UnitData {
            file_name: file_name.into(),
            package_name,
            imports: NodeList::new(),
            types: NodeList::new(),
        });
        self.push_node(SyntaxKind::CompilationUnit, span, data_index)
    }

    pub fn add_import(&mut self, qualified: Atom, wildcard: bool, span: Span) -> NodeIndex {
        let data_index = self.imports.len() as u32;
        self.imports.push(ImportData {
            qualified,
            wildcard,
        });
        self.push_node(SyntaxKind::ImportDecl, span, data_index)
    }

    pub fn add_type_decl(&mut self, name: Atom, span: Span) -> NodeIndex {
        let data_index = self.type_decls.len() as u32;
        self.type_decls.push(TypeDeclData {
            name,
            extends: NodeIndex::NONE,
            type_params: Vec::new(),
            fields: NodeList::new(),
            methods: NodeList::new(),
            initializers: NodeList::new(),
            annotations: NodeList::new(),
            enclosing: NodeIndex::NONE,
        });
        self.push_node(SyntaxKind::TypeDecl, span, data_index)
    }

    fn add_variable_like(
        &mut self,
        kind: SyntaxKind,
        name: Atom,
        type_ref: NodeIndex,
        initializer: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.variables.len() as u32;
        self.variables.push(VariableData {
            name,
            type_ref,
            initializer,
            annotations: NodeList::new(),
        });
        self.push_node(kind, span, data_index)
    }

    pub fn add_field(
        &mut self,
        name: Atom,
        type_ref: NodeIndex,
        initializer: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        self.add_variable_like(SyntaxKind::FieldDecl, name, type_ref, initializer, span)
    }

    pub fn add_parameter(&mut self, name: Atom, type_ref: NodeIndex, span: Span) -> NodeIndex {
        self.add_variable_like(SyntaxKind::Parameter, name, type_ref, NodeIndex::NONE, span)
    }

    pub fn add_local(
        &mut self,
        name: Atom,
        type_ref: NodeIndex,
        initializer: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        self.add_variable_like(SyntaxKind::LocalDecl, name, type_ref, initializer, span)
    }

    pub fn add_method(
        &mut self,
        name: Atom,
        return_type: NodeIndex,
        body: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.methods.len() as u32;
        self.methods.push(MethodData {
            name,
            return_type,
            parameters: NodeList::new(),
            thrown: NodeList::new(),
            body,
            annotations: NodeList::new(),
        });
        self.push_node(SyntaxKind::MethodDecl, span, data_index)
    }

    pub fn add_initializer_block(&mut self, body: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.blocks.len() as u32;
        let statements = match self.get_block(body) {
            Some(b) => b.statements.clone(),
            None => NodeList::new(),
        };
        self.blocks.push(BlockData { statements });
        self.push_node(SyntaxKind::InitializerBlock, span, data_index)
    }

    pub fn add_annotation(&mut self, type_ref: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.annotations.len() as u32;
        self.annotations.push(AnnotationData {
            type_ref,
            args: NodeList::new(),
            resolved_fqn: Atom::NONE,
        });
        self.push_node(SyntaxKind::Annotation, span, data_index)
    }

    pub fn add_annotation_arg(&mut self, name: Atom, value: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.annotation_args.len() as u32;
        self.annotation_args.push(AnnotationArgData { name, value });
        self.push_node(SyntaxKind::AnnotationArg, span, data_index)
    }

    pub fn add_primitive_type_ref(&mut self, primitive: Primitive, span: Span) -> NodeIndex {
        let data_index = self.primitive_refs.len() as u32;
        self.primitive_refs.push(PrimitiveTypeRefData { primitive });
        self.push_node(SyntaxKind::PrimitiveTypeRef, span, data_index)
    }

    pub fn add_named_type_ref(
        &mut self,
        segments: Vec<Atom>,
        type_args: NodeList,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.named_refs.len() as u32;
        self.named_refs.push(NamedTypeRefData {
            segments,
            type_args,
        });
        self.push_node(SyntaxKind::NamedTypeRef, span, data_index)
    }

    pub fn add_array_type_ref(&mut self, element: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.array_refs.len() as u32;
        self.array_refs.push(ArrayTypeRefData { element });
        self.push_node(SyntaxKind::ArrayTypeRef, span, data_index)
    }

    pub fn add_wildcard_type_ref(&mut self, span: Span) -> NodeIndex {
        self.push_node(SyntaxKind::WildcardTypeRef, span, NO_DATA)
    }

    pub fn add_block(&mut self, statements: NodeList, span: Span) -> NodeIndex {
        let data_index = self.blocks.len() as u32;
        self.blocks.push(BlockData { statements });
        self.push_node(SyntaxKind::Block, span, data_index)
    }

    pub fn add_if(
        &mut self,
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.ifs.len() as u32;
        self.ifs.push(IfData {
            condition,
            then_branch,
            else_branch,
        });
        self.push_node(SyntaxKind::IfStatement, span, data_index)
    }

    pub fn add_try(
        &mut self,
        block: NodeIndex,
        catches: NodeList,
        finally_block: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.trys.len() as u32;
        self.trys.push(TryData {
            block,
            catches,
            finally_block,
        });
        self.push_node(SyntaxKind::TryStatement, span, data_index)
    }

    pub fn add_catch(&mut self, parameter: NodeIndex, block: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.catches.len() as u32;
        self.catches.push(CatchData { parameter, block });
        self.push_node(SyntaxKind::CatchClause, span, data_index)
    }

    pub fn add_expression_statement(&mut self, expression: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.expr_stmts.len() as u32;
        self.expr_stmts.push(ExprStmtData { expression });
        self.push_node(SyntaxKind::ExpressionStatement, span, data_index)
    }

    pub fn add_return(&mut self, expression: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.returns.len() as u32;
        self.returns.push(ReturnData { expression });
        self.push_node(SyntaxKind::ReturnStatement, span, data_index)
    }

    pub fn add_throw(&mut self, expression: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.throws.len() as u32;
        self.throws.push(ThrowData { expression });
        self.push_node(SyntaxKind::ThrowStatement, span, data_index)
    }

    pub fn add_identifier(&mut self, name: Atom, span: Span) -> NodeIndex {
        let data_index = self.identifiers.len() as u32;
        self.identifiers.push(IdentifierData { name });
        self.push_node(SyntaxKind::Identifier, span, data_index)
    }

    pub fn add_select(&mut self, base: NodeIndex, name: Atom, span: Span) -> NodeIndex {
        let data_index = self.selects.len() as u32;
        self.selects.push(SelectData { base, name });
        self.push_node(SyntaxKind::Select, span, data_index)
    }

    pub fn add_literal(&mut self, value: LiteralValue, span: Span) -> NodeIndex {
        let data_index = self.literals.len() as u32;
        self.literals.push(LiteralData { value });
        self.push_node(SyntaxKind::Literal, span, data_index)
    }

    pub fn add_binary(
        &mut self,
        op: BinaryOp,
        lhs: NodeIndex,
        rhs: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.binaries.len() as u32;
        self.binaries.push(BinaryData { op, lhs, rhs });
        self.push_node(SyntaxKind::Binary, span, data_index)
    }

    pub fn add_unary(&mut self, op: UnaryOp, operand: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.unaries.len() as u32;
        self.unaries.push(UnaryData { op, operand });
        self.push_node(SyntaxKind::Unary, span, data_index)
    }

    pub fn add_conditional(
        &mut self,
        condition: NodeIndex,
        then_expr: NodeIndex,
        else_expr: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.conditionals.len() as u32;
        self.conditionals.push(ConditionalData {
            condition,
            then_expr,
            else_expr,
        });
        self.push_node(SyntaxKind::Conditional, span, data_index)
    }

    pub fn add_call(&mut self, callee: NodeIndex, args: NodeList, span: Span) -> NodeIndex {
        let data_index = self.calls.len() as u32;
        self.calls.push(CallData { callee, args });
        self.push_node(SyntaxKind::Call, span, data_index)
    }

    pub fn add_new(&mut self, type_ref: NodeIndex, args: NodeList, span: Span) -> NodeIndex {
        let data_index = self.news.len() as u32;
        self.news.push(NewData { type_ref, args });
        self.push_node(SyntaxKind::New, span, data_index)
    }

    pub fn add_instanceof(
        &mut self,
        expression: NodeIndex,
        type_ref: NodeIndex,
        span: Span,
    ) -> NodeIndex {
        let data_index = self.instanceofs.len() as u32;
        self.instanceofs.push(InstanceOfData {
            expression,
            type_ref,
        });
        self.push_node(SyntaxKind::InstanceOf, span, data_index)
    }

    pub fn add_cast(&mut self, type_ref: NodeIndex, expression: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.casts.len() as u32;
        self.casts.push(CastData {
            type_ref,
            expression,
        });
        self.push_node(SyntaxKind::Cast, span, data_index)
    }

    pub fn add_assign(&mut self, target: NodeIndex, value: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.assigns.len() as u32;
        self.assigns.push(AssignData { target, value });
        self.push_node(SyntaxKind::Assign, span, data_index)
    }

    pub fn add_array_literal(&mut self, elements: NodeList, span: Span) -> NodeIndex {
        let data_index = self.array_literals.len() as u32;
        self.array_literals.push(ArrayLiteralData { elements });
        self.push_node(SyntaxKind::ArrayLiteral, span, data_index)
    }

    pub fn add_class_literal(&mut self, type_ref: NodeIndex, span: Span) -> NodeIndex {
        let data_index = self.class_literals.len() as u32;
        self.class_literals.push(ClassLiteralData { type_ref });
        self.push_node(SyntaxKind::ClassLiteral, span, data_index)
    }

    pub fn add_this(&mut self, span: Span) -> NodeIndex {
        self.push_node(SyntaxKind::This, span, NO_DATA)
    }

    pub fn add_super(&mut self, span: Span) -> NodeIndex {
        self.push_node(SyntaxKind::Super, span, NO_DATA)
    }
}
