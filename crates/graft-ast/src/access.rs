//! NodeArena access methods and child enumeration.
//!
//! Typed accessors check the node kind before touching the payload pool, so
//! a stale or mismatched index degrades to `None` instead of reading the
//! wrong pool entry.

use crate::arena::NodeArena;
use crate::node::*;
use crate::node_flags::NodeFlags;

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $pool:ident, $data:ty, $($kind:pat_param)|+) => {
        #[inline]
        pub fn $get(&self, index: NodeIndex) -> Option<&$data> {
            let node = self.get(index)?;
            if node.has_data() && matches!(node.kind, $($kind)|+) {
                self.$pool.get(node.data_index as usize)
            } else {
                None
            }
        }

        #[inline]
        pub fn $get_mut(&mut self, index: NodeIndex) -> Option<&mut $data> {
            let node = self.get(index)?;
            if node.has_data() && matches!(node.kind, $($kind)|+) {
                let data_index = node.data_index as usize;
                self.$pool.get_mut(data_index)
            } else {
                None
            }
        }
    };
}

impl NodeArena {
    /// Get a thin node by index.
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Get a mutable thin node by index.
    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<SyntaxKind> {
        self.get(index).map(|n| n.kind)
    }

    pub fn flags(&self, index: NodeIndex) -> NodeFlags {
        self.get(index).map(|n| n.flags).unwrap_or_default()
    }

    pub fn set_flags(&mut self, index: NodeIndex, flags: NodeFlags) {
        if let Some(node) = self.get_mut(index) {
            node.flags |= flags;
        }
    }

    typed_accessors!(get_unit, get_unit_mut, units, UnitData, SyntaxKind::CompilationUnit);
    typed_accessors!(get_import, get_import_mut, imports, ImportData, SyntaxKind::ImportDecl);
    typed_accessors!(get_type_decl, get_type_decl_mut, type_decls, TypeDeclData, SyntaxKind::TypeDecl);
    typed_accessors!(
        get_variable, get_variable_mut, variables, VariableData,
        SyntaxKind::FieldDecl | SyntaxKind::Parameter | SyntaxKind::LocalDecl
    );
    typed_accessors!(get_method, get_method_mut, methods, MethodData, SyntaxKind::MethodDecl);
    typed_accessors!(get_annotation, get_annotation_mut, annotations, AnnotationData, SyntaxKind::Annotation);
    typed_accessors!(get_annotation_arg, get_annotation_arg_mut, annotation_args, AnnotationArgData, SyntaxKind::AnnotationArg);
    typed_accessors!(get_primitive_ref, get_primitive_ref_mut, primitive_refs, PrimitiveTypeRefData, SyntaxKind::PrimitiveTypeRef);
    typed_accessors!(get_named_ref, get_named_ref_mut, named_refs, NamedTypeRefData, SyntaxKind::NamedTypeRef);
    typed_accessors!(get_array_ref, get_array_ref_mut, array_refs, ArrayTypeRefData, SyntaxKind::ArrayTypeRef);
    typed_accessors!(
        get_block, get_block_mut, blocks, BlockData,
        SyntaxKind::Block | SyntaxKind::InitializerBlock
    );
    typed_accessors!(get_if, get_if_mut, ifs, IfData, SyntaxKind::IfStatement);
    typed_accessors!(get_try, get_try_mut, trys, TryData, SyntaxKind::TryStatement);
    typed_accessors!(get_catch, get_catch_mut, catches, CatchData, SyntaxKind::CatchClause);
    typed_accessors!(get_expr_stmt, get_expr_stmt_mut, expr_stmts, ExprStmtData, SyntaxKind::ExpressionStatement);
    typed_accessors!(get_return, get_return_mut, returns, ReturnData, SyntaxKind::ReturnStatement);
    typed_accessors!(get_throw, get_throw_mut, throws, ThrowData, SyntaxKind::ThrowStatement);
    typed_accessors!(get_identifier, get_identifier_mut, identifiers, IdentifierData, SyntaxKind::Identifier);
    typed_accessors!(get_select, get_select_mut, selects, SelectData, SyntaxKind::Select);
    typed_accessors!(get_literal, get_literal_mut, literals, LiteralData, SyntaxKind::Literal);
    typed_accessors!(get_binary, get_binary_mut, binaries, BinaryData, SyntaxKind::Binary);
    typed_accessors!(get_unary, get_unary_mut, unaries, UnaryData, SyntaxKind::Unary);
    typed_accessors!(get_conditional, get_conditional_mut, conditionals, ConditionalData, SyntaxKind::Conditional);
    typed_accessors!(get_call, get_call_mut, calls, CallData, SyntaxKind::Call);
    typed_accessors!(get_new, get_new_mut, news, NewData, SyntaxKind::New);
    typed_accessors!(get_instanceof, get_instanceof_mut, instanceofs, InstanceOfData, SyntaxKind::InstanceOf);
    typed_accessors!(get_cast, get_cast_mut, casts, CastData, SyntaxKind::Cast);
    typed_accessors!(get_assign, get_assign_mut, assigns, AssignData, SyntaxKind::Assign);
    typed_accessors!(get_array_literal, get_array_literal_mut, array_literals, ArrayLiteralData, SyntaxKind::ArrayLiteral);
    typed_accessors!(get_class_literal, get_class_literal_mut, class_literals, ClassLiteralData, SyntaxKind::ClassLiteral);

    /// Direct children of a node in source order. This is the single place
    /// that knows every kind's child layout; the wrapper layer and the
    /// aliasing checks are built on it.
    pub fn children_of(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let Some(node) = self.get(index) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut push = |idx: NodeIndex, out: &mut Vec<NodeIndex>| {
            if idx.is_some() {
                out.push(idx);
            }
        };
        match node.kind {
            SyntaxKind::CompilationUnit => {
                if let Some(unit) = self.get_unit(index) {
                    out.extend(unit.imports.iter());
                    out.extend(unit.types.iter());
                }
            }
            SyntaxKind::ImportDecl => {}
            SyntaxKind::TypeDecl => {
                if let Some(decl) = self.get_type_decl(index) {
                    out.extend(decl.annotations.iter());
                    push(decl.extends, &mut out);
                    out.extend(decl.fields.iter());
                    out.extend(decl.initializers.iter());
                    out.extend(decl.methods.iter());
                }
            }
            SyntaxKind::FieldDecl | SyntaxKind::Parameter | SyntaxKind::LocalDecl => {
                if let Some(var) = self.get_variable(index) {
                    out.extend(var.annotations.iter());
                    push(var.type_ref, &mut out);
                    push(var.initializer, &mut out);
                }
            }
            SyntaxKind::MethodDecl => {
                if let Some(method) = self.get_method(index) {
                    out.extend(method.annotations.iter());
                    push(method.return_type, &mut out);
                    out.extend(method.parameters.iter());
                    out.extend(method.thrown.iter());
                    push(method.body, &mut out);
                }
            }
            SyntaxKind::InitializerBlock | SyntaxKind::Block => {
                if let Some(block) = self.get_block(index) {
                    out.extend(block.statements.iter());
                }
            }
            SyntaxKind::Annotation => {
                if let Some(ann) = self.get_annotation(index) {
                    push(ann.type_ref, &mut out);
                    out.extend(ann.args.iter());
                }
            }
            SyntaxKind::AnnotationArg => {
                if let Some(arg) = self.get_annotation_arg(index) {
                    push(arg.value, &mut out);
                }
            }
            SyntaxKind::PrimitiveTypeRef | SyntaxKind::WildcardTypeRef => {}
            SyntaxKind::NamedTypeRef => {
                if let Some(named) = self.get_named_ref(index) {
                    out.extend(named.type_args.iter());
                }
            }
            SyntaxKind::ArrayTypeRef => {
                if let Some(arr) = self.get_array_ref(index) {
                    push(arr.element, &mut out);
                }
            }
            SyntaxKind::IfStatement => {
                if let Some(data) = self.get_if(index) {
                    push(data.condition, &mut out);
                    push(data.then_branch, &mut out);
                    push(data.else_branch, &mut out);
                }
            }
            SyntaxKind::TryStatement => {
                if let Some(data) = self.get_try(index) {
                    push(data.block, &mut out);
                    out.extend(data.catches.iter());
                    push(data.finally_block, &mut out);
                }
            }
            SyntaxKind::CatchClause => {
                if let Some(data) = self.get_catch(index) {
                    push(data.parameter, &mut out);
                    push(data.block, &mut out);
                }
            }
            SyntaxKind::ExpressionStatement => {
                if let Some(data) = self.get_expr_stmt(index) {
                    push(data.expression, &mut out);
                }
            }
            SyntaxKind::ReturnStatement => {
                if let Some(data) = self.get_return(index) {
                    push(data.expression, &mut out);
                }
            }
            SyntaxKind::ThrowStatement => {
                if let Some(data) = self.get_throw(index) {
                    push(data.expression, &mut out);
                }
            }
            SyntaxKind::Identifier | SyntaxKind::Literal | SyntaxKind::This | SyntaxKind::Super => {}
            SyntaxKind::Select => {
                if let Some(data) = self.get_select(index) {
                    push(data.base, &mut out);
                }
            }
            SyntaxKind::Binary => {
                if let Some(data) = self.get_binary(index) {
                    push(data.lhs, &mut out);
                    push(data.rhs, &mut out);
                }
            }
            SyntaxKind::Unary => {
                if let Some(data) = self.get_unary(index) {
                    push(data.operand, &mut out);
                }
            }
            SyntaxKind::Conditional => {
                if let Some(data) = self.get_conditional(index) {
                    push(data.condition, &mut out);
                    push(data.then_expr, &mut out);
                    push(data.else_expr, &mut out);
                }
            }
            SyntaxKind::Call => {
                if let Some(data) = self.get_call(index) {
                    push(data.callee, &mut out);
                    out.extend(data.args.iter());
                }
            }
            SyntaxKind::New => {
                if let Some(data) = self.get_new(index) {
                    push(data.type_ref, &mut out);
                    out.extend(data.args.iter());
                }
            }
            SyntaxKind::InstanceOf => {
                if let Some(data) = self.get_instanceof(index) {
                    push(data.expression, &mut out);
                    push(data.type_ref, &mut out);
                }
            }
            SyntaxKind::Cast => {
                if let Some(data) = self.get_cast(index) {
                    push(data.type_ref, &mut out);
                    push(data.expression, &mut out);
                }
            }
            SyntaxKind::Assign => {
                if let Some(data) = self.get_assign(index) {
                    push(data.target, &mut out);
                    push(data.value, &mut out);
                }
            }
            SyntaxKind::ArrayLiteral => {
                if let Some(data) = self.get_array_literal(index) {
                    out.extend(data.elements.iter());
                }
            }
            SyntaxKind::ClassLiteral => {
                if let Some(data) = self.get_class_literal(index) {
                    push(data.type_ref, &mut out);
                }
            }
        }
        out
    }

    /// Dotted text of a written type reference, e.g. `graft.Cleanup`.
    /// Returns None for non-named type references.
    pub fn named_ref_text(&self, index: NodeIndex) -> Option<String> {
        let named = self.get_named_ref(index)?;
        let mut text = String::new();
        for (i, &segment) in named.segments.iter().enumerate() {
            if i > 0 {
                text.push('.');
            }
            text.push_str(self.interner.resolve(segment));
        }
        Some(text)
    }

    /// Whether a method node is a constructor.
    pub fn is_constructor(&self, index: NodeIndex) -> bool {
        self.flags(index).contains(NodeFlags::CONSTRUCTOR)
    }
}
