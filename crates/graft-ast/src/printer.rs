//! Source-shaped pretty printer.
//!
//! Renders an arena subtree back into Java-like source text. Used by the
//! tree-dump diagnostic handler and by tests asserting on generated shapes.
//! Output favors one statement per line over faithful formatting.

use crate::arena::NodeArena;
use crate::node::*;
use crate::node_flags::NodeFlags;

pub struct Printer<'a> {
    arena: &'a NodeArena,
    out: String,
    indent: usize,
    /// Mark generated members with a `// generated` trailer.
    pub show_generated: bool,
}

pub fn print_unit(arena: &NodeArena, unit: NodeIndex) -> String {
    let mut printer = Printer::new(arena);
    printer.unit(unit);
    printer.finish()
}

pub fn print_node(arena: &NodeArena, node: NodeIndex) -> String {
    let mut printer = Printer::new(arena);
    printer.node(node);
    printer.finish()
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a NodeArena) -> Printer<'a> {
        Printer {
            arena,
            out: String::new(),
            indent: 0,
            show_generated: false,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn atom(&self, atom: graft_common::Atom) -> &str {
        if atom.is_none() {
            ""
        } else {
            self.arena.resolve_atom(atom)
        }
    }

    fn modifiers(&self, flags: NodeFlags) -> String {
        let mut out = String::new();
        if flags.contains(NodeFlags::PUBLIC) {
            out.push_str("public ");
        }
        if flags.contains(NodeFlags::PROTECTED) {
            out.push_str("protected ");
        }
        if flags.contains(NodeFlags::PRIVATE) {
            out.push_str("private ");
        }
        if flags.contains(NodeFlags::STATIC) {
            out.push_str("static ");
        }
        if flags.contains(NodeFlags::ABSTRACT) {
            out.push_str("abstract ");
        }
        if flags.contains(NodeFlags::FINAL) {
            out.push_str("final ");
        }
        if flags.contains(NodeFlags::TRANSIENT) {
            out.push_str("transient ");
        }
        out
    }

    pub fn unit(&mut self, unit: NodeIndex) {
        let Some(data) = self.arena.get_unit(unit) else {
            return;
        };
        if data.package_name.is_some() {
            let pkg = format!("package {};", self.atom(data.package_name));
            self.line(&pkg);
        }
        let imports: Vec<NodeIndex> = data.imports.iter().collect();
        let types: Vec<NodeIndex> = data.types.iter().collect();
        for import in imports {
            if let Some(imp) = self.arena.get_import(import) {
                let suffix = if imp.wildcard { ".*" } else { "" };
                let text = format!("import {}{};", self.atom(imp.qualified), suffix);
                self.line(&text);
            }
        }
        for ty in types {
            self.type_decl(ty);
        }
    }

    pub fn node(&mut self, node: NodeIndex) {
        match self.arena.kind(node) {
            Some(SyntaxKind::CompilationUnit) => self.unit(node),
            Some(SyntaxKind::TypeDecl) => self.type_decl(node),
            Some(SyntaxKind::MethodDecl) => self.method(node),
            Some(SyntaxKind::FieldDecl) => self.field(node),
            Some(k) if k.is_statement() => self.statement(node),
            _ => {
                let text = self.expr(node);
                self.line(&text);
            }
        }
    }

    fn type_decl(&mut self, decl: NodeIndex) {
        let Some(data) = self.arena.get_type_decl(decl) else {
            return;
        };
        let annotations: Vec<NodeIndex> = data.annotations.iter().collect();
        let fields: Vec<NodeIndex> = data.fields.iter().collect();
        let initializers: Vec<NodeIndex> = data.initializers.iter().collect();
        let methods: Vec<NodeIndex> = data.methods.iter().collect();
        let name = self.atom(data.name).to_string();
        let extends = if data.extends.is_some() {
            format!(" extends {}", self.type_ref(data.extends))
        } else {
            String::new()
        };
        let mods = self.modifiers(self.arena.flags(decl));

        for ann in annotations {
            let text = self.annotation(ann);
            self.line(&text);
        }
        self.line(&format!("{mods}class {name}{extends} {{"));
        self.indent += 1;
        for field in fields {
            self.field(field);
        }
        for init in initializers {
            self.line("{");
            self.indent += 1;
            self.block_statements(init);
            self.indent -= 1;
            self.line("}");
        }
        for method in methods {
            self.method(method);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn generated_trailer(&self, node: NodeIndex) -> &'static str {
        if self.show_generated && self.arena.is_generated(node) {
            " // generated"
        } else {
            ""
        }
    }

    fn field(&mut self, field: NodeIndex) {
        let Some(var) = self.arena.get_variable(field) else {
            return;
        };
        let annotations: Vec<NodeIndex> = var.annotations.iter().collect();
        let name = self.atom(var.name).to_string();
        let ty = self.type_ref(var.type_ref);
        let init = if var.initializer.is_some() {
            format!(" = {}", self.expr(var.initializer))
        } else {
            String::new()
        };
        for ann in annotations {
            let text = self.annotation(ann);
            self.line(&text);
        }
        let mods = self.modifiers(self.arena.flags(field));
        let trailer = self.generated_trailer(field);
        self.line(&format!("{mods}{ty} {name}{init};{trailer}"));
    }

    fn method(&mut self, method: NodeIndex) {
        let Some(data) = self.arena.get_method(method) else {
            return;
        };
        let annotations: Vec<NodeIndex> = data.annotations.iter().collect();
        let params: Vec<NodeIndex> = data.parameters.iter().collect();
        let thrown: Vec<NodeIndex> = data.thrown.iter().collect();
        let body = data.body;
        let name = self.atom(data.name).to_string();
        let is_ctor = self.arena.is_constructor(method);
        let ret = if is_ctor {
            String::new()
        } else if data.return_type.is_some() {
            format!("{} ", self.type_ref(data.return_type))
        } else {
            "void ".to_string()
        };

        for ann in annotations {
            let text = self.annotation(ann);
            self.line(&text);
        }
        let mods = self.modifiers(self.arena.flags(method));
        let params_text: Vec<String> = params
            .iter()
            .map(|&p| {
                let var = self.arena.get_variable(p);
                match var {
                    Some(v) => format!("{} {}", self.type_ref(v.type_ref), self.atom(v.name)),
                    None => String::new(),
                }
            })
            .collect();
        let throws_text = if thrown.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = thrown.iter().map(|&t| self.type_ref(t)).collect();
            format!(" throws {}", names.join(", "))
        };
        let trailer = self.generated_trailer(method);
        if body.is_none() {
            self.line(&format!(
                "{mods}{ret}{name}({}){throws_text};{trailer}",
                params_text.join(", ")
            ));
            return;
        }
        self.line(&format!(
            "{mods}{ret}{name}({}){throws_text} {{{trailer}",
            params_text.join(", ")
        ));
        self.indent += 1;
        self.block_statements(body);
        self.indent -= 1;
        self.line("}");
    }

    fn annotation(&self, annotation: NodeIndex) -> String {
        let Some(data) = self.arena.get_annotation(annotation) else {
            return String::new();
        };
        let name = self
            .arena
            .named_ref_text(data.type_ref)
            .unwrap_or_default();
        if data.args.is_empty() {
            return format!("@{name}");
        }
        let args: Vec<String> = data
            .args
            .iter()
            .map(|arg| {
                let Some(a) = self.arena.get_annotation_arg(arg) else {
                    return String::new();
                };
                if a.name.is_none() {
                    self.expr(a.value)
                } else {
                    format!("{} = {}", self.atom(a.name), self.expr(a.value))
                }
            })
            .collect();
        format!("@{name}({})", args.join(", "))
    }

    fn block_statements(&mut self, block: NodeIndex) {
        let Some(data) = self.arena.get_block(block) else {
            return;
        };
        let statements: Vec<NodeIndex> = data.statements.iter().collect();
        for stmt in statements {
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: NodeIndex) {
        match self.arena.kind(stmt) {
            Some(SyntaxKind::Block) => {
                self.line("{");
                self.indent += 1;
                self.block_statements(stmt);
                self.indent -= 1;
                self.line("}");
            }
            Some(SyntaxKind::LocalDecl) => {
                let Some(var) = self.arena.get_variable(stmt) else {
                    return;
                };
                let annotations: Vec<NodeIndex> = var.annotations.iter().collect();
                let name = self.atom(var.name).to_string();
                let ty = self.type_ref(var.type_ref);
                let init = if var.initializer.is_some() {
                    format!(" = {}", self.expr(var.initializer))
                } else {
                    String::new()
                };
                for ann in annotations {
                    let text = self.annotation(ann);
                    self.line(&text);
                }
                let mods = self.modifiers(self.arena.flags(stmt));
                self.line(&format!("{mods}{ty} {name}{init};"));
            }
            Some(SyntaxKind::IfStatement) => {
                let Some(data) = self.arena.get_if(stmt) else {
                    return;
                };
                let (cond, then_branch, else_branch) =
                    (data.condition, data.then_branch, data.else_branch);
                let cond_text = self.expr(cond);
                self.line(&format!("if ({cond_text}) {{"));
                self.indent += 1;
                self.statement_or_block(then_branch);
                self.indent -= 1;
                if else_branch.is_some() {
                    self.line("} else {");
                    self.indent += 1;
                    self.statement_or_block(else_branch);
                    self.indent -= 1;
                }
                self.line("}");
            }
            Some(SyntaxKind::TryStatement) => {
                let Some(data) = self.arena.get_try(stmt) else {
                    return;
                };
                let (block, finally_block) = (data.block, data.finally_block);
                let catches: Vec<NodeIndex> = data.catches.iter().collect();
                self.line("try {");
                self.indent += 1;
                self.block_statements(block);
                self.indent -= 1;
                for catch in catches {
                    let Some(c) = self.arena.get_catch(catch) else {
                        continue;
                    };
                    let (param, cblock) = (c.parameter, c.block);
                    let param_text = match self.arena.get_variable(param) {
                        Some(v) => {
                            format!("{} {}", self.type_ref(v.type_ref), self.atom(v.name))
                        }
                        None => String::new(),
                    };
                    self.line(&format!("}} catch ({param_text}) {{"));
                    self.indent += 1;
                    self.block_statements(cblock);
                    self.indent -= 1;
                }
                if finally_block.is_some() {
                    self.line("} finally {");
                    self.indent += 1;
                    self.block_statements(finally_block);
                    self.indent -= 1;
                }
                self.line("}");
            }
            Some(SyntaxKind::ExpressionStatement) => {
                let expr = self
                    .arena
                    .get_expr_stmt(stmt)
                    .map(|d| d.expression)
                    .unwrap_or(NodeIndex::NONE);
                let text = self.expr(expr);
                self.line(&format!("{text};"));
            }
            Some(SyntaxKind::ReturnStatement) => {
                let expr = self
                    .arena
                    .get_return(stmt)
                    .map(|d| d.expression)
                    .unwrap_or(NodeIndex::NONE);
                if expr.is_none() {
                    self.line("return;");
                } else {
                    let text = self.expr(expr);
                    self.line(&format!("return {text};"));
                }
            }
            Some(SyntaxKind::ThrowStatement) => {
                let expr = self
                    .arena
                    .get_throw(stmt)
                    .map(|d| d.expression)
                    .unwrap_or(NodeIndex::NONE);
                let text = self.expr(expr);
                self.line(&format!("throw {text};"));
            }
            _ => {}
        }
    }

    fn statement_or_block(&mut self, node: NodeIndex) {
        if self.arena.kind(node) == Some(SyntaxKind::Block) {
            self.block_statements(node);
        } else {
            self.statement(node);
        }
    }

    pub fn type_ref(&self, type_ref: NodeIndex) -> String {
        match self.arena.kind(type_ref) {
            Some(SyntaxKind::PrimitiveTypeRef) => {
                let prim = self
                    .arena
                    .get_primitive_ref(type_ref)
                    .map(|p| p.primitive)
                    .unwrap_or(Primitive::Void);
                match prim {
                    Primitive::Boolean => "boolean",
                    Primitive::Byte => "byte",
                    Primitive::Short => "short",
                    Primitive::Int => "int",
                    Primitive::Long => "long",
                    Primitive::Char => "char",
                    Primitive::Float => "float",
                    Primitive::Double => "double",
                    Primitive::Void => "void",
                }
                .to_string()
            }
            Some(SyntaxKind::NamedTypeRef) => {
                let Some(named) = self.arena.get_named_ref(type_ref) else {
                    return String::new();
                };
                let mut text = self.arena.named_ref_text(type_ref).unwrap_or_default();
                if !named.type_args.is_empty() {
                    let args: Vec<String> =
                        named.type_args.iter().map(|a| self.type_ref(a)).collect();
                    text.push('<');
                    text.push_str(&args.join(", "));
                    text.push('>');
                }
                text
            }
            Some(SyntaxKind::ArrayTypeRef) => {
                let elem = self
                    .arena
                    .get_array_ref(type_ref)
                    .map(|a| a.element)
                    .unwrap_or(NodeIndex::NONE);
                format!("{}[]", self.type_ref(elem))
            }
            Some(SyntaxKind::WildcardTypeRef) => "?".to_string(),
            _ => String::new(),
        }
    }

    pub fn expr(&self, expr: NodeIndex) -> String {
        match self.arena.kind(expr) {
            Some(SyntaxKind::Identifier) => self
                .arena
                .get_identifier(expr)
                .map(|d| self.atom(d.name).to_string())
                .unwrap_or_default(),
            Some(SyntaxKind::Select) => {
                let Some(data) = self.arena.get_select(expr) else {
                    return String::new();
                };
                format!("{}.{}", self.expr(data.base), self.atom(data.name))
            }
            Some(SyntaxKind::Literal) => {
                let Some(data) = self.arena.get_literal(expr) else {
                    return String::new();
                };
                match &data.value {
                    LiteralValue::Bool(b) => b.to_string(),
                    LiteralValue::Int(i) => i.to_string(),
                    LiteralValue::Long(l) => format!("{l}L"),
                    LiteralValue::Float(f) => format!("{f}f"),
                    LiteralValue::Double(d) => d.to_string(),
                    LiteralValue::Char(c) => format!("'{c}'"),
                    LiteralValue::Str(s) => format!("\"{s}\""),
                    LiteralValue::Null => "null".to_string(),
                }
            }
            Some(SyntaxKind::Binary) => {
                let Some(data) = self.arena.get_binary(expr) else {
                    return String::new();
                };
                let op = match data.op {
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::Lt => "<",
                    BinaryOp::Gt => ">",
                    BinaryOp::Le => "<=",
                    BinaryOp::Ge => ">=",
                    BinaryOp::Plus => "+",
                    BinaryOp::Minus => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Rem => "%",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                    BinaryOp::BitAnd => "&",
                    BinaryOp::BitOr => "|",
                    BinaryOp::BitXor => "^",
                    BinaryOp::Shl => "<<",
                    BinaryOp::Shr => ">>",
                    BinaryOp::Ushr => ">>>",
                };
                format!("{} {} {}", self.expr(data.lhs), op, self.expr(data.rhs))
            }
            Some(SyntaxKind::Unary) => {
                let Some(data) = self.arena.get_unary(expr) else {
                    return String::new();
                };
                let op = match data.op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::BitNot => "~",
                };
                format!("{}{}", op, self.expr(data.operand))
            }
            Some(SyntaxKind::Conditional) => {
                let Some(data) = self.arena.get_conditional(expr) else {
                    return String::new();
                };
                format!(
                    "{} ? {} : {}",
                    self.expr(data.condition),
                    self.expr(data.then_expr),
                    self.expr(data.else_expr)
                )
            }
            Some(SyntaxKind::Call) => {
                let Some(data) = self.arena.get_call(expr) else {
                    return String::new();
                };
                let args: Vec<String> = data.args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.expr(data.callee), args.join(", "))
            }
            Some(SyntaxKind::New) => {
                let Some(data) = self.arena.get_new(expr) else {
                    return String::new();
                };
                let args: Vec<String> = data.args.iter().map(|a| self.expr(a)).collect();
                format!("new {}({})", self.type_ref(data.type_ref), args.join(", "))
            }
            Some(SyntaxKind::InstanceOf) => {
                let Some(data) = self.arena.get_instanceof(expr) else {
                    return String::new();
                };
                format!(
                    "{} instanceof {}",
                    self.expr(data.expression),
                    self.type_ref(data.type_ref)
                )
            }
            Some(SyntaxKind::Cast) => {
                let Some(data) = self.arena.get_cast(expr) else {
                    return String::new();
                };
                format!(
                    "({}) {}",
                    self.type_ref(data.type_ref),
                    self.expr(data.expression)
                )
            }
            Some(SyntaxKind::Assign) => {
                let Some(data) = self.arena.get_assign(expr) else {
                    return String::new();
                };
                format!("{} = {}", self.expr(data.target), self.expr(data.value))
            }
            Some(SyntaxKind::ArrayLiteral) => {
                let Some(data) = self.arena.get_array_literal(expr) else {
                    return String::new();
                };
                let elems: Vec<String> = data.elements.iter().map(|e| self.expr(e)).collect();
                format!("{{{}}}", elems.join(", "))
            }
            Some(SyntaxKind::ClassLiteral) => {
                let ty = self
                    .arena
                    .get_class_literal(expr)
                    .map(|d| d.type_ref)
                    .unwrap_or(NodeIndex::NONE);
                format!("{}.class", self.type_ref(ty))
            }
            Some(SyntaxKind::This) => "this".to_string(),
            Some(SyntaxKind::Super) => "super".to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::UnitBuilder;

    #[test]
    fn prints_class_with_field_and_method() {
        let mut b = UnitBuilder::new("Point.java", "demo");
        let class = b.class("Point");
        b.modifiers(class, NodeFlags::PUBLIC);
        let int_ty = b.primitive(Primitive::Int);
        let field = b.field(class, "x", int_ty);
        b.modifiers(field, NodeFlags::PRIVATE);
        let x = b.ident("x");
        let ret = b.return_stmt(x);
        let body = b.block(vec![ret]);
        let ret_ty = b.primitive(Primitive::Int);
        let m = b.method(class, "getX", ret_ty, body);
        b.modifiers(m, NodeFlags::PUBLIC);
        let (arena, unit) = b.finish();

        let text = print_unit(&arena, unit);
        assert!(text.contains("package demo;"));
        assert!(text.contains("public class Point {"));
        assert!(text.contains("private int x;"));
        assert!(text.contains("public int getX() {"));
        assert!(text.contains("return x;"));
    }

    #[test]
    fn prints_try_finally() {
        let mut b = UnitBuilder::new("T.java", "");
        let close = b.select("r.close");
        let call = b.call(close, vec![]);
        let stmt = b.expr_stmt(call);
        let finally = b.block(vec![stmt]);
        let body = b.block(vec![]);
        let arena_try = {
            let span = graft_common::Span::EMPTY;
            b.arena_mut()
                .add_try(body, NodeList::new(), finally, span)
        };
        let text = print_node(b.arena(), arena_try);
        assert!(text.contains("try {"));
        assert!(text.contains("} finally {"));
        assert!(text.contains("r.close();"));
    }
}
