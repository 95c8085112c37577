//! Node kinds, indices, and per-kind payload structs.
//!
//! A `Node` is deliberately thin: kind, span, flags, and an index into the
//! pool that holds the kind's payload. Kinds with no payload (`This`,
//! `Super`, `WildcardTypeRef`) leave the data index at `NO_DATA`.

use graft_common::{Atom, Span};
use smallvec::SmallVec;

use crate::node_flags::NodeFlags;

/// Dense id of a node within its unit's arena. `NodeIndex::NONE` is the
/// absent sentinel (missing else-branch, missing initializer, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(&self) -> bool {
        *self == NodeIndex::NONE
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        *self != NodeIndex::NONE
    }
}

/// Ordered list of child node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeList {
    pub nodes: SmallVec<[NodeIndex; 4]>,
}

impl NodeList {
    pub fn new() -> NodeList {
        NodeList::default()
    }

    pub fn of(nodes: impl IntoIterator<Item = NodeIndex>) -> NodeList {
        NodeList {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn push(&mut self, node: NodeIndex) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().copied()
    }
}

impl FromIterator<NodeIndex> for NodeList {
    fn from_iter<T: IntoIterator<Item = NodeIndex>>(iter: T) -> NodeList {
        NodeList::of(iter)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SyntaxKind {
    CompilationUnit,
    ImportDecl,
    TypeDecl,
    FieldDecl,
    MethodDecl,
    Parameter,
    LocalDecl,
    InitializerBlock,
    Annotation,
    AnnotationArg,
    // Type references
    PrimitiveTypeRef,
    NamedTypeRef,
    ArrayTypeRef,
    WildcardTypeRef,
    // Statements
    Block,
    IfStatement,
    TryStatement,
    CatchClause,
    ExpressionStatement,
    ReturnStatement,
    ThrowStatement,
    // Expressions
    Identifier,
    Select,
    Literal,
    Binary,
    Unary,
    Conditional,
    Call,
    New,
    InstanceOf,
    Cast,
    Assign,
    ArrayLiteral,
    ClassLiteral,
    This,
    Super,
}

impl SyntaxKind {
    pub fn is_type_ref(&self) -> bool {
        matches!(
            self,
            SyntaxKind::PrimitiveTypeRef
                | SyntaxKind::NamedTypeRef
                | SyntaxKind::ArrayTypeRef
                | SyntaxKind::WildcardTypeRef
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::LocalDecl
        )
    }
}

pub const NO_DATA: u32 = u32::MAX;

/// Thin node record; payload lives in the arena's per-kind pools.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: SyntaxKind,
    pub span: Span,
    pub flags: NodeFlags,
    pub data_index: u32,
}

impl Node {
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data_index != NO_DATA
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.flags.contains(NodeFlags::GENERATED)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    Void,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Null,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Mul,
    Div,
    Rem,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Ushr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    BitNot,
}

// Per-kind payloads. Field/local/parameter declarations share one payload
// shape, distinguished by node kind, which is what lets the cleanup handler
// treat its degenerate argument form uniformly.

#[derive(Clone, Debug)]
pub struct UnitData {
    pub file_name: String,
    pub package_name: Atom,
    pub imports: NodeList,
    pub types: NodeList,
}

#[derive(Clone, Debug)]
pub struct ImportData {
    /// Interned dotted path; for a wildcard import, the path without `.*`.
    pub qualified: Atom,
    pub wildcard: bool,
}

#[derive(Clone, Debug)]
pub struct TypeDeclData {
    pub name: Atom,
    /// NamedTypeRef of the extends clause, or NONE for a root-object type.
    pub extends: NodeIndex,
    pub type_params: Vec<Atom>,
    pub fields: NodeList,
    pub methods: NodeList,
    pub initializers: NodeList,
    pub annotations: NodeList,
    /// Enclosing TypeDecl for nested types, or NONE.
    pub enclosing: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct VariableData {
    pub name: Atom,
    pub type_ref: NodeIndex,
    pub initializer: NodeIndex,
    pub annotations: NodeList,
}

#[derive(Clone, Debug)]
pub struct MethodData {
    pub name: Atom,
    pub return_type: NodeIndex,
    pub parameters: NodeList,
    pub thrown: NodeList,
    pub body: NodeIndex,
    pub annotations: NodeList,
}

#[derive(Clone, Debug)]
pub struct AnnotationData {
    /// Written type reference (NamedTypeRef), simple or qualified.
    pub type_ref: NodeIndex,
    pub args: NodeList,
    /// Fully-qualified name when the host has already resolved the binding;
    /// `Atom::NONE` during outline passes.
    pub resolved_fqn: Atom,
}

#[derive(Clone, Debug)]
pub struct AnnotationArgData {
    /// Option name; `Atom::NONE` for the positional `value` shorthand.
    pub name: Atom,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct PrimitiveTypeRefData {
    pub primitive: Primitive,
}

#[derive(Clone, Debug)]
pub struct NamedTypeRefData {
    pub segments: Vec<Atom>,
    pub type_args: NodeList,
}

#[derive(Clone, Debug)]
pub struct ArrayTypeRefData {
    pub element: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct BlockData {
    pub statements: NodeList,
}

#[derive(Clone, Debug)]
pub struct IfData {
    pub condition: NodeIndex,
    pub then_branch: NodeIndex,
    pub else_branch: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TryData {
    pub block: NodeIndex,
    pub catches: NodeList,
    pub finally_block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CatchData {
    pub parameter: NodeIndex,
    pub block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ExprStmtData {
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ReturnData {
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ThrowData {
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IdentifierData {
    pub name: Atom,
}

#[derive(Clone, Debug)]
pub struct SelectData {
    pub base: NodeIndex,
    pub name: Atom,
}

#[derive(Clone, Debug)]
pub struct LiteralData {
    pub value: LiteralValue,
}

#[derive(Clone, Debug)]
pub struct BinaryData {
    pub op: BinaryOp,
    pub lhs: NodeIndex,
    pub rhs: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct UnaryData {
    pub op: UnaryOp,
    pub operand: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConditionalData {
    pub condition: NodeIndex,
    pub then_expr: NodeIndex,
    pub else_expr: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CallData {
    pub callee: NodeIndex,
    pub args: NodeList,
}

#[derive(Clone, Debug)]
pub struct NewData {
    pub type_ref: NodeIndex,
    pub args: NodeList,
}

#[derive(Clone, Debug)]
pub struct InstanceOfData {
    pub expression: NodeIndex,
    pub type_ref: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CastData {
    pub type_ref: NodeIndex,
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct AssignData {
    pub target: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ArrayLiteralData {
    pub elements: NodeList,
}

#[derive(Clone, Debug)]
pub struct ClassLiteralData {
    pub type_ref: NodeIndex,
}
