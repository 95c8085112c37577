//! Wrapper tree over the native arena.
//!
//! The arena knows child layout per kind but has no parent links and no
//! notion of which nodes can host markers. `UnitTree` adds both: a uniform
//! handle per relevant native node with a [`Kind`] tag, ordered children,
//! and a parent back-reference, plus a native-index lookup map. Wrapper ids
//! are only valid until the next rebuild; `NodeIndex` is the stable key.

use graft_ast::{NodeArena, NodeIndex, SyntaxKind};
use rustc_hash::FxHashMap;

/// Id of a wrapper node within its `UnitTree`. Invalidated by `rebuild`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeId(pub u32);

/// Kind tag of a wrapper node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    CompilationUnit,
    Type,
    Field,
    Initializer,
    Method,
    Argument,
    Local,
    Annotation,
    Statement,
}

impl Kind {
    /// Kinds whose annotations the dispatch engine inspects.
    pub fn hosts_markers(&self) -> bool {
        matches!(
            self,
            Kind::Type | Kind::Field | Kind::Method | Kind::Argument | Kind::Local
        )
    }
}

#[derive(Debug)]
struct TreeNode {
    node: NodeIndex,
    kind: Kind,
    parent: Option<TreeId>,
    children: Vec<TreeId>,
}

#[derive(Debug, Default)]
pub struct UnitTree {
    nodes: Vec<TreeNode>,
    lookup: FxHashMap<NodeIndex, TreeId>,
    root: Option<TreeId>,
}

fn wrapper_kind(kind: SyntaxKind) -> Option<Kind> {
    match kind {
        SyntaxKind::CompilationUnit => Some(Kind::CompilationUnit),
        SyntaxKind::TypeDecl => Some(Kind::Type),
        SyntaxKind::FieldDecl => Some(Kind::Field),
        SyntaxKind::InitializerBlock => Some(Kind::Initializer),
        SyntaxKind::MethodDecl => Some(Kind::Method),
        SyntaxKind::Parameter => Some(Kind::Argument),
        SyntaxKind::LocalDecl => Some(Kind::Local),
        SyntaxKind::Annotation => Some(Kind::Annotation),
        SyntaxKind::Block
        | SyntaxKind::IfStatement
        | SyntaxKind::TryStatement
        | SyntaxKind::CatchClause
        | SyntaxKind::ExpressionStatement
        | SyntaxKind::ReturnStatement
        | SyntaxKind::ThrowStatement => Some(Kind::Statement),
        // Expressions and type references are not wrapped; handlers reach
        // them through the arena directly.
        _ => None,
    }
}

impl UnitTree {
    /// Build the wrapper tree for a unit. Idempotent per native node: each
    /// `NodeIndex` maps to exactly one wrapper.
    pub fn build(arena: &NodeArena, unit: NodeIndex) -> UnitTree {
        let mut tree = UnitTree::default();
        tree.root = tree.wrap(arena, unit, None);
        tree
    }

    /// Throw away all wrappers and re-index from the native tree's current
    /// shape. Call after splicing or after a diet parse gains bodies.
    pub fn rebuild(&mut self, arena: &NodeArena, unit: NodeIndex) {
        self.nodes.clear();
        self.lookup.clear();
        self.root = self.wrap(arena, unit, None);
    }

    /// Re-synchronize one wrapper's subtree with the native node's current
    /// children. Logs and leaves the tree untouched when the wrapper no
    /// longer matches the native shape (the host may have mutated the node
    /// behind our back during a re-entrant pass).
    pub fn rebuild_subtree(&mut self, arena: &NodeArena, id: TreeId) {
        let Some(entry) = self.nodes.get(id.0 as usize) else {
            tracing::warn!(id = id.0, "rebuild_subtree on unknown wrapper id");
            return;
        };
        let node = entry.node;
        let parent = entry.parent;
        if arena.get(node).is_none() {
            tracing::warn!(
                node = node.0,
                "rebuild_subtree: native node vanished; wrapper out of sync"
            );
            return;
        }
        self.unlink_descendants(id);
        let kind = match arena.kind(node).and_then(wrapper_kind) {
            Some(kind) => kind,
            None => {
                tracing::warn!(node = node.0, "rebuild_subtree: node is no longer wrappable");
                return;
            }
        };
        self.nodes[id.0 as usize] = TreeNode {
            node,
            kind,
            parent,
            children: Vec::new(),
        };
        self.lookup.insert(node, id);
        let children = self.wrap_children(arena, node, id);
        self.nodes[id.0 as usize].children = children;
    }

    fn unlink_descendants(&mut self, id: TreeId) {
        let children = std::mem::take(&mut self.nodes[id.0 as usize].children);
        for child in children {
            let node = self.nodes[child.0 as usize].node;
            self.lookup.remove(&node);
            self.unlink_descendants(child);
        }
    }

    fn wrap(&mut self, arena: &NodeArena, node: NodeIndex, parent: Option<TreeId>) -> Option<TreeId> {
        let kind = wrapper_kind(arena.kind(node)?)?;
        if let Some(&existing) = self.lookup.get(&node) {
            return Some(existing);
        }
        let id = TreeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            node,
            kind,
            parent,
            children: Vec::new(),
        });
        self.lookup.insert(node, id);
        let children = self.wrap_children(arena, node, id);
        self.nodes[id.0 as usize].children = children;
        Some(id)
    }

    fn wrap_children(&mut self, arena: &NodeArena, node: NodeIndex, id: TreeId) -> Vec<TreeId> {
        let mut children = Vec::new();
        for child in arena.children_of(node) {
            match arena.kind(child).and_then(wrapper_kind) {
                Some(_) => {
                    if let Some(child_id) = self.wrap(arena, child, Some(id)) {
                        children.push(child_id);
                    }
                }
                // Unwrapped child (expression, type ref): still descend, a
                // wrappable node may sit below (a local inside a block that
                // hangs off an if-statement arm, say).
                None => {
                    for grand in arena.children_of(child) {
                        if arena.kind(grand).and_then(wrapper_kind).is_some() {
                            if let Some(gid) = self.wrap(arena, grand, Some(id)) {
                                children.push(gid);
                            }
                        }
                    }
                }
            }
        }
        children
    }

    pub fn root(&self) -> Option<TreeId> {
        self.root
    }

    pub fn find(&self, node: NodeIndex) -> Option<TreeId> {
        self.lookup.get(&node).copied()
    }

    pub fn node(&self, id: TreeId) -> NodeIndex {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.node)
            .unwrap_or(NodeIndex::NONE)
    }

    pub fn kind(&self, id: TreeId) -> Option<Kind> {
        self.nodes.get(id.0 as usize).map(|n| n.kind)
    }

    pub fn parent(&self, id: TreeId) -> Option<TreeId> {
        self.nodes.get(id.0 as usize).and_then(|n| n.parent)
    }

    pub fn children(&self, id: TreeId) -> &[TreeId] {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Nearest ancestor of the given kind, the wrapper equivalent of
    /// walking `up()` until a kind matches.
    pub fn ancestor_of_kind(&self, id: TreeId, kind: Kind) -> Option<TreeId> {
        let mut current = self.parent(id);
        while let Some(c) = current {
            if self.kind(c) == Some(kind) {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first preorder walk of wrapper ids.
    pub fn walk(&self) -> Vec<TreeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root {
            self.walk_into(root, &mut out);
        }
        out
    }

    fn walk_into(&self, id: TreeId, out: &mut Vec<TreeId>) {
        out.push(id);
        for &child in self.children(id) {
            self.walk_into(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_ast::{Primitive, UnitBuilder};

    #[test]
    fn wraps_declarations_and_annotations() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "Marker");
        let int_ty = b.primitive(Primitive::Int);
        let field = b.field(class, "x", int_ty);
        let (arena, unit) = b.finish();

        let tree = UnitTree::build(&arena, unit);
        let class_id = tree.find(class).unwrap();
        assert_eq!(tree.kind(class_id), Some(Kind::Type));
        let ann_id = tree.find(ann).unwrap();
        assert_eq!(tree.kind(ann_id), Some(Kind::Annotation));
        assert_eq!(tree.parent(ann_id), Some(class_id));
        let field_id = tree.find(field).unwrap();
        assert_eq!(tree.kind(field_id), Some(Kind::Field));
    }

    #[test]
    fn wrapper_identity_is_one_to_one() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let int_ty = b.primitive(Primitive::Int);
        b.field(class, "x", int_ty);
        let (arena, unit) = b.finish();

        let tree = UnitTree::build(&arena, unit);
        let ids = tree.walk();
        let mut seen = rustc_hash::FxHashSet::default();
        for id in ids {
            assert!(seen.insert(tree.node(id)), "native node wrapped twice");
        }
    }

    #[test]
    fn rebuild_tracks_native_mutation() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let (mut arena, unit) = b.finish();

        let mut tree = UnitTree::build(&arena, unit);
        let before = tree.len();

        // Host adds a field after the first wrap.
        let int_ty = arena.add_primitive_type_ref(Primitive::Int, graft_common::Span::EMPTY);
        let name = arena.intern("late");
        let field = arena.add_field(name, int_ty, NodeIndex::NONE, graft_common::Span::EMPTY);
        if let Some(data) = arena.get_type_decl_mut(class) {
            data.fields.push(field);
        }

        tree.rebuild(&arena, unit);
        assert!(tree.len() > before);
        assert_eq!(tree.kind(tree.find(field).unwrap()), Some(Kind::Field));
    }

    #[test]
    fn local_inside_method_block_is_reachable() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let res_ty = b.named_ref("Resource");
        let open = b.ident("open");
        let init = b.call(open, vec![]);
        let local = b.local("r", res_ty, init);
        let body = b.block(vec![local]);
        let void_ty = b.primitive(Primitive::Void);
        let method = b.method(class, "run", void_ty, body);
        let (arena, unit) = b.finish();

        let tree = UnitTree::build(&arena, unit);
        let local_id = tree.find(local).unwrap();
        assert_eq!(tree.kind(local_id), Some(Kind::Local));
        assert_eq!(
            tree.ancestor_of_kind(local_id, Kind::Method),
            tree.find(method)
        );
    }
}
