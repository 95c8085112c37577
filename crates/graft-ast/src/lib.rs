//! Arena-based native parse tree for a Java-like host compiler.
//!
//! This crate plays the role of the host compiler's own AST: the structure
//! the transformation engine receives, mutates in place, and hands back for
//! continued compilation. Nodes live in a [`NodeArena`] and are addressed by
//! dense [`NodeIndex`] ids; per-kind payloads live in side pools, and
//! engine bookkeeping (generated-by attribution) is an id-keyed side table
//! rather than a weak map.

pub mod arena;
pub mod builder;
pub mod node;
pub mod node_flags;
pub mod printer;

mod access;

pub use arena::{NodeArena, ParseState};
pub use builder::UnitBuilder;
pub use node::{
    BinaryOp, LiteralValue, Node, NodeIndex, NodeList, Primitive, SyntaxKind, UnaryOp,
};
pub use node_flags::NodeFlags;
