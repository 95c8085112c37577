//! Annotation-driven AST transformation engine.
//!
//! The host compiler hands each compilation unit's arena to
//! [`TransformEngine::run_on`] after parsing. The engine wraps the native
//! tree, finds marker annotations on declarations, decodes their arguments,
//! and invokes the matching handler, which synthesizes new members or
//! rewrites method bodies in place. The unit then flows back into the
//! host's type checker as if the generated code had been hand-written.
//!
//! Resilience contract: one broken marker expansion never fails the rest of
//! the unit. Decode failures and handler faults are converted into
//! span-bound diagnostics at the dispatch boundary and traversal continues.

pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod resolver;
pub mod synth;
pub mod tree;
pub mod values;

pub use dispatch::{TransformContext, TransformEngine};
pub use registry::{
    builtin_registry, Handler, HandlerError, HandlerRegistry, MarkerKind, Registration,
    SchedulingFlags, TreeVisitor, TypeLibrary,
};
pub use resolver::resolve_marker;
pub use synth::{clone_subtree, inject_field, inject_method, Synth};
pub use tree::{Kind, TreeId, UnitTree};
pub use values::{AnnValue, AnnotationValues, ValueDecodeError};
