//! Handler registry and marker identity.
//!
//! Markers are a closed sum type: the registry is built at startup from a
//! static list of (marker, flags, factory) entries instead of reflective
//! service discovery. At most one handler answers for a marker; a duplicate
//! registration is a startup error, logged, and the later entry rejected.

use std::fmt;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::dispatch::TransformContext;
use crate::tree::TreeId;
use crate::values::{AnnotationSchema, AnnotationValues, DefaultValue, OptionSpec};

/// Every marker the engine knows how to expand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    EqualsAndHashCode,
    Getter,
    Setter,
    Cleanup,
    SneakyThrows,
    NoArgsConstructor,
    RequiredArgsConstructor,
    AllArgsConstructor,
    PrintTree,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 9] = [
        MarkerKind::EqualsAndHashCode,
        MarkerKind::Getter,
        MarkerKind::Setter,
        MarkerKind::Cleanup,
        MarkerKind::SneakyThrows,
        MarkerKind::NoArgsConstructor,
        MarkerKind::RequiredArgsConstructor,
        MarkerKind::AllArgsConstructor,
        MarkerKind::PrintTree,
    ];

    pub fn fqn(&self) -> &'static str {
        match self {
            MarkerKind::EqualsAndHashCode => "graft.EqualsAndHashCode",
            MarkerKind::Getter => "graft.Getter",
            MarkerKind::Setter => "graft.Setter",
            MarkerKind::Cleanup => "graft.Cleanup",
            MarkerKind::SneakyThrows => "graft.SneakyThrows",
            MarkerKind::NoArgsConstructor => "graft.NoArgsConstructor",
            MarkerKind::RequiredArgsConstructor => "graft.RequiredArgsConstructor",
            MarkerKind::AllArgsConstructor => "graft.AllArgsConstructor",
            MarkerKind::PrintTree => "graft.PrintTree",
        }
    }

    pub fn simple_name(&self) -> &'static str {
        self.fqn().rsplit('.').next().unwrap_or_default()
    }

    pub fn from_fqn(fqn: &str) -> Option<MarkerKind> {
        MarkerKind::ALL.into_iter().find(|m| m.fqn() == fqn)
    }

    /// Whether this marker is the reserved-for-last diagnostic facility.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, MarkerKind::PrintTree)
    }

    pub fn schema(&self) -> &'static AnnotationSchema {
        match self {
            MarkerKind::EqualsAndHashCode => &EQUALS_HASH_CODE_SCHEMA,
            MarkerKind::Getter | MarkerKind::Setter => &ACCESSOR_SCHEMA,
            MarkerKind::Cleanup => &CLEANUP_SCHEMA,
            MarkerKind::SneakyThrows => &SNEAKY_THROWS_SCHEMA,
            MarkerKind::NoArgsConstructor => &NO_ARGS_SCHEMA,
            MarkerKind::RequiredArgsConstructor | MarkerKind::AllArgsConstructor => {
                &ARGS_CONSTRUCTOR_SCHEMA
            }
            MarkerKind::PrintTree => &PRINT_TREE_SCHEMA,
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fqn())
    }
}

static EQUALS_HASH_CODE_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[
        OptionSpec {
            name: "of",
            default: DefaultValue::EmptyList,
        },
        OptionSpec {
            name: "exclude",
            default: DefaultValue::EmptyList,
        },
        OptionSpec {
            name: "callSuper",
            default: DefaultValue::Bool(false),
        },
    ],
};

static ACCESSOR_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[OptionSpec {
        name: "value",
        default: DefaultValue::EnumRef("AccessLevel.PUBLIC"),
    }],
};

static CLEANUP_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[
        OptionSpec {
            name: "value",
            default: DefaultValue::Str("close"),
        },
        OptionSpec {
            name: "quietly",
            default: DefaultValue::Bool(false),
        },
    ],
};

static SNEAKY_THROWS_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[OptionSpec {
        name: "value",
        default: DefaultValue::EmptyList,
    }],
};

static NO_ARGS_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[
        OptionSpec {
            name: "access",
            default: DefaultValue::EnumRef("AccessLevel.PUBLIC"),
        },
        OptionSpec {
            name: "staticName",
            default: DefaultValue::Str(""),
        },
        OptionSpec {
            name: "callSuper",
            default: DefaultValue::Bool(false),
        },
    ],
};

static ARGS_CONSTRUCTOR_SCHEMA: AnnotationSchema = AnnotationSchema {
    options: &[
        OptionSpec {
            name: "access",
            default: DefaultValue::EnumRef("AccessLevel.PUBLIC"),
        },
        OptionSpec {
            name: "staticName",
            default: DefaultValue::Str(""),
        },
        OptionSpec {
            name: "callSuper",
            default: DefaultValue::Bool(false),
        },
        OptionSpec {
            name: "suppressConstructorProperties",
            default: DefaultValue::Bool(false),
        },
    ],
};

static PRINT_TREE_SCHEMA: AnnotationSchema = AnnotationSchema { options: &[] };

/// Unexpected handler failure; surfaces as a logged diagnostic at the
/// dispatch boundary, never as a propagated error.
#[derive(Clone, Debug)]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> HandlerError {
        HandlerError {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HandlerError {}

/// The transformation logic bound to one marker type.
pub trait Handler: Send + Sync {
    /// Lightweight early reaction during an outline-only pass, for
    /// handlers that must influence the host before full resolution (e.g.
    /// suppressing default-member synthesis). Must not mutate the tree.
    fn pre_handle(
        &self,
        _values: &AnnotationValues,
        _site: TreeId,
        _cx: &mut TransformContext<'_>,
    ) {
    }

    fn handle(
        &self,
        values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError>;
}

/// Ordinary tree visitor, run before the annotation passes.
pub trait TreeVisitor: Send + Sync {
    fn name(&self) -> &'static str;
    fn visit(&self, cx: &mut TransformContext<'_>);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulingFlags {
    /// Defer full handling until the host has completed an outline-only
    /// parse and entered full resolution; only `pre_handle` runs earlier.
    pub defer_until_post_diet: bool,
    /// Defer until the host is building a type's field/method list; such
    /// handlers only run from the member-synthesis entry point.
    pub defer_until_build_members: bool,
}

pub struct Registration {
    pub marker: MarkerKind,
    pub flags: SchedulingFlags,
    pub handler: Box<dyn Handler>,
}

pub struct HandlerRegistry {
    handlers: FxHashMap<MarkerKind, Registration>,
    visitors: Vec<Box<dyn TreeVisitor>>,
    library: TypeLibrary,
}

impl HandlerRegistry {
    /// Build a registry from explicit registrations. Duplicate marker
    /// registration is an error: logged, first registrant wins.
    pub fn discover(
        entries: Vec<Registration>,
        visitors: Vec<Box<dyn TreeVisitor>>,
    ) -> HandlerRegistry {
        let mut handlers: FxHashMap<MarkerKind, Registration> = FxHashMap::default();
        for entry in entries {
            if handlers.contains_key(&entry.marker) {
                tracing::error!(marker = %entry.marker, "duplicate handler registration rejected");
                continue;
            }
            handlers.insert(entry.marker, entry);
        }
        let library = TypeLibrary::from_markers(handlers.keys().copied());
        HandlerRegistry {
            handlers,
            visitors,
            library,
        }
    }

    pub fn lookup(&self, marker: MarkerKind) -> Option<&Registration> {
        self.handlers.get(&marker)
    }

    pub fn visitors(&self) -> &[Box<dyn TreeVisitor>] {
        &self.visitors
    }

    pub fn library(&self) -> &TypeLibrary {
        &self.library
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Known marker fully-qualified names, indexed by simple name for the
/// written-name resolution heuristic.
#[derive(Debug, Default)]
pub struct TypeLibrary {
    by_simple: FxHashMap<&'static str, SmallVec<[&'static str; 2]>>,
    fqns: Vec<&'static str>,
}

impl TypeLibrary {
    pub fn from_markers(markers: impl Iterator<Item = MarkerKind>) -> TypeLibrary {
        let mut library = TypeLibrary::default();
        for marker in markers {
            library.add(marker.fqn());
        }
        library
    }

    pub fn add(&mut self, fqn: &'static str) {
        let simple = fqn.rsplit('.').next().unwrap_or(fqn);
        self.by_simple.entry(simple).or_default().push(fqn);
        self.fqns.push(fqn);
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.fqns.iter().any(|&f| f == fqn)
    }

    pub fn candidates_for_simple(&self, simple: &str) -> &[&'static str] {
        self.by_simple.get(simple).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// The built-in registry: every marker in [`MarkerKind::ALL`] with its
/// production handler and scheduling flags.
pub fn builtin_registry() -> &'static HandlerRegistry {
    static REGISTRY: Lazy<HandlerRegistry> =
        Lazy::new(|| HandlerRegistry::discover(crate::handlers::builtin_registrations(), Vec::new()));
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NopHandler;

    impl Handler for NopHandler {
        fn handle(
            &self,
            _values: &AnnotationValues,
            _site: TreeId,
            _cx: &mut TransformContext<'_>,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let first = Registration {
            marker: MarkerKind::Cleanup,
            flags: SchedulingFlags {
                defer_until_post_diet: true,
                ..Default::default()
            },
            handler: Box::new(NopHandler),
        };
        let second = Registration {
            marker: MarkerKind::Cleanup,
            flags: SchedulingFlags::default(),
            handler: Box::new(NopHandler),
        };
        let registry = HandlerRegistry::discover(vec![first, second], Vec::new());
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .lookup(MarkerKind::Cleanup)
                .unwrap()
                .flags
                .defer_until_post_diet
        );
    }

    #[test]
    fn library_indexes_by_simple_name() {
        let registry = builtin_registry();
        let candidates = registry.library().candidates_for_simple("Cleanup");
        assert_eq!(candidates, ["graft.Cleanup"]);
        assert!(registry.library().contains("graft.SneakyThrows"));
        assert!(!registry.library().contains("graft.Nonsuch"));
    }

    #[test]
    fn builtin_registry_covers_every_marker() {
        let registry = builtin_registry();
        for marker in MarkerKind::ALL {
            assert!(registry.lookup(marker).is_some(), "missing {marker}");
        }
    }
}
