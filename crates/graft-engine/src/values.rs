//! Annotation value decoding.
//!
//! Turns one annotation site into a typed configuration object against the
//! marker's schema: every recognized option ends up with a value (explicit
//! or defaulted), explicit arguments carry their constant-folded value plus
//! the verbatim source text, and unrecognized arguments are retained for
//! completeness checks. A fold failure is a first-class control-flow
//! signal (`ValueDecodeError`), not a fatal error: it aborts this one
//! marker instance and carries the offending expression's span.

use std::fmt;

use graft_ast::printer::Printer;
use graft_ast::{LiteralValue, NodeArena, NodeIndex, SyntaxKind, UnaryOp};
use graft_common::Span;
use indexmap::IndexMap;

/// A constant-folded annotation argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Char(char),
    Str(String),
    /// `Some.Type.class`
    ClassRef(String),
    /// Dotted constant reference, e.g. `AccessLevel.PRIVATE`.
    EnumRef(String),
    List(Vec<AnnValue>),
    /// Nested annotation literal; kept as a handle into the arena.
    Nested(NodeIndex),
    Null,
}

impl AnnValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Flattens `x` and `{x, y}` to a list of element values; annotation
    /// syntax allows a single element where an array is expected.
    pub fn as_list(&self) -> Vec<&AnnValue> {
        match self {
            AnnValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// Schema default, spelled so option tables can be `const`.
#[derive(Copy, Clone, Debug)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
    EnumRef(&'static str),
    EmptyList,
}

impl DefaultValue {
    pub fn to_value(self) -> AnnValue {
        match self {
            DefaultValue::Bool(b) => AnnValue::Bool(b),
            DefaultValue::Int(i) => AnnValue::Int(i),
            DefaultValue::Str(s) => AnnValue::Str(s.to_string()),
            DefaultValue::EnumRef(s) => AnnValue::EnumRef(s.to_string()),
            DefaultValue::EmptyList => AnnValue::List(Vec::new()),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: DefaultValue,
}

#[derive(Copy, Clone, Debug)]
pub struct AnnotationSchema {
    pub options: &'static [OptionSpec],
}

/// One recognized option's decoded state.
#[derive(Clone, Debug)]
pub struct DecodedOption {
    pub value: AnnValue,
    /// Verbatim source text of the argument expression; `None` when the
    /// option was defaulted.
    pub raw: Option<String>,
    pub explicit: bool,
    /// Span of the explicit argument, or the annotation's own span when
    /// defaulted (so warnings about an option still have an anchor).
    pub span: Span,
}

/// The decoded configuration object for one annotation site.
#[derive(Clone, Debug)]
pub struct AnnotationValues {
    /// Insertion order follows the schema, keeping reporting deterministic.
    options: IndexMap<&'static str, DecodedOption>,
    /// Arguments whose names match no schema option: (written name, arg node).
    pub unrecognized: Vec<(String, NodeIndex)>,
    /// The annotation node this was decoded from.
    pub site: NodeIndex,
}

impl AnnotationValues {
    pub fn get(&self, name: &str) -> Option<&DecodedOption> {
        self.options.get(name)
    }

    pub fn is_explicit(&self, name: &str) -> bool {
        self.options.get(name).is_some_and(|o| o.explicit)
    }

    pub fn span_of(&self, name: &str) -> Option<Span> {
        self.options.get(name).map(|o| o.span)
    }

    pub fn bool_value(&self, name: &str) -> bool {
        self.options
            .get(name)
            .and_then(|o| o.value.as_bool())
            .unwrap_or(false)
    }

    /// String form of an option; constant references read as their written
    /// text so `access = AccessLevel.NONE` behaves like a string option.
    pub fn str_value(&self, name: &str) -> String {
        self.options
            .get(name)
            .and_then(|o| match &o.value {
                AnnValue::Str(s) | AnnValue::EnumRef(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// String elements of a list-valued option; class refs contribute their
    /// type name, matching the `Foo.class` spelling for exception lists.
    pub fn string_list(&self, name: &str) -> Vec<String> {
        let Some(option) = self.options.get(name) else {
            return Vec::new();
        };
        option
            .value
            .as_list()
            .into_iter()
            .filter_map(|v| match v {
                AnnValue::Str(s) => Some(s.clone()),
                AnnValue::ClassRef(c) => Some(c.clone()),
                AnnValue::EnumRef(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DecodedOption)> {
        self.options.iter().map(|(k, v)| (*k, v))
    }
}

/// Localized decode failure: one argument could not be constant-folded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueDecodeError {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for ValueDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValueDecodeError {}

/// Decode one annotation site against its marker's schema.
pub fn decode(
    arena: &NodeArena,
    site: NodeIndex,
    schema: &AnnotationSchema,
) -> Result<AnnotationValues, ValueDecodeError> {
    let ann_span = arena.get(site).map(|n| n.span).unwrap_or(Span::EMPTY);
    let args: Vec<NodeIndex> = match arena.get_annotation(site) {
        Some(data) => data.args.iter().collect(),
        None => {
            return Err(ValueDecodeError {
                span: ann_span,
                message: "not an annotation node".to_string(),
            });
        }
    };

    // Match explicit arguments to schema options first.
    let mut explicit: IndexMap<&'static str, (NodeIndex, NodeIndex)> = IndexMap::new();
    let mut unrecognized = Vec::new();
    for arg in args {
        let Some(arg_data) = arena.get_annotation_arg(arg) else {
            continue;
        };
        let written = if arg_data.name.is_none() {
            // Positional shorthand: the single unnamed argument is "value".
            "value".to_string()
        } else {
            arena.resolve_atom(arg_data.name).to_string()
        };
        match schema.options.iter().find(|o| o.name == written) {
            Some(spec) => {
                explicit.insert(spec.name, (arg, arg_data.value));
            }
            None => unrecognized.push((written, arg)),
        }
    }

    let mut options = IndexMap::new();
    for spec in schema.options {
        match explicit.get(spec.name) {
            Some(&(arg, value_expr)) => {
                let span = arena.get(arg).map(|n| n.span).unwrap_or(ann_span);
                let value = fold(arena, value_expr)?;
                let raw = Printer::new(arena).expr(value_expr);
                options.insert(
                    spec.name,
                    DecodedOption {
                        value,
                        raw: Some(raw),
                        explicit: true,
                        span,
                    },
                );
            }
            None => {
                options.insert(
                    spec.name,
                    DecodedOption {
                        value: spec.default.to_value(),
                        raw: None,
                        explicit: false,
                        span: ann_span,
                    },
                );
            }
        }
    }

    Ok(AnnotationValues {
        options,
        unrecognized,
        site,
    })
}

/// Constant-fold an annotation argument expression.
fn fold(arena: &NodeArena, expr: NodeIndex) -> Result<AnnValue, ValueDecodeError> {
    let fail = |span: Span, what: &str| ValueDecodeError {
        span,
        message: format!("annotation argument is not a compile-time constant: {what}"),
    };
    let Some(node) = arena.get(expr) else {
        return Err(fail(Span::EMPTY, "missing expression"));
    };
    let span = node.span;
    match node.kind {
        SyntaxKind::Literal => {
            let data = arena.get_literal(expr).ok_or_else(|| fail(span, "literal"))?;
            Ok(match &data.value {
                LiteralValue::Bool(b) => AnnValue::Bool(*b),
                LiteralValue::Int(i) | LiteralValue::Long(i) => AnnValue::Int(*i),
                LiteralValue::Float(f) => AnnValue::Double(f64::from(*f)),
                LiteralValue::Double(d) => AnnValue::Double(*d),
                LiteralValue::Char(c) => AnnValue::Char(*c),
                LiteralValue::Str(s) => AnnValue::Str(s.clone()),
                LiteralValue::Null => AnnValue::Null,
            })
        }
        SyntaxKind::Unary => {
            let data = arena.get_unary(expr).ok_or_else(|| fail(span, "unary"))?;
            match (data.op, fold(arena, data.operand)?) {
                (UnaryOp::Neg, AnnValue::Int(i)) => Ok(AnnValue::Int(-i)),
                (UnaryOp::Neg, AnnValue::Double(d)) => Ok(AnnValue::Double(-d)),
                (UnaryOp::Not, AnnValue::Bool(b)) => Ok(AnnValue::Bool(!b)),
                _ => Err(fail(span, "unary operator on non-constant")),
            }
        }
        SyntaxKind::ArrayLiteral => {
            let data = arena
                .get_array_literal(expr)
                .ok_or_else(|| fail(span, "array"))?;
            let mut items = Vec::with_capacity(data.elements.len());
            for element in data.elements.iter() {
                items.push(fold(arena, element)?);
            }
            Ok(AnnValue::List(items))
        }
        SyntaxKind::ClassLiteral => {
            let type_ref = arena
                .get_class_literal(expr)
                .map(|d| d.type_ref)
                .unwrap_or(NodeIndex::NONE);
            let name = arena
                .named_ref_text(type_ref)
                .ok_or_else(|| fail(span, "class literal"))?;
            Ok(AnnValue::ClassRef(name))
        }
        SyntaxKind::Annotation => Ok(AnnValue::Nested(expr)),
        // A bare or dotted name can only be a constant reference.
        SyntaxKind::Identifier | SyntaxKind::Select => {
            let text = Printer::new(arena).expr(expr);
            if text.is_empty() {
                Err(fail(span, "unresolvable name"))
            } else {
                Ok(AnnValue::EnumRef(text))
            }
        }
        other => Err(fail(span, &format!("{other:?} expression"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_ast::UnitBuilder;

    const SCHEMA: AnnotationSchema = AnnotationSchema {
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

    #[test]
    fn zero_arguments_yield_schema_defaults() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "Cleanup");
        let (arena, _) = b.finish();

        let values = decode(&arena, ann, &SCHEMA).unwrap();
        for (_, option) in values.iter() {
            assert!(!option.explicit);
            assert!(option.raw.is_none());
        }
        assert_eq!(values.str_value("value"), "close");
        assert!(!values.bool_value("quietly"));
    }

    #[test]
    fn positional_argument_binds_to_value() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "Cleanup");
        let lit = b.lit_str("dispose");
        b.annotation_arg(ann, "", lit);
        let (arena, _) = b.finish();

        let values = decode(&arena, ann, &SCHEMA).unwrap();
        assert!(values.is_explicit("value"));
        assert_eq!(values.str_value("value"), "dispose");
        assert_eq!(values.get("value").unwrap().raw.as_deref(), Some("\"dispose\""));
        assert!(!values.is_explicit("quietly"));
    }

    #[test]
    fn unrecognized_options_are_retained() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "Cleanup");
        let lit = b.lit_bool(true);
        b.annotation_arg(ann, "nonsuch", lit);
        let (arena, _) = b.finish();

        let values = decode(&arena, ann, &SCHEMA).unwrap();
        assert_eq!(values.unrecognized.len(), 1);
        assert_eq!(values.unrecognized[0].0, "nonsuch");
    }

    #[test]
    fn non_constant_argument_is_a_localized_failure() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "Cleanup");
        let callee = b.ident("compute");
        let call = b.call(callee, vec![]);
        b.annotation_arg(ann, "value", call);
        let (arena, _) = b.finish();

        let err = decode(&arena, ann, &SCHEMA).unwrap_err();
        let call_span = arena.get(call).unwrap().span;
        assert_eq!(err.span, call_span);
    }

    #[test]
    fn folds_arrays_class_literals_and_negation() {
        let mut b = UnitBuilder::new("T.java", "demo");
        let class = b.class("T");
        let ann = b.annotate(class, "M");
        let one = b.lit_int(1);
        let neg = {
            let span = graft_common::Span::EMPTY;
            b.arena_mut().add_unary(UnaryOp::Neg, one, span)
        };
        let cls = b.class_literal("java.lang.Throwable");
        let arr = b.array_literal(vec![neg, cls]);
        b.annotation_arg(ann, "value", arr);
        let (arena, _) = b.finish();

        const M: AnnotationSchema = AnnotationSchema {
            options: &[OptionSpec {
                name: "value",
                default: DefaultValue::EmptyList,
            }],
        };
        let values = decode(&arena, ann, &M).unwrap();
        let list = values.get("value").unwrap().value.as_list();
        assert_eq!(list[0], &AnnValue::Int(-1));
        assert_eq!(
            list[1],
            &AnnValue::ClassRef("java.lang.Throwable".to_string())
        );
    }
}
