//! `graft.NoArgsConstructor` / `RequiredArgsConstructor` /
//! `AllArgsConstructor`: constructor synthesis during member building.
//!
//! These handlers run from the host's build-members callback, after field
//! lists are complete but before the implicit default constructor would be
//! committed. Their `pre_handle` runs during outline parsing and asks the
//! host to hold off on default-member synthesis for the marked type.

use graft_ast::{NodeFlags, NodeIndex};
use graft_common::{diagnostic_codes, Span};

use crate::dispatch::TransformContext;
use crate::handlers::util::{self, MemberExists};
use crate::registry::{Handler, HandlerError};
use crate::synth::{clone_subtree, inject_method, Synth};
use crate::tree::{Kind, TreeId};
use crate::values::AnnotationValues;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    NoArgs,
    RequiredArgs,
    AllArgs,
}

pub struct HandleConstructor {
    mode: Mode,
}

impl HandleConstructor {
    pub fn no_args() -> HandleConstructor {
        HandleConstructor { mode: Mode::NoArgs }
    }

    pub fn required_args() -> HandleConstructor {
        HandleConstructor {
            mode: Mode::RequiredArgs,
        }
    }

    pub fn all_args() -> HandleConstructor {
        HandleConstructor { mode: Mode::AllArgs }
    }

    fn pick_fields(&self, cx: &TransformContext<'_>, type_decl: NodeIndex) -> Vec<NodeIndex> {
        match self.mode {
            Mode::NoArgs => Vec::new(),
            Mode::AllArgs => util::instance_fields(cx.arena, type_decl),
            Mode::RequiredArgs => util::instance_fields(cx.arena, type_decl)
                .into_iter()
                .filter(|&f| {
                    let is_final = cx.arena.flags(f).contains(NodeFlags::FINAL);
                    let has_init = cx
                        .arena
                        .get_variable(f)
                        .map(|v| v.initializer.is_some())
                        .unwrap_or(false);
                    if is_final {
                        // Already-assigned finals cannot be constructor
                        // parameters.
                        return !has_init;
                    }
                    util::has_annotation_named(cx.arena, f, "NonNull")
                })
                .collect(),
        }
    }
}

impl Handler for HandleConstructor {
    fn pre_handle(
        &self,
        _values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) {
        if let Some(type_decl) = util::host_of_kind(cx, site, Kind::Type) {
            cx.suppress_default_members(type_decl);
        }
    }

    fn handle(
        &self,
        values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError> {
        let ann_node = cx.tree.node(site);
        let span = cx.arena.get(ann_node).map(|n| n.span).unwrap_or(Span::EMPTY);

        let host = cx.tree.parent(site);
        if host.map(|h| cx.tree.kind(h)) != Some(Some(Kind::Type)) {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "constructor markers are only supported on a type",
            );
            return Ok(());
        }
        let type_decl = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);

        let Some(access) = util::parse_access_level(&values.str_value("access")) else {
            // AccessLevel.NONE turns the marker off.
            return Ok(());
        };

        if util::constructor_exists(cx.arena, type_decl) == MemberExists::ExistsByGeneration {
            return Ok(());
        }

        let fields = self.pick_fields(cx, type_decl);
        let names: Vec<String> = fields
            .iter()
            .map(|&f| util::field_name(cx.arena, f))
            .collect();
        let non_null: Vec<bool> = fields
            .iter()
            .map(|&f| util::has_annotation_named(cx.arena, f, "NonNull"))
            .collect();
        let param_types: Vec<NodeIndex> = fields
            .iter()
            .map(|&f| {
                let ty = cx
                    .arena
                    .get_variable(f)
                    .map(|v| v.type_ref)
                    .unwrap_or(NodeIndex::NONE);
                clone_subtree(cx.arena, ty, ann_node)
            })
            .collect();

        let type_name = util::type_name(cx.arena, type_decl);
        let static_name = values.str_value("staticName");
        let ctor_access = if static_name.is_empty() {
            access
        } else {
            NodeFlags::PRIVATE
        };

        let ctor = build_constructor(cx, ann_node, &type_name, &names, &non_null, &param_types, ctor_access);
        inject_method(cx.arena, type_decl, ctor, ann_node);

        if !static_name.is_empty() {
            let factory_types: Vec<NodeIndex> = fields
                .iter()
                .map(|&f| {
                    let ty = cx
                        .arena
                        .get_variable(f)
                        .map(|v| v.type_ref)
                        .unwrap_or(NodeIndex::NONE);
                    clone_subtree(cx.arena, ty, ann_node)
                })
                .collect();
            let qualified = util::qualified_type_name(cx.arena, type_decl);
            let factory = build_factory(
                cx,
                ann_node,
                &qualified,
                &static_name,
                &names,
                &factory_types,
                access,
            );
            inject_method(cx.arena, type_decl, factory, ann_node);
        }

        cx.resync();
        Ok(())
    }
}

/// `<access> TypeName(<params>) { <null checks>; this.f = f; ... }`
fn build_constructor(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    type_name: &str,
    names: &[String],
    non_null: &[bool],
    param_types: &[NodeIndex],
    access: NodeFlags,
) -> NodeIndex {
    let mut s = Synth::new(cx.arena, source);
    let mut statements = Vec::new();

    for (name, &check) in names.iter().zip(non_null) {
        if !check {
            continue;
        }
        // if (f == null) throw new java.lang.NullPointerException("...");
        let param_ref = s.ident(name);
        let null = s.lit_null();
        let is_null = s.binary(graft_ast::BinaryOp::Eq, param_ref, null);
        let npe_ty = s.named_ref("java.lang.NullPointerException");
        let message = s.lit_str(&format!("{name} is marked non-null but is null"));
        let raised = s.new_(npe_ty, vec![message]);
        let thrown = s.throw_stmt(raised);
        statements.push(s.if_stmt(is_null, thrown, NodeIndex::NONE));
    }
    for name in names {
        let this = s.this_();
        let target = s.select(this, name);
        let value = s.ident(name);
        let assign = s.assign(target, value);
        statements.push(s.expr_stmt(assign));
    }

    let body = s.block(statements);
    let ctor = s.constructor(type_name, body, access);
    for (name, &ty) in names.iter().zip(param_types) {
        let param = s.parameter(ctor, name, ty);
        s.add_flags(param, NodeFlags::FINAL);
    }
    ctor
}

/// `<access> static TypeName <name>(<params>) { return new TypeName(args); }`
fn build_factory(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    qualified_type: &str,
    factory_name: &str,
    names: &[String],
    param_types: &[NodeIndex],
    access: NodeFlags,
) -> NodeIndex {
    let mut s = Synth::new(cx.arena, source);
    let new_ty = s.named_ref(qualified_type);
    let args: Vec<NodeIndex> = names.iter().map(|n| s.ident(n)).collect();
    let constructed = s.new_(new_ty, args);
    let ret = s.return_stmt(constructed);
    let body = s.block(vec![ret]);
    let return_ty = s.named_ref(qualified_type);
    let factory = s.method(factory_name, return_ty, body, access | NodeFlags::STATIC);
    for (name, &ty) in names.iter().zip(param_types) {
        let param = s.parameter(factory, name, ty);
        s.add_flags(param, NodeFlags::FINAL);
    }
    factory
}
