//! `graft.EqualsAndHashCode`: value equality over a type's instance fields.
//!
//! Generates `equals`, `canEqual`, and `hashCode`. The `canEqual` hook
//! keeps the symmetry contract intact across subclasses that also carry
//! the marker: `a.equals(b)` asks `b.canEqual(a)` before comparing, so a
//! subclass with extra state can veto comparison against its parent type.

use graft_ast::{BinaryOp, NodeFlags, NodeIndex, Primitive, UnaryOp};
use graft_common::{diagnostic_codes, Span};

use crate::dispatch::TransformContext;
use crate::handlers::util::{
    self, FieldShape, MemberExists,
};
use crate::registry::{Handler, HandlerError};
use crate::synth::{inject_method, Synth};
use crate::tree::{Kind, TreeId};
use crate::values::AnnotationValues;

const HASH_PRIME: i64 = 31;
const TRUE_WORD: i64 = 1231;
const FALSE_WORD: i64 = 1237;
const NULL_WORD: i64 = 0;

pub struct HandleEqualsAndHashCode;

impl Handler for HandleEqualsAndHashCode {
    fn handle(
        &self,
        values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError> {
        let ann_node = cx.tree.node(site);
        let span = node_span(cx, ann_node);

        let host = cx.tree.parent(site);
        if host.map(|h| cx.tree.kind(h)) != Some(Some(Kind::Type)) {
            cx.error(
                span,
                diagnostic_codes::ILLEGAL_SITE,
                "@EqualsAndHashCode is only supported on a type",
            );
            return Ok(());
        }
        let type_decl = host.map(|h| cx.tree.node(h)).unwrap_or(NodeIndex::NONE);

        let of_explicit = values.is_explicit("of");
        let exclude_explicit = values.is_explicit("exclude");
        if of_explicit && exclude_explicit {
            cx.warning(
                values.span_of("exclude").unwrap_or(span),
                diagnostic_codes::BAD_OPTIONS,
                "'of' and 'exclude' are mutually exclusive; the 'exclude' parameter will be ignored",
            );
        }

        let has_superclass = cx
            .arena
            .get_type_decl(type_decl)
            .map(|d| d.extends.is_some())
            .unwrap_or(false);
        let mut call_super = values.bool_value("callSuper");
        if call_super && !has_superclass {
            cx.error(
                values.span_of("callSuper").unwrap_or(span),
                diagnostic_codes::BAD_OPTIONS,
                "generating equals/hashCode with a supercall to java.lang.Object is pointless",
            );
            return Ok(());
        }
        if !values.is_explicit("callSuper") && has_superclass {
            cx.warning(
                span,
                diagnostic_codes::BAD_OPTIONS,
                "generating equals/hashCode without a call to the superclass, \
                 even though this class extends another; add callSuper=false if intentional",
            );
            call_super = false;
        }

        let fields = select_fields(values, of_explicit, exclude_explicit, type_decl, span, cx);

        let mut seen_generated = false;
        for name in ["equals", "hashCode", "canEqual"] {
            match util::method_exists(cx.arena, type_decl, name) {
                MemberExists::ExistsByUser => {
                    cx.warning(
                        span,
                        diagnostic_codes::MEMBER_EXISTS,
                        "not generating equals and hashCode: a method with one of those names already exists",
                    );
                    return Ok(());
                }
                MemberExists::ExistsByGeneration => seen_generated = true,
                MemberExists::NotExists => {}
            }
        }
        if seen_generated {
            return Ok(());
        }

        let type_name = util::qualified_type_name(cx.arena, type_decl);

        // The symmetry hook only matters when a subclass could exist or the
        // type already sits in an equality hierarchy of its own.
        let is_final = cx
            .arena
            .flags(type_decl)
            .contains(NodeFlags::FINAL);
        let needs_can_equal = !is_final || has_superclass;

        let equals = generate_equals(cx, ann_node, &type_name, &fields, call_super, needs_can_equal);
        inject_method(cx.arena, type_decl, equals, ann_node);

        if needs_can_equal {
            let can_equal = generate_can_equal(cx, ann_node, &type_name);
            inject_method(cx.arena, type_decl, can_equal, ann_node);
        }

        let hash_code = generate_hash_code(cx, ann_node, &fields, call_super);
        inject_method(cx.arena, type_decl, hash_code, ann_node);

        cx.resync();
        Ok(())
    }
}

fn node_span(cx: &TransformContext<'_>, node: NodeIndex) -> Span {
    cx.arena.get(node).map(|n| n.span).unwrap_or(Span::EMPTY)
}

/// Apply `of`/`exclude` to the instance field list. Unknown names are
/// warnings, not errors; the rest of the generation proceeds.
fn select_fields(
    values: &AnnotationValues,
    of_explicit: bool,
    exclude_explicit: bool,
    type_decl: NodeIndex,
    span: Span,
    cx: &mut TransformContext<'_>,
) -> Vec<NodeIndex> {
    let all = util::instance_fields(cx.arena, type_decl);
    if of_explicit {
        let wanted = values.string_list("of");
        let mut picked = Vec::with_capacity(wanted.len());
        for name in &wanted {
            match all
                .iter()
                .find(|&&f| util::field_name(cx.arena, f) == *name)
            {
                Some(&f) => picked.push(f),
                None => cx.warning(
                    values.span_of("of").unwrap_or(span),
                    diagnostic_codes::BAD_OPTIONS,
                    format!("'of' names a field that does not exist: {name}"),
                ),
            }
        }
        return picked;
    }
    if exclude_explicit {
        let excluded = values.string_list("exclude");
        for name in &excluded {
            if !all
                .iter()
                .any(|&f| util::field_name(cx.arena, f) == *name)
            {
                cx.warning(
                    values.span_of("exclude").unwrap_or(span),
                    diagnostic_codes::BAD_OPTIONS,
                    format!("'exclude' names a field that does not exist: {name}"),
                );
            }
        }
        return all
            .into_iter()
            .filter(|&f| !excluded.contains(&util::field_name(cx.arena, f)))
            .collect();
    }
    all
}

fn generate_hash_code(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    fields: &[NodeIndex],
    call_super: bool,
) -> NodeIndex {
    let shapes: Vec<(String, FieldShape)> = fields
        .iter()
        .map(|&f| (util::field_name(cx.arena, f), util::field_shape(cx.arena, f)))
        .collect();

    let mut s = Synth::new(cx.arena, source);
    let mut statements = Vec::new();

    // final int PRIME = 31;
    let int_ty = s.primitive(Primitive::Int);
    let prime_init = s.lit_int(HASH_PRIME);
    let prime = s.local("PRIME", int_ty, prime_init);
    s.add_flags(prime, NodeFlags::FINAL);
    statements.push(prime);

    // int result = 1;
    let int_ty = s.primitive(Primitive::Int);
    let one = s.lit_int(1);
    let result = s.local("result", int_ty, one);
    statements.push(result);

    if call_super {
        let sup = s.super_();
        let callee = s.select(sup, "hashCode");
        let call = s.call(callee, vec![]);
        statements.push(mix_into_result(&mut s, call));
    }

    for (name, shape) in &shapes {
        match shape {
            FieldShape::Primitive(Primitive::Boolean) => {
                let this_f = this_field(&mut s, name);
                let t = s.lit_int(TRUE_WORD);
                let f = s.lit_int(FALSE_WORD);
                let pick = s.conditional(this_f, t, f);
                statements.push(mix_into_result(&mut s, pick));
            }
            FieldShape::Primitive(Primitive::Long) => {
                let temp = format!("${name}");
                let long_ty = s.primitive(Primitive::Long);
                let this_f = this_field(&mut s, name);
                let local = s.local(&temp, long_ty, this_f);
                s.add_flags(local, NodeFlags::FINAL);
                statements.push(local);
                statements.push(fold_long_words(&mut s, &temp));
            }
            FieldShape::Primitive(Primitive::Double) => {
                // final long $f = java.lang.Double.doubleToLongBits(this.f);
                let temp = format!("${name}");
                let long_ty = s.primitive(Primitive::Long);
                let callee = s.dotted("java.lang.Double.doubleToLongBits");
                let this_f = this_field(&mut s, name);
                let bits = s.call(callee, vec![this_f]);
                let local = s.local(&temp, long_ty, bits);
                s.add_flags(local, NodeFlags::FINAL);
                statements.push(local);
                statements.push(fold_long_words(&mut s, &temp));
            }
            FieldShape::Primitive(Primitive::Float) => {
                let callee = s.dotted("java.lang.Float.floatToIntBits");
                let this_f = this_field(&mut s, name);
                let bits = s.call(callee, vec![this_f]);
                statements.push(mix_into_result(&mut s, bits));
            }
            FieldShape::Primitive(_) => {
                let this_f = this_field(&mut s, name);
                statements.push(mix_into_result(&mut s, this_f));
            }
            FieldShape::Array { deep } => {
                let helper = if *deep {
                    "java.util.Arrays.deepHashCode"
                } else {
                    "java.util.Arrays.hashCode"
                };
                let callee = s.dotted(helper);
                let this_f = this_field(&mut s, name);
                let hashed = s.call(callee, vec![this_f]);
                statements.push(mix_into_result(&mut s, hashed));
            }
            FieldShape::Reference => {
                // final java.lang.Object $f = this.f;
                let temp = format!("${name}");
                let obj_ty = s.named_ref("java.lang.Object");
                let this_f = this_field(&mut s, name);
                let local = s.local(&temp, obj_ty, this_f);
                s.add_flags(local, NodeFlags::FINAL);
                statements.push(local);
                // result = result * PRIME + ($f == null ? 0 : $f.hashCode());
                let temp_ref = s.ident(&temp);
                let null = s.lit_null();
                let is_null = s.binary(BinaryOp::Eq, temp_ref, null);
                let null_word = s.lit_int(NULL_WORD);
                let temp_ref = s.ident(&temp);
                let callee = s.select(temp_ref, "hashCode");
                let hashed = s.call(callee, vec![]);
                let pick = s.conditional(is_null, null_word, hashed);
                statements.push(mix_into_result(&mut s, pick));
            }
        }
    }

    let result_ref = s.ident("result");
    statements.push(s.return_stmt(result_ref));

    let body = s.block(statements);
    let int_ty = s.primitive(Primitive::Int);
    s.method("hashCode", int_ty, body, NodeFlags::PUBLIC)
}

/// `result = result * PRIME + <expr>;`
fn mix_into_result(s: &mut Synth<'_>, expr: NodeIndex) -> NodeIndex {
    let result_ref = s.ident("result");
    let prime_ref = s.ident("PRIME");
    let product = s.binary(BinaryOp::Mul, result_ref, prime_ref);
    let sum = s.binary(BinaryOp::Plus, product, expr);
    let result_ref = s.ident("result");
    let assign = s.assign(result_ref, sum);
    s.expr_stmt(assign)
}

/// `result = result * PRIME + (int) ($f >>> 32 ^ $f);`
fn fold_long_words(s: &mut Synth<'_>, temp: &str) -> NodeIndex {
    let temp_ref = s.ident(temp);
    let thirty_two = s.lit_int(32);
    let high = s.binary(BinaryOp::Ushr, temp_ref, thirty_two);
    let temp_ref = s.ident(temp);
    let mixed = s.binary(BinaryOp::BitXor, high, temp_ref);
    let int_ty = s.primitive(Primitive::Int);
    let narrowed = s.cast(int_ty, mixed);
    mix_into_result(s, narrowed)
}

fn generate_equals(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    type_name: &str,
    fields: &[NodeIndex],
    call_super: bool,
    via_can_equal: bool,
) -> NodeIndex {
    let shapes: Vec<(String, FieldShape)> = fields
        .iter()
        .map(|&f| (util::field_name(cx.arena, f), util::field_shape(cx.arena, f)))
        .collect();

    let mut s = Synth::new(cx.arena, source);
    let mut statements = Vec::new();

    // if (o == this) return true;
    let o = s.ident("o");
    let this = s.this_();
    let same = s.binary(BinaryOp::Eq, o, this);
    let ret_true = {
        let t = s.lit_bool(true);
        s.return_stmt(t)
    };
    statements.push(s.if_stmt(same, ret_true, NodeIndex::NONE));

    // if (!(o instanceof TypeName)) return false;
    let o = s.ident("o");
    let ty = s.named_ref(type_name);
    let is_instance = s.instanceof(o, ty);
    let not_instance = s.unary(UnaryOp::Not, is_instance);
    let ret_false = return_false(&mut s);
    statements.push(s.if_stmt(not_instance, ret_false, NodeIndex::NONE));

    // final TypeName other = (TypeName) o;
    let ty = s.named_ref(type_name);
    let cast_ty = s.named_ref(type_name);
    let o = s.ident("o");
    let narrowed = s.cast(cast_ty, o);
    let other = s.local("other", ty, narrowed);
    s.add_flags(other, NodeFlags::FINAL);
    statements.push(other);

    if via_can_equal {
        // if (!other.canEqual((java.lang.Object) this)) return false;
        let other_ref = s.ident("other");
        let callee = s.select(other_ref, "canEqual");
        let obj_ty = s.named_ref("java.lang.Object");
        let this = s.this_();
        let widened = s.cast(obj_ty, this);
        let asks = s.call(callee, vec![widened]);
        let vetoed = s.unary(UnaryOp::Not, asks);
        let ret_false = return_false(&mut s);
        statements.push(s.if_stmt(vetoed, ret_false, NodeIndex::NONE));
    }

    if call_super {
        // if (!super.equals(o)) return false;
        let sup = s.super_();
        let callee = s.select(sup, "equals");
        let o = s.ident("o");
        let call = s.call(callee, vec![o]);
        let differs = s.unary(UnaryOp::Not, call);
        let ret_false = return_false(&mut s);
        statements.push(s.if_stmt(differs, ret_false, NodeIndex::NONE));
    }

    for (name, shape) in &shapes {
        match shape {
            FieldShape::Primitive(Primitive::Float) => {
                statements.push(compare_via(&mut s, "java.lang.Float.compare", name));
            }
            FieldShape::Primitive(Primitive::Double) => {
                statements.push(compare_via(&mut s, "java.lang.Double.compare", name));
            }
            FieldShape::Primitive(_) => {
                // if (this.f != other.f) return false;
                let this_f = this_field(&mut s, name);
                let other_f = other_field(&mut s, name);
                let differs = s.binary(BinaryOp::Ne, this_f, other_f);
                let ret_false = return_false(&mut s);
                statements.push(s.if_stmt(differs, ret_false, NodeIndex::NONE));
            }
            FieldShape::Array { deep } => {
                let helper = if *deep {
                    "java.util.Arrays.deepEquals"
                } else {
                    "java.util.Arrays.equals"
                };
                let callee = s.dotted(helper);
                let this_f = this_field(&mut s, name);
                let other_f = other_field(&mut s, name);
                let same = s.call(callee, vec![this_f, other_f]);
                let differs = s.unary(UnaryOp::Not, same);
                let ret_false = return_false(&mut s);
                statements.push(s.if_stmt(differs, ret_false, NodeIndex::NONE));
            }
            FieldShape::Reference => {
                // final java.lang.Object this$f = this.f;
                let this_temp = format!("this${name}");
                let other_temp = format!("other${name}");
                let obj_ty = s.named_ref("java.lang.Object");
                let this_f = this_field(&mut s, name);
                let l1 = s.local(&this_temp, obj_ty, this_f);
                s.add_flags(l1, NodeFlags::FINAL);
                statements.push(l1);
                let obj_ty = s.named_ref("java.lang.Object");
                let other_f = other_field(&mut s, name);
                let l2 = s.local(&other_temp, obj_ty, other_f);
                s.add_flags(l2, NodeFlags::FINAL);
                statements.push(l2);
                // if (this$f == null ? other$f != null : !this$f.equals(other$f)) return false;
                let a = s.ident(&this_temp);
                let null = s.lit_null();
                let a_null = s.binary(BinaryOp::Eq, a, null);
                let b = s.ident(&other_temp);
                let null = s.lit_null();
                let b_not_null = s.binary(BinaryOp::Ne, b, null);
                let a = s.ident(&this_temp);
                let callee = s.select(a, "equals");
                let b = s.ident(&other_temp);
                let eq_call = s.call(callee, vec![b]);
                let not_eq = s.unary(UnaryOp::Not, eq_call);
                let differs = s.conditional(a_null, b_not_null, not_eq);
                let ret_false = return_false(&mut s);
                statements.push(s.if_stmt(differs, ret_false, NodeIndex::NONE));
            }
        }
    }

    let t = s.lit_bool(true);
    statements.push(s.return_stmt(t));

    let body = s.block(statements);
    let bool_ty = s.primitive(Primitive::Boolean);
    let method = s.method("equals", bool_ty, body, NodeFlags::PUBLIC);
    let obj_ty = s.named_ref("java.lang.Object");
    let param = s.parameter(method, "o", obj_ty);
    s.add_flags(param, NodeFlags::FINAL);
    method
}

/// `if (Helper.compare(this.f, other.f) != 0) return false;`
fn compare_via(s: &mut Synth<'_>, helper: &str, name: &str) -> NodeIndex {
    let callee = s.dotted(helper);
    let this_f = this_field(s, name);
    let other_f = other_field(s, name);
    let cmp = s.call(callee, vec![this_f, other_f]);
    let zero = s.lit_int(0);
    let differs = s.binary(BinaryOp::Ne, cmp, zero);
    let ret_false = return_false(s);
    s.if_stmt(differs, ret_false, NodeIndex::NONE)
}

fn generate_can_equal(
    cx: &mut TransformContext<'_>,
    source: NodeIndex,
    type_name: &str,
) -> NodeIndex {
    let mut s = Synth::new(cx.arena, source);
    let other = s.ident("other");
    let ty = s.named_ref(type_name);
    let check = s.instanceof(other, ty);
    let ret = s.return_stmt(check);
    let body = s.block(vec![ret]);
    let bool_ty = s.primitive(Primitive::Boolean);
    let method = s.method("canEqual", bool_ty, body, NodeFlags::PROTECTED);
    let obj_ty = s.named_ref("java.lang.Object");
    let param = s.parameter(method, "other", obj_ty);
    s.add_flags(param, NodeFlags::FINAL);
    method
}

fn this_field(s: &mut Synth<'_>, name: &str) -> NodeIndex {
    let this = s.this_();
    s.select(this, name)
}

fn other_field(s: &mut Synth<'_>, name: &str) -> NodeIndex {
    let other = s.ident("other");
    s.select(other, name)
}

fn return_false(s: &mut Synth<'_>) -> NodeIndex {
    let f = s.lit_bool(false);
    s.return_stmt(f)
}
