//! `graft.PrintTree`: dump the fully transformed unit.
//!
//! Runs in its own pass after every structural handler so the dump shows
//! generated members. The rendering goes to the tracing sink and is also
//! attached to the unit's problem list as a message diagnostic, which is
//! what makes it observable in tests.

use graft_ast::printer;
use graft_common::{diagnostic_codes, Span};
use tracing::info;

use crate::dispatch::TransformContext;
use crate::registry::{Handler, HandlerError};
use crate::tree::TreeId;
use crate::values::AnnotationValues;

pub struct HandlePrintTree;

impl Handler for HandlePrintTree {
    fn handle(
        &self,
        _values: &AnnotationValues,
        site: TreeId,
        cx: &mut TransformContext<'_>,
    ) -> Result<(), HandlerError> {
        let ann_node = cx.tree.node(site);
        let span = cx.arena.get(ann_node).map(|n| n.span).unwrap_or(Span::EMPTY);

        let rendered = printer::print_unit(cx.arena, cx.unit);
        info!(file = %cx.file_name, "\n{rendered}");
        cx.message(span, diagnostic_codes::TREE_DUMP, rendered);
        Ok(())
    }
}
