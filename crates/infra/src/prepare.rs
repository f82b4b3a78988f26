use threadscribe_core::{ConvertContext, PrepareOptions, PreparedText, render_budgeted};
use tracing::debug;

use crate::dispatch::{SourcePayload, dispatch, dispatch_json};

/// Converts a typed payload and renders it under the comment budget.
pub fn prepare(
    data: Option<&SourcePayload>,
    options: PrepareOptions,
    ctx: &ConvertContext<'_>,
) -> PreparedText {
    let Some(payload) = data else {
        return PreparedText::default();
    };
    let threads = dispatch(payload, ctx);
    let prepared = render_budgeted(&threads, options);
    log_counts(&prepared);
    prepared
}

/// Like [`prepare`] for raw JSON. When nothing can be extracted the input is
/// returned verbatim so the caller still has something to show.
pub fn prepare_json(
    json: &str,
    type_hint: &str,
    options: PrepareOptions,
    ctx: &ConvertContext<'_>,
) -> PreparedText {
    let threads = dispatch_json(json, type_hint, ctx);
    if threads.is_empty() {
        ctx.debug(format_args!("no threads extracted for hint {type_hint:?}; passing input through"));
        return PreparedText::verbatim(json);
    }
    let prepared = render_budgeted(&threads, options);
    log_counts(&prepared);
    prepared
}

fn log_counts(prepared: &PreparedText) {
    debug!(
        included = prepared.included,
        total = prepared.total,
        truncated = prepared.truncated,
        "prepared comments"
    );
}
