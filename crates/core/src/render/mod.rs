//! Markdown-like text rendering of comment threads for model input.

mod writer;

use serde::Serialize;

use crate::domain::comments::{CommentThread, count_nodes};
use crate::domain::minified::MinifiedCommentThread;
use writer::ThreadWriter;

pub const DEFAULT_MAX_COMMENTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    pub max_comments: usize,
    /// Drops author/date/source/url headers, comment timestamps and scores.
    pub slim: bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            max_comments: DEFAULT_MAX_COMMENTS,
            slim: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreparedText {
    pub text: String,
    /// Comment blocks actually emitted.
    pub included: usize,
    /// Comments present across all threads.
    pub total: usize,
    pub truncated: bool,
}

impl PreparedText {
    /// Raw input handed back untouched when no structure could be extracted.
    pub fn verbatim(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            ..Self::default()
        }
    }
}

pub fn truncation_note(max_comments: usize, total: usize) -> String {
    format!("_Note: analysis truncated to the first {max_comments} of {total} comments._")
}

/// Renders threads depth-first under a comment budget shared by all threads.
///
/// Each emitted comment costs one unit. A comment's replies are only visited
/// while budget remains, and no further thread is started once it is spent.
pub fn render_budgeted(threads: &[CommentThread], options: PrepareOptions) -> PreparedText {
    if threads.is_empty() {
        return PreparedText::default();
    }
    let total: usize = threads.iter().map(|thread| count_nodes(&thread.comments)).sum();
    let mut writer = ThreadWriter::new(Some(options.max_comments), options.slim);
    for thread in threads {
        if writer.exhausted() {
            break;
        }
        writer.thread(thread);
    }
    let included = writer.included();
    let truncated = total > options.max_comments;
    let mut text = writer.finish();
    if truncated {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&truncation_note(options.max_comments, total));
        text.push('\n');
    }
    PreparedText {
        text,
        included,
        total,
        truncated,
    }
}

/// Renders minified threads in full mode, without a budget.
pub fn minify_text(threads: &[MinifiedCommentThread]) -> String {
    let mut writer = ThreadWriter::new(None, false);
    for thread in threads {
        writer.thread(thread);
    }
    writer.finish()
}
