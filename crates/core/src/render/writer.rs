use chrono::{DateTime, Utc};

use crate::domain::comments::{CommentNode, CommentThread};
use crate::domain::minified::{MinifiedCommentNode, MinifiedCommentThread};
use crate::types::source_kind::SourceKind;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const INDENT: &str = "  ";

pub(super) trait RenderNode: Sized {
    fn author(&self) -> &str;
    fn content(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn score(&self) -> Option<i64>;
    fn replies(&self) -> &[Self];
}

pub(super) trait RenderThread {
    type Node: RenderNode;

    fn title(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn author(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn source_type(&self) -> SourceKind;
    fn url(&self) -> Option<&str>;
    fn comments(&self) -> &[Self::Node];
}

/// Depth-first writer with an optional comment budget. Traversal keeps its own
/// stack so reply depth is bounded only by memory.
pub(super) struct ThreadWriter {
    output: String,
    remaining: Option<usize>,
    included: usize,
    threads: usize,
    slim: bool,
}

impl ThreadWriter {
    pub(super) fn new(budget: Option<usize>, slim: bool) -> Self {
        Self {
            output: String::new(),
            remaining: budget,
            included: 0,
            threads: 0,
            slim,
        }
    }

    pub(super) fn exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    pub(super) fn included(&self) -> usize {
        self.included
    }

    pub(super) fn thread<T: RenderThread>(&mut self, thread: &T) {
        if self.threads > 0 {
            self.output.push_str("---\n\n");
        }
        self.threads += 1;
        self.header(thread);

        let mut stack = vec![(thread.comments().iter(), 0)];
        while let Some((pending, depth)) = stack.last_mut() {
            if self.exhausted() {
                break;
            }
            let depth = *depth;
            let Some(node) = pending.next() else {
                stack.pop();
                continue;
            };
            self.comment(node, depth);
            stack.push((node.replies().iter(), depth + 1));
        }
    }

    pub(super) fn finish(self) -> String {
        let mut text = self.output.trim_end().to_string();
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    fn header<T: RenderThread>(&mut self, thread: &T) {
        self.output.push_str("# ");
        self.output.push_str(thread.title());
        self.output.push('\n');
        if let Some(description) = thread.description().map(str::trim).filter(|d| !d.is_empty()) {
            self.output.push_str(description);
            self.output.push('\n');
        }
        if !self.slim {
            self.line("Author: ", thread.author());
            self.line("Created: ", &thread.created_at().format(TIMESTAMP_FORMAT).to_string());
            self.line("Source: ", thread.source_type().label());
            if let Some(url) = thread.url().filter(|url| !url.trim().is_empty()) {
                self.line("URL: ", url);
            }
        }
        self.output.push_str("\n## Comments\n\n");
    }

    fn comment<N: RenderNode>(&mut self, node: &N, depth: usize) {
        let indent = INDENT.repeat(depth);
        self.output.push_str(&indent);
        self.output.push_str("**");
        self.output.push_str(node.author());
        self.output.push_str("**");
        if !self.slim {
            self.output.push_str(" (");
            self.output.push_str(&node.created_at().format(TIMESTAMP_FORMAT).to_string());
            self.output.push(')');
        }
        self.output.push_str(":\n");
        for line in node.content().lines() {
            if !line.is_empty() {
                self.output.push_str(&indent);
                self.output.push_str(line);
            }
            self.output.push('\n');
        }
        if !self.slim {
            if let Some(score) = node.score() {
                self.output.push_str(&format!("{indent}_Score: {score}_\n"));
            }
        }
        self.output.push('\n');

        self.included += 1;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
    }

    fn line(&mut self, label: &str, value: &str) {
        self.output.push_str(label);
        self.output.push_str(value);
        self.output.push('\n');
    }
}

impl RenderNode for CommentNode {
    fn author(&self) -> &str {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn score(&self) -> Option<i64> {
        self.score
    }

    fn replies(&self) -> &[Self] {
        &self.replies
    }
}

impl RenderThread for CommentThread {
    type Node = CommentNode;

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn source_type(&self) -> SourceKind {
        self.source_type
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn comments(&self) -> &[CommentNode] {
        &self.comments
    }
}

impl RenderNode for MinifiedCommentNode {
    fn author(&self) -> &str {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn score(&self) -> Option<i64> {
        self.score
    }

    fn replies(&self) -> &[Self] {
        &self.replies
    }
}

impl RenderThread for MinifiedCommentThread {
    type Node = MinifiedCommentNode;

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn source_type(&self) -> SourceKind {
        self.source_type
    }

    fn url(&self) -> Option<&str> {
        None
    }

    fn comments(&self) -> &[MinifiedCommentNode] {
        &self.comments
    }
}
