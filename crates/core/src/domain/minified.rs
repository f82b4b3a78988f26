use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::comments::{CommentNode, CommentThread};
use crate::types::source_kind::SourceKind;

/// A [`CommentThread`] without identifiers, URLs or metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifiedCommentThread {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub source_type: SourceKind,
    pub comments: Vec<MinifiedCommentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifiedCommentNode {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<MinifiedCommentNode>,
}

pub fn minify(thread: &CommentThread) -> MinifiedCommentThread {
    MinifiedCommentThread {
        title: thread.title.clone(),
        description: thread.description.clone(),
        author: thread.author.clone(),
        created_at: thread.created_at,
        source_type: thread.source_type,
        comments: minify_nodes(&thread.comments),
    }
}

pub fn minify_all(threads: &[CommentThread]) -> Vec<MinifiedCommentThread> {
    threads.iter().map(minify).collect()
}

// A node waiting for its replies, the replies still to visit, and the ones
// already minified. The bottom frame has no node.
type Frame<'a> = (
    Option<MinifiedCommentNode>,
    std::slice::Iter<'a, CommentNode>,
    Vec<MinifiedCommentNode>,
);

fn minify_nodes(nodes: &[CommentNode]) -> Vec<MinifiedCommentNode> {
    let mut stack: Vec<Frame<'_>> = vec![(None, nodes.iter(), Vec::new())];
    while let Some((_, pending, _)) = stack.last_mut() {
        if let Some(node) = pending.next() {
            stack.push((Some(minify_node(node)), node.replies.iter(), Vec::new()));
            continue;
        }
        let Some((owner, _, replies)) = stack.pop() else {
            break;
        };
        let Some(mut owner) = owner else {
            return replies;
        };
        owner.replies = replies;
        if let Some((_, _, siblings)) = stack.last_mut() {
            siblings.push(owner);
        }
    }
    Vec::new()
}

fn minify_node(node: &CommentNode) -> MinifiedCommentNode {
    MinifiedCommentNode {
        author: node.author.clone(),
        content: node.content.clone(),
        created_at: node.created_at,
        score: node.score,
        replies: Vec::new(),
    }
}

impl Drop for MinifiedCommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}
