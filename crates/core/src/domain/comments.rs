use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::source_kind::SourceKind;

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Platform-specific extras keyed by name. Ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub replies: Vec<CommentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
    pub source_type: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub comments: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(id: impl Into<String>, author: &str, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            author: author_or_unknown(author),
            content: content.into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            score: None,
            metadata: None,
            replies: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + count_nodes(&self.replies)
    }
}

// Reply chains can be as deep as the input is long, so the tree is torn down
// with a work list instead of recursive drop glue.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl CommentThread {
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_type: SourceKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            author: UNKNOWN_AUTHOR.to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            url: None,
            source_type,
            metadata: None,
            comments: Vec::new(),
        }
    }

    pub fn total_comments(&self) -> usize {
        count_nodes(&self.comments)
    }
}

pub fn count_nodes(nodes: &[CommentNode]) -> usize {
    let mut pending = vec![nodes];
    let mut count = 0;
    while let Some(level) = pending.pop() {
        count += level.len();
        pending.extend(level.iter().map(|node| node.replies.as_slice()));
    }
    count
}

pub fn author_or_unknown(author: &str) -> String {
    let trimmed = author.trim();
    if trimmed.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Collects metadata entries, dropping nulls. Returns `None` in for-analysis
/// mode or when nothing is left.
pub fn collect_metadata<I>(for_analysis: bool, entries: I) -> Option<Metadata>
where
    I: IntoIterator<Item = (&'static str, serde_json::Value)>,
{
    if for_analysis {
        return None;
    }
    let metadata: Metadata = entries
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn counts_nested_replies() {
        let mut root = CommentNode::new("a", "alice", "root");
        let mut child = CommentNode::new("b", "bob", "child");
        child.replies.push(CommentNode::new("c", "carol", "grandchild"));
        root.replies.push(child);
        root.replies.push(CommentNode::new("d", "dave", "sibling"));
        assert_eq!(root.count(), 4);

        let mut thread = CommentThread::new("t", "Title", SourceKind::Reddit);
        thread.comments.push(root);
        thread.comments.push(CommentNode::new("e", "", "another root"));
        assert_eq!(thread.total_comments(), 5);
        assert_eq!(thread.comments[1].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn metadata_omitted_for_analysis_or_when_empty() {
        assert!(collect_metadata(true, [("score", json!(3))]).is_none());
        assert!(collect_metadata(false, [("score", json!(null))]).is_none());
        let metadata = collect_metadata(false, [("score", json!(3)), ("tag", json!(null))]).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["score"], json!(3));
    }

    #[test]
    fn serializes_camel_case_without_absent_metadata() {
        let thread = CommentThread::new("t1", "Title", SourceKind::GitHub);
        let value = serde_json::to_value(&thread).unwrap();
        assert_eq!(value["sourceType"], json!("GitHub"));
        assert!(value.get("metadata").is_none());
        assert_eq!(value["createdAt"], json!("1970-01-01T00:00:00Z"));
    }
}
