//! Social posts exported as a flat list of tweets linked by `parentId`.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, ORPHAN_MARKER, SourceKind, Timestamp,
    author_or_unknown, build_forest, collect_metadata, decode_entities,
};

use super::{de, non_empty, pick_text};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub in_reply_to_id: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp_utc: Timestamp,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub like_count: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub repost_count: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub retweet_count: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SocialPost {
    fn display_name(&self) -> &str {
        self.author
            .as_deref()
            .or(self.handle.as_deref())
            .unwrap_or_default()
    }

    fn parent(&self) -> Option<&str> {
        pick_text(self.parent_id.as_deref(), self.in_reply_to_id.as_deref())
    }

    fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    fn body(&self) -> &str {
        pick_text(self.content.as_deref(), self.text.as_deref()).unwrap_or_default()
    }

    fn posted_at(&self) -> Timestamp {
        self.timestamp_utc.or(self.created_at)
    }

    fn reposts(&self) -> Option<i64> {
        self.repost_count.or(self.retweet_count)
    }
}

/// Every post without a parent starts a thread; replies are attached by
/// walking parent links down from each root. Posts left over (a missing parent
/// or a parent cycle) are appended to the first thread.
pub fn convert_posts(posts: &[SocialPost], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    let mut seen = HashSet::new();
    let posts: Vec<&SocialPost> = posts.iter().filter(|post| seen.insert(post.id.as_str())).collect();
    let known: HashSet<&str> = posts.iter().map(|post| post.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&SocialPost>> = HashMap::new();
    for &post in &posts {
        if let Some(parent) = post.parent() {
            children.entry(parent).or_default().push(post);
        }
    }
    let mut visited: HashSet<&str> = HashSet::new();

    let mut threads = Vec::new();
    for &root in posts.iter().filter(|post| post.is_root()) {
        visited.insert(root.id.as_str());
        let mut thread = root_thread(root, ctx);
        let replies = children.get(root.id.as_str()).map(Vec::as_slice).unwrap_or_default();
        let nodes = descendants(replies, &children, &mut visited)
            .into_iter()
            .map(|post| post_node(post, ctx))
            .collect();
        thread.comments = build_forest(nodes).roots;
        threads.push(thread);
    }

    let mut stray = Vec::new();
    for &post in &posts {
        if visited.contains(post.id.as_str()) {
            continue;
        }
        let mut nodes: Vec<CommentNode> = descendants(&[post], &children, &mut visited)
            .into_iter()
            .map(|post| post_node(post, ctx))
            .collect();
        let parent_known = post
            .parent()
            .is_some_and(|parent| known.contains(parent));
        if let Some(first) = nodes.first_mut().filter(|_| !parent_known) {
            first.content.insert_str(0, ORPHAN_MARKER);
        }
        stray.extend(build_forest(nodes).roots);
    }
    if stray.is_empty() {
        return threads;
    }

    ctx.debug(format_args!(
        "twitter: {} posts not reachable from a root post",
        stray.len()
    ));
    match threads.first_mut() {
        Some(thread) => thread.comments.extend(stray),
        None => {
            let anchor = stray[0].parent_id.clone().unwrap_or_else(|| stray[0].id.clone());
            let mut thread =
                CommentThread::new(&anchor, format!("Conversation {anchor}"), SourceKind::Twitter);
            thread.comments = stray;
            threads.push(thread);
        }
    }
    threads
}

fn root_thread(post: &SocialPost, ctx: &ConvertContext<'_>) -> CommentThread {
    let author = author_or_unknown(post.display_name());
    let mut thread = CommentThread::new(&post.id, format!("Post by {author}"), SourceKind::Twitter);
    thread.description = non_empty(&decode_entities(post.body()));
    thread.author = author;
    thread.created_at = post.posted_at().or_epoch();
    thread.url = post.url.as_deref().and_then(non_empty);
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("handle", json!(post.handle)),
            ("likeCount", json!(post.like_count)),
            ("repostCount", json!(post.reposts())),
        ],
    );
    thread
}

fn post_node(post: &SocialPost, ctx: &ConvertContext<'_>) -> CommentNode {
    let mut node = CommentNode::new(&post.id, post.display_name(), decode_entities(post.body()));
    node.parent_id = post.parent().map(str::to_string);
    node.created_at = post.posted_at().or_epoch();
    node.score = post.like_count;
    node.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("handle", json!(post.handle)),
            ("repostCount", json!(post.reposts())),
            ("url", json!(post.url)),
        ],
    );
    node
}

// `start` and every reply below it in pre-order, skipping posts already placed.
fn descendants<'a>(
    start: &[&'a SocialPost],
    children: &HashMap<&str, Vec<&'a SocialPost>>,
    visited: &mut HashSet<&'a str>,
) -> Vec<&'a SocialPost> {
    let mut stack: Vec<&SocialPost> = start.iter().rev().copied().collect();
    let mut ordered = Vec::new();
    while let Some(post) = stack.pop() {
        if !visited.insert(post.id.as_str()) {
            continue;
        }
        ordered.push(post);
        if let Some(replies) = children.get(post.id.as_str()) {
            stack.extend(replies.iter().rev().copied());
        }
    }
    ordered
}
