use serde::Deserialize;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, SourceKind, Timestamp, author_or_unknown,
    collect_metadata, decode_entities, sanitize_inline,
};

use super::{OrphanPolicy, comment_id, de, nest_comments, non_empty, pick_text};

const REDDIT_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditPost {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub self_text: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub created_utc: Timestamp,
    #[serde(default)]
    pub url: Option<String>,
    pub subreddit: String,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub score: Option<i64>,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub num_comments: Option<i64>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub comments: Vec<RedditComment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditComment {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub created_utc: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub score: Option<i64>,
    #[serde(default)]
    pub permalink: Option<String>,
    /// Reddit sends `""` instead of an empty listing.
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub replies: Vec<RedditComment>,
}

pub fn convert_posts(posts: &[RedditPost], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    posts.iter().map(|post| convert_post(post, ctx)).collect()
}

pub fn convert_post(post: &RedditPost, ctx: &ConvertContext<'_>) -> CommentThread {
    let post_id = strip_kind_prefix(&post.id);
    let mut position = 0;
    let top_level = post
        .comments
        .iter()
        .map(|comment| convert_comment(comment, post_id, None, &mut position, ctx))
        .collect();

    let mut thread = CommentThread::new(post_id, sanitize_inline(&post.title), SourceKind::Reddit);
    thread.description = pick_text(post.self_text.as_deref(), post.selftext.as_deref())
        .map(decode_entities)
        .and_then(|d| non_empty(&d));
    thread.author = author_or_unknown(post.author.as_deref().unwrap_or_default());
    thread.created_at = post.created_at.or(post.created_utc).or_epoch();
    thread.url = post
        .url
        .as_deref()
        .and_then(non_empty)
        .or_else(|| post.permalink.as_deref().map(absolute_permalink));
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("subreddit", json!(post.subreddit)),
            ("score", json!(post.score)),
            ("upvoteRatio", json!(post.upvote_ratio)),
            ("numComments", json!(post.num_comments)),
            ("permalink", json!(post.permalink)),
        ],
    );
    thread.comments = nest_comments(top_level, OrphanPolicy::Root, post_id, ctx);
    thread
}

// Nested replies keep the structure they arrived in; only the top level is
// re-nested by parent id, which covers flat exports.
fn convert_comment(
    comment: &RedditComment,
    post_id: &str,
    parent: Option<&str>,
    position: &mut usize,
    ctx: &ConvertContext<'_>,
) -> CommentNode {
    let id = comment_id(comment.id.as_deref().map(strip_kind_prefix), post_id, *position);
    *position += 1;

    let declared_parent = comment
        .parent_id
        .as_deref()
        .map(strip_kind_prefix)
        .filter(|parent_id| !parent_id.is_empty() && *parent_id != post_id);
    let mut node = CommentNode::new(
        id,
        comment.author.as_deref().unwrap_or_default(),
        decode_entities(&comment.body),
    );
    node.parent_id = parent.or(declared_parent).map(str::to_string);
    node.created_at = comment.created_at.or(comment.created_utc).or_epoch();
    node.score = comment.score;
    node.metadata = collect_metadata(
        ctx.for_analysis,
        [("permalink", json!(comment.permalink.as_deref().map(absolute_permalink)))],
    );
    let own_id = node.id.clone();
    node.replies = comment
        .replies
        .iter()
        .map(|reply| convert_comment(reply, post_id, Some(own_id.as_str()), position, ctx))
        .collect();
    node
}

/// Drops the `t1_`/`t3_` kind prefix from Reddit fullnames.
fn strip_kind_prefix(id: &str) -> &str {
    let id = id.trim();
    ["t1_", "t3_"]
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .unwrap_or(id)
}

fn absolute_permalink(permalink: &str) -> String {
    if permalink.starts_with('/') {
        format!("{REDDIT_BASE}{permalink}")
    } else {
        permalink.to_string()
    }
}
