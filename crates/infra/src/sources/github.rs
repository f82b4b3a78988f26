//! GitHub issues (flat comment lists with optional review context) and
//! discussions (nested replies with an optional accepted answer).
//!
//! Bodies are GitHub-flavoured markdown already and are kept verbatim.

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, SourceKind, Timestamp, author_or_unknown,
    collect_metadata, sanitize_inline,
};

use super::{OrphanPolicy, comment_id, de, nest_comments, non_empty, pick_text};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubIssue {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub last_updated: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub upvotes: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "de::name_list")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub comments: Vec<GithubIssueComment>,
    // Only discussions have an accepted answer.
    #[serde(default)]
    answer_id: Option<IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubIssueComment {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub in_reply_to_id: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub code_context: Option<String>,
    #[serde(default)]
    pub diff_hunk: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub line_position: Option<i64>,
    // Issue comments are flat; nested replies mean a discussion.
    #[serde(default, deserialize_with = "de::lenient_list")]
    replies: Vec<IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubDiscussion {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub answer_id: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub comments: Vec<DiscussionComment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionComment {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub upvotes: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub upvote_count: Option<i64>,
    #[serde(default)]
    pub is_answer: bool,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub replies: Vec<DiscussionComment>,
}

impl GithubIssue {
    /// Whether the item carries structure only discussions have: an accepted
    /// answer or comments with nested replies.
    pub fn looks_like_discussion(&self) -> bool {
        self.answer_id.is_some() || self.comments.iter().any(|comment| !comment.replies.is_empty())
    }

    fn link(&self) -> Option<&str> {
        pick_text(self.url.as_deref(), self.html_url.as_deref())
    }
}

impl GithubIssueComment {
    fn text(&self) -> &str {
        pick_text(self.content.as_deref(), self.body.as_deref()).unwrap_or_default()
    }

    fn parent(&self) -> Option<&str> {
        pick_text(self.parent_id.as_deref(), self.in_reply_to_id.as_deref())
    }
}

impl DiscussionComment {
    fn text(&self) -> &str {
        pick_text(self.content.as_deref(), self.body.as_deref()).unwrap_or_default()
    }
}

pub fn convert_issues(issues: &[GithubIssue], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    issues.iter().map(|issue| convert_issue(issue, ctx)).collect()
}

pub fn convert_issue(issue: &GithubIssue, ctx: &ConvertContext<'_>) -> CommentThread {
    let nodes = issue
        .comments
        .iter()
        .enumerate()
        .map(|(position, comment)| {
            let mut node = CommentNode::new(
                comment_id(comment.id.as_deref(), &issue.id, position),
                comment.author.as_deref().unwrap_or_default(),
                comment.text().trim(),
            );
            node.parent_id = comment.parent().map(str::to_string);
            node.created_at = comment.created_at.or_epoch();
            node.metadata = collect_metadata(
                ctx.for_analysis,
                [
                    ("url", json!(pick_text(comment.url.as_deref(), comment.html_url.as_deref()))),
                    (
                        "codeContext",
                        json!(pick_text(comment.code_context.as_deref(), comment.diff_hunk.as_deref())),
                    ),
                    ("filePath", json!(pick_text(comment.file_path.as_deref(), comment.path.as_deref()))),
                    ("linePosition", json!(comment.line_position)),
                ],
            );
            node
        })
        .collect();

    let mut thread = CommentThread::new(&issue.id, sanitize_inline(&issue.title), SourceKind::GitHub);
    thread.description = issue.body.as_deref().and_then(non_empty);
    thread.author = author_or_unknown(issue.author.as_deref().unwrap_or_default());
    thread.created_at = issue.created_at.or_epoch();
    thread.url = issue.link().and_then(non_empty);
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("labels", json!((!issue.labels.is_empty()).then_some(&issue.labels))),
            ("upvotes", json!(issue.upvotes)),
            ("state", json!(issue.state)),
            ("lastUpdated", json!(issue.last_updated.or(issue.updated_at).get())),
        ],
    );
    thread.comments = nest_comments(nodes, OrphanPolicy::Root, &issue.id, ctx);
    thread
}

pub fn convert_discussions(
    discussions: &[GithubDiscussion],
    ctx: &ConvertContext<'_>,
) -> Vec<CommentThread> {
    discussions
        .iter()
        .enumerate()
        .map(|(position, discussion)| convert_discussion(discussion, position, ctx))
        .collect()
}

/// `position` is the discussion's index in its payload, used for an id when
/// neither an id nor a numbered url is present.
pub fn convert_discussion(
    discussion: &GithubDiscussion,
    position: usize,
    ctx: &ConvertContext<'_>,
) -> CommentThread {
    let thread_id = discussion
        .id
        .clone()
        .or_else(|| number_from_url(&discussion.url))
        .unwrap_or_else(|| format!("discussion-{}", position + 1));
    let answer_id = discussion.answer_id.as_deref();

    let mut counter = 0;
    let top_level: Vec<CommentNode> = discussion
        .comments
        .iter()
        .map(|comment| convert_reply(comment, &thread_id, None, answer_id, &mut counter, ctx))
        .collect();

    let mut thread = CommentThread::new(&thread_id, sanitize_inline(&discussion.title), SourceKind::GitHub);
    thread.description = discussion.body.as_deref().and_then(non_empty);
    thread.author = author_or_unknown(discussion.author.as_deref().unwrap_or_default());
    thread.created_at = discussion.created_at.or_epoch();
    thread.url = non_empty(&discussion.url);
    thread.metadata = collect_metadata(ctx.for_analysis, [("answerId", json!(discussion.answer_id))]);
    thread.comments = nest_comments(top_level, OrphanPolicy::Root, &thread_id, ctx);
    thread
}

fn convert_reply(
    comment: &DiscussionComment,
    thread_id: &str,
    parent: Option<&str>,
    answer_id: Option<&str>,
    counter: &mut usize,
    ctx: &ConvertContext<'_>,
) -> CommentNode {
    let id = comment_id(comment.id.as_deref(), thread_id, *counter);
    *counter += 1;
    let is_answer = comment.is_answer || answer_id.is_some_and(|answer| answer == id);

    let mut node = CommentNode::new(
        id,
        comment.author.as_deref().unwrap_or_default(),
        comment.text().trim(),
    );
    node.parent_id = parent.map(str::to_string);
    node.created_at = comment.created_at.or_epoch();
    node.score = comment.upvotes.or(comment.upvote_count);
    node.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("url", json!(comment.url)),
            ("isAnswer", if is_answer { json!(true) } else { json!(null) }),
        ],
    );
    let own_id = node.id.clone();
    node.replies = comment
        .replies
        .iter()
        .map(|reply| convert_reply(reply, thread_id, Some(own_id.as_str()), answer_id, counter, ctx))
        .collect();
    node
}

fn number_from_url(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    (!last.is_empty() && last.bytes().all(|b| b.is_ascii_digit())).then(|| last.to_string())
}
