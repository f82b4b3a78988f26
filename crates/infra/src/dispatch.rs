//! Routes payloads to the matching platform adapter.
//!
//! Typed callers build a [`SourcePayload`] and call [`dispatch`]. Callers that
//! only hold JSON and a source hint go through [`dispatch_json`], which tries
//! the candidate shapes for the hint in order and takes the first one that
//! parses to a non-empty list. Parse failures are logged, never returned.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use threadscribe_core::{CommentThread, ConvertContext, SourceKind};
use tracing::debug;

use crate::sources::blog::{self, BlogArticle};
use crate::sources::github::{self, GithubDiscussion, GithubIssue};
use crate::sources::hackernews::{self, HackerNewsItem};
use crate::sources::reddit::{self, RedditPost};
use crate::sources::twitter::{self, SocialPost};
use crate::sources::youtube::{self, YoutubeVideo};

/// Hint that asks for shape detection instead of naming a platform.
pub const AUTO_HINT: &str = "auto";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has no items")]
    Empty,
}

#[derive(Debug, Clone)]
pub enum SourcePayload {
    YouTube(Vec<YoutubeVideo>),
    Reddit(Vec<RedditPost>),
    GithubIssues(Vec<GithubIssue>),
    GithubDiscussions(Vec<GithubDiscussion>),
    HackerNews(Vec<HackerNewsItem>),
    Twitter(Vec<SocialPost>),
    Blog(Vec<BlogArticle>),
}

impl SourcePayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePayload::YouTube(_) => SourceKind::YouTube,
            SourcePayload::Reddit(_) => SourceKind::Reddit,
            SourcePayload::GithubIssues(_) | SourcePayload::GithubDiscussions(_) => SourceKind::GitHub,
            SourcePayload::HackerNews(_) => SourceKind::HackerNews,
            SourcePayload::Twitter(_) => SourceKind::Twitter,
            SourcePayload::Blog(_) => SourceKind::Blog,
        }
    }

    /// Number of top-level items in the payload.
    pub fn len(&self) -> usize {
        match self {
            SourcePayload::YouTube(items) => items.len(),
            SourcePayload::Reddit(items) => items.len(),
            SourcePayload::GithubIssues(items) => items.len(),
            SourcePayload::GithubDiscussions(items) => items.len(),
            SourcePayload::HackerNews(items) => items.len(),
            SourcePayload::Twitter(items) => items.len(),
            SourcePayload::Blog(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn dispatch(payload: &SourcePayload, ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    let threads = match payload {
        SourcePayload::YouTube(videos) => youtube::convert_videos(videos, ctx),
        SourcePayload::Reddit(posts) => reddit::convert_posts(posts, ctx),
        SourcePayload::GithubIssues(issues) => github::convert_issues(issues, ctx),
        SourcePayload::GithubDiscussions(discussions) => github::convert_discussions(discussions, ctx),
        SourcePayload::HackerNews(items) => hackernews::convert_items(items, ctx),
        SourcePayload::Twitter(posts) => twitter::convert_posts(posts, ctx),
        SourcePayload::Blog(articles) => blog::convert_articles(articles, ctx),
    };
    debug!(source = %payload.kind(), items = payload.len(), threads = threads.len(), "dispatched payload");
    threads
}

/// Parses `json` according to `type_hint` and converts it. Unknown hints,
/// malformed JSON and unrecognized shapes all yield no threads.
pub fn dispatch_json(json: &str, type_hint: &str, ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    let hint = type_hint.trim().to_ascii_lowercase();
    let payload = if hint.is_empty() || hint == AUTO_HINT {
        detect_payload(json, ctx)
    } else {
        match hint.parse::<SourceKind>() {
            Ok(kind) => parse_payload(json, kind, ctx),
            Err(err) => {
                ctx.debug(format_args!("{err}"));
                None
            }
        }
    };
    payload.map(|payload| dispatch(&payload, ctx)).unwrap_or_default()
}

/// Parses `json` as one of the shapes `kind` can take. GitHub payloads are
/// tried as issues first, then as discussions.
pub fn parse_payload(json: &str, kind: SourceKind, ctx: &ConvertContext<'_>) -> Option<SourcePayload> {
    let value = parse_value(json, ctx)?;
    Shape::for_kind(kind)
        .iter()
        .find_map(|shape| shape.parse(&value, ctx))
}

/// Tries every shape in a fixed priority order. Shapes with marker keys are
/// only tried when the first item carries one of them, since several shapes
/// share the same required fields.
pub fn detect_payload(json: &str, ctx: &ConvertContext<'_>) -> Option<SourcePayload> {
    let value = parse_value(json, ctx)?;
    let first = match &value {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    let Some(Value::Object(first)) = first else {
        ctx.debug("payload is not an object or a list of objects");
        return None;
    };
    let payload = AUTO_ORDER
        .iter()
        .filter(|(_, markers)| markers.is_empty() || markers.iter().any(|key| first.contains_key(*key)))
        .find_map(|(shape, _)| shape.parse(&value, ctx));
    if let Some(payload) = &payload {
        ctx.debug(format_args!("detected {} payload", payload.kind()));
    }
    payload
}

fn parse_value(json: &str, ctx: &ConvertContext<'_>) -> Option<Value> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(err) => {
            ctx.debug(PayloadError::from(err));
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    YouTube,
    Reddit,
    GithubIssues,
    GithubDiscussions,
    HackerNews,
    Twitter,
    Blog,
}

const AUTO_ORDER: &[(Shape, &[&str])] = &[
    (Shape::HackerNews, &["type", "kids"]),
    (Shape::Reddit, &["subreddit"]),
    (Shape::Blog, &["responses", "claps", "subtitle"]),
    (Shape::YouTube, &["channelTitle", "viewCount"]),
    (Shape::GithubIssues, &[]),
    (Shape::GithubDiscussions, &[]),
    (Shape::Twitter, &[]),
];

impl Shape {
    fn for_kind(kind: SourceKind) -> &'static [Shape] {
        match kind {
            SourceKind::YouTube => &[Shape::YouTube],
            SourceKind::Reddit => &[Shape::Reddit],
            SourceKind::GitHub => &[Shape::GithubIssues, Shape::GithubDiscussions],
            SourceKind::HackerNews => &[Shape::HackerNews],
            SourceKind::Twitter => &[Shape::Twitter],
            SourceKind::Blog => &[Shape::Blog],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Shape::YouTube => "youtube",
            Shape::Reddit => "reddit",
            Shape::GithubIssues => "github issues",
            Shape::GithubDiscussions => "github discussions",
            Shape::HackerNews => "hackernews",
            Shape::Twitter => "twitter",
            Shape::Blog => "blog",
        }
    }

    fn parse(self, value: &Value, ctx: &ConvertContext<'_>) -> Option<SourcePayload> {
        match self {
            Shape::YouTube => self.attempt(value, ctx).map(SourcePayload::YouTube),
            Shape::Reddit => self.attempt(value, ctx).map(SourcePayload::Reddit),
            Shape::GithubIssues => self
                .attempt::<GithubIssue>(value, ctx)
                .filter(|issues| {
                    let discussion = issues.iter().any(GithubIssue::looks_like_discussion);
                    if discussion {
                        ctx.debug("github issues shape rejected: items carry replies or an accepted answer");
                    }
                    !discussion
                })
                .map(SourcePayload::GithubIssues),
            Shape::GithubDiscussions => self.attempt(value, ctx).map(SourcePayload::GithubDiscussions),
            Shape::HackerNews => self.attempt(value, ctx).map(SourcePayload::HackerNews),
            Shape::Twitter => self.attempt(value, ctx).map(SourcePayload::Twitter),
            Shape::Blog => self.attempt(value, ctx).map(SourcePayload::Blog),
        }
    }

    fn attempt<T: DeserializeOwned>(self, value: &Value, ctx: &ConvertContext<'_>) -> Option<Vec<T>> {
        match parse_items(value) {
            Ok(items) => Some(items),
            Err(err) => {
                ctx.debug(format_args!("{} shape rejected: {err}", self.label()));
                None
            }
        }
    }
}

/// A JSON array of items or a single item object.
fn parse_items<T: DeserializeOwned>(value: &Value) -> Result<Vec<T>, PayloadError> {
    let items = match value {
        Value::Array(_) => Vec::<T>::deserialize(value)?,
        _ => vec![T::deserialize(value)?],
    };
    if items.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    #[test]
    fn github_hint_falls_back_to_discussions() {
        let discussions = json!([{
            "title": "Q",
            "url": "https://github.com/o/r/discussions/5",
            "comments": [{ "id": "d1", "body": "answer" }]
        }])
        .to_string();
        let payload = parse_payload(&discussions, SourceKind::GitHub, &ConvertContext::default());
        assert!(matches!(payload, Some(SourcePayload::GithubDiscussions(ref items)) if items.len() == 1));

        let issues = json!([{ "id": 1, "title": "Bug", "comments": [] }]).to_string();
        let payload = parse_payload(&issues, SourceKind::GitHub, &ConvertContext::default());
        assert!(matches!(payload, Some(SourcePayload::GithubIssues(_))));
    }

    #[test]
    fn discussions_with_ids_are_not_read_as_issues() {
        let ctx = ConvertContext::default();
        let discussion = json!([{
            "id": "D_kwDO",
            "title": "How do I?",
            "answerId": "c2",
            "comments": [{ "id": "c1", "body": "try this", "replies": [{ "id": "c2", "body": "works" }] }]
        }])
        .to_string();
        let payload = parse_payload(&discussion, SourceKind::GitHub, &ctx);
        assert!(matches!(payload, Some(SourcePayload::GithubDiscussions(_))));

        let threads = dispatch_json(&discussion, "github", &ctx);
        assert_eq!(threads[0].id, "D_kwDO");
        assert_eq!(threads[0].total_comments(), 2);
        let answer = &threads[0].comments[0].replies[0];
        assert_eq!(answer.metadata.as_ref().unwrap()["isAnswer"], json!(true));

        let nested_only = json!([{
            "id": 4,
            "title": "Idea",
            "comments": [{ "id": "c1", "body": "+1", "replies": { "nodes": [{ "body": "agreed" }] } }]
        }])
        .to_string();
        let payload = parse_payload(&nested_only, SourceKind::GitHub, &ctx);
        assert!(matches!(payload, Some(SourcePayload::GithubDiscussions(_))));
    }

    #[test]
    fn empty_lists_are_not_accepted() {
        let ctx = ConvertContext::default();
        assert!(parse_payload("[]", SourceKind::GitHub, &ctx).is_none());
        assert!(dispatch_json("[]", "github", &ctx).is_empty());
    }

    #[test]
    fn single_object_is_a_one_item_payload() {
        let json = json!({ "id": "v1", "title": "Video", "comments": [] }).to_string();
        let payload = parse_payload(&json, SourceKind::YouTube, &ConvertContext::default());
        assert_eq!(payload.map(|payload| payload.len()), Some(1));
    }

    #[test]
    fn unknown_hint_and_bad_json_yield_nothing_and_log() {
        let seen = RefCell::new(Vec::new());
        let sink = |message: &str| seen.borrow_mut().push(message.to_string());
        let ctx = ConvertContext::default().with_sink(&sink);

        assert!(dispatch_json("[]", "myspace", &ctx).is_empty());
        assert!(dispatch_json("{not json", "reddit", &ctx).is_empty());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("myspace"));
        assert!(seen[1].starts_with("invalid json"));
    }

    #[test]
    fn hints_are_case_insensitive() {
        let json = json!([{ "id": 1, "type": "story", "title": "T" }]).to_string();
        let threads = dispatch_json(&json, " HackerNews ", &ConvertContext::default());
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].source_type, SourceKind::HackerNews);
    }

    #[test]
    fn auto_detection_uses_marker_keys() {
        let ctx = ConvertContext::default();
        let cases = [
            (json!([{ "id": 1, "type": "story", "title": "T" }]), SourceKind::HackerNews),
            (json!([{ "id": "p", "title": "T", "subreddit": "rust" }]), SourceKind::Reddit),
            (json!([{ "id": "a", "title": "T", "responses": [] }]), SourceKind::Blog),
            (json!([{ "id": "v", "title": "T", "viewCount": 3 }]), SourceKind::YouTube),
            (json!([{ "id": 7, "title": "T", "labels": [] }]), SourceKind::GitHub),
            (json!([{ "id": "t", "content": "hello" }]), SourceKind::Twitter),
        ];
        for (value, expected) in cases {
            let payload = detect_payload(&value.to_string(), &ctx);
            assert_eq!(payload.map(|payload| payload.kind()), Some(expected), "{value}");
        }
        assert!(detect_payload("[1, 2]", &ctx).is_none());
    }
}
