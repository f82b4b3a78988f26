use serde::Deserialize;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, SourceKind, Timestamp, author_or_unknown,
    collect_metadata, sanitize, sanitize_inline,
};

use super::{OrphanPolicy, comment_id, de, nest_comments, non_empty, pick_text};

/// A blog article with its reader responses (Medium, Disqus-style exports).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogArticle {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Timestamp,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub claps: Option<i64>,
    #[serde(default, deserialize_with = "de::name_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub responses: Vec<BlogResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "de::author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp_utc: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub claps: Option<i64>,
}

impl BlogResponse {
    fn html(&self) -> &str {
        pick_text(self.body_html.as_deref(), self.content.as_deref()).unwrap_or_default()
    }
}

pub fn convert_articles(articles: &[BlogArticle], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    articles.iter().map(|article| convert_article(article, ctx)).collect()
}

pub fn convert_article(article: &BlogArticle, ctx: &ConvertContext<'_>) -> CommentThread {
    let nodes = article
        .responses
        .iter()
        .enumerate()
        .map(|(position, response)| {
            let mut node = CommentNode::new(
                comment_id(response.id.as_deref(), &article.id, position),
                response.author.as_deref().unwrap_or_default(),
                sanitize(response.html()),
            );
            node.parent_id = response.parent_id.clone();
            node.created_at = response.timestamp_utc.or_epoch();
            node.score = response.claps;
            node.metadata = collect_metadata(ctx.for_analysis, [("claps", json!(response.claps))]);
            node
        })
        .collect();

    let mut thread = CommentThread::new(&article.id, sanitize_inline(&article.title), SourceKind::Blog);
    thread.description = article.subtitle.as_deref().map(sanitize).and_then(|s| non_empty(&s));
    thread.author = author_or_unknown(article.author.as_deref().unwrap_or_default());
    thread.created_at = article.published_at.or_epoch();
    thread.url = article.url.as_deref().and_then(non_empty);
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("subtitle", json!(article.subtitle)),
            ("claps", json!(article.claps)),
            ("tags", json!((!article.tags.is_empty()).then_some(&article.tags))),
        ],
    );
    // Responses to removed responses stay visible but flagged.
    thread.comments = nest_comments(nodes, OrphanPolicy::Mark, &article.id, ctx);
    thread
}

#[cfg(test)]
mod tests {
    use threadscribe_core::ORPHAN_MARKER;

    use super::*;

    #[test]
    fn responses_are_sanitized_nested_and_orphans_marked() {
        let article: BlogArticle = serde_json::from_value(json!({
            "id": "post-1",
            "title": "On <em>writing</em>",
            "author": "Grace",
            "subtitle": "Notes &amp; drafts",
            "claps": 120,
            "tags": ["craft"],
            "responses": [
                { "id": "r1", "author": "Hal", "bodyHtml": "<p>Loved it</p><p>Thanks</p>", "claps": 3 },
                { "id": "r2", "parentId": "r1", "author": "Grace", "content": "Thank you!" },
                { "id": "r3", "parentId": "gone", "author": "Ivy", "bodyHtml": "me too" }
            ]
        }))
        .unwrap();
        let thread = convert_article(&article, &ConvertContext::default());
        assert_eq!(thread.title, "On *writing*");
        assert_eq!(thread.description.as_deref(), Some("Notes & drafts"));
        assert_eq!(thread.source_type, SourceKind::Blog);
        assert_eq!(thread.metadata.as_ref().unwrap()["tags"], json!(["craft"]));

        assert_eq!(thread.comments.len(), 2);
        assert_eq!(thread.comments[0].content, "Loved it\n\nThanks");
        assert_eq!(thread.comments[0].score, Some(3));
        assert_eq!(thread.comments[0].replies[0].content, "Thank you!");
        assert_eq!(thread.comments[1].content, format!("{ORPHAN_MARKER}me too"));
    }

    #[test]
    fn html_body_wins_over_plain_content() {
        let article: BlogArticle = serde_json::from_value(json!({
            "id": "a",
            "title": "T",
            "responses": [
                { "id": "r1", "bodyHtml": "<p>rich</p>", "content": "rich" },
                { "id": "r2", "bodyHtml": "", "content": "plain only" }
            ]
        }))
        .unwrap();
        let thread = convert_article(&article, &ConvertContext::default());
        assert_eq!(thread.comments[0].content, "rich");
        assert_eq!(thread.comments[1].content, "plain only");
    }
}
