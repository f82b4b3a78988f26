use serde::Deserialize;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, SourceKind, Timestamp, author_or_unknown,
    collect_metadata, sanitize, sanitize_inline,
};

use super::{OrphanPolicy, comment_id, de, nest_comments, non_empty, pick_text};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeVideo {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub published_at: Timestamp,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub view_count: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub like_count: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub comment_count: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_list")]
    pub comments: Vec<YoutubeComment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeComment {
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub text_display: Option<String>,
    #[serde(default)]
    pub published_at: Timestamp,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub like_count: Option<i64>,
}

impl YoutubeVideo {
    fn channel(&self) -> Option<&str> {
        pick_text(self.author.as_deref(), self.channel_title.as_deref())
    }
}

impl YoutubeComment {
    fn author_name(&self) -> &str {
        pick_text(self.author.as_deref(), self.author_display_name.as_deref()).unwrap_or_default()
    }

    fn body(&self) -> &str {
        pick_text(self.text.as_deref(), self.text_display.as_deref()).unwrap_or_default()
    }
}

pub fn convert_videos(videos: &[YoutubeVideo], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    videos.iter().map(|video| convert_video(video, ctx)).collect()
}

pub fn convert_video(video: &YoutubeVideo, ctx: &ConvertContext<'_>) -> CommentThread {
    let nodes = video
        .comments
        .iter()
        .enumerate()
        .map(|(position, comment)| {
            let mut node = CommentNode::new(
                comment_id(comment.id.as_deref(), &video.id, position),
                comment.author_name(),
                sanitize(comment.body()),
            );
            node.parent_id = comment.parent_id.clone();
            node.created_at = comment.published_at.or_epoch();
            node.score = comment.like_count;
            node
        })
        .collect();

    let mut thread = CommentThread::new(&video.id, sanitize_inline(&video.title), SourceKind::YouTube);
    thread.description = video.description.as_deref().map(sanitize).and_then(|d| non_empty(&d));
    if let Some(author) = video.channel() {
        thread.author = author_or_unknown(author);
    }
    thread.created_at = video.published_at.or_epoch();
    thread.url = Some(
        video
            .url
            .clone()
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", video.id)),
    );
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("channel", json!(video.channel())),
            ("viewCount", json!(video.view_count)),
            ("likeCount", json!(video.like_count)),
            ("commentCount", json!(video.comment_count)),
        ],
    );
    thread.comments = nest_comments(nodes, OrphanPolicy::Root, &video.id, ctx);
    thread
}
