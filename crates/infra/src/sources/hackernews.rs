//! Hacker News items as returned by the Firebase API: one flat pool of stories
//! and comments, linked through `kids` arrays.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::json;
use threadscribe_core::{
    CommentNode, CommentThread, ConvertContext, SourceKind, Timestamp, author_or_unknown,
    build_forest, collect_metadata, sanitize, sanitize_inline,
};

use super::{de, non_empty};

const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";
const UNKNOWN_STORY: &str = "unknown";

#[derive(Debug, Clone, Deserialize)]
pub struct HackerNewsItem {
    #[serde(deserialize_with = "de::required_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "de::flexible_id")]
    pub parent: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub time: Timestamp,
    #[serde(default, deserialize_with = "de::id_list")]
    pub kids: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_i64")]
    pub descendants: Option<i64>,
}

impl HackerNewsItem {
    fn is_story(&self) -> bool {
        matches!(self.kind.as_str(), "story" | "poll" | "job")
    }

    fn is_comment(&self) -> bool {
        self.kind == "comment"
    }

    fn is_gone(&self) -> bool {
        self.deleted || self.dead
    }
}

pub fn item_url(id: &str) -> String {
    format!("{ITEM_URL}{id}")
}

/// Builds one thread per story in the pool. Without a story, comments whose
/// parent is not in the pool hang off a placeholder thread.
///
/// Replies are found through `kids` first, in their ranked order. A comment
/// that no `kids` list mentions still lands under its `parent` when that
/// parent was placed.
pub fn convert_items(items: &[HackerNewsItem], ctx: &ConvertContext<'_>) -> Vec<CommentThread> {
    let mut pool: HashMap<&str, &HackerNewsItem> = HashMap::with_capacity(items.len());
    for item in items {
        pool.entry(item.id.as_str()).or_insert(item);
    }
    let mut assembly = Assembly::new(pool);

    let mut threads = Vec::new();
    for item in items.iter().filter(|item| item.is_story()) {
        if !assembly.visited.insert(item.id.as_str()) {
            continue;
        }
        let slot = assembly.open_thread(item.id.as_str());
        assembly.walk(&item.kids, slot, ctx);
        threads.push(story_thread(item, ctx));
    }

    let story_mode = !threads.is_empty();
    let mut unanchored = 0;
    for item in items.iter().filter(|item| item.is_comment()) {
        if assembly.visited.contains(item.id.as_str()) {
            continue;
        }
        match assembly.anchor(item) {
            Ok((slot, chain)) => assembly.adopt(&chain, slot, ctx),
            Err(chain) if story_mode => {
                for member in chain {
                    let fresh = assembly.visited.insert(member.id.as_str());
                    if fresh && member.is_comment() && !member.is_gone() {
                        unanchored += 1;
                    }
                }
            }
            Err(chain) => {
                let slot = match assembly.placeholder {
                    Some(slot) => slot,
                    None => {
                        let story_id = chain
                            .last()
                            .and_then(|&top| top.parent.as_deref())
                            .filter(|parent| !assembly.pool.contains_key(parent))
                            .unwrap_or(UNKNOWN_STORY);
                        threads.push(placeholder_thread(story_id));
                        let slot = assembly.open_thread(story_id);
                        assembly.placeholder = Some(slot);
                        slot
                    }
                };
                assembly.adopt(&chain, slot, ctx);
            }
        }
    }
    if unanchored > 0 {
        ctx.debug(format_args!(
            "hacker news: {unanchored} comments not reachable from any story"
        ));
    }

    for (thread, nodes) in threads.iter_mut().zip(assembly.placed) {
        thread.comments = build_forest(nodes).roots;
    }
    threads
}

/// Where a reply to an already placed item goes: which thread, under which
/// live comment (`None` for the top level).
#[derive(Debug, Clone, Copy)]
struct Slot<'a> {
    thread: usize,
    parent: Option<&'a str>,
}

struct Assembly<'a> {
    pool: HashMap<&'a str, &'a HackerNewsItem>,
    visited: HashSet<&'a str>,
    slots: HashMap<&'a str, Slot<'a>>,
    /// Flat comments per thread, parent links already resolved.
    placed: Vec<Vec<CommentNode>>,
    placeholder: Option<Slot<'a>>,
}

impl<'a> Assembly<'a> {
    fn new(pool: HashMap<&'a str, &'a HackerNewsItem>) -> Self {
        Self {
            pool,
            visited: HashSet::new(),
            slots: HashMap::new(),
            placed: Vec::new(),
            placeholder: None,
        }
    }

    fn open_thread(&mut self, id: &'a str) -> Slot<'a> {
        let slot = Slot {
            thread: self.placed.len(),
            parent: None,
        };
        self.placed.push(Vec::new());
        self.slots.insert(id, slot);
        slot
    }

    // Deleted and dead items are skipped; their live replies take their place
    // under the nearest live ancestor.
    fn walk(&mut self, kids: &'a [String], slot: Slot<'a>, ctx: &ConvertContext<'_>) {
        let mut stack: Vec<(&str, Slot<'a>)> =
            kids.iter().rev().map(|kid| (kid.as_str(), slot)).collect();
        while let Some((id, slot)) = stack.pop() {
            let Some(&item) = self.pool.get(id) else {
                ctx.debug(format_args!("hacker news: item {id} not in payload"));
                continue;
            };
            if !self.visited.insert(item.id.as_str()) {
                continue;
            }
            let below = if item.is_gone() || !item.is_comment() {
                slot
            } else {
                self.placed[slot.thread].push(comment_node(item, slot.parent));
                Slot {
                    thread: slot.thread,
                    parent: Some(item.id.as_str()),
                }
            };
            self.slots.insert(item.id.as_str(), below);
            stack.extend(item.kids.iter().rev().map(|kid| (kid.as_str(), below)));
        }
    }

    /// Follows `parent` links up from `item` to the first placed ancestor.
    /// Returns the unplaced chain, `item` first, with the slot above it; or
    /// just the chain when it ends at a missing item, no parent, or a cycle.
    fn anchor(
        &self,
        item: &'a HackerNewsItem,
    ) -> Result<(Slot<'a>, Vec<&'a HackerNewsItem>), Vec<&'a HackerNewsItem>> {
        let mut chain = vec![item];
        let mut seen = HashSet::from([item.id.as_str()]);
        let mut current = item;
        while let Some(parent) = current.parent.as_deref() {
            if let Some(&slot) = self.slots.get(parent) {
                return Ok((slot, chain));
            }
            match self.pool.get(parent) {
                Some(&up) if !self.visited.contains(up.id.as_str()) && seen.insert(&up.id) => {
                    chain.push(up);
                    current = up;
                }
                _ => break,
            }
        }
        Err(chain)
    }

    // Places the chain top-down so each member lands under the one above it.
    fn adopt(&mut self, chain: &[&'a HackerNewsItem], mut slot: Slot<'a>, ctx: &ConvertContext<'_>) {
        for &member in chain.iter().rev() {
            if !self.visited.contains(member.id.as_str()) {
                self.walk(std::slice::from_ref(&member.id), slot, ctx);
            }
            if let Some(&below) = self.slots.get(member.id.as_str()) {
                slot = below;
            }
        }
    }
}

fn comment_node(item: &HackerNewsItem, parent: Option<&str>) -> CommentNode {
    let mut node = CommentNode::new(
        &item.id,
        item.by.as_deref().unwrap_or_default(),
        item.text.as_deref().map(sanitize).unwrap_or_default(),
    );
    node.parent_id = parent.map(str::to_string);
    node.created_at = item.time.or_epoch();
    node
}

fn story_thread(item: &HackerNewsItem, ctx: &ConvertContext<'_>) -> CommentThread {
    let title = item.title.as_deref().map(sanitize_inline).unwrap_or_default();
    let mut thread = CommentThread::new(&item.id, title, SourceKind::HackerNews);
    thread.description = item.text.as_deref().map(sanitize).and_then(|text| non_empty(&text));
    thread.author = author_or_unknown(item.by.as_deref().unwrap_or_default());
    thread.created_at = item.time.or_epoch();
    thread.url = Some(item_url(&item.id));
    thread.metadata = collect_metadata(
        ctx.for_analysis,
        [
            ("type", json!(item.kind)),
            ("link", json!(item.url)),
            ("score", json!(item.score)),
            ("descendants", json!(item.descendants)),
        ],
    );
    thread
}

fn placeholder_thread(story_id: &str) -> CommentThread {
    let mut thread = CommentThread::new(
        story_id,
        format!("Hacker News discussion {story_id}"),
        SourceKind::HackerNews,
    );
    if story_id != UNKNOWN_STORY {
        thread.url = Some(item_url(story_id));
    }
    thread
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(value: serde_json::Value) -> Vec<HackerNewsItem> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn story_kids_become_nested_comments() {
        let items = items(json!([
            { "id": 1, "type": "story", "by": "alice", "title": "Show HN: thing", "url": "https://thing.dev", "time": 1700000000, "kids": [2, 3], "score": 99 },
            { "id": 3, "type": "comment", "by": "carol", "parent": 1, "text": "second" },
            { "id": 2, "type": "comment", "by": "bob", "parent": 1, "text": "first &amp; <i>best</i>", "kids": [4] },
            { "id": 4, "type": "comment", "by": "dave", "parent": 2, "text": "reply" }
        ]));
        let threads = convert_items(&items, &ConvertContext::default());
        assert_eq!(threads.len(), 1);
        let thread = &threads[0];
        assert_eq!(thread.id, "1");
        assert_eq!(thread.url.as_deref(), Some("https://news.ycombinator.com/item?id=1"));
        assert_eq!(thread.metadata.as_ref().unwrap()["link"], json!("https://thing.dev"));

        let ids: Vec<_> = thread.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(thread.comments[0].content, "first & *best*");
        assert_eq!(thread.comments[0].parent_id, None);
        assert_eq!(thread.comments[0].replies[0].id, "4");
        assert_eq!(thread.comments[0].replies[0].parent_id.as_deref(), Some("2"));
    }

    #[test]
    fn deleted_items_promote_their_replies() {
        let items = items(json!([
            { "id": 1, "type": "story", "title": "T", "kids": [2, 5] },
            { "id": 2, "type": "comment", "deleted": true, "parent": 1, "kids": [3] },
            { "id": 3, "type": "comment", "by": "x", "parent": 2, "text": "survivor" },
            { "id": 5, "type": "comment", "dead": true, "by": "y", "parent": 1, "text": "flagged" }
        ]));
        let threads = convert_items(&items, &ConvertContext::default());
        let thread = &threads[0];
        assert_eq!(thread.total_comments(), 1);
        assert_eq!(thread.comments[0].id, "3");
        assert_eq!(thread.comments[0].parent_id, None);
    }

    #[test]
    fn missing_story_gets_placeholder_thread() {
        let items = items(json!([
            { "id": 10, "type": "comment", "by": "a", "parent": 9, "text": "top", "kids": [11] },
            { "id": 11, "type": "comment", "by": "b", "parent": 10, "text": "nested" },
            { "id": 12, "type": "comment", "by": "c", "parent": 9, "text": "another top" }
        ]));
        let threads = convert_items(&items, &ConvertContext::default());
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "9");
        assert_eq!(threads[0].title, "Hacker News discussion 9");
        let ids: Vec<_> = threads[0].comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "12"]);
        assert_eq!(threads[0].total_comments(), 3);
    }

    #[test]
    fn repeated_kids_are_emitted_once() {
        let items = items(json!([
            { "id": 1, "type": "story", "title": "T", "kids": [2, 2] },
            { "id": 2, "type": "comment", "by": "a", "text": "once", "kids": [2] }
        ]));
        let threads = convert_items(&items, &ConvertContext::default());
        assert_eq!(threads[0].total_comments(), 1);
    }

    #[test]
    fn comments_missing_from_kids_follow_their_parent() {
        let items = items(json!([
            { "id": 1, "type": "story", "title": "T", "kids": [2] },
            { "id": 2, "type": "comment", "by": "a", "parent": 1, "text": "listed" },
            { "id": 3, "type": "comment", "by": "b", "parent": 1, "text": "unlisted" },
            { "id": 4, "type": "comment", "by": "c", "parent": 2, "text": "unlisted reply" },
            { "id": 6, "type": "comment", "by": "d", "parent": 5, "text": "under a later parent" },
            { "id": 5, "type": "comment", "by": "e", "parent": 3, "text": "later parent" }
        ]));
        let threads = convert_items(&items, &ConvertContext::default());
        let thread = &threads[0];
        assert_eq!(thread.total_comments(), 5);
        let ids: Vec<_> = thread.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(thread.comments[0].replies[0].id, "4");
        assert_eq!(thread.comments[1].replies[0].id, "5");
        assert_eq!(thread.comments[1].replies[0].replies[0].id, "6");
    }

    #[test]
    fn comments_outside_every_story_are_reported() {
        let items = items(json!([
            { "id": 1, "type": "story", "title": "T", "kids": [] },
            { "id": 7, "type": "comment", "by": "a", "parent": 99, "text": "elsewhere" },
            { "id": 8, "type": "comment", "by": "b", "parent": 7, "text": "also elsewhere" }
        ]));
        let messages = std::cell::RefCell::new(Vec::new());
        let sink = |message: &str| messages.borrow_mut().push(message.to_string());
        let ctx = ConvertContext::default().with_sink(&sink);
        let threads = convert_items(&items, &ctx);
        assert_eq!(threads[0].total_comments(), 0);
        assert!(
            messages
                .borrow()
                .iter()
                .any(|message| message == "hacker news: 2 comments not reachable from any story")
        );
    }

    #[test]
    fn long_reply_chains_do_not_recurse() {
        let depth = 10_000;
        let mut raw = vec![json!({ "id": 0, "type": "story", "title": "T", "kids": [1] })];
        raw.extend((1..=depth).map(|n| {
            json!({ "id": n, "type": "comment", "by": "x", "parent": n - 1, "text": "deeper", "kids": [n + 1] })
        }));
        let threads = convert_items(&items(serde_json::Value::Array(raw)), &ConvertContext::default());
        assert_eq!(threads[0].total_comments(), depth);
    }

    #[test]
    fn nothing_to_build_from_empty_pool() {
        assert!(convert_items(&[], &ConvertContext::default()).is_empty());
    }
}
