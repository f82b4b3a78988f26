//! Platform adapters: each turns one exported payload shape into canonical
//! comment threads.

pub(crate) mod de;

pub mod blog;
pub mod github;
pub mod hackernews;
pub mod reddit;
pub mod twitter;
pub mod youtube;

use threadscribe_core::{CommentNode, ConvertContext, build_forest, mark_orphans};

/// What happens to comments whose parent is not in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Promote to root as-is.
    Root,
    /// Promote to root with the orphan marker prefixed to the content.
    Mark,
}

/// Nests a flat comment list and applies the orphan policy.
pub(crate) fn nest_comments(
    nodes: Vec<CommentNode>,
    policy: OrphanPolicy,
    thread_id: &str,
    ctx: &ConvertContext<'_>,
) -> Vec<CommentNode> {
    let mut forest = build_forest(nodes);
    if forest.duplicates > 0 {
        ctx.debug(format_args!(
            "thread {thread_id}: dropped {} comments with repeated ids",
            forest.duplicates
        ));
    }
    if !forest.orphans.is_empty() {
        ctx.debug(format_args!(
            "thread {thread_id}: {} comments reference missing parents",
            forest.orphans.len()
        ));
        if policy == OrphanPolicy::Mark {
            mark_orphans(&mut forest);
        }
    }
    forest.roots
}

/// The source id when present, otherwise `{thread_id}-c{n}` with a 1-based position.
pub(crate) fn comment_id(raw: Option<&str>, thread_id: &str, position: usize) -> String {
    match raw.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => format!("{thread_id}-c{}", position + 1),
    }
}

/// The first value with visible text. Exports often carry one value under two
/// names, and either may be blank.
pub(crate) fn pick_text<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary
        .filter(|text| !text.trim().is_empty())
        .or(fallback.filter(|text| !text.trim().is_empty()))
}

/// Trimmed text, or `None` when nothing is left.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadscribe_core::ORPHAN_MARKER;

    fn reply(id: &str, parent: &str) -> CommentNode {
        let mut node = CommentNode::new(id, "someone", "text");
        node.parent_id = Some(parent.to_string());
        node
    }

    #[test]
    fn picks_first_visible_text() {
        assert_eq!(pick_text(Some("a"), Some("b")), Some("a"));
        assert_eq!(pick_text(Some("  "), Some("b")), Some("b"));
        assert_eq!(pick_text(None, Some("")), None);
    }

    #[test]
    fn synthesizes_ids_from_position() {
        assert_eq!(comment_id(Some(" abc "), "t1", 0), "abc");
        assert_eq!(comment_id(Some(""), "t1", 0), "t1-c1");
        assert_eq!(comment_id(None, "t1", 4), "t1-c5");
    }

    #[test]
    fn orphan_policy_controls_marking() {
        let nodes = || vec![CommentNode::new("a", "x", "root"), reply("b", "gone")];
        let ctx = ConvertContext::default();

        let rooted = nest_comments(nodes(), OrphanPolicy::Root, "t", &ctx);
        assert_eq!(rooted.len(), 2);
        assert_eq!(rooted[1].content, "text");

        let marked = nest_comments(nodes(), OrphanPolicy::Mark, "t", &ctx);
        assert_eq!(marked[1].content, format!("{ORPHAN_MARKER}text"));
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" a ").as_deref(), Some("a"));
    }
}
