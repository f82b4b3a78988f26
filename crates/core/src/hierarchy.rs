use std::collections::{HashMap, HashSet};

use crate::domain::comments::CommentNode;

pub const ORPHAN_MARKER: &str = "[Reply to unavailable comment] ";

/// Result of rebuilding reply trees from a flat list.
#[derive(Debug, Default)]
pub struct Forest {
    pub roots: Vec<CommentNode>,
    /// Nodes placed under a parent.
    pub attached: usize,
    /// Ids of roots whose declared parent is not in the list, in source order.
    pub orphans: Vec<String>,
    /// Later nodes dropped because their id was already seen.
    pub duplicates: usize,
}

/// Rebuilds reply trees from nodes carrying `parent_id`.
///
/// Parents are resolved against the whole list before anything is attached, so
/// a reply may appear before its parent. The first node with a given id wins.
/// Nodes with no parent, a self parent, or an unknown parent become roots in
/// source order. Nodes only reachable through a parent cycle are recovered by
/// promoting the first repeated node of each cycle to root.
pub fn build_forest(nodes: Vec<CommentNode>) -> Forest {
    let mut index = HashMap::with_capacity(nodes.len());
    let mut slots = Vec::with_capacity(nodes.len());
    let mut duplicates = 0;
    for node in nodes {
        if index.contains_key(&node.id) {
            duplicates += 1;
            continue;
        }
        index.insert(node.id.clone(), slots.len());
        slots.push(Some(node));
    }

    let mut parents: Vec<Option<usize>> = vec![None; slots.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut root_indices = Vec::new();
    let mut orphans = Vec::new();
    for (idx, slot) in slots.iter().enumerate() {
        let Some(node) = slot else {
            continue;
        };
        let parent_id = node
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|parent_id| !parent_id.is_empty() && *parent_id != node.id);
        match parent_id {
            Some(parent_id) => match index.get(parent_id) {
                Some(&parent_idx) => {
                    parents[idx] = Some(parent_idx);
                    children[parent_idx].push(idx);
                }
                None => {
                    orphans.push(node.id.clone());
                    root_indices.push(idx);
                }
            },
            None => root_indices.push(idx),
        }
    }

    let total = slots.len();
    let mut roots = Vec::with_capacity(root_indices.len());
    for idx in root_indices {
        if let Some(node) = take_subtree(idx, &mut slots, &children) {
            roots.push(node);
        }
    }
    for idx in 0..total {
        if slots[idx].is_none() {
            continue;
        }
        let entry = cycle_entry(idx, &parents, &slots);
        if let Some(node) = take_subtree(entry, &mut slots, &children) {
            roots.push(node);
        }
    }

    Forest {
        attached: total - roots.len(),
        roots,
        orphans,
        duplicates,
    }
}

/// Prefixes every orphan root with [`ORPHAN_MARKER`].
pub fn mark_orphans(forest: &mut Forest) {
    if forest.orphans.is_empty() {
        return;
    }
    let orphans: HashSet<&str> = forest.orphans.iter().map(String::as_str).collect();
    for root in &mut forest.roots {
        if orphans.contains(root.id.as_str()) && !root.content.starts_with(ORPHAN_MARKER) {
            root.content.insert_str(0, ORPHAN_MARKER);
        }
    }
}

// Detaches the node at `root` together with every still-unplaced descendant.
fn take_subtree(
    root: usize,
    slots: &mut [Option<CommentNode>],
    children: &[Vec<usize>],
) -> Option<CommentNode> {
    let node = slots[root].take()?;
    let mut stack = vec![(node, children[root].iter())];
    while let Some((_, pending)) = stack.last_mut() {
        if let Some(&child_idx) = pending.next() {
            if let Some(child) = slots[child_idx].take() {
                stack.push((child, children[child_idx].iter()));
            }
            continue;
        }
        let (done, _) = stack.pop()?;
        match stack.last_mut() {
            Some((parent, _)) => parent.replies.push(done),
            None => return Some(done),
        }
    }
    None
}

// Walks up from an unplaced node until a node repeats; that node sits on a cycle.
fn cycle_entry(start: usize, parents: &[Option<usize>], slots: &[Option<CommentNode>]) -> usize {
    let mut seen = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match parents[current] {
            Some(parent) if slots[parent].is_some() => current = parent,
            _ => return current,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>) -> CommentNode {
        let mut node = CommentNode::new(id, "someone", format!("body {id}"));
        node.parent_id = parent.map(str::to_string);
        node
    }

    fn collect_ids(nodes: &[CommentNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.id.clone());
            collect_ids(&node.replies, out);
        }
    }

    fn all_ids(forest: &Forest) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(&forest.roots, &mut ids);
        ids
    }

    #[test]
    fn long_parent_chain_nests_in_one_tree() {
        let depth = 10_000;
        let nodes = (0..depth)
            .map(|n: usize| {
                let parent = n.checked_sub(1).map(|p| p.to_string());
                node(&n.to_string(), parent.as_deref())
            })
            .collect();
        let forest = build_forest(nodes);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.attached, depth - 1);
        assert_eq!(crate::domain::comments::count_nodes(&forest.roots), depth);
    }

    #[test]
    fn nests_replies_in_source_order() {
        let forest = build_forest(vec![
            node("a", None),
            node("b", Some("a")),
            node("c", Some("a")),
            node("d", Some("b")),
        ]);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.attached, 3);
        let root = &forest.roots[0];
        assert_eq!(root.replies[0].id, "b");
        assert_eq!(root.replies[1].id, "c");
        assert_eq!(root.replies[0].replies[0].id, "d");
    }

    #[test]
    fn reply_before_parent_still_attaches() {
        let forest = build_forest(vec![node("b", Some("a")), node("a", None)]);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].id, "a");
        assert_eq!(forest.roots[0].replies[0].id, "b");
        assert!(forest.orphans.is_empty());
    }

    #[test]
    fn missing_parent_becomes_orphan_root() {
        let mut forest = build_forest(vec![node("a", None), node("b", Some("missing"))]);
        assert_eq!(forest.roots.len(), 2);
        assert_eq!(forest.orphans, vec!["b".to_string()]);
        assert_eq!(forest.attached, 0);

        mark_orphans(&mut forest);
        assert_eq!(forest.roots[0].content, "body a");
        assert_eq!(forest.roots[1].content, format!("{ORPHAN_MARKER}body b"));
        mark_orphans(&mut forest);
        assert_eq!(forest.roots[1].content, format!("{ORPHAN_MARKER}body b"));
    }

    #[test]
    fn self_parent_and_blank_parent_are_roots() {
        let forest = build_forest(vec![node("a", Some("a")), node("b", Some("  "))]);
        assert_eq!(forest.roots.len(), 2);
        assert!(forest.orphans.is_empty());
    }

    #[test]
    fn first_duplicate_wins() {
        let mut second = node("a", None);
        second.content = "second".to_string();
        let forest = build_forest(vec![node("a", None), second, node("b", Some("a"))]);
        assert_eq!(forest.duplicates, 1);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].content, "body a");
        assert_eq!(all_ids(&forest), vec!["a", "b"]);
    }

    #[test]
    fn parent_cycles_are_broken_without_losing_nodes() {
        let forest = build_forest(vec![
            node("root", None),
            node("x", Some("y")),
            node("y", Some("x")),
            node("z", Some("x")),
        ]);
        let ids = all_ids(&forest);
        assert_eq!(ids.len(), 4);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(forest.roots.len(), 2);
        assert_eq!(forest.roots[0].id, "root");
        // walking up from x reaches y, then x again: x is promoted
        assert_eq!(forest.roots[1].id, "x");
        assert_eq!(forest.roots[1].replies[0].id, "y");
        assert_eq!(forest.roots[1].replies[1].id, "z");
        assert_eq!(forest.attached, 2);
    }

    #[test]
    fn keeps_replies_already_on_input_nodes() {
        let mut parent = node("a", None);
        parent.replies.push(node("nested", Some("a")));
        let forest = build_forest(vec![parent, node("b", Some("a"))]);
        let ids: Vec<_> = forest.roots[0].replies.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["nested", "b"]);
    }
}
