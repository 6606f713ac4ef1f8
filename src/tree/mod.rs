pub(crate) mod display;

use crate::models::{Chapter, ContentNode, NodeRef};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MergeError {
    /// No chapter with this id exists anywhere in the tree.
    #[error("merge target not found: {parent_id}")]
    TargetNotFound { parent_id: String },
}

/// Ordered root list of the content explorer.
///
/// Every version of the tree is immutable. A merge allocates new nodes only
/// along the path from the root to the merge target; all other nodes are the
/// same `Arc`s as in the previous version.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ContentTree {
    roots: Vec<NodeRef>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<ContentNode>) -> Self {
        Self {
            roots: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn roots(&self) -> &[NodeRef] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of materialized nodes, at every depth.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[NodeRef]) -> usize {
            nodes
                .iter()
                .map(|n| match n.as_ref() {
                    ContentNode::Chapter(Chapter {
                        children: Some(children),
                        ..
                    }) => 1 + count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.roots)
    }

    /// Pre-order search for the first chapter with this id. Lessons sharing the id are skipped.
    pub fn find_chapter(&self, id: &str) -> Option<&Chapter> {
        fn walk<'a>(nodes: &'a [NodeRef], id: &str) -> Option<&'a Chapter> {
            for node in nodes {
                let ContentNode::Chapter(chapter) = node.as_ref() else {
                    continue;
                };
                if chapter.id == id {
                    return Some(chapter);
                }
                if let Some(found) = chapter.children.as_deref().and_then(|c| walk(c, id)) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, id)
    }
}

/// Merge a freshly fetched slice into `tree`.
///
/// A miss is not an error for the caller: the input tree comes back unchanged
/// and the miss is logged.
pub(crate) fn merge(
    tree: &ContentTree,
    parent_id: Option<&str>,
    new_nodes: Vec<ContentNode>,
) -> ContentTree {
    match try_merge(tree, parent_id, new_nodes) {
        Ok(next) => next,
        Err(e) => {
            tracing::warn!("{e}; keeping tree unchanged");
            tree.clone()
        }
    }
}

/// Like [`merge`], but reports a missing target instead of absorbing it.
pub(crate) fn try_merge(
    tree: &ContentTree,
    parent_id: Option<&str>,
    new_nodes: Vec<ContentNode>,
) -> Result<ContentTree, MergeError> {
    let Some(parent_id) = parent_id else {
        return Ok(ContentTree::from_nodes(new_nodes));
    };

    let new_nodes: Vec<NodeRef> = new_nodes.into_iter().map(Arc::new).collect();
    attach(&tree.roots, parent_id, &new_nodes)
        .map(|roots| ContentTree { roots })
        .ok_or_else(|| MergeError::TargetNotFound {
            parent_id: parent_id.to_string(),
        })
}

/// Rebuild `nodes` with the target chapter's children extended, or `None` if
/// the target is not in this subtree.
fn attach(nodes: &[NodeRef], parent_id: &str, new_nodes: &[NodeRef]) -> Option<Vec<NodeRef>> {
    for (i, node) in nodes.iter().enumerate() {
        let ContentNode::Chapter(chapter) = node.as_ref() else {
            continue;
        };

        let replaced = if chapter.id == parent_id {
            Some(Chapter {
                children: Some(append_unique(chapter.children.as_deref(), new_nodes)),
                ..chapter.clone()
            })
        } else {
            chapter
                .children
                .as_deref()
                .and_then(|children| attach(children, parent_id, new_nodes))
                .map(|children| Chapter {
                    children: Some(children),
                    ..chapter.clone()
                })
        };

        if let Some(replaced) = replaced {
            let mut out = nodes.to_vec();
            out[i] = Arc::new(ContentNode::Chapter(replaced));
            return Some(out);
        }
    }
    None
}

fn append_unique(existing: Option<&[NodeRef]>, new_nodes: &[NodeRef]) -> Vec<NodeRef> {
    let existing = existing.unwrap_or_default();
    let mut seen: HashSet<&str> = existing.iter().map(|n| n.id()).collect();

    let mut out = existing.to_vec();
    for node in new_nodes {
        if seen.insert(node.id()) {
            out.push(node.clone());
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Chapter, ContentNode, Lesson, MediaType, Priority};
    use std::sync::Arc;

    pub fn lesson(id: &str, duration_seconds: u64) -> ContentNode {
        ContentNode::Lesson(Lesson {
            id: id.to_string(),
            priority: Priority::default(),
            is_pinned: false,
            title: format!("Lesson {id}"),
            duration_seconds,
            media_type: MediaType::Video,
            url: format!("https://cdn.example.com/{id}.mp4"),
            is_completed: false,
        })
    }

    pub fn chapter(id: &str, children: Option<Vec<ContentNode>>) -> ContentNode {
        ContentNode::Chapter(Chapter {
            id: id.to_string(),
            priority: Priority::default(),
            is_pinned: false,
            name: format!("Chapter {id}"),
            is_completed: false,
            children: children.map(|c| c.into_iter().map(Arc::new).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{chapter, lesson};
    use super::*;

    fn child_ids(tree: &ContentTree, chapter_id: &str) -> Option<Vec<String>> {
        tree.find_chapter(chapter_id)?
            .children
            .as_ref()
            .map(|c| c.iter().map(|n| n.id().to_string()).collect())
    }

    #[test]
    fn test_merge_into_unloaded_chapter() {
        let tree = ContentTree::from_nodes(vec![chapter("A", None)]);
        let next = merge(&tree, Some("A"), vec![lesson("L1", 60), lesson("L2", 90)]);
        assert_eq!(child_ids(&next, "A"), Some(vec!["L1".into(), "L2".into()]));
    }

    #[test]
    fn test_merge_skips_existing_children() {
        let tree = ContentTree::from_nodes(vec![chapter("A", Some(vec![lesson("L1", 60)]))]);
        let next = merge(&tree, Some("A"), vec![lesson("L1", 60), lesson("L2", 90)]);
        assert_eq!(child_ids(&next, "A"), Some(vec!["L1".into(), "L2".into()]));
    }

    #[test]
    fn test_merge_into_nested_chapter() {
        let tree = ContentTree::from_nodes(vec![chapter(
            "A",
            Some(vec![chapter("B", Some(vec![]))]),
        )]);
        let next = merge(&tree, Some("B"), vec![lesson("L3", 30)]);

        assert_eq!(child_ids(&next, "B"), Some(vec!["L3".into()]));
        assert_eq!(child_ids(&next, "A"), Some(vec!["B".into()]));
        assert_eq!(next.roots().len(), 1);
        assert!(!Arc::ptr_eq(&tree.roots()[0], &next.roots()[0]));
        assert_eq!(next.node_count(), 3);
    }

    #[test]
    fn test_root_merge_replaces_everything() {
        let tree = ContentTree::from_nodes(vec![
            chapter("A", Some(vec![lesson("L1", 10)])),
            lesson("L9", 10),
        ]);
        let next = merge(&tree, None, vec![lesson("X", 1), chapter("Y", None)]);
        let ids: Vec<&str> = next.roots().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["X", "Y"]);
    }

    #[test]
    fn test_unknown_target_is_noop() {
        let tree = ContentTree::from_nodes(vec![chapter("A", Some(vec![lesson("L1", 10)]))]);
        let next = merge(&tree, Some("ghost"), vec![lesson("Z", 5)]);
        assert_eq!(next, tree);
        assert_eq!(
            try_merge(&tree, Some("ghost"), vec![lesson("Z", 5)]),
            Err(MergeError::TargetNotFound {
                parent_id: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_lesson_id_is_not_a_merge_target() {
        let tree = ContentTree::from_nodes(vec![lesson("L1", 10)]);
        assert!(try_merge(&tree, Some("L1"), vec![lesson("L2", 5)]).is_err());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let tree = ContentTree::from_nodes(vec![chapter("A", None)]);
        let batch = || vec![lesson("L1", 60), lesson("L2", 90)];
        let once = merge(&tree, Some("A"), batch());
        let twice = merge(&once, Some("A"), batch());
        assert_eq!(child_ids(&once, "A"), child_ids(&twice, "A"));
    }

    #[test]
    fn test_duplicates_inside_one_batch_are_dropped() {
        let tree = ContentTree::from_nodes(vec![chapter("A", None)]);
        let next = merge(&tree, Some("A"), vec![lesson("L1", 60), lesson("L1", 61)]);
        assert_eq!(child_ids(&next, "A"), Some(vec!["L1".into()]));
    }

    #[test]
    fn test_order_is_existing_then_new_in_fetch_order() {
        let tree = ContentTree::from_nodes(vec![chapter(
            "A",
            Some(vec![lesson("L2", 1), lesson("L1", 1)]),
        )]);
        let next = merge(
            &tree,
            Some("A"),
            vec![lesson("L4", 1), lesson("L1", 1), lesson("L3", 1)],
        );
        assert_eq!(
            child_ids(&next, "A"),
            Some(vec!["L2".into(), "L1".into(), "L4".into(), "L3".into()])
        );
    }

    #[test]
    fn test_merge_shares_nodes_off_the_path() {
        let tree = ContentTree::from_nodes(vec![
            chapter("A", Some(vec![chapter("B", None), chapter("C", Some(vec![lesson("L1", 1)]))])),
            chapter("D", Some(vec![lesson("L2", 1)])),
        ]);
        let next = merge(&tree, Some("B"), vec![lesson("L3", 1)]);

        // D is a sibling of the path root.
        assert!(Arc::ptr_eq(&tree.roots()[1], &next.roots()[1]));

        // C is a sibling of B under the rebuilt A.
        let old_a = tree.roots()[0].as_chapter().and_then(|c| c.children.clone()).expect("A loaded");
        let new_a = next.roots()[0].as_chapter().and_then(|c| c.children.clone()).expect("A loaded");
        assert!(Arc::ptr_eq(&old_a[1], &new_a[1]));
        assert!(!Arc::ptr_eq(&old_a[0], &new_a[0]));

        // The input is untouched.
        assert_eq!(child_ids(&tree, "B"), None);
    }

    #[test]
    fn test_dedupe_is_scoped_to_target_children() {
        let tree = ContentTree::from_nodes(vec![
            chapter("A", Some(vec![lesson("L1", 1)])),
            chapter("B", None),
        ]);
        let next = merge(&tree, Some("B"), vec![lesson("L1", 1)]);
        assert_eq!(child_ids(&next, "B"), Some(vec!["L1".into()]));
        assert_eq!(child_ids(&next, "A"), Some(vec!["L1".into()]));
    }

    #[test]
    fn test_find_prefers_first_preorder_match() {
        let tree = ContentTree::from_nodes(vec![
            chapter("A", Some(vec![chapter("X", Some(vec![]))])),
            chapter("X", None),
        ]);
        assert!(tree.find_chapter("X").expect("found").is_loaded());
        assert!(tree.find_chapter("nope").is_none());
    }
}
