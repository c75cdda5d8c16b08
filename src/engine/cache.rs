//! Identity-keyed render memoization.
//!
//! An entry is reused only for the very same `Arc<Node>` allocation at the
//! same depth under the same root id. Two nodes with equal content but
//! different allocations never share output.
//!
//! Renderers can look upwards (parent, ancestors, root node) and at the
//! navigation state, so every entry also records what its subtree read:
//! - `reach`: how many ancestor levels the output depends on; those
//!   ancestor allocations must match for a hit
//! - `navigation`: the target path the output was built for, if it read
//!   one; a pass without navigation state has the empty path
//!
//! A new root snapshot therefore re-renders exactly the subtrees that looked
//! at it, and unchanged subtrees that only read their parent are reused.

use crate::model::{Node, NodeId};
use crate::view::View;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

struct CacheEntry {
    node: Weak<Node>,
    depth: usize,
    root_id: NodeId,
    /// Ancestors the output depends on, nearest first.
    ancestors: Vec<Weak<Node>>,
    navigation: Option<Vec<NodeId>>,
    view: View,
}

/// A reusable view and the dependencies it carries to its parent.
#[derive(Debug, Clone)]
pub struct Memo {
    pub view: View,
    pub reach: usize,
    pub navigation: bool,
}

/// Memoized views keyed by node id.
#[derive(Default)]
pub struct RenderCache {
    entries: HashMap<NodeId, CacheEntry>,
    generation: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `node`. `ancestors` runs from the parent upwards;
    /// `navigation` is the target path of the current pass.
    pub fn get<'n>(
        &self,
        node: &Arc<Node>,
        depth: usize,
        root_id: &NodeId,
        ancestors: impl Iterator<Item = &'n Arc<Node>>,
        navigation: &[NodeId],
    ) -> Option<Memo> {
        let entry = self.entries.get(&node.id)?;
        if !same_alloc(&entry.node, node) || entry.depth != depth || &entry.root_id != root_id {
            return None;
        }
        let mut current = ancestors;
        for cached in &entry.ancestors {
            match current.next() {
                Some(ancestor) if same_alloc(cached, ancestor) => {}
                _ => return None,
            }
        }
        if entry.navigation.as_deref().is_some_and(|path| path != navigation) {
            return None;
        }
        Some(Memo {
            view: entry.view.clone(),
            reach: entry.ancestors.len(),
            navigation: entry.navigation.is_some(),
        })
    }

    /// Store `view` with the first `reach` of `ancestors` (parent first).
    #[allow(clippy::too_many_arguments)]
    pub fn insert<'n>(
        &mut self,
        node: &Arc<Node>,
        depth: usize,
        root_id: NodeId,
        ancestors: impl Iterator<Item = &'n Arc<Node>>,
        reach: usize,
        navigation: Option<Vec<NodeId>>,
        view: View,
    ) {
        self.entries.insert(
            node.id.clone(),
            CacheEntry {
                node: Arc::downgrade(node),
                depth,
                root_id,
                ancestors: ancestors.take(reach).map(Arc::downgrade).collect(),
                navigation,
                view,
            },
        );
    }

    /// Drop everything if the registry changed since the last pass.
    pub fn sync_generation(&mut self, generation: u64) {
        if self.generation != generation {
            if !self.entries.is_empty() {
                tracing::debug!(
                    from = self.generation,
                    to = generation,
                    "Registry changed, clearing render cache"
                );
            }
            self.entries.clear();
            self.generation = generation;
        }
    }

    /// Remove entries whose node is no longer alive.
    pub fn prune(&mut self) {
        self.entries.retain(|_, e| e.node.strong_count() > 0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn same_alloc(cached: &Weak<Node>, node: &Arc<Node>) -> bool {
    cached.upgrade().is_some_and(|c| Arc::ptr_eq(&c, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;

    fn node(id: &str) -> Arc<Node> {
        Arc::new(Node::new(NodeId::new(id).unwrap(), NodeType::Item, "row_simple", "x"))
    }

    fn ids(raw: &[&str]) -> Vec<NodeId> {
        raw.iter().map(|s| NodeId::new(*s).unwrap()).collect()
    }

    #[test]
    fn hit_requires_identity() {
        let mut cache = RenderCache::new();
        let a = node("a");
        let twin = node("a");
        let parent = node("root");
        let root = parent.id.clone();
        let chain = [Arc::clone(&parent)];
        cache.insert(&a, 1, root.clone(), chain.iter(), 1, None, View::text("a"));

        assert!(cache.get(&a, 1, &root, chain.iter(), &[]).is_some());
        assert!(cache.get(&twin, 1, &root, chain.iter(), &[]).is_none());
        assert!(cache.get(&a, 2, &root, chain.iter(), &[]).is_none());
        assert!(cache.get(&a, 1, &root, [node("root")].iter(), &[]).is_none());
        assert!(cache.get(&a, 1, &root, std::iter::empty(), &[]).is_none());
    }

    #[test]
    fn only_recorded_reach_is_compared() {
        let mut cache = RenderCache::new();
        let leaf = node("leaf");
        let parent = node("tab");
        let root = node("root");
        let chain = [Arc::clone(&parent), Arc::clone(&root)];
        cache.insert(&leaf, 2, root.id.clone(), chain.iter(), 1, None, View::Empty);

        // A new root snapshot does not matter to a leaf that read its parent only.
        let new_root = [Arc::clone(&parent), node("root")];
        let hit = cache.get(&leaf, 2, &root.id, new_root.iter(), &[]).unwrap();
        assert_eq!(hit.reach, 1);

        // Once the leaf depends on the root, the new snapshot misses.
        cache.insert(&leaf, 2, root.id.clone(), chain.iter(), 2, None, View::Empty);
        assert!(cache.get(&leaf, 2, &root.id, new_root.iter(), &[]).is_none());
        assert!(cache.get(&leaf, 2, &root.id, chain.iter(), &[]).is_some());
    }

    #[test]
    fn navigation_dependent_entries_match_the_target_path() {
        let mut cache = RenderCache::new();
        let shell = node("root");
        let path = ids(&["root", "tabA"]);
        cache.insert(&shell, 0, shell.id.clone(), std::iter::empty(), 0, Some(path.clone()), View::Empty);

        let hit = cache.get(&shell, 0, &shell.id, std::iter::empty(), &path).unwrap();
        assert!(hit.navigation);
        let other = ids(&["root", "tabB"]);
        assert!(cache.get(&shell, 0, &shell.id, std::iter::empty(), &other).is_none());
        assert!(cache.get(&shell, 0, &shell.id, std::iter::empty(), &[]).is_none());
    }

    #[test]
    fn prune_drops_dead_nodes() {
        let mut cache = RenderCache::new();
        let root = NodeId::new("root").unwrap();
        {
            let gone = node("gone");
            cache.insert(&gone, 0, root.clone(), std::iter::empty(), 0, None, View::Empty);
        }
        let kept = node("kept");
        cache.insert(&kept, 0, root, std::iter::empty(), 0, None, View::Empty);
        cache.prune();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn generation_change_clears() {
        let mut cache = RenderCache::new();
        let a = node("a");
        cache.insert(&a, 0, a.id.clone(), std::iter::empty(), 0, None, View::Empty);
        cache.sync_generation(0);
        assert_eq!(cache.len(), 1);
        cache.sync_generation(1);
        assert!(cache.is_empty());
    }
}
