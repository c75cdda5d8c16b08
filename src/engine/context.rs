//! Per-node render context.

use crate::model::{Node, NodeId};
use serde::Serialize;
use std::sync::Arc;

/// Positional state of the node being rendered.
///
/// `root_id` and `root_node` are the same at every depth of a pass;
/// `depth` is the parent's depth plus one, with the root at 0.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub node: Arc<Node>,
    pub depth: usize,
    pub parent_id: Option<NodeId>,
    pub root_id: NodeId,
    pub root_node: Arc<Node>,
}

impl RenderContext {
    /// Context of the root of a pass.
    pub fn root(root: &Arc<Node>) -> Self {
        Self {
            node: Arc::clone(root),
            depth: 0,
            parent_id: None,
            root_id: root.id.clone(),
            root_node: Arc::clone(root),
        }
    }

    /// Context for a child of this context's node.
    pub fn child(&self, child: &Arc<Node>) -> Self {
        Self {
            node: Arc::clone(child),
            depth: self.depth + 1,
            parent_id: Some(self.node.id.clone()),
            root_id: self.root_id.clone(),
            root_node: Arc::clone(&self.root_node),
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// Counters collected during one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    /// Renderer invocations (cache hits excluded).
    pub rendered: usize,
    pub exact: usize,
    pub type_default: usize,
    pub fallback: usize,
    pub cache_hits: usize,
    /// Nodes cut off by the depth limit.
    pub truncated: usize,
    pub max_depth_seen: usize,
}

impl RenderStats {
    /// Resolutions that did not find the node's own variant.
    pub fn degraded(&self) -> usize {
        self.type_default + self.fallback
    }
}
