//! The scope a renderer runs in.

use crate::actions::NodeActions;
use crate::config::EngineConfig;
use crate::engine::cache::RenderCache;
use crate::engine::context::{RenderContext, RenderStats};
use crate::model::{Node, NodeId};
use crate::navigation::NavigationState;
use crate::registry::{ResolutionPath, VariantRegistry};
use crate::view::{Element, View};
use std::cell::Cell;
use std::sync::Arc;

/// A node on the render stack and what its output has read so far.
struct Frame {
    ctx: RenderContext,
    /// Ancestor levels the output depends on (1 = parent).
    reach: Cell<usize>,
    navigated: Cell<bool>,
}

/// Ambient state handed to a [`NodeRenderer`](crate::registry::NodeRenderer).
///
/// Holds a stack of [`RenderContext`]s: the top is the node currently being
/// rendered, the entries below are its ancestors. A context pushed for a node
/// is only visible to that node's renderer and to descendants rendered
/// through it.
///
/// Reads that look above the parent ([`root_node`](Self::root_node),
/// [`ancestors`](Self::ancestors), [`context`](Self::context)) or at the
/// [`navigation`](Self::navigation) state are recorded, so memoized output
/// is only reused where those inputs are unchanged.
pub struct RenderScope<'a> {
    registry: &'a VariantRegistry,
    actions: &'a dyn NodeActions,
    config: &'a EngineConfig,
    cache: &'a mut RenderCache,
    navigation: Option<&'a NavigationState>,
    root: RenderContext,
    stack: Vec<Frame>,
    stats: RenderStats,
}

impl<'a> RenderScope<'a> {
    pub(crate) fn new(
        root: &Arc<Node>,
        registry: &'a VariantRegistry,
        actions: &'a dyn NodeActions,
        config: &'a EngineConfig,
        cache: &'a mut RenderCache,
        navigation: Option<&'a NavigationState>,
    ) -> Self {
        Self {
            registry,
            actions,
            config,
            cache,
            navigation,
            root: RenderContext::root(root),
            stack: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    /// Context of the node being rendered. Exposes the root node, so the
    /// output is treated as depending on every ancestor.
    pub fn context(&self) -> &RenderContext {
        self.depends_on(usize::MAX);
        self.top()
    }

    pub fn depth(&self) -> usize {
        self.top().depth
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.top().parent_id.as_ref()
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root.root_id
    }

    pub fn root_node(&self) -> &Arc<Node> {
        self.depends_on(usize::MAX);
        &self.root.root_node
    }

    /// Parent of the node being rendered.
    pub fn parent(&self) -> Option<&Arc<Node>> {
        let len = self.stack.len();
        if len >= 2 {
            Some(&self.stack[len - 2].ctx.node)
        } else {
            None
        }
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.depends_on(usize::MAX);
        let len = self.stack.len();
        self.stack[..len.saturating_sub(1)]
            .iter()
            .rev()
            .map(|frame| &frame.ctx.node)
    }

    /// Shell navigation state of this pass, when rendered through
    /// [`ViewEngine::render_navigated`](crate::engine::ViewEngine::render_navigated).
    pub fn navigation(&self) -> Option<&NavigationState> {
        if let Some(frame) = self.stack.last() {
            frame.navigated.set(true);
        }
        self.navigation
    }

    pub fn actions(&self) -> &dyn NodeActions {
        self.actions
    }

    pub fn is_interactive(&self) -> bool {
        self.actions.is_interactive()
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn registry(&self) -> &VariantRegistry {
        self.registry
    }

    /// Render every child of the current node, in order.
    pub fn render_children(&mut self) -> Vec<View> {
        let current = Arc::clone(&self.top().node);
        current
            .children
            .iter()
            .map(|child| self.render_child(child))
            .collect()
    }

    /// Render one child of the current node (for layouts that place
    /// children individually). The child is rendered one level deeper
    /// than the current node.
    pub fn render_child(&mut self, child: &Arc<Node>) -> View {
        let ctx = self.top().child(child);
        self.render_node(ctx)
    }

    /// Render the descendant at the end of `path`, a chain of ids starting
    /// at a child of the current node. Nodes along the way are not rendered
    /// but give the target its real depth and parent. A path that leaves
    /// the tree renders nothing.
    pub fn render_path(&mut self, path: &[NodeId]) -> View {
        let Some((target, between)) = path.split_last() else {
            return View::Empty;
        };
        let mut pushed = 0;
        for id in between {
            let Some(next) = self.top().node.child(id).cloned() else {
                break;
            };
            let ctx = self.top().child(&next);
            self.push(ctx);
            pushed += 1;
        }
        let target = if pushed == between.len() {
            self.top().node.child(target).cloned()
        } else {
            None
        };
        let view = match target {
            Some(node) => self.render_child(&node),
            None => {
                tracing::warn!(from = %self.top().node.id, "Render path leaves the tree");
                View::Empty
            }
        };
        for _ in 0..pushed {
            self.pop();
        }
        view
    }

    pub(crate) fn render_root(&mut self) -> View {
        let ctx = self.root.clone();
        self.render_node(ctx)
    }

    pub(crate) fn into_stats(self) -> RenderStats {
        self.stats
    }

    fn top(&self) -> &RenderContext {
        self.stack.last().map(|frame| &frame.ctx).unwrap_or(&self.root)
    }

    fn nav_path(&self) -> &'a [NodeId] {
        self.navigation
            .map(|nav| nav.target_path.as_slice())
            .unwrap_or(&[])
    }

    /// Record that the current output reads `levels` ancestors up.
    fn depends_on(&self, levels: usize) {
        if let Some(frame) = self.stack.last() {
            let levels = levels.min(frame.ctx.depth);
            frame.reach.set(frame.reach.get().max(levels));
        }
    }

    /// Fold a finished child's dependencies into the current frame.
    fn inherit(&self, reach: usize, navigated: bool) {
        self.depends_on(reach.saturating_sub(1));
        if navigated {
            if let Some(frame) = self.stack.last() {
                frame.navigated.set(true);
            }
        }
    }

    fn push(&mut self, ctx: RenderContext) {
        // Every renderer may consult its parent (inherited menus).
        let reach = ctx.depth.min(1);
        self.stack.push(Frame {
            ctx,
            reach: Cell::new(reach),
            navigated: Cell::new(false),
        });
    }

    fn pop(&mut self) -> (usize, bool) {
        let Some(frame) = self.stack.pop() else {
            return (0, false);
        };
        let (reach, navigated) = (frame.reach.get(), frame.navigated.get());
        self.inherit(reach, navigated);
        (reach, navigated)
    }

    fn render_node(&mut self, ctx: RenderContext) -> View {
        let node = Arc::clone(&ctx.node);
        self.stats.max_depth_seen = self.stats.max_depth_seen.max(ctx.depth);

        if ctx.depth > self.config.max_depth {
            tracing::warn!(
                node = %node.id,
                depth = ctx.depth,
                max_depth = self.config.max_depth,
                "Render depth limit reached, truncating subtree"
            );
            self.stats.truncated += 1;
            return Element::new("truncated")
                .node(&node.id)
                .attr("depth", ctx.depth)
                .attr("hidden_children", node.children.len())
                .into_view();
        }

        // The stack holds the ancestors of `ctx`, parent on top.
        if self.config.memoize {
            let ancestors = self.stack.iter().rev().map(|frame| &frame.ctx.node);
            let hit = self
                .cache
                .get(&node, ctx.depth, &ctx.root_id, ancestors, self.nav_path());
            if let Some(memo) = hit {
                self.stats.cache_hits += 1;
                self.inherit(memo.reach, memo.navigation);
                return memo.view;
            }
        }

        let registry = self.registry;
        let resolution = registry.resolve(&node);
        match resolution.path {
            ResolutionPath::Exact => self.stats.exact += 1,
            ResolutionPath::TypeDefault => self.stats.type_default += 1,
            ResolutionPath::Fallback => self.stats.fallback += 1,
        }
        let renderer = Arc::clone(resolution.renderer);

        tracing::trace!(node = %node.id, depth = ctx.depth, renderer = renderer.name(), "Rendering node");

        let depth = ctx.depth;
        let root_id = ctx.root_id.clone();

        self.push(ctx);
        let view = renderer.render(&node, self);
        let (reach, navigated) = self.pop();
        self.stats.rendered += 1;

        if self.config.memoize {
            let navigation = navigated.then(|| self.nav_path().to_vec());
            let ancestors = self.stack.iter().rev().map(|frame| &frame.ctx.node);
            self.cache
                .insert(&node, depth, root_id, ancestors, reach, navigation, view.clone());
        }
        view
    }
}
