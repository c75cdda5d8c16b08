//! Tree renderer.
//!
//! [`ViewEngine`] walks a node tree depth-first in child order, resolves
//! each node's renderer through the [`VariantRegistry`] and runs it inside a
//! [`RenderScope`] carrying the node's [`RenderContext`]. Renderers decide
//! where their children go; the engine only guarantees that every child
//! rendered through the scope gets the right depth, parent and root.

mod cache;
mod context;
mod scope;

pub use cache::{Memo, RenderCache};
pub use context::{RenderContext, RenderStats};
pub use scope::RenderScope;

use crate::actions::{dispatch_interaction, Interaction, NodeActions, NoopActions};
use crate::config::EngineConfig;
use crate::error::{EngineError, IngestError};
use crate::menu::{self, ContextMenuConfig};
use crate::model::{validate_with_limit, Node, NodeId};
use crate::navigation::{NavigationState, ShellNavigator};
use crate::registry::VariantRegistry;
use crate::view::{Element, View};
use serde::Serialize;
use std::rc::Rc;
use std::sync::Arc;

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTree {
    pub root_id: NodeId,
    pub root: View,
    pub stats: RenderStats,
}

impl RenderedTree {
    pub fn to_text(&self) -> String {
        self.root.to_text()
    }
}

/// Renders node trees and routes interactions on the rendered output.
pub struct ViewEngine {
    registry: VariantRegistry,
    actions: Rc<dyn NodeActions>,
    config: EngineConfig,
    cache: RenderCache,
}

impl ViewEngine {
    /// Engine with no-op actions and default config.
    pub fn new(registry: VariantRegistry) -> Self {
        Self {
            registry,
            actions: Rc::new(NoopActions),
            config: EngineConfig::default(),
            cache: RenderCache::new(),
        }
    }

    pub fn with_actions(mut self, actions: Rc<dyn NodeActions>) -> Self {
        self.set_actions(actions);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.set_config(config);
        self
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Mutable registry access for hot swapping. Any change invalidates
    /// memoized output on the next pass.
    pub fn registry_mut(&mut self) -> &mut VariantRegistry {
        &mut self.registry
    }

    pub fn actions(&self) -> &Rc<dyn NodeActions> {
        &self.actions
    }

    /// Replace the action bundle. Views built with the old bundle are dropped.
    pub fn set_actions(&mut self, actions: Rc<dyn NodeActions>) {
        self.actions = actions;
        self.cache.clear();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
        self.cache.clear();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_views(&self) -> usize {
        self.cache.len()
    }

    /// Render a tree snapshot.
    pub fn render(&mut self, root: &Arc<Node>) -> RenderedTree {
        self.render_pass(root, None)
    }

    /// Render the navigator's tree with its state: the shell marks the
    /// active tab and shows the target with its breadcrumbs.
    pub fn render_navigated(&mut self, navigator: &ShellNavigator) -> RenderedTree {
        let state = navigator.state();
        self.render_pass(navigator.root(), Some(&state))
    }

    fn render_pass(
        &mut self,
        root: &Arc<Node>,
        navigation: Option<&NavigationState>,
    ) -> RenderedTree {
        self.cache.sync_generation(self.registry.generation());
        if !self.config.memoize {
            self.cache.clear();
        }

        let mut scope = RenderScope::new(
            root,
            &self.registry,
            self.actions.as_ref(),
            &self.config,
            &mut self.cache,
            navigation,
        );
        let view = scope.render_root();
        let stats = scope.into_stats();
        self.cache.prune();

        tracing::debug!(
            root = %root.id,
            rendered = stats.rendered,
            cache_hits = stats.cache_hits,
            degraded = stats.degraded(),
            truncated = stats.truncated,
            navigated = navigation.is_some(),
            "Render pass complete"
        );

        RenderedTree {
            root_id: root.id.clone(),
            root: view,
            stats,
        }
    }

    /// Validate, then render. With `strict_validation` a tree with
    /// blocking errors is rejected; otherwise findings are logged.
    pub fn render_validated(&mut self, root: &Arc<Node>) -> Result<RenderedTree, EngineError> {
        let result = validate_with_limit(root, self.config.max_depth);
        for warning in &result.warnings {
            tracing::warn!(code = warning.code(), field = warning.field(), "{warning}");
        }
        if !result.is_valid() {
            if self.config.strict_validation {
                return Err(IngestError::Invalid {
                    errors: result.errors,
                }
                .into());
            }
            for error in &result.errors {
                tracing::warn!(code = error.code(), field = error.field(), "Rendering despite: {error}");
            }
        }
        Ok(self.render(root))
    }

    /// Dispatch the element's press interaction. Returns false when the
    /// element has none or its node is not in `root`.
    pub fn activate(&self, root: &Node, element: &Element) -> bool {
        self.fire(root, element, element.on_press.as_ref())
    }

    pub fn activate_long(&self, root: &Node, element: &Element) -> bool {
        self.fire(root, element, element.on_long_press.as_ref())
    }

    fn fire(&self, root: &Node, element: &Element, interaction: Option<&Interaction>) -> bool {
        let (Some(interaction), Some(id)) = (interaction, element.node_id.as_ref()) else {
            return false;
        };
        let Some(node) = root.find(id) else {
            tracing::debug!(node = %id, "Activated element's node is not in the tree");
            return false;
        };
        dispatch_interaction(
            interaction,
            node,
            root.parent_of(id),
            self.actions.as_ref(),
            &self.config.status_cycle,
        );
        true
    }

    /// Effective context menu of a node in `root`.
    pub fn context_menu(&self, root: &Node, id: &NodeId) -> Option<ContextMenuConfig> {
        let node = root.find(id)?;
        menu::resolve(node, root.parent_of(id))
    }

    /// Deliver a selected menu option. Returns false when the node is
    /// missing or the option is not visible for it.
    pub fn select_menu_option(&self, root: &Node, id: &NodeId, option_id: &str) -> bool {
        let Some(node) = root.find(id) else {
            return false;
        };
        let parent = root.parent_of(id);
        let Some(menu) = menu::resolve(node, parent) else {
            return false;
        };
        match menu.option(option_id) {
            Some(option) => {
                menu::dispatch_menu_option(
                    option,
                    node,
                    parent,
                    self.actions.as_ref(),
                    &self.config.status_cycle,
                );
                true
            }
            None => {
                tracing::debug!(node = %id, option = option_id, "Menu option not available");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BehaviorConfig, CreateOption, NodeType};
    use crate::registry::{renderer_fn, ResolutionPath};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    /// Renders every node as `<variant depth=.. parent=..>` with its children.
    fn positioned(tag: &'static str) -> Arc<dyn crate::registry::NodeRenderer> {
        renderer_fn(tag, move |node, cx| {
            Element::new(tag)
                .node(&node.id)
                .attr("depth", cx.depth())
                .attr_opt("parent", cx.parent_id())
                .attr("root", cx.root_id())
                .children(cx.render_children())
                .into_view()
        })
    }

    fn registry() -> VariantRegistry {
        let mut registry = VariantRegistry::new(positioned("fallback"));
        registry.register("stack", positioned("stack"));
        registry.register("row_simple", positioned("row"));
        registry.set_default_for_type(NodeType::Item, "row_simple");
        registry
    }

    fn tree() -> Arc<Node> {
        Node::new(id("root"), NodeType::Space, "stack", "Root")
            .with_child(
                Node::new(id("tabA"), NodeType::Container, "stack", "A")
                    .with_child(Node::new(id("g1"), NodeType::Item, "row_simple", "G1")),
            )
            .with_child(Node::new(id("tabB"), NodeType::Container, "mystery", "B"))
            .into_arc()
    }

    #[test]
    fn context_propagates_depth_parent_and_root() {
        let mut engine = ViewEngine::new(registry());
        let out = engine.render(&tree());

        let g1 = out.root.find_node(&id("g1")).unwrap();
        assert_eq!(g1.tag, "row");
        assert_eq!(g1.attrs["depth"], "2");
        assert_eq!(g1.attrs["parent"], "tabA");
        assert_eq!(g1.attrs["root"], "root");

        let root = out.root.find_node(&id("root")).unwrap();
        assert_eq!(root.attrs["depth"], "0");
        assert!(!root.attrs.contains_key("parent"));

        let b = out.root.find_node(&id("tabB")).unwrap();
        assert_eq!(b.tag, "fallback");
        assert_eq!(out.stats.fallback, 1);
        assert_eq!(out.stats.exact, 3);
        assert_eq!(out.stats.max_depth_seen, 2);
    }

    #[test]
    fn type_default_path_is_counted() {
        let mut engine = ViewEngine::new(registry());
        let root = Node::new(id("a"), NodeType::Item, "unknown_x", "A").into_arc();
        assert_eq!(
            engine.registry().resolve(&root).path,
            ResolutionPath::TypeDefault
        );
        let out = engine.render(&root);
        assert_eq!(out.stats.type_default, 1);
        assert_eq!(out.root.as_element().unwrap().tag, "row");
    }

    #[test]
    fn children_render_in_array_order() {
        let mut engine = ViewEngine::new(registry());
        let out = engine.render(&tree());
        let order: Vec<String> = out
            .root
            .elements()
            .into_iter()
            .filter_map(|e| e.node_id.as_ref().map(NodeId::to_string))
            .collect();
        assert_eq!(order, vec!["root", "tabA", "g1", "tabB"]);
    }

    #[test]
    fn memoized_subtrees_are_reused_by_identity() {
        let mut engine = ViewEngine::new(registry());
        let tree = tree();
        let first = engine.render(&tree);
        assert_eq!(first.stats.cache_hits, 0);

        // Same snapshot: the root itself is a hit.
        let second = engine.render(&tree);
        assert_eq!(second.stats.cache_hits, 1);
        assert_eq!(second.stats.rendered, 0);
        assert_eq!(first.root, second.root);

        // New root sharing both tabs: the tabs re-render under the new
        // parent, g1 (same node, same parent) is reused.
        let mut next = Node::new(id("root"), NodeType::Space, "stack", "Root v2");
        next.children = tree.children.clone();
        let third = engine.render(&next.into_arc());
        assert_eq!(third.stats.cache_hits, 1);
        assert_eq!(third.stats.rendered, 3);
    }

    #[test]
    fn upward_reads_are_not_served_from_an_old_root() {
        let mut registry = registry();
        registry.register(
            "row_simple",
            renderer_fn("trail", |node, cx| {
                let trail: Vec<String> = cx.ancestors().map(|a| a.id.to_string()).collect();
                Element::new("trail")
                    .node(&node.id)
                    .attr("root_title", &cx.root_node().title)
                    .attr("trail", trail.join("<"))
                    .into_view()
            }),
        );
        let mut engine = ViewEngine::new(registry);
        let tree = tree();
        let first = engine.render(&tree);
        assert_eq!(first.root.find_node(&id("g1")).unwrap().attrs["root_title"], "Root");

        let mut next = Node::new(id("root"), NodeType::Space, "stack", "Root v2");
        next.children = tree.children.clone();
        let next = next.into_arc();
        assert!(Arc::ptr_eq(&next.children[0], &tree.children[0]));

        let out = engine.render(&next);
        let g1 = out.root.find_node(&id("g1")).unwrap();
        assert_eq!(g1.attrs["root_title"], "Root v2");
        assert_eq!(g1.attrs["trail"], "tabA<root");
        assert_eq!(out.stats.cache_hits, 0);

        // The same snapshot again is served entirely from the cache.
        let again = engine.render(&next);
        assert_eq!(again.stats.rendered, 0);
        assert_eq!(again.root, out.root);
    }

    #[test]
    fn registry_change_invalidates_cache() {
        let mut engine = ViewEngine::new(registry());
        let tree = tree();
        engine.render(&tree);
        engine.registry_mut().register("mystery", positioned("mystery"));
        let out = engine.render(&tree);
        assert_eq!(out.stats.cache_hits, 0);
        assert_eq!(out.root.find_node(&id("tabB")).unwrap().tag, "mystery");
    }

    #[test]
    fn memoize_off_always_renders() {
        let config = EngineConfig {
            memoize: false,
            ..EngineConfig::default()
        };
        let mut engine = ViewEngine::new(registry()).with_config(config);
        let tree = tree();
        engine.render(&tree);
        let out = engine.render(&tree);
        assert_eq!(out.stats.cache_hits, 0);
        assert_eq!(engine.cached_views(), 0);
    }

    #[test]
    fn depth_limit_truncates() {
        let config = EngineConfig {
            max_depth: 1,
            ..EngineConfig::default()
        };
        let mut engine = ViewEngine::new(registry()).with_config(config);
        let out = engine.render(&tree());
        let cut = out.root.find_node(&id("g1")).unwrap();
        assert_eq!(cut.tag, "truncated");
        assert_eq!(out.stats.truncated, 1);
    }

    #[test]
    fn strict_validation_rejects_blocking_errors() {
        let bad = Node::new(id("r"), NodeType::Space, "stack", "R")
            .with_child(Node::new(id("x"), NodeType::Item, "", "X"))
            .into_arc();

        let mut lenient = ViewEngine::new(registry());
        assert!(lenient.render_validated(&bad).is_ok());

        let config = EngineConfig {
            strict_validation: true,
            ..EngineConfig::default()
        };
        let mut strict = ViewEngine::new(registry()).with_config(config);
        let err = strict.render_validated(&bad).unwrap_err();
        assert!(matches!(err, EngineError::Ingest(IngestError::Invalid { .. })));
    }

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl NodeActions for Recorder {
        fn request_create(&self, parent: &Node, option: Option<&CreateOption>) {
            let option = option.map(|o| o.id.clone()).unwrap_or_default();
            self.calls.borrow_mut().push(format!("create:{}:{option}", parent.id));
        }
        fn navigate_into(&self, target: &NodeId) {
            self.calls.borrow_mut().push(format!("navigate:{target}"));
        }
        fn open_context_menu(&self, node: &Node, parent: Option<&Node>) {
            let parent = parent.map(|p| p.id.to_string()).unwrap_or_default();
            self.calls.borrow_mut().push(format!("menu:{}:{parent}", node.id));
        }
        fn cycle_status(&self, node: &Node, next_status: &str) {
            self.calls.borrow_mut().push(format!("status:{}:{next_status}", node.id));
        }
        fn trigger_behavior(&self, node: &Node, behavior: &BehaviorConfig) {
            self.calls.borrow_mut().push(format!("behavior:{}:{}", node.id, behavior.action()));
        }
        fn open_note(&self, node: &Node) {
            self.calls.borrow_mut().push(format!("note:{}", node.id));
        }
        fn move_node(&self, node: &Node, target_parent: &NodeId, _index: Option<usize>) {
            self.calls.borrow_mut().push(format!("move:{}:{target_parent}", node.id));
        }
    }

    #[test]
    fn activation_routes_to_actions() {
        let recorder = Rc::new(Recorder::default());
        let mut registry = registry();
        registry.register(
            "row_simple",
            renderer_fn("pressable", |node, _cx| {
                Element::new("row")
                    .node(&node.id)
                    .on_press(Interaction::behavior(BehaviorConfig::CycleStatus))
                    .on_long_press(Interaction::ContextMenu)
                    .into_view()
            }),
        );
        let mut engine = ViewEngine::new(registry).with_actions(recorder.clone());
        let tree = tree();
        let out = engine.render(&tree);
        let row = out.root.find_node(&id("g1")).unwrap();

        assert!(engine.activate(&tree, row));
        assert!(engine.activate_long(&tree, row));
        let stack = out.root.find_node(&id("tabA")).unwrap();
        assert!(!engine.activate(&tree, stack));

        assert_eq!(
            *recorder.calls.borrow(),
            vec!["status:g1:todo", "menu:g1:tabA"]
        );
    }

    #[test]
    fn menu_selection_goes_through_resolver() {
        let recorder = Rc::new(Recorder::default());
        let engine = ViewEngine::new(registry()).with_actions(recorder.clone());
        let parent = Node::new(id("list"), NodeType::Collection, "stack", "List").with_meta(
            "child_context_menu",
            json!({"options": [
                {"id": "del", "label": "Delete", "action_type": "delete",
                 "show_if": {"key": "locked", "value": true, "operator": "neq"}},
                {"id": "open", "label": "Open", "action_type": "navigate"}
            ]}),
        );
        let root = parent
            .with_child(Node::new(id("a"), NodeType::Item, "row_simple", "A").with_meta("locked", true))
            .with_child(Node::new(id("b"), NodeType::Item, "row_simple", "B"))
            .into_arc();

        let menu = engine.context_menu(&root, &id("a")).unwrap();
        assert_eq!(menu.options.len(), 1);
        assert!(!engine.select_menu_option(&root, &id("a"), "del"));
        assert!(engine.select_menu_option(&root, &id("b"), "del"));
        assert!(engine.select_menu_option(&root, &id("a"), "open"));
        assert!(!engine.select_menu_option(&root, &id("zzz"), "open"));

        assert_eq!(
            *recorder.calls.borrow(),
            vec!["behavior:b:delete", "navigate:a"]
        );
    }
}
