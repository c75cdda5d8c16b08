//! Action and behavior dispatch.
//!
//! Renderers never mutate data. They attach [`Interaction`] values to the
//! elements they produce, and the host routes an activated interaction to an
//! injected [`NodeActions`] bundle through [`dispatch_interaction`]. Intents
//! are delivered exactly once per activation; retries and rollback belong to
//! the mutation layer behind the bundle.

use crate::model::{BehaviorConfig, CreateOption, Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Callbacks a host implements to connect the engine to its data layer.
///
/// Every method is fire-and-forget. Hosts without a live backend (previews,
/// sandboxes) use [`NoopActions`], so renderers never branch on whether
/// actions exist. [`is_interactive`](Self::is_interactive) is for
/// affordance styling only.
pub trait NodeActions {
    /// Open the create form under `parent`, optionally for a specific option.
    fn request_create(&self, parent: &Node, option: Option<&CreateOption>);

    /// Navigate into a node (usually forwarded to the shell navigator).
    fn navigate_into(&self, target: &NodeId);

    /// Breadcrumb press: jump back to `level` of the current target path,
    /// where `target` sits.
    fn navigate_to_level(&self, level: usize, target: &NodeId) {
        let _ = level;
        self.navigate_into(target);
    }

    fn open_context_menu(&self, node: &Node, parent: Option<&Node>);

    /// Advance a node's status to `next_status`.
    fn cycle_status(&self, node: &Node, next_status: &str);

    /// Generic, data-described behavior.
    fn trigger_behavior(&self, node: &Node, behavior: &BehaviorConfig);

    fn open_note(&self, node: &Node);

    fn move_node(&self, node: &Node, target_parent: &NodeId, index: Option<usize>);

    /// Rebuild the persisted-record shape the mutation layer expects.
    fn node_to_resource(&self, node: &Node, parent_id: Option<&NodeId>) -> Resource {
        Resource::from_node(node, parent_id)
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Action bundle that does nothing. Used outside any live context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActions;

impl NodeActions for NoopActions {
    fn request_create(&self, _parent: &Node, _option: Option<&CreateOption>) {}
    fn navigate_into(&self, _target: &NodeId) {}
    fn open_context_menu(&self, _node: &Node, _parent: Option<&Node>) {}
    fn cycle_status(&self, _node: &Node, _next_status: &str) {}
    fn trigger_behavior(&self, _node: &Node, _behavior: &BehaviorConfig) {}
    fn open_note(&self, _node: &Node) {}
    fn move_node(&self, _node: &Node, _target_parent: &NodeId, _index: Option<usize>) {}

    fn is_interactive(&self) -> bool {
        false
    }
}

/// What activating an element asks for. Pure data, attached to views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    Navigate { target: NodeId },
    /// Breadcrumb jump to an index of the current target path.
    NavigateToLevel { level: usize, target: NodeId },
    Behavior { behavior: BehaviorConfig },
    ContextMenu,
    /// Create under the element's node; `option` is a create-option id.
    Create { option: Option<String> },
    OpenNote,
}

impl Interaction {
    pub fn behavior(behavior: BehaviorConfig) -> Self {
        Interaction::Behavior { behavior }
    }

    pub fn navigate(target: NodeId) -> Self {
        Interaction::Navigate { target }
    }
}

/// Ordered list of statuses used by status cycling.
///
/// Never empty: an empty list falls back to the default cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StatusCycle(Vec<String>);

impl From<Vec<String>> for StatusCycle {
    fn from(statuses: Vec<String>) -> Self {
        Self::new(statuses)
    }
}

impl From<StatusCycle> for Vec<String> {
    fn from(cycle: StatusCycle) -> Self {
        cycle.0
    }
}

impl Default for StatusCycle {
    fn default() -> Self {
        Self(vec![
            "todo".to_string(),
            "in_progress".to_string(),
            "done".to_string(),
        ])
    }
}

impl StatusCycle {
    pub fn new(statuses: Vec<String>) -> Self {
        if statuses.is_empty() {
            Self::default()
        } else {
            Self(statuses)
        }
    }

    pub fn statuses(&self) -> &[String] {
        &self.0
    }

    /// Status following `current`, wrapping around. Unknown or missing
    /// statuses start the cycle.
    pub fn next(&self, current: Option<&str>) -> &str {
        let position = current.and_then(|c| self.0.iter().position(|s| s == c));
        match position {
            Some(i) => &self.0[(i + 1) % self.0.len()],
            None => &self.0[0],
        }
    }
}

/// The node's declared behavior, or the renderer's default.
pub fn effective_behavior(node: &Node, default: BehaviorConfig) -> BehaviorConfig {
    node.metadata.behavior().unwrap_or(default)
}

/// Minimal persisted record reconstructed from a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub kind: NodeType,
    pub variant: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Renderer-owned metadata, without engine keys.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Resource {
    pub fn from_node(node: &Node, parent_id: Option<&NodeId>) -> Self {
        Self {
            id: node.id.clone(),
            parent_id: parent_id.cloned(),
            kind: node.node_type,
            variant: node.variant.clone(),
            title: node.title.clone(),
            status: node.metadata.status().map(String::from),
            data: node.metadata.extension_bag(),
        }
    }
}

/// Route an activated interaction on `node` to the action bundle.
///
/// `CycleStatus` behaviors are resolved against `statuses` and delivered to
/// [`NodeActions::cycle_status`]; every other behavior goes through
/// [`NodeActions::trigger_behavior`] untouched.
pub fn dispatch_interaction(
    interaction: &Interaction,
    node: &Node,
    parent: Option<&Node>,
    actions: &dyn NodeActions,
    statuses: &StatusCycle,
) {
    tracing::debug!(node = %node.id, ?interaction, "Dispatching interaction");
    match interaction {
        Interaction::Navigate { target } => actions.navigate_into(target),
        Interaction::NavigateToLevel { level, target } => actions.navigate_to_level(*level, target),
        Interaction::Behavior {
            behavior: BehaviorConfig::CycleStatus,
        } => {
            let next = statuses.next(node.metadata.status());
            actions.cycle_status(node, next);
        }
        Interaction::Behavior { behavior } => actions.trigger_behavior(node, behavior),
        Interaction::ContextMenu => actions.open_context_menu(node, parent),
        Interaction::Create { option } => {
            let options = node.metadata.create_options();
            let selected = option
                .as_deref()
                .and_then(|id| options.iter().find(|o| o.id == id));
            if option.is_some() && selected.is_none() {
                tracing::warn!(node = %node.id, option = ?option, "Create option not found, opening generic form");
            }
            actions.request_create(node, selected);
        }
        Interaction::OpenNote => actions.open_note(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl NodeActions for Recorder {
        fn request_create(&self, parent: &Node, option: Option<&CreateOption>) {
            self.calls.borrow_mut().push(format!(
                "create:{}:{}",
                parent.id,
                option.map(|o| o.id.as_str()).unwrap_or("-")
            ));
        }
        fn navigate_into(&self, target: &NodeId) {
            self.calls.borrow_mut().push(format!("navigate:{target}"));
        }
        fn open_context_menu(&self, node: &Node, _parent: Option<&Node>) {
            self.calls.borrow_mut().push(format!("menu:{}", node.id));
        }
        fn cycle_status(&self, node: &Node, next_status: &str) {
            self.calls
                .borrow_mut()
                .push(format!("status:{}:{next_status}", node.id));
        }
        fn trigger_behavior(&self, node: &Node, behavior: &BehaviorConfig) {
            self.calls
                .borrow_mut()
                .push(format!("behavior:{}:{}", node.id, behavior.action()));
        }
        fn open_note(&self, node: &Node) {
            self.calls.borrow_mut().push(format!("note:{}", node.id));
        }
        fn move_node(&self, node: &Node, target_parent: &NodeId, _index: Option<usize>) {
            self.calls
                .borrow_mut()
                .push(format!("move:{}:{target_parent}", node.id));
        }
    }

    fn task(status: &str) -> Node {
        Node::new(NodeId::new("t1").unwrap(), NodeType::Item, "row_simple", "Task")
            .with_meta("status", status)
    }

    #[test]
    fn status_cycle_wraps_and_restarts() {
        let cycle = StatusCycle::default();
        assert_eq!(cycle.next(Some("todo")), "in_progress");
        assert_eq!(cycle.next(Some("done")), "todo");
        assert_eq!(cycle.next(Some("archived")), "todo");
        assert_eq!(cycle.next(None), "todo");
        assert_eq!(StatusCycle::new(vec![]), StatusCycle::default());
    }

    #[test]
    fn cycle_status_goes_to_dedicated_callback() {
        let recorder = Recorder::default();
        dispatch_interaction(
            &Interaction::behavior(BehaviorConfig::CycleStatus),
            &task("in_progress"),
            None,
            &recorder,
            &StatusCycle::default(),
        );
        assert_eq!(*recorder.calls.borrow(), vec!["status:t1:done"]);
    }

    #[test]
    fn declared_behavior_overrides_default() {
        let node = task("todo").with_meta("behavior", json!({"action": "open_note"}));
        let behavior = effective_behavior(&node, BehaviorConfig::CycleStatus);
        assert_eq!(behavior, BehaviorConfig::OpenNote);

        let recorder = Recorder::default();
        dispatch_interaction(
            &Interaction::behavior(behavior),
            &node,
            None,
            &recorder,
            &StatusCycle::default(),
        );
        assert_eq!(*recorder.calls.borrow(), vec!["behavior:t1:open_note"]);
    }

    #[test]
    fn create_looks_up_option() {
        let node = task("todo").with_meta(
            "create_options",
            json!([{"id": "sub", "label": "Subtask"}]),
        );
        let recorder = Recorder::default();
        let statuses = StatusCycle::default();
        dispatch_interaction(
            &Interaction::Create {
                option: Some("sub".into()),
            },
            &node,
            None,
            &recorder,
            &statuses,
        );
        dispatch_interaction(
            &Interaction::Create {
                option: Some("nope".into()),
            },
            &node,
            None,
            &recorder,
            &statuses,
        );
        assert_eq!(*recorder.calls.borrow(), vec!["create:t1:sub", "create:t1:-"]);
    }

    #[test]
    fn breadcrumb_defaults_to_plain_navigation() {
        let recorder = Recorder::default();
        dispatch_interaction(
            &Interaction::NavigateToLevel {
                level: 1,
                target: NodeId::new("tasks").unwrap(),
            },
            &task("todo"),
            None,
            &recorder,
            &StatusCycle::default(),
        );
        assert_eq!(*recorder.calls.borrow(), vec!["navigate:tasks"]);
        assert_eq!(
            serde_json::to_value(Interaction::NavigateToLevel {
                level: 1,
                target: NodeId::new("tasks").unwrap(),
            })
            .unwrap(),
            json!({"kind": "navigate_to_level", "level": 1, "target": "tasks"})
        );
    }

    #[test]
    fn noop_bundle_is_not_interactive() {
        let noop = NoopActions;
        assert!(!noop.is_interactive());
        dispatch_interaction(
            &Interaction::OpenNote,
            &task("todo"),
            None,
            &noop,
            &StatusCycle::default(),
        );
    }

    #[test]
    fn resource_strips_engine_keys() {
        let node = task("done")
            .with_meta("color", "red")
            .with_meta("context_menu", json!({"options": []}));
        let parent = NodeId::new("folder").unwrap();
        let resource = NoopActions.node_to_resource(&node, Some(&parent));
        assert_eq!(resource.parent_id, Some(parent));
        assert_eq!(resource.status.as_deref(), Some("done"));
        assert!(resource.data.contains_key("color"));
        assert!(!resource.data.contains_key("context_menu"));
    }

    #[test]
    fn interaction_wire_shape() {
        let interaction = Interaction::navigate(NodeId::new("g1").unwrap());
        assert_eq!(
            serde_json::to_value(&interaction).unwrap(),
            json!({"kind": "navigate", "target": "g1"})
        );
    }
}
