//! Context-menu resolution.
//!
//! A node's effective menu comes from its own `metadata.context_menu`, or
//! else from its parent's `metadata.child_context_menu`. Options are then
//! filtered by their `show_if` predicate against the node's metadata.
//! Menu visibility is cosmetic, so every ambiguity resolves to "visible".

use crate::actions::{NodeActions, StatusCycle};
use crate::model::{BehaviorConfig, Metadata, Node, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A declarative menu definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuConfig {
    #[serde(default)]
    pub options: Vec<ContextMenuOption>,
}

/// One menu entry. Type-specific fields (e.g. `behavior` for behavior
/// options, `target` for navigate options) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuOption {
    pub id: String,
    pub label: String,
    pub action_type: MenuActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What selecting an option does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MenuActionType {
    Delete,
    Edit,
    Navigate,
    Create,
    Move,
    Note,
    Status,
    Behavior,
    Custom(String),
}

impl From<String> for MenuActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "delete" => MenuActionType::Delete,
            "edit" => MenuActionType::Edit,
            "navigate" => MenuActionType::Navigate,
            "create" => MenuActionType::Create,
            "move" => MenuActionType::Move,
            "note" | "open_note" => MenuActionType::Note,
            "status" | "cycle_status" => MenuActionType::Status,
            "behavior" => MenuActionType::Behavior,
            _ => MenuActionType::Custom(value),
        }
    }
}

impl From<MenuActionType> for String {
    fn from(value: MenuActionType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MenuActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MenuActionType::Delete => "delete",
            MenuActionType::Edit => "edit",
            MenuActionType::Navigate => "navigate",
            MenuActionType::Create => "create",
            MenuActionType::Move => "move",
            MenuActionType::Note => "note",
            MenuActionType::Status => "status",
            MenuActionType::Behavior => "behavior",
            MenuActionType::Custom(s) => s,
        };
        f.write_str(s)
    }
}

/// Visibility predicate `{key, value, operator}` over node metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowIf {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub operator: ShowIfOperator,
}

/// Comparison used by [`ShowIf`]. Missing operator means `eq`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShowIfOperator {
    #[default]
    Eq,
    Neq,
    Exists,
    NotExists,
    /// Unrecognised operator; evaluates to visible.
    Unknown(String),
}

impl From<String> for ShowIfOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "eq" => ShowIfOperator::Eq,
            "neq" => ShowIfOperator::Neq,
            "exists" => ShowIfOperator::Exists,
            "not_exists" => ShowIfOperator::NotExists,
            _ => ShowIfOperator::Unknown(value),
        }
    }
}

impl From<ShowIfOperator> for String {
    fn from(value: ShowIfOperator) -> Self {
        match value {
            ShowIfOperator::Eq => "eq".to_string(),
            ShowIfOperator::Neq => "neq".to_string(),
            ShowIfOperator::Exists => "exists".to_string(),
            ShowIfOperator::NotExists => "not_exists".to_string(),
            ShowIfOperator::Unknown(s) => s,
        }
    }
}

impl ShowIf {
    pub fn new(key: impl Into<String>, operator: ShowIfOperator, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            value,
            operator,
        }
    }

    /// Evaluate against node metadata.
    ///
    /// A missing key never equals a value, so `eq` hides and `neq` shows.
    /// `not_exists` on a missing key shows. A JSON `null` counts as absent.
    pub fn evaluate(&self, metadata: &Metadata) -> bool {
        let actual = metadata.get(&self.key).filter(|v| !v.is_null());
        match &self.operator {
            ShowIfOperator::Eq => match (&self.value, actual) {
                (Some(expected), Some(actual)) => expected == actual,
                (None, None) => true,
                _ => false,
            },
            ShowIfOperator::Neq => match (&self.value, actual) {
                (Some(expected), Some(actual)) => expected != actual,
                (None, None) => false,
                _ => true,
            },
            ShowIfOperator::Exists => actual.is_some(),
            ShowIfOperator::NotExists => actual.is_none(),
            ShowIfOperator::Unknown(op) => {
                tracing::debug!(operator = %op, key = %self.key, "Unknown show_if operator, showing option");
                true
            }
        }
    }
}

impl ContextMenuOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, action_type: MenuActionType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action_type,
            show_if: None,
            icon: None,
            extra: Map::new(),
        }
    }

    pub fn with_show_if(mut self, show_if: ShowIf) -> Self {
        self.show_if = Some(show_if);
        self
    }

    /// Options without `show_if` are always visible.
    pub fn is_visible(&self, metadata: &Metadata) -> bool {
        self.show_if
            .as_ref()
            .map_or(true, |cond| cond.evaluate(metadata))
    }

    /// `behavior` field of a behavior option.
    pub fn behavior(&self) -> Option<BehaviorConfig> {
        let value = self.extra.get("behavior")?;
        match BehaviorConfig::deserialize(value) {
            Ok(behavior) => Some(behavior),
            Err(e) => {
                tracing::warn!(option = %self.id, error = %e, "Ignoring malformed menu behavior");
                None
            }
        }
    }

    /// `target` field of a navigate or move option.
    pub fn target(&self) -> Option<NodeId> {
        self.extra
            .get("target")
            .and_then(Value::as_str)
            .and_then(|s| NodeId::new(s).ok())
    }
}

impl ContextMenuConfig {
    pub fn new(options: Vec<ContextMenuOption>) -> Self {
        Self { options }
    }

    /// Keep only options visible for `metadata`.
    pub fn filtered(&self, metadata: &Metadata) -> ContextMenuConfig {
        ContextMenuConfig {
            options: self
                .options
                .iter()
                .filter(|o| o.is_visible(metadata))
                .cloned()
                .collect(),
        }
    }

    pub fn option(&self, id: &str) -> Option<&ContextMenuOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// Where a resolved menu came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSource {
    Item,
    Parent,
}

/// Unfiltered menu for `node` and where it came from.
pub fn source_menu(node: &Node, parent: Option<&Node>) -> Option<(ContextMenuConfig, MenuSource)> {
    if let Some(menu) = node.metadata.context_menu() {
        return Some((menu, MenuSource::Item));
    }
    parent
        .and_then(|p| p.metadata.child_context_menu())
        .map(|menu| (menu, MenuSource::Parent))
}

/// Effective menu for `node`, filtered by visibility.
///
/// `None` means "show no menu": there is no config, or no option survived
/// the visibility filter.
pub fn resolve(node: &Node, parent: Option<&Node>) -> Option<ContextMenuConfig> {
    let (menu, source) = source_menu(node, parent)?;
    let filtered = menu.filtered(&node.metadata);
    tracing::trace!(
        node = %node.id,
        ?source,
        total = menu.options.len(),
        visible = filtered.options.len(),
        "Resolved context menu"
    );
    if filtered.options.is_empty() {
        None
    } else {
        Some(filtered)
    }
}

/// Deliver a selected menu option to the action bundle.
pub fn dispatch_menu_option(
    option: &ContextMenuOption,
    node: &Node,
    parent: Option<&Node>,
    actions: &dyn NodeActions,
    statuses: &StatusCycle,
) {
    tracing::debug!(node = %node.id, option = %option.id, action = %option.action_type, "Menu option selected");
    match &option.action_type {
        MenuActionType::Navigate => {
            let target = option.target().unwrap_or_else(|| node.id.clone());
            actions.navigate_into(&target);
        }
        MenuActionType::Create => {
            let create = node
                .metadata
                .create_options()
                .into_iter()
                .find(|c| Some(c.id.as_str()) == option.extra.get("create_option").and_then(Value::as_str));
            actions.request_create(node, create.as_ref());
        }
        MenuActionType::Move => match option.target() {
            Some(target) => actions.move_node(node, &target, None),
            None => actions.trigger_behavior(node, &BehaviorConfig::custom("move")),
        },
        MenuActionType::Note => actions.open_note(node),
        MenuActionType::Status => actions.cycle_status(node, statuses.next(node.metadata.status())),
        MenuActionType::Behavior => match option.behavior() {
            Some(behavior) => actions.trigger_behavior(node, &behavior),
            None => tracing::warn!(option = %option.id, "Behavior option without a behavior"),
        },
        MenuActionType::Delete | MenuActionType::Edit | MenuActionType::Custom(_) => {
            let behavior = BehaviorConfig::Custom {
                action: option.action_type.to_string(),
                target: parent.map(|p| p.id.to_string()),
                payload: Some(Value::String(option.id.clone())),
            };
            actions.trigger_behavior(node, &behavior);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use serde_json::json;

    fn node_with(meta: Value) -> Node {
        let mut node = Node::new(NodeId::new("n").unwrap(), NodeType::Item, "row_simple", "N");
        node.metadata = serde_json::from_value(meta).unwrap();
        node
    }

    fn show_if(value: Value) -> ShowIf {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn operators() {
        let meta: Metadata = serde_json::from_value(json!({"locked": true, "color": "red"})).unwrap();
        assert!(show_if(json!({"key": "locked", "value": true, "operator": "eq"})).evaluate(&meta));
        assert!(!show_if(json!({"key": "locked", "value": true, "operator": "neq"})).evaluate(&meta));
        assert!(show_if(json!({"key": "color", "operator": "exists"})).evaluate(&meta));
        assert!(!show_if(json!({"key": "color", "operator": "not_exists"})).evaluate(&meta));
        assert!(show_if(json!({"key": "color", "value": "red"})).evaluate(&meta));
    }

    #[test]
    fn missing_key_semantics() {
        let meta = Metadata::new();
        assert!(!show_if(json!({"key": "locked", "value": true, "operator": "eq"})).evaluate(&meta));
        assert!(show_if(json!({"key": "locked", "value": true, "operator": "neq"})).evaluate(&meta));
        assert!(!show_if(json!({"key": "locked", "operator": "exists"})).evaluate(&meta));
        assert!(show_if(json!({"key": "locked", "operator": "not_exists"})).evaluate(&meta));
    }

    #[test]
    fn unknown_operator_fails_open() {
        let cond = show_if(json!({"key": "locked", "value": 1, "operator": "gt"}));
        assert_eq!(cond.operator, ShowIfOperator::Unknown("gt".into()));
        assert!(cond.evaluate(&Metadata::new()));
    }

    #[test]
    fn item_menu_wins_over_parent_menu() {
        let item = node_with(json!({"context_menu": {"options": [
            {"id": "mine", "label": "Mine", "action_type": "edit"}
        ]}}));
        let parent = node_with(json!({"child_context_menu": {"options": [
            {"id": "inherited", "label": "Inherited", "action_type": "delete"}
        ]}}));
        let menu = resolve(&item, Some(&parent)).unwrap();
        assert_eq!(menu.options[0].id, "mine");

        let plain = node_with(json!({}));
        let menu = resolve(&plain, Some(&parent)).unwrap();
        assert_eq!(menu.options[0].id, "inherited");
        assert_eq!(menu.options[0].action_type, MenuActionType::Delete);
    }

    #[test]
    fn no_config_means_no_menu() {
        let plain = node_with(json!({}));
        assert!(resolve(&plain, None).is_none());
        let empty = node_with(json!({"context_menu": {"options": []}}));
        assert!(resolve(&empty, None).is_none());
    }

    #[test]
    fn fully_filtered_menu_is_suppressed() {
        let node = node_with(json!({"locked": true, "context_menu": {"options": [
            {"id": "del", "label": "Delete", "action_type": "delete",
             "show_if": {"key": "locked", "value": true, "operator": "neq"}}
        ]}}));
        assert!(resolve(&node, None).is_none());
    }

    #[test]
    fn action_type_round_trips_custom_names() {
        let option: ContextMenuOption = serde_json::from_value(json!({
            "id": "share", "label": "Share", "action_type": "share_link", "channel": "email"
        }))
        .unwrap();
        assert_eq!(option.action_type, MenuActionType::Custom("share_link".into()));
        assert_eq!(option.extra.get("channel"), Some(&json!("email")));
        let back = serde_json::to_value(&option).unwrap();
        assert_eq!(back["action_type"], json!("share_link"));
    }
}
