//! Create options and form-field schemas.
//!
//! These are consumed by an external dynamic form renderer. The engine only
//! carries them from node metadata to [`NodeActions::request_create`](crate::actions::NodeActions::request_create).

use crate::model::node::NodeType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a `create_options` / `header_action` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOption {
    pub id: String,
    pub label: String,
    /// Variant of the node to create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CreateFieldSchema>,
    /// Unknown keys are preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A declarative form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFieldSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Field kind (`text`, `number`, `date`, `select`, ...). Opaque to the engine.
    #[serde(rename = "type", default = "default_field_kind")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Value>,
}

fn default_field_kind() -> String {
    "text".to_string()
}

impl CreateOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            variant: None,
            node_type: None,
            icon: None,
            fields: Vec::new(),
            extra: Map::new(),
        }
    }
}
