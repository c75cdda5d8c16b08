//! Declarative interaction intents.
//!
//! A node states what should happen when it is activated with
//! `metadata.behavior = {action, target?, payload?}`. The wire format is kept
//! as is; on load it is lifted into a closed [`BehaviorConfig`] with a
//! validated payload per kind. Unknown actions land in
//! [`BehaviorConfig::Custom`] so newer data keeps working on older engines.

use crate::error::BehaviorError;
use crate::model::node_id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACTION_CYCLE_STATUS: &str = "cycle_status";
pub const ACTION_TOGGLE_STATUS: &str = "toggle_status";
pub const ACTION_SET_STATUS: &str = "set_status";
pub const ACTION_UPDATE_FIELD: &str = "update_field";
pub const ACTION_MOVE_NODE: &str = "move_node";
pub const ACTION_NAVIGATE: &str = "navigate";
pub const ACTION_OPEN_NOTE: &str = "open_note";

/// A data-described intent delivered to the mutation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBehavior", into = "RawBehavior")]
pub enum BehaviorConfig {
    /// Advance `metadata.status` to the next value of the status cycle.
    CycleStatus,
    /// Set `metadata.status` to a fixed value.
    SetStatus { status: String },
    /// Write `value` into metadata field `field`.
    UpdateField { field: String, value: Value },
    /// Re-parent the node, optionally at a position.
    MoveNode {
        target_parent: NodeId,
        index: Option<usize>,
    },
    /// Navigate to another node.
    Navigate { target: NodeId },
    OpenNote,
    /// Forward-compatible escape hatch for actions the engine does not know.
    Custom {
        action: String,
        target: Option<String>,
        payload: Option<Value>,
    },
}

impl BehaviorConfig {
    /// The wire `action` name.
    pub fn action(&self) -> &str {
        match self {
            BehaviorConfig::CycleStatus => ACTION_CYCLE_STATUS,
            BehaviorConfig::SetStatus { .. } => ACTION_SET_STATUS,
            BehaviorConfig::UpdateField { .. } => ACTION_UPDATE_FIELD,
            BehaviorConfig::MoveNode { .. } => ACTION_MOVE_NODE,
            BehaviorConfig::Navigate { .. } => ACTION_NAVIGATE,
            BehaviorConfig::OpenNote => ACTION_OPEN_NOTE,
            BehaviorConfig::Custom { action, .. } => action,
        }
    }

    pub fn custom(action: impl Into<String>) -> Self {
        BehaviorConfig::Custom {
            action: action.into(),
            target: None,
            payload: None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, BehaviorConfig::Custom { .. })
    }
}

/// Wire shape of a behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBehavior {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl TryFrom<RawBehavior> for BehaviorConfig {
    type Error = BehaviorError;

    fn try_from(raw: RawBehavior) -> Result<Self, Self::Error> {
        let RawBehavior {
            action,
            target,
            payload,
        } = raw;

        match action.as_str() {
            "" => Err(BehaviorError::EmptyAction),
            ACTION_CYCLE_STATUS | ACTION_TOGGLE_STATUS => Ok(BehaviorConfig::CycleStatus),
            ACTION_SET_STATUS => {
                let status = target
                    .or_else(|| payload.as_ref().and_then(|p| p.as_str().map(String::from)))
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| BehaviorError::MissingTarget {
                        action: action.clone(),
                    })?;
                Ok(BehaviorConfig::SetStatus { status })
            }
            ACTION_UPDATE_FIELD => {
                let field = required_target(&action, target)?;
                let value = payload.ok_or_else(|| BehaviorError::InvalidPayload {
                    action: action.clone(),
                    reason: "missing value to write".to_string(),
                })?;
                Ok(BehaviorConfig::UpdateField { field, value })
            }
            ACTION_MOVE_NODE => {
                let target_parent = NodeId::new(required_target(&action, target)?)
                    .map_err(|_| BehaviorError::MissingTarget {
                        action: action.clone(),
                    })?;
                let index = match payload {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) => Some(n.as_u64().ok_or_else(|| {
                        BehaviorError::InvalidPayload {
                            action: action.clone(),
                            reason: format!("index must be a non-negative integer, got {n}"),
                        }
                    })? as usize),
                    Some(other) => {
                        return Err(BehaviorError::InvalidPayload {
                            action,
                            reason: format!("index must be a number, got {other}"),
                        })
                    }
                };
                Ok(BehaviorConfig::MoveNode {
                    target_parent,
                    index,
                })
            }
            ACTION_NAVIGATE => {
                let target = NodeId::new(required_target(&action, target)?).map_err(|_| {
                    BehaviorError::MissingTarget {
                        action: action.clone(),
                    }
                })?;
                Ok(BehaviorConfig::Navigate { target })
            }
            ACTION_OPEN_NOTE => Ok(BehaviorConfig::OpenNote),
            _ => Ok(BehaviorConfig::Custom {
                action,
                target,
                payload,
            }),
        }
    }
}

fn required_target(action: &str, target: Option<String>) -> Result<String, BehaviorError> {
    target
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BehaviorError::MissingTarget {
            action: action.to_string(),
        })
}

impl From<BehaviorConfig> for RawBehavior {
    fn from(config: BehaviorConfig) -> Self {
        let action = config.action().to_string();
        match config {
            BehaviorConfig::CycleStatus | BehaviorConfig::OpenNote => RawBehavior {
                action,
                target: None,
                payload: None,
            },
            BehaviorConfig::SetStatus { status } => RawBehavior {
                action,
                target: Some(status),
                payload: None,
            },
            BehaviorConfig::UpdateField { field, value } => RawBehavior {
                action,
                target: Some(field),
                payload: Some(value),
            },
            BehaviorConfig::MoveNode {
                target_parent,
                index,
            } => RawBehavior {
                action,
                target: Some(target_parent.to_string()),
                payload: index.map(Value::from),
            },
            BehaviorConfig::Navigate { target } => RawBehavior {
                action,
                target: Some(target.to_string()),
                payload: None,
            },
            BehaviorConfig::Custom {
                action,
                target,
                payload,
            } => RawBehavior {
                action,
                target,
                payload,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<BehaviorConfig, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn toggle_status_is_an_alias() {
        assert_eq!(
            parse(json!({"action": "toggle_status"})).unwrap(),
            BehaviorConfig::CycleStatus
        );
    }

    #[test]
    fn update_field_requires_target_and_value() {
        let ok = parse(json!({"action": "update_field", "target": "priority", "payload": "high"}))
            .unwrap();
        assert_eq!(
            ok,
            BehaviorConfig::UpdateField {
                field: "priority".into(),
                value: json!("high")
            }
        );
        assert!(parse(json!({"action": "update_field", "payload": 1})).is_err());
        assert!(parse(json!({"action": "update_field", "target": "x"})).is_err());
    }

    #[test]
    fn move_node_index_must_be_unsigned() {
        let ok = parse(json!({"action": "move_node", "target": "folder-2", "payload": 3})).unwrap();
        assert!(matches!(ok, BehaviorConfig::MoveNode { index: Some(3), .. }));
        assert!(parse(json!({"action": "move_node", "target": "f", "payload": -1})).is_err());
        assert!(parse(json!({"action": "move_node", "target": "f", "payload": "top"})).is_err());
    }

    #[test]
    fn unknown_action_is_custom() {
        let custom = parse(json!({"action": "archive", "target": "x", "payload": {"soft": true}}))
            .unwrap();
        assert!(custom.is_custom());
        assert_eq!(custom.action(), "archive");
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let config = BehaviorConfig::Navigate {
            target: NodeId::new("n9").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"action": "navigate", "target": "n9"})
        );
    }
}
