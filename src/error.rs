//! Error types.

use crate::model::NodeId;
use thiserror::Error;

/// Validation findings for a node tree.
///
/// Every variant carries the `field` path of the offending value
/// (e.g. `children[1].variant`) so data authors can locate it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Two nodes in the same tree share an id.
    #[error("Duplicate id '{id}' at {field} (first seen at {first_field})")]
    DuplicateId {
        id: NodeId,
        field: String,
        first_field: String,
    },

    #[error("Empty id at {field}")]
    EmptyId { field: String },

    #[error("Empty variant on node '{id}' at {field}")]
    EmptyVariant { id: NodeId, field: String },

    #[error("Empty title on node '{id}' at {field}")]
    EmptyTitle { id: NodeId, field: String },

    /// A relationship entry is missing its target or type.
    #[error("Malformed relationship on node '{source_node}' at {field}: {reason}")]
    MalformedRelationship {
        source_node: NodeId,
        field: String,
        reason: String,
    },

    /// A relationship points back at its own node.
    #[error("Relationship on node '{id}' at {field} targets itself")]
    SelfRelationship { id: NodeId, field: String },

    /// A documented metadata key holds a value the engine cannot read.
    #[error("Malformed metadata on node '{id}' at {field}: {reason}")]
    MalformedMetadata {
        id: NodeId,
        field: String,
        reason: String,
    },

    /// The tree is deeper than the configured render depth.
    #[error("Node '{id}' at {field} is deeper than the render limit {max_depth}")]
    TooDeep {
        id: NodeId,
        field: String,
        max_depth: usize,
    },
}

impl ValidationError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::EmptyId { .. } => "EMPTY_ID",
            Self::EmptyVariant { .. } => "EMPTY_VARIANT",
            Self::EmptyTitle { .. } => "EMPTY_TITLE",
            Self::MalformedRelationship { .. } => "MALFORMED_RELATIONSHIP",
            Self::SelfRelationship { .. } => "SELF_RELATIONSHIP",
            Self::MalformedMetadata { .. } => "MALFORMED_METADATA",
            Self::TooDeep { .. } => "TOO_DEEP",
        }
    }

    /// Path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::DuplicateId { field, .. }
            | Self::EmptyId { field }
            | Self::EmptyVariant { field, .. }
            | Self::EmptyTitle { field, .. }
            | Self::MalformedRelationship { field, .. }
            | Self::SelfRelationship { field, .. }
            | Self::MalformedMetadata { field, .. }
            | Self::TooDeep { field, .. } => field,
        }
    }

    /// Blocking errors reject the tree; the rest are warnings.
    pub fn is_blocking(&self) -> bool {
        !matches!(
            self,
            Self::SelfRelationship { .. } | Self::MalformedMetadata { .. } | Self::TooDeep { .. }
        )
    }
}

/// Invalid behavior payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviorError {
    #[error("behavior action cannot be empty")]
    EmptyAction,

    #[error("behavior '{action}' requires a target")]
    MissingTarget { action: String },

    #[error("behavior '{action}' has an invalid payload: {reason}")]
    InvalidPayload { action: String, reason: String },
}

/// Startup configuration errors. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no fallback renderer registered; the registry cannot resolve unknown variants")]
    MissingFallback,

    #[error("type default '{node_type}' -> '{variant}' names an unregistered variant")]
    UnknownTypeDefault { node_type: String, variant: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors loading a node tree from its wire format.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to parse node tree: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("node tree rejected with {} error(s): {}", errors.len(), summarize(errors))]
    Invalid { errors: Vec<ValidationError> },
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .take(3)
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Umbrella error for engine entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Navigation(#[from] crate::navigation::NavigationFault),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    #[test]
    fn codes_and_fields() {
        let err = ValidationError::EmptyVariant {
            id: id("n1"),
            field: "children[0].variant".into(),
        };
        assert_eq!(err.code(), "EMPTY_VARIANT");
        assert_eq!(err.field(), "children[0].variant");
        assert!(err.is_blocking());
    }

    #[test]
    fn metadata_issues_are_warnings() {
        let err = ValidationError::MalformedMetadata {
            id: id("n1"),
            field: "metadata.behavior".into(),
            reason: "bad".into(),
        };
        assert!(!err.is_blocking());
    }

    #[test]
    fn ingest_error_summarizes() {
        let err = IngestError::Invalid {
            errors: vec![ValidationError::EmptyId {
                field: "children[2].id".into(),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("1 error"));
        assert!(msg.contains("children[2].id"));
    }
}
