//! Reference validator for node trees.
//!
//! Checks, in one depth-first pass:
//! 1. Ids are non-empty and unique within the tree
//! 2. Variants and titles are non-empty
//! 3. Relationship entries carry a target and a type
//! 4. Documented metadata keys parse (warning only)
//! 5. Depth stays within the render limit (warning only)

use crate::error::{IngestError, ValidationError};
use crate::model::node::Node;
use crate::model::node_id::NodeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of validating a tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationResult {
    /// Blocking errors (the tree should be rejected).
    pub errors: Vec<ValidationError>,
    /// Non-blocking warnings (the tree can still render).
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there are no blocking errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error or warning based on severity.
    pub fn add(&mut self, error: ValidationError) {
        if error.is_blocking() {
            self.errors.push(error);
        } else {
            self.warnings.push(error);
        }
    }

    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// Findings with the given code, errors first.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |e| e.code() == code)
    }
}

/// Validate a tree with no depth limit.
///
/// # Example
///
/// ```
/// use node_engine::model::{validate, Node, NodeId, NodeType};
///
/// let root = Node::new(NodeId::new("root").unwrap(), NodeType::Space, "tab_shell", "Home");
/// assert!(validate(&root).is_valid());
/// ```
pub fn validate(root: &Node) -> ValidationResult {
    validate_with_limit(root, usize::MAX)
}

/// Validate a tree, warning about nodes deeper than `max_depth`.
pub fn validate_with_limit(root: &Node, max_depth: usize) -> ValidationResult {
    let mut walker = Walker {
        seen: HashMap::new(),
        result: ValidationResult::new(),
        max_depth,
    };
    walker.visit(root, String::new(), 0);
    walker.result
}

struct Walker {
    seen: HashMap<NodeId, String>,
    result: ValidationResult,
    max_depth: usize,
}

impl Walker {
    fn visit(&mut self, node: &Node, path: String, depth: usize) {
        let id_field = field(&path, "id");

        if node.id.is_empty() {
            self.result.add(ValidationError::EmptyId {
                field: id_field.clone(),
            });
        } else if let Some(first_field) = self.seen.get(&node.id) {
            self.result.add(ValidationError::DuplicateId {
                id: node.id.clone(),
                field: id_field.clone(),
                first_field: first_field.clone(),
            });
        } else {
            self.seen.insert(node.id.clone(), id_field.clone());
        }

        if node.variant.trim().is_empty() {
            self.result.add(ValidationError::EmptyVariant {
                id: node.id.clone(),
                field: field(&path, "variant"),
            });
        }

        if node.title.trim().is_empty() {
            self.result.add(ValidationError::EmptyTitle {
                id: node.id.clone(),
                field: field(&path, "title"),
            });
        }

        if depth > self.max_depth {
            self.result.add(ValidationError::TooDeep {
                id: node.id.clone(),
                field: id_field,
                max_depth: self.max_depth,
            });
        }

        self.check_relationships(node, &path);

        for (key, reason) in node.metadata.malformed_keys() {
            self.result.add(ValidationError::MalformedMetadata {
                id: node.id.clone(),
                field: field(&path, &format!("metadata.{key}")),
                reason,
            });
        }

        for (i, child) in node.children.iter().enumerate() {
            self.visit(child, field(&path, &format!("children[{i}]")), depth + 1);
        }
    }

    fn check_relationships(&mut self, node: &Node, path: &str) {
        for (i, rel) in node.relationships.iter().enumerate() {
            let rel_path = field(path, &format!("relationships[{i}]"));
            if rel.target_id.trim().is_empty() {
                self.result.add(ValidationError::MalformedRelationship {
                    source_node: node.id.clone(),
                    field: field(&rel_path, "targetId"),
                    reason: "missing targetId".to_string(),
                });
            } else if rel.target_id == node.id.as_str() {
                self.result.add(ValidationError::SelfRelationship {
                    id: node.id.clone(),
                    field: field(&rel_path, "targetId"),
                });
            }
            if rel.kind.trim().is_empty() {
                self.result.add(ValidationError::MalformedRelationship {
                    source_node: node.id.clone(),
                    field: field(&rel_path, "type"),
                    reason: "missing type".to_string(),
                });
            }
        }
    }
}

/// Parse and validate a tree from its JSON wire format.
///
/// Blocking findings reject the tree; warnings are logged and the tree is
/// returned.
pub fn ingest(json: &str) -> Result<Arc<Node>, IngestError> {
    let root = Node::from_json(json)?;
    let result = validate(&root);
    for warning in &result.warnings {
        tracing::warn!(code = warning.code(), field = warning.field(), "{warning}");
    }
    if !result.is_valid() {
        tracing::debug!(errors = result.errors.len(), "Rejecting node tree");
        return Err(IngestError::Invalid {
            errors: result.errors,
        });
    }
    tracing::debug!(root = %root.id, nodes = root.subtree_len(), "Ingested node tree");
    Ok(root)
}

fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
