//! Node data model: the recursive [`Node`], its metadata and validation.

pub mod behavior;
mod create;
mod icon;
mod metadata;
mod node;
mod node_id;
mod validate;

pub use behavior::{BehaviorConfig, RawBehavior};
pub use create::{CreateFieldSchema, CreateOption};
pub use icon::Icon;
pub use metadata::{keys, Metadata};
pub use node::{DepthFirst, Node, NodeType, Relationship};
pub use node_id::{NodeId, NodeIdError};
pub use validate::{ingest, validate, validate_with_limit, ValidationResult};
