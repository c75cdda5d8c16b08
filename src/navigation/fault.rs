//! Navigation faults.
//!
//! Faults are recoverable: the requested transition did not happen and the
//! navigator state is exactly what it was before the call.

use crate::model::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationFault {
    /// Target id is not reachable from the shell root.
    #[error("Node '{0}' not found under the shell root")]
    NodeNotFound(NodeId),

    /// Breadcrumb index past the end of the current path.
    #[error("Level {index} out of range: path has {len} entries")]
    LevelOutOfRange { index: usize, len: usize },

    /// Tab selection named something that is not a direct child of the root.
    #[error("Node '{0}' is not a tab of the shell")]
    NotATab(NodeId),
}

impl NavigationFault {
    pub fn code(&self) -> &'static str {
        match self {
            NavigationFault::NodeNotFound(_) => "NODE_NOT_FOUND",
            NavigationFault::LevelOutOfRange { .. } => "LEVEL_OUT_OF_RANGE",
            NavigationFault::NotATab(_) => "NOT_A_TAB",
        }
    }

    /// Faults caused by stale data (the tree changed under the caller)
    /// rather than by a bad index from the UI.
    pub fn is_stale_data(&self) -> bool {
        matches!(
            self,
            NavigationFault::NodeNotFound(_) | NavigationFault::NotATab(_)
        )
    }
}
