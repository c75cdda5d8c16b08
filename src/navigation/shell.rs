//! Shell navigation state machine.
//!
//! The only state is the target node id. The path from the root, the active
//! tab, the depth flags and the breadcrumbs are all derived from it and the
//! current tree, and are recomputed after every transition.

use crate::actions::Interaction;
use crate::model::{Node, NodeId};
use crate::navigation::effects::NavEffects;
use crate::navigation::fault::NavigationFault;
use serde::Serialize;
use std::sync::Arc;

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: NodeId,
    pub title: String,
    /// Index into the target path; pass to [`ShellNavigator::navigate_to_level`].
    pub level: usize,
    pub is_current: bool,
}

/// Derived navigation state, as handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    /// Ids from the shell root to the target; never empty.
    pub target_path: Vec<NodeId>,
    pub active_tab: Option<NodeId>,
    pub is_deep_view: bool,
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl NavigationState {
    /// Id of the shell root this state belongs to.
    pub fn shell_id(&self) -> Option<&NodeId> {
        self.target_path.first()
    }

    /// Path from the active tab down to the target.
    pub fn below_shell(&self) -> &[NodeId] {
        self.target_path.get(1..).unwrap_or(&[])
    }
}

/// Tracks a target node somewhere under a shell root whose direct children
/// are tabs.
#[derive(Debug, Clone)]
pub struct ShellNavigator {
    root: Arc<Node>,
    target: Option<NodeId>,
    default_tab: Option<NodeId>,
    path: Vec<NodeId>,
}

impl ShellNavigator {
    pub fn new(root: Arc<Node>) -> Self {
        let mut nav = Self {
            path: vec![root.id.clone()],
            root,
            target: None,
            default_tab: None,
        };
        nav.derive();
        nav
    }

    /// Configure the tab shown when there is no target. Ignored if it is not
    /// a tab of the root; `metadata.default_tab` on the root is used next,
    /// then the first tab.
    pub fn with_default_tab(mut self, tab: Option<NodeId>) -> Self {
        self.default_tab = tab;
        self
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn target(&self) -> Option<&NodeId> {
        self.target.as_ref()
    }

    /// Ids from the root to the target. `[root]` when there is no target or
    /// the target is not in the tree.
    pub fn target_path(&self) -> &[NodeId] {
        &self.path
    }

    /// Levels below the root: 0 at the root, 1 on a tab.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Node at the end of the target path.
    pub fn current_node(&self) -> &Node {
        self.path
            .last()
            .and_then(|id| self.root.find(id))
            .unwrap_or(&*self.root)
    }

    /// The tab whose subtree holds the target, or the default tab.
    pub fn active_tab_id(&self) -> Option<&NodeId> {
        if let Some(tab) = self.path.get(1) {
            return Some(tab);
        }
        self.default_tab_id()
    }

    pub fn active_tab(&self) -> Option<&Arc<Node>> {
        self.active_tab_id().and_then(|id| self.root.child(id))
    }

    fn default_tab_id(&self) -> Option<&NodeId> {
        let configured = [self.default_tab.clone(), self.root.metadata.default_tab()];
        configured
            .into_iter()
            .flatten()
            .find_map(|id| self.root.child(&id))
            .or_else(|| self.root.children.first())
            .map(|tab| &tab.id)
    }

    /// No target, the root, or a tab.
    pub fn is_at_tab_root(&self) -> bool {
        self.path.len() <= 2
    }

    /// Target strictly below tab level.
    pub fn is_deep_view(&self) -> bool {
        !self.is_at_tab_root()
    }

    /// Title for the shell header: the deep node's title, else the active
    /// tab's, else the root's.
    pub fn display_title(&self) -> &str {
        if self.is_deep_view() {
            return &self.current_node().title;
        }
        match self.active_tab() {
            Some(tab) => &tab.title,
            None => &self.root.title,
        }
    }

    /// Root crumb first, then one crumb per path entry below the root.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let last = self.path.len() - 1;
        let mut crumbs = Vec::with_capacity(self.path.len());
        let mut node: &Node = &self.root;
        for (level, id) in self.path.iter().enumerate() {
            if level > 0 {
                match node.child(id) {
                    Some(child) => node = &**child,
                    None => break,
                }
            }
            crumbs.push(Breadcrumb {
                id: id.clone(),
                title: node.title.clone(),
                level,
                is_current: level == last,
            });
        }
        crumbs
    }

    /// Snapshot of the derived state.
    pub fn state(&self) -> NavigationState {
        NavigationState {
            target_path: self.path.clone(),
            active_tab: self.active_tab_id().cloned(),
            is_deep_view: self.is_deep_view(),
            title: self.display_title().to_string(),
            breadcrumbs: self.breadcrumbs(),
        }
    }

    /// Apply a navigation interaction activated on rendered output.
    /// Non-navigation interactions change nothing.
    pub fn follow(&mut self, interaction: &Interaction) -> Result<NavEffects, NavigationFault> {
        match interaction {
            Interaction::Navigate { target } => self.navigate_to_node(target),
            Interaction::NavigateToLevel { level, target } => {
                if self.path.get(*level) != Some(target) {
                    tracing::debug!(index = *level, target_node = %target, "Breadcrumb is stale");
                    return Err(NavigationFault::NodeNotFound(target.clone()));
                }
                self.navigate_to_level(*level)
            }
            _ => Ok(NavEffects::NONE),
        }
    }

    /// Target a node anywhere under the root.
    pub fn navigate_to_node(&mut self, id: &NodeId) -> Result<NavEffects, NavigationFault> {
        if !self.root.contains(id) {
            tracing::debug!(target_node = %id, "Navigation target not in tree");
            return Err(NavigationFault::NodeNotFound(id.clone()));
        }
        Ok(self.retarget(Some(id.clone())))
    }

    /// Pop one level. No-op at the root.
    pub fn navigate_back(&mut self) -> NavEffects {
        if self.path.len() <= 1 {
            return NavEffects::NONE;
        }
        let parent = self.path[self.path.len() - 2].clone();
        self.retarget(Some(parent))
    }

    /// Jump to a path index (breadcrumb click).
    pub fn navigate_to_level(&mut self, index: usize) -> Result<NavEffects, NavigationFault> {
        match self.path.get(index) {
            Some(id) => {
                let id = id.clone();
                Ok(self.retarget(Some(id)))
            }
            None => Err(NavigationFault::LevelOutOfRange {
                index,
                len: self.path.len(),
            }),
        }
    }

    /// Tab click.
    pub fn select_tab(&mut self, id: &NodeId) -> Result<NavEffects, NavigationFault> {
        if self.root.child(id).is_none() {
            return Err(NavigationFault::NotATab(id.clone()));
        }
        Ok(self.retarget(Some(id.clone())))
    }

    /// Clear the target.
    pub fn reset(&mut self) -> NavEffects {
        self.retarget(None)
    }

    /// Swap in a new tree snapshot, keeping the target. A target that no
    /// longer exists degrades the path to the root.
    pub fn replace_tree(&mut self, root: Arc<Node>) -> NavEffects {
        let before = self.snapshot();
        self.root = root;
        self.derive();
        self.effects_since(before)
    }

    fn retarget(&mut self, target: Option<NodeId>) -> NavEffects {
        let before = self.snapshot();
        self.target = target;
        self.derive();
        let effects = self.effects_since(before);
        tracing::debug!(
            target_node = ?self.target.as_ref().map(NodeId::as_str),
            depth = self.depth(),
            ?effects,
            "Navigated"
        );
        effects
    }

    fn derive(&mut self) {
        self.path = match &self.target {
            None => vec![self.root.id.clone()],
            Some(target) => match self.root.path_to(target) {
                Some(path) => path,
                None => {
                    tracing::warn!(target_node = %target, root = %self.root.id, "Navigation target vanished, showing root");
                    vec![self.root.id.clone()]
                }
            },
        };
    }

    fn snapshot(&self) -> (Option<NodeId>, Option<NodeId>, usize) {
        (
            self.path.last().cloned(),
            self.active_tab_id().cloned(),
            self.path.len(),
        )
    }

    fn effects_since(&self, before: (Option<NodeId>, Option<NodeId>, usize)) -> NavEffects {
        let (target, tab, len) = before;
        let mut effects = NavEffects::NONE;
        if self.path.last() != target.as_ref() {
            effects |= NavEffects::TARGET_CHANGED;
        }
        if self.active_tab_id() != tab.as_ref() {
            effects |= NavEffects::TAB_CHANGED;
        }
        if self.path.len() != len {
            effects |= NavEffects::DEPTH_CHANGED;
        }
        effects
    }
}
