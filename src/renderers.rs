//! Built-in renderers.
//!
//! Small, generic layouts that make any valid tree renderable out of the box.
//! Hosts register their own variants on top of [`builtin_registry`] and may
//! replace any of these.

use crate::actions::{effective_behavior, Interaction};
use crate::engine::RenderScope;
use crate::menu;
use crate::model::{BehaviorConfig, Node, NodeId};
use crate::navigation::NavigationState;
use crate::registry::{NodeRenderer, VariantRegistry};
use crate::view::{Element, View};
use std::sync::Arc;

/// Variant names of the built-in renderers.
pub mod variants {
    pub const DIAGNOSTIC: &str = "diagnostic";
    pub const STACK: &str = "stack";
    pub const ROW_SIMPLE: &str = "row_simple";
    pub const GRID: &str = "grid";
    pub const TAB_SHELL: &str = "tab_shell";
}

/// Registry with every built-in renderer, the diagnostic fallback and the
/// default variant for each node type.
pub fn builtin_registry() -> VariantRegistry {
    use crate::model::NodeType;

    let mut registry = VariantRegistry::new(Arc::new(DiagnosticRenderer));
    registry.register(variants::DIAGNOSTIC, Arc::new(DiagnosticRenderer));
    registry.register(variants::STACK, Arc::new(StackRenderer));
    registry.register(variants::ROW_SIMPLE, Arc::new(RowRenderer));
    registry.register(variants::GRID, Arc::new(GridRenderer::default()));
    registry.register(variants::TAB_SHELL, Arc::new(TabShellRenderer));
    registry.set_default_for_type(NodeType::Space, variants::TAB_SHELL);
    registry.set_default_for_type(NodeType::Container, variants::STACK);
    registry.set_default_for_type(NodeType::Collection, variants::GRID);
    registry.set_default_for_type(NodeType::Item, variants::ROW_SIMPLE);
    registry
}

/// Terminal fallback. Shows the raw identity of the node so data authors can
/// see what failed to resolve, then renders the children normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticRenderer;

impl NodeRenderer for DiagnosticRenderer {
    fn name(&self) -> &str {
        variants::DIAGNOSTIC
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        let message = format!(
            "No renderer for variant '{}' (type {}, id {})",
            node.variant, node.node_type, node.id
        );
        Element::new("diagnostic")
            .node(&node.id)
            .attr("id", &node.id)
            .attr("type", node.node_type)
            .attr("variant", &node.variant)
            .attr("title", &node.title)
            .child(View::text(message))
            .children(cx.render_children())
            .into_view()
    }
}

/// Vertical list with a header and the node's create options.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackRenderer;

impl NodeRenderer for StackRenderer {
    fn name(&self) -> &str {
        variants::STACK
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        let header = Element::new("header")
            .attr("title", &node.title)
            .children(create_buttons(node));
        Element::new("stack")
            .node(&node.id)
            .attr("depth", cx.depth())
            .child(header)
            .children(cx.render_children())
            .into_view()
    }
}

fn create_buttons(node: &Node) -> Vec<View> {
    node.metadata
        .create_options()
        .into_iter()
        .map(|option| {
            Element::new("create_button")
                .node(&node.id)
                .attr("label", &option.label)
                .attr_opt("icon", option.icon.as_deref())
                .on_press(Interaction::Create {
                    option: Some(option.id),
                })
                .into_view()
        })
        .collect()
}

/// Single-line item. Pressing it runs the node's behavior (status cycling
/// by default); a long press opens the context menu when one resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowRenderer;

impl NodeRenderer for RowRenderer {
    fn name(&self) -> &str {
        variants::ROW_SIMPLE
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        let has_menu = menu::resolve(node, cx.parent().map(|p| &**p)).is_some();
        let behavior = effective_behavior(node, BehaviorConfig::CycleStatus);

        let mut row = Element::new("row")
            .node(&node.id)
            .attr("title", &node.title)
            .attr_opt("status", node.metadata.status())
            .attr_opt("icon", node.metadata.icon())
            .on_press(Interaction::behavior(behavior));
        if has_menu {
            row = row.on_long_press(Interaction::ContextMenu);
        }
        if cx.is_interactive() {
            row = row.attr("cursor", "pointer");
        }
        row.children(cx.render_children()).into_view()
    }
}

/// Children laid out in rows of `metadata.columns` cells.
#[derive(Debug, Clone, Copy)]
pub struct GridRenderer {
    pub default_columns: usize,
}

impl Default for GridRenderer {
    fn default() -> Self {
        Self { default_columns: 2 }
    }
}

impl NodeRenderer for GridRenderer {
    fn name(&self) -> &str {
        variants::GRID
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        let columns = node.metadata.columns(self.default_columns.max(1));
        let cells = cx.render_children();
        let mut rows = Vec::with_capacity(cells.len().div_ceil(columns));
        let mut cells = cells.into_iter().peekable();
        while cells.peek().is_some() {
            let row: Vec<View> = cells.by_ref().take(columns).collect();
            rows.push(Element::new("grid_row").children(row).into_view());
        }
        Element::new("grid")
            .node(&node.id)
            .attr("title", &node.title)
            .attr("columns", columns)
            .children(create_buttons(node))
            .children(rows)
            .into_view()
    }
}

/// Shell with one tab per child.
///
/// Rendered plainly, only the default tab's subtree is shown and switching
/// tabs is a navigation request. Rendered with the navigation state of this
/// shell, the active tab is the navigator's, a deep target is shown in place
/// of the tab with breadcrumbs leading back up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabShellRenderer;

impl TabShellRenderer {
    fn default_tab<'n>(node: &'n Node, cx: &RenderScope<'_>) -> Option<&'n Arc<Node>> {
        let configured = node.metadata.default_tab().or_else(|| {
            cx.config()
                .default_tab
                .as_deref()
                .and_then(|id| NodeId::new(id).ok())
        });
        configured
            .and_then(|id| node.child(&id))
            .or_else(|| node.children.first())
    }

    fn breadcrumbs(node: &Node, state: &NavigationState) -> Element {
        let crumbs: Vec<View> = state
            .breadcrumbs
            .iter()
            .map(|crumb| {
                let element = Element::new("crumb")
                    .node(&node.id)
                    .attr("id", &crumb.id)
                    .attr("title", &crumb.title)
                    .attr("level", crumb.level)
                    .attr("current", crumb.is_current);
                if crumb.is_current {
                    element.into_view()
                } else {
                    element
                        .on_press(Interaction::NavigateToLevel {
                            level: crumb.level,
                            target: crumb.id.clone(),
                        })
                        .into_view()
                }
            })
            .collect();
        Element::new("breadcrumbs").children(crumbs)
    }
}

impl NodeRenderer for TabShellRenderer {
    fn name(&self) -> &str {
        variants::TAB_SHELL
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        let state = cx
            .navigation()
            .filter(|state| state.shell_id() == Some(&node.id))
            .cloned();
        let navigated_tab = state
            .as_ref()
            .and_then(|s| s.active_tab.as_ref())
            .and_then(|id| node.child(id));
        let active = navigated_tab
            .or_else(|| Self::default_tab(node, cx))
            .cloned();

        let tabs = node.children.iter().map(|tab| {
            let selected = active.as_ref().is_some_and(|a| a.id == tab.id);
            Element::new("tab")
                .node(&tab.id)
                .attr("title", &tab.title)
                .attr_opt("icon", tab.metadata.icon())
                .attr("selected", selected)
                .on_press(Interaction::navigate(tab.id.clone()))
                .into_view()
        });
        let tab_bar = Element::new("tab_bar").children(tabs.collect::<Vec<_>>());

        let title = match (&state, &active) {
            (Some(state), _) => state.title.clone(),
            (None, Some(tab)) => tab.title.clone(),
            (None, None) => node.title.clone(),
        };
        let mut header = Element::new("shell_header").attr("title", title);
        let content = match (&state, &active) {
            (Some(state), _) if state.is_deep_view => {
                header = header.child(Self::breadcrumbs(node, state));
                cx.render_path(state.below_shell())
            }
            (_, Some(tab)) => cx.render_child(tab),
            (_, None) => View::Empty,
        };
        Element::new("shell")
            .node(&node.id)
            .attr("title", &node.title)
            .child(header)
            .child(tab_bar)
            .child(Element::new("content").child(content))
            .into_view()
    }
}
