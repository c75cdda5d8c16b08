//! Rendered output.
//!
//! Renderers produce a [`View`] tree: plain data that a host toolkit maps
//! onto real widgets. Elements may carry [`Interaction`]s, which the host
//! hands back to the engine when the user activates them.

use crate::actions::Interaction;
use crate::model::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A node of rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Element(Element),
    Text { text: String },
    Empty,
}

/// A tagged element with attributes, optional interactions and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_press: Option<Interaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_long_press: Option<Interaction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<View>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            node_id: None,
            attrs: BTreeMap::new(),
            on_press: None,
            on_long_press: None,
            children: Vec::new(),
        }
    }

    pub fn node(mut self, id: &NodeId) -> Self {
        self.node_id = Some(id.clone());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.insert(key.into(), value.to_string());
        self
    }

    pub fn attr_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    pub fn on_press(mut self, interaction: Interaction) -> Self {
        self.on_press = Some(interaction);
        self
    }

    pub fn on_long_press(mut self, interaction: Interaction) -> Self {
        self.on_long_press = Some(interaction);
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn into_view(self) -> View {
        View::Element(self)
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        View::Element(element)
    }
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        View::Text { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            View::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Pre-order walk over all elements.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_elements(self, &mut out);
        out
    }

    /// First element rendered for `id` (the node's outermost element).
    pub fn find_node(&self, id: &NodeId) -> Option<&Element> {
        self.elements()
            .into_iter()
            .find(|e| e.node_id.as_ref() == Some(id))
    }

    /// Elements whose tag matches.
    pub fn find_tag(&self, tag: &str) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|e| e.tag == tag)
            .collect()
    }

    /// Indented, human-readable dump.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_text(self, 0, &mut out);
        out
    }
}

fn collect_elements<'a>(view: &'a View, out: &mut Vec<&'a Element>) {
    if let View::Element(e) = view {
        out.push(e);
        for child in &e.children {
            collect_elements(child, out);
        }
    }
}

fn write_text(view: &View, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match view {
        View::Empty => {}
        View::Text { text } => {
            let _ = writeln!(out, "{pad}\"{text}\"");
        }
        View::Element(e) => {
            let _ = write!(out, "{pad}<{}", e.tag);
            if let Some(id) = &e.node_id {
                let _ = write!(out, " #{id}");
            }
            for (k, v) in &e.attrs {
                let _ = write!(out, " {k}={v:?}");
            }
            if e.on_press.is_some() {
                let _ = write!(out, " [press]");
            }
            if e.on_long_press.is_some() {
                let _ = write!(out, " [long-press]");
            }
            let _ = writeln!(out, ">");
            for child in &e.children {
                write_text(child, indent + 1, out);
            }
        }
    }
}
