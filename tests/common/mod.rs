//! Shared helpers for integration tests.

#![allow(dead_code)]

use node_engine::{BehaviorConfig, CreateOption, Node, NodeActions, NodeId};
use std::cell::RefCell;
use std::sync::Arc;

pub fn workspace() -> Arc<Node> {
    node_engine::ingest(include_str!("../fixtures/workspace.json")).expect("fixture is valid")
}

pub fn id(s: &str) -> NodeId {
    NodeId::new(s).expect("non-empty id")
}

/// Action bundle that records every call as a short string.
#[derive(Default)]
pub struct Recorder {
    pub calls: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn push(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl NodeActions for Recorder {
    fn request_create(&self, parent: &Node, option: Option<&CreateOption>) {
        let option = option.map(|o| o.id.as_str()).unwrap_or("-");
        self.push(format!("create:{}:{option}", parent.id));
    }

    fn navigate_into(&self, target: &NodeId) {
        self.push(format!("navigate:{target}"));
    }

    fn open_context_menu(&self, node: &Node, parent: Option<&Node>) {
        let parent = parent.map(|p| p.id.as_str()).unwrap_or("-");
        self.push(format!("menu:{}:{parent}", node.id));
    }

    fn cycle_status(&self, node: &Node, next_status: &str) {
        self.push(format!("status:{}:{next_status}", node.id));
    }

    fn trigger_behavior(&self, node: &Node, behavior: &BehaviorConfig) {
        self.push(format!("behavior:{}:{}", node.id, behavior.action()));
    }

    fn open_note(&self, node: &Node) {
        self.push(format!("note:{}", node.id));
    }

    fn move_node(&self, node: &Node, target_parent: &NodeId, index: Option<usize>) {
        let index = index.map(|i| i.to_string()).unwrap_or_else(|| "-".into());
        self.push(format!("move:{}:{target_parent}:{index}", node.id));
    }
}
