//! Node metadata: documented engine keys plus an opaque extension bag.
//!
//! The engine only interprets the keys listed in [`keys`]. Everything else is
//! renderer-private and exposed untyped through [`Metadata::get`].
//! Malformed values under a documented key are logged and treated as absent,
//! so older or hand-authored data never breaks a render.

use crate::menu::ContextMenuConfig;
use crate::model::behavior::BehaviorConfig;
use crate::model::create::{CreateFieldSchema, CreateOption};
use crate::model::icon::Icon;
use crate::model::node_id::NodeId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Documented metadata keys read by the engine.
pub mod keys {
    pub const CONTEXT_MENU: &str = "context_menu";
    pub const CHILD_CONTEXT_MENU: &str = "child_context_menu";
    pub const BEHAVIOR: &str = "behavior";
    pub const STATUS: &str = "status";
    pub const ICON: &str = "icon";
    pub const DEFAULT_TAB: &str = "default_tab";
    pub const HEADER_ACTION: &str = "header_action";
    pub const CREATE_OPTIONS: &str = "create_options";
    pub const CREATE_FIELDS: &str = "create_fields";
    pub const COLUMNS: &str = "columns";

    /// Keys the engine owns; excluded from the resource payload.
    pub const ENGINE_KEYS: [&str; 8] = [
        CONTEXT_MENU,
        CHILD_CONTEXT_MENU,
        BEHAVIOR,
        ICON,
        DEFAULT_TAB,
        HEADER_ACTION,
        CREATE_OPTIONS,
        CREATE_FIELDS,
    ];
}

/// String-keyed node payload. Never null: a `null` in the wire format
/// deserializes to an empty map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self(map.unwrap_or_default()))
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// String value under `key`, if it is a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.str(keys::STATUS)
    }

    /// Icon named by `metadata.icon`; unknown names resolve to [`Icon::Fallback`].
    pub fn icon(&self) -> Option<Icon> {
        self.str(keys::ICON).map(Icon::from_name)
    }

    pub fn default_tab(&self) -> Option<NodeId> {
        self.str(keys::DEFAULT_TAB)
            .and_then(|s| NodeId::new(s).ok())
    }

    /// Grid column count; defaults to `fallback` when absent or not a positive integer.
    pub fn columns(&self, fallback: usize) -> usize {
        self.0
            .get(keys::COLUMNS)
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(fallback)
    }

    /// `metadata.context_menu` when present with at least one option.
    pub fn context_menu(&self) -> Option<ContextMenuConfig> {
        self.typed::<ContextMenuConfig>(keys::CONTEXT_MENU)
            .filter(|menu| !menu.options.is_empty())
    }

    /// `metadata.child_context_menu` when present with at least one option.
    pub fn child_context_menu(&self) -> Option<ContextMenuConfig> {
        self.typed::<ContextMenuConfig>(keys::CHILD_CONTEXT_MENU)
            .filter(|menu| !menu.options.is_empty())
    }

    pub fn behavior(&self) -> Option<BehaviorConfig> {
        self.typed(keys::BEHAVIOR)
    }

    /// Create options from `create_options` followed by `header_action`.
    ///
    /// `header_action` may hold a single option or a list.
    pub fn create_options(&self) -> Vec<CreateOption> {
        let mut options: Vec<CreateOption> =
            self.typed(keys::CREATE_OPTIONS).unwrap_or_default();
        match self.0.get(keys::HEADER_ACTION) {
            Some(Value::Array(_)) => {
                options.extend(self.typed::<Vec<CreateOption>>(keys::HEADER_ACTION).unwrap_or_default())
            }
            Some(_) => options.extend(self.typed::<CreateOption>(keys::HEADER_ACTION)),
            None => {}
        }
        options
    }

    pub fn create_fields(&self) -> Vec<CreateFieldSchema> {
        self.typed(keys::CREATE_FIELDS).unwrap_or_default()
    }

    /// Documented keys whose values fail to parse, with the parse error.
    pub fn malformed_keys(&self) -> Vec<(&'static str, String)> {
        let mut malformed = Vec::new();
        check::<ContextMenuConfig>(self, keys::CONTEXT_MENU, &mut malformed);
        check::<ContextMenuConfig>(self, keys::CHILD_CONTEXT_MENU, &mut malformed);
        check::<BehaviorConfig>(self, keys::BEHAVIOR, &mut malformed);
        check::<Vec<CreateOption>>(self, keys::CREATE_OPTIONS, &mut malformed);
        check::<Vec<CreateFieldSchema>>(self, keys::CREATE_FIELDS, &mut malformed);
        malformed
    }

    /// Metadata without the engine-owned keys.
    pub fn extension_bag(&self) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(k, _)| !keys::ENGINE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.0.get(key)?;
        if value.is_null() {
            return None;
        }
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed metadata value");
                None
            }
        }
    }
}

fn check<T: DeserializeOwned>(
    metadata: &Metadata,
    key: &'static str,
    out: &mut Vec<(&'static str, String)>,
) {
    if let Some(value) = metadata.0.get(key) {
        if value.is_null() {
            return;
        }
        if let Err(e) = T::deserialize(value) {
            out.push((key, e.to_string()));
        }
    }
}
