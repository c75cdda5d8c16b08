//! Node Engine - data-driven rendering of recursive node trees.
//!
//! A node tree comes in as data. Each node names a `variant`, and the engine
//! looks up the renderer for it, renders the tree depth-first with positional
//! context, and hands user interactions back to the host as declarative
//! intents:
//! - `model` - `Node`, `NodeId`, metadata accessors, `BehaviorConfig`, validation
//! - `registry` - variant to renderer lookup with type defaults and a fallback
//! - `engine` - `ViewEngine`, `RenderScope`/`RenderContext`, memoization
//! - `renderers` - built-in layouts and `builtin_registry()`
//! - `actions` - the `NodeActions` bundle and interaction dispatch
//! - `navigation` - shell target/tab/breadcrumb state and the back-button chain
//! - `menu` - context-menu inheritance and `show_if` visibility
//!
//! # Architecture
//!
//! ```text
//! JSON tree ──ingest──▶ Arc<Node> ──ViewEngine::render──▶ View
//!                                     │ per node:
//!                                     ├── VariantRegistry::resolve
//!                                     │     exact ▶ type default ▶ fallback
//!                                     └── NodeRenderer::render(node, scope)
//!
//! View element activated ──▶ Interaction ──▶ NodeActions (host data layer)
//!                                         └─▶ ShellNavigator (navigate)
//! ```
//!
//! # Example
//!
//! ```
//! use node_engine::{builtin_registry, ingest, ViewEngine};
//!
//! let tree = ingest(r#"{
//!     "id": "root", "type": "space", "variant": "tab_shell", "title": "Home",
//!     "children": [
//!         {"id": "tasks", "type": "container", "variant": "stack", "title": "Tasks",
//!          "children": [
//!              {"id": "t1", "type": "item", "variant": "fancy_row", "title": "Write"}
//!          ]}
//!     ]
//! }"#).unwrap();
//!
//! let mut engine = ViewEngine::new(builtin_registry());
//! let out = engine.render(&tree);
//! assert_eq!(out.stats.type_default, 1);
//! assert!(out.root.find_node(&"t1".parse().unwrap()).is_some());
//! ```

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod menu;
pub mod model;
pub mod navigation;
pub mod registry;
pub mod renderers;
pub mod view;

// Re-exports
pub use actions::{
    dispatch_interaction, effective_behavior, Interaction, NodeActions, NoopActions, Resource,
    StatusCycle,
};
pub use config::EngineConfig;
pub use engine::{RenderCache, RenderContext, RenderScope, RenderStats, RenderedTree, ViewEngine};
pub use error::{BehaviorError, ConfigError, EngineError, IngestError, ValidationError};
pub use menu::{
    dispatch_menu_option, ContextMenuConfig, ContextMenuOption, MenuActionType, ShowIf,
    ShowIfOperator,
};
pub use model::{
    ingest, validate, BehaviorConfig, CreateFieldSchema, CreateOption, Icon, Metadata, Node,
    NodeId, NodeIdError, NodeType, Relationship, ValidationResult,
};
pub use navigation::{
    back_priority, shell_back_handler, BackDispatcher, BackHandlerGuard, BackOutcome, Breadcrumb,
    NavEffects, NavigationFault, NavigationState, ShellNavigator,
};
pub use registry::{renderer_fn, NodeRenderer, RegistryBuilder, Resolution, ResolutionPath, VariantRegistry};
pub use renderers::builtin_registry;
pub use view::{Element, View};
