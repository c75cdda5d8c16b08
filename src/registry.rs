//! Variant registry.
//!
//! Maps a node's `variant` string to the renderer that interprets it.
//! Resolution is total: exact variant, then the configured default variant
//! for the node's type, then the diagnostic fallback. A registry cannot exist
//! without a fallback, so a missing fallback is caught when it is built, not
//! when an unknown node shows up.

use crate::engine::RenderScope;
use crate::error::ConfigError;
use crate::model::{Node, NodeType};
use crate::view::View;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interprets a node as a [`View`].
///
/// A renderer receives only the node. Depth, parent and root come from
/// [`RenderScope::context`], and children are rendered through
/// [`RenderScope::render_children`]. It must produce output for any valid
/// node and must not panic.
pub trait NodeRenderer: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View;
}

/// Adapter turning a closure into a [`NodeRenderer`].
pub struct FnRenderer<F> {
    name: String,
    render: F,
}

impl<F> NodeRenderer for FnRenderer<F>
where
    F: Fn(&Arc<Node>, &mut RenderScope<'_>) -> View + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, node: &Arc<Node>, cx: &mut RenderScope<'_>) -> View {
        (self.render)(node, cx)
    }
}

/// Build a renderer from a closure.
pub fn renderer_fn<F>(name: impl Into<String>, render: F) -> Arc<dyn NodeRenderer>
where
    F: Fn(&Arc<Node>, &mut RenderScope<'_>) -> View + Send + Sync + 'static,
{
    Arc::new(FnRenderer {
        name: name.into(),
        render,
    })
}

/// Which step of the resolution chain produced a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionPath {
    /// `node.variant` is registered.
    Exact,
    /// Recovered through the type default.
    TypeDefault,
    /// Terminal diagnostic fallback.
    Fallback,
}

/// Outcome of [`VariantRegistry::resolve`].
#[derive(Clone)]
pub struct Resolution<'a> {
    pub renderer: &'a Arc<dyn NodeRenderer>,
    pub path: ResolutionPath,
    /// Variant that was actually used (`None` for the fallback).
    pub variant: Option<&'a str>,
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("renderer", &self.renderer.name())
            .field("path", &self.path)
            .field("variant", &self.variant)
            .finish()
    }
}

/// Variant name to renderer lookup with type defaults and a fallback.
#[derive(Clone)]
pub struct VariantRegistry {
    renderers: HashMap<String, Arc<dyn NodeRenderer>>,
    type_defaults: HashMap<NodeType, String>,
    fallback: Arc<dyn NodeRenderer>,
    generation: u64,
}

impl fmt::Debug for VariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut variants: Vec<&String> = self.renderers.keys().collect();
        variants.sort();
        f.debug_struct("VariantRegistry")
            .field("variants", &variants)
            .field("type_defaults", &self.type_defaults)
            .field("fallback", &self.fallback.name())
            .field("generation", &self.generation)
            .finish()
    }
}

impl VariantRegistry {
    /// Create a registry with the given terminal fallback.
    pub fn new(fallback: Arc<dyn NodeRenderer>) -> Self {
        Self {
            renderers: HashMap::new(),
            type_defaults: HashMap::new(),
            fallback,
            generation: 0,
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register a renderer. Re-registering replaces the old renderer
    /// (hot swap) and returns it.
    pub fn register(
        &mut self,
        variant: impl Into<String>,
        renderer: Arc<dyn NodeRenderer>,
    ) -> Option<Arc<dyn NodeRenderer>> {
        let variant = variant.into();
        let previous = self.renderers.insert(variant.clone(), renderer);
        if let Some(old) = &previous {
            tracing::warn!(variant = %variant, previous = old.name(), "Variant re-registered, replacing renderer");
        }
        self.generation += 1;
        previous
    }

    pub fn unregister(&mut self, variant: &str) -> Option<Arc<dyn NodeRenderer>> {
        let removed = self.renderers.remove(variant);
        if removed.is_some() {
            self.generation += 1;
        }
        removed
    }

    pub fn has_variant(&self, variant: &str) -> bool {
        self.renderers.contains_key(variant)
    }

    pub fn set_fallback(&mut self, renderer: Arc<dyn NodeRenderer>) {
        self.fallback = renderer;
        self.generation += 1;
    }

    pub fn fallback(&self) -> &Arc<dyn NodeRenderer> {
        &self.fallback
    }

    /// Configure the default variant for a node type. The variant may be
    /// registered later; until then the default is skipped.
    pub fn set_default_for_type(&mut self, node_type: NodeType, variant: impl Into<String>) {
        let variant = variant.into();
        if !self.has_variant(&variant) {
            tracing::debug!(%node_type, variant = %variant, "Type default names a variant that is not registered yet");
        }
        self.type_defaults.insert(node_type, variant);
        self.generation += 1;
    }

    pub fn default_for_type(&self, node_type: NodeType) -> Option<&str> {
        self.type_defaults.get(&node_type).map(String::as_str)
    }

    /// Registered variant names, sorted.
    pub fn variants(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Bumped on every change; render caches compare against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve the renderer for `node`. Never fails.
    pub fn resolve(&self, node: &Node) -> Resolution<'_> {
        if let Some((variant, renderer)) = self.renderers.get_key_value(node.variant.as_str()) {
            return Resolution {
                renderer,
                path: ResolutionPath::Exact,
                variant: Some(variant.as_str()),
            };
        }

        if let Some(default_variant) = self.type_defaults.get(&node.node_type) {
            if let Some(renderer) = self.renderers.get(default_variant) {
                tracing::warn!(
                    node = %node.id,
                    variant = %node.variant,
                    node_type = %node.node_type,
                    resolved = %default_variant,
                    "Unknown variant, using type default"
                );
                return Resolution {
                    renderer,
                    path: ResolutionPath::TypeDefault,
                    variant: Some(default_variant.as_str()),
                };
            }
        }

        tracing::warn!(
            node = %node.id,
            variant = %node.variant,
            node_type = %node.node_type,
            fallback = self.fallback.name(),
            "Unresolvable variant, using fallback renderer"
        );
        Resolution {
            renderer: &self.fallback,
            path: ResolutionPath::Fallback,
            variant: None,
        }
    }
}

/// Startup builder. [`build`](Self::build) fails without a fallback.
#[derive(Default)]
pub struct RegistryBuilder {
    renderers: Vec<(String, Arc<dyn NodeRenderer>)>,
    type_defaults: Vec<(NodeType, String)>,
    fallback: Option<Arc<dyn NodeRenderer>>,
    strict_type_defaults: bool,
}

impl RegistryBuilder {
    pub fn register(mut self, variant: impl Into<String>, renderer: Arc<dyn NodeRenderer>) -> Self {
        self.renderers.push((variant.into(), renderer));
        self
    }

    pub fn default_for_type(mut self, node_type: NodeType, variant: impl Into<String>) -> Self {
        self.type_defaults.push((node_type, variant.into()));
        self
    }

    pub fn fallback(mut self, renderer: Arc<dyn NodeRenderer>) -> Self {
        self.fallback = Some(renderer);
        self
    }

    /// Reject type defaults that name unregistered variants.
    pub fn strict_type_defaults(mut self, strict: bool) -> Self {
        self.strict_type_defaults = strict;
        self
    }

    pub fn build(self) -> Result<VariantRegistry, ConfigError> {
        let fallback = self.fallback.ok_or(ConfigError::MissingFallback)?;
        let mut registry = VariantRegistry::new(fallback);
        for (variant, renderer) in self.renderers {
            registry.register(variant, renderer);
        }
        for (node_type, variant) in self.type_defaults {
            if self.strict_type_defaults && !registry.has_variant(&variant) {
                return Err(ConfigError::UnknownTypeDefault {
                    node_type: node_type.to_string(),
                    variant,
                });
            }
            registry.set_default_for_type(node_type, variant);
        }
        tracing::debug!(?registry, "Variant registry built");
        Ok(registry)
    }
}
