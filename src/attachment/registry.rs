//! Renderer type registry
//!
//! Maps attachment type names to renderer factories. Renderers are registered
//! explicitly; lookups try the built-in namespace, then the name as a fully
//! qualified identifier, then every registered simple name
//! (case-insensitive). Results are memoized per requested name.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use super::log_file::LogRenderer;
use super::{Renderer, RendererType, BUILTIN_NAMESPACE};
use crate::error::Result;

/// Creates and restores instances of one renderer type
#[derive(Clone)]
pub struct RendererFactory {
    qualified_name: String,
    simple_name: &'static str,
    create: fn() -> Box<dyn Renderer>,
    restore: fn(&str) -> Result<Box<dyn Renderer>>,
}

fn create_default<T: RendererType>() -> Box<dyn Renderer> {
    Box::new(T::default())
}

fn restore_state<T: RendererType>(state: &str) -> Result<Box<dyn Renderer>> {
    let renderer: T = serde_json::from_str(state)?;
    Ok(Box::new(renderer))
}

impl RendererFactory {
    /// Factory for a renderer type
    pub fn of<T: RendererType>() -> Self {
        Self {
            qualified_name: T::qualified_name(),
            simple_name: T::TYPE_NAME,
            create: create_default::<T>,
            restore: restore_state::<T>,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn simple_name(&self) -> &str {
        self.simple_name
    }

    /// A fresh default-constructed renderer
    pub fn create(&self) -> Box<dyn Renderer> {
        (self.create)()
    }

    /// A renderer hydrated from serialized state
    pub fn restore(&self, state: &str) -> Result<Box<dyn Renderer>> {
        (self.restore)(state)
    }
}

impl std::fmt::Debug for RendererFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererFactory")
            .field("qualified_name", &self.qualified_name)
            .finish()
    }
}

/// Registry of renderer factories with memoized name resolution
#[derive(Debug, Default)]
pub struct RendererRegistry {
    factories: Vec<RendererFactory>,
    resolved: Mutex<HashMap<String, Option<usize>>>,
}

impl RendererRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the renderers shipped with this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<LogRenderer>();
        registry
    }

    /// Register a renderer type, replacing any earlier one with the same qualified name
    pub fn register<T: RendererType>(&mut self) -> &mut Self {
        self.register_factory(RendererFactory::of::<T>())
    }

    pub fn register_factory(&mut self, factory: RendererFactory) -> &mut Self {
        match self
            .factories
            .iter_mut()
            .find(|f| f.qualified_name == factory.qualified_name)
        {
            Some(existing) => *existing = factory,
            None => self.factories.push(factory),
        }
        self.clear_cache();
        self
    }

    /// Qualified names of every registered renderer, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.qualified_name()).collect()
    }

    /// Resolve a type name to a factory, or `None` if nothing matches
    pub fn resolve(&self, type_name: &str) -> Option<&RendererFactory> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return None;
        }

        if let Ok(cache) = self.resolved.lock() {
            if let Some(&hit) = cache.get(type_name) {
                return hit.map(|i| &self.factories[i]);
            }
        }

        let index = self.lookup(type_name);
        match index {
            Some(i) => debug!(
                "Resolved renderer '{}' to {}",
                type_name, self.factories[i].qualified_name
            ),
            None => debug!("No renderer registered for '{}'", type_name),
        }

        if let Ok(mut cache) = self.resolved.lock() {
            cache.insert(type_name.to_string(), index);
        }

        index.map(|i| &self.factories[i])
    }

    fn lookup(&self, type_name: &str) -> Option<usize> {
        let in_builtin_namespace = format!("{}::{}", BUILTIN_NAMESPACE, type_name);
        let exact = |name: &str| self.factories.iter().position(|f| f.qualified_name == name);

        exact(&in_builtin_namespace)
            .or_else(|| exact(type_name))
            .or_else(|| {
                self.factories
                    .iter()
                    .position(|f| f.simple_name.eq_ignore_ascii_case(type_name))
            })
    }

    fn clear_cache(&mut self) {
        match self.resolved.get_mut() {
            Ok(cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

static GLOBAL_REGISTRY: Lazy<RwLock<RendererRegistry>> =
    Lazy::new(|| RwLock::new(RendererRegistry::with_builtins()));

/// Register a renderer type with the process-wide registry
pub fn register_renderer<T: RendererType>() {
    let mut registry = GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.register::<T>();
}

/// Run `f` against the process-wide registry
pub fn with_global_registry<R>(f: impl FnOnce(&RendererRegistry) -> R) -> R {
    let registry = GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&registry)
}
