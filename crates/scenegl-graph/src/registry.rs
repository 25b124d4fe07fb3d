use std::collections::HashMap;
use std::sync::Arc;

use scenegl_core::EngineError;

use crate::class::{NodeClass, NodeType};

/// Class table consulted by `Scene::create`.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<NodeType, Arc<NodeClass>>,
    by_name: HashMap<&'static str, NodeType>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: NodeClass) -> Result<(), EngineError> {
        if let Some(existing) = self.classes.get(&class.id()) {
            return Err(EngineError::invalid_usage(format!(
                "class id {} is already taken by {}",
                class.id(),
                existing.name()
            )));
        }
        if self.by_name.contains_key(class.name()) {
            return Err(EngineError::invalid_usage(format!(
                "class name {} is already registered",
                class.name()
            )));
        }
        self.by_name.insert(class.name(), class.id());
        self.classes.insert(class.id(), Arc::new(class));
        Ok(())
    }

    pub fn resolve(&self, ty: NodeType) -> Result<Arc<NodeClass>, EngineError> {
        self.classes.get(&ty).cloned().ok_or_else(|| {
            tracing::error!("unknown node type {ty}");
            EngineError::InvalidType(ty.to_string())
        })
    }

    /// Look a class up by its registered name, e.g. `"group"`.
    pub fn resolve_name(&self, name: &str) -> Result<Arc<NodeClass>, EngineError> {
        match self.by_name.get(name) {
            Some(ty) => self.resolve(*ty),
            None => {
                tracing::error!("unknown node class \"{name}\"");
                Err(EngineError::InvalidType(name.to_string()))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
