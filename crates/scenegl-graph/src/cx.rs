use std::any::Any;

use scenegl_core::EngineError;

use crate::context::ExecContext;
use crate::node::{Node, NodeId};
use crate::params::{ParamKind, ParamValue};
use crate::scene::Scene;

/// What a class callback sees: its own node's parameters, read access to other nodes, the owning
/// execution context, and the passes it may drive on its children.
pub struct NodeCx<'a> {
    scene: &'a mut Scene,
    id: NodeId,
}

impl<'a> NodeCx<'a> {
    pub(crate) fn new(scene: &'a mut Scene, id: NodeId) -> Self {
        Self { scene, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.scene
            .nodes
            .get(&self.id)
            .map_or("<destroyed>", |n| n.name.as_str())
    }

    pub fn param(&self, key: &str) -> Result<&ParamValue, EngineError> {
        let node = self.scene.node(self.id)?;
        node.param(key).ok_or_else(|| {
            EngineError::invalid_usage(format!(
                "parameter \"{key}\" not found in {}",
                node.class.name()
            ))
        })
    }

    fn typed<'s, T>(
        &'s self,
        key: &str,
        expected: ParamKind,
        get: impl FnOnce(&'s ParamValue) -> Option<T>,
    ) -> Result<T, EngineError> {
        let value = self.param(key)?;
        get(value).ok_or_else(|| {
            EngineError::invalid_usage(format!(
                "{}.{key} is a {} parameter, not {}",
                self.name(),
                value.kind().name(),
                expected.name()
            ))
        })
    }

    pub fn bool(&self, key: &str) -> Result<bool, EngineError> {
        self.typed(key, ParamKind::Bool, ParamValue::as_bool)
    }

    pub fn int(&self, key: &str) -> Result<i64, EngineError> {
        self.typed(key, ParamKind::Int, ParamValue::as_int)
    }

    pub fn float(&self, key: &str) -> Result<f64, EngineError> {
        self.typed(key, ParamKind::Float, ParamValue::as_float)
    }

    pub fn vec4(&self, key: &str) -> Result<[f32; 4], EngineError> {
        self.typed(key, ParamKind::Vec4, ParamValue::as_vec4)
    }

    pub fn str(&self, key: &str) -> Result<&str, EngineError> {
        self.typed(key, ParamKind::Str, ParamValue::as_str)
    }

    pub fn node(&self, key: &str) -> Result<Option<NodeId>, EngineError> {
        self.typed(key, ParamKind::Node, ParamValue::as_node)
    }

    /// Every node referenced by a node-typed parameter.
    pub fn nodes(&self, key: &str) -> Result<Vec<NodeId>, EngineError> {
        Ok(self.param(key)?.node_refs().collect())
    }

    /// Read-only view of another node.
    pub fn peek_node(&self, id: NodeId) -> Result<&Node, EngineError> {
        self.scene.node(id)
    }

    /// Borrow another node's private data as its concrete type.
    pub fn peek<T: 'static>(&self, id: NodeId) -> Result<&T, EngineError> {
        let node = self.scene.node(id)?;
        let private: &dyn Any = node.private.as_deref().ok_or_else(|| {
            EngineError::invalid_usage(format!("\"{}\" is busy in one of its callbacks", node.name))
        })?;
        private.downcast_ref::<T>().ok_or_else(|| {
            EngineError::unsupported(format!(
                "\"{}\" is a {} node and does not expose that data",
                node.name,
                node.class.name()
            ))
        })
    }

    pub fn visit(&mut self, child: NodeId, is_active: bool, t: f64) -> Result<(), EngineError> {
        self.scene.visit_node(child, is_active, t)
    }

    pub fn update(&mut self, child: NodeId, t: f64) -> Result<(), EngineError> {
        self.scene.update(child, t)
    }

    pub fn draw(&mut self, child: NodeId) -> Result<(), EngineError> {
        self.scene.draw(child)
    }

    /// The execution context this node is attached to.
    pub fn exec(&mut self) -> Result<&mut ExecContext, EngineError> {
        let node = self.scene.node(self.id)?;
        let ctx = node.ctx.ok_or_else(|| {
            EngineError::invalid_usage(format!("\"{}\" is not attached", node.name))
        })?;
        self.scene.context_mut(ctx)
    }
}

impl std::fmt::Debug for NodeCx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCx")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}
