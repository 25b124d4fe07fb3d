//! Node classes: static identity plus the lifecycle callbacks.
//!
//! A class author implements [`NodeOps`] with a concrete `Private` type. The scene stores private
//! data type-erased and dispatches through [`ClassOps`], which downcasts back to the concrete type
//! before calling the typed callback.

use std::any::Any;
use std::fmt;

use scenegl_core::EngineError;

use crate::cx::NodeCx;
use crate::params::ParamSpec;
use crate::state::StateValue;

/// Stable numeric class identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeType(pub u32);

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType(0x{:08x})", self.0)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Draws, or contains things that draw.
    Render,
    /// Produces a value other nodes read during update.
    Value,
    /// Describes a pipeline-state override applied around a draw.
    State,
}

impl NodeCategory {
    pub fn name(self) -> &'static str {
        match self {
            NodeCategory::Render => "render",
            NodeCategory::Value => "value",
            NodeCategory::State => "state",
        }
    }
}

/// Callbacks a class may provide. Every one is optional.
///
/// `init`/`uninit` bracket context-bound resources, `prefetch`/`release` bracket per-activation
/// resources. `visit` replaces the default child traversal when `CUSTOM_VISIT` is set.
#[allow(unused_variables)]
pub trait NodeOps: 'static {
    type Private: Default + 'static;

    const CUSTOM_VISIT: bool = false;

    fn init(&self, cx: &mut NodeCx<'_>, private: &mut Self::Private) -> Result<(), EngineError> {
        Ok(())
    }

    fn prefetch(&self, cx: &mut NodeCx<'_>, private: &mut Self::Private) -> Result<(), EngineError> {
        Ok(())
    }

    fn release(&self, cx: &mut NodeCx<'_>, private: &mut Self::Private) {}

    fn uninit(&self, cx: &mut NodeCx<'_>, private: &mut Self::Private) {}

    fn update(
        &self,
        cx: &mut NodeCx<'_>,
        private: &mut Self::Private,
        t: f64,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn draw(&self, cx: &mut NodeCx<'_>, private: &mut Self::Private) -> Result<(), EngineError> {
        Ok(())
    }

    fn visit(
        &self,
        cx: &mut NodeCx<'_>,
        private: &mut Self::Private,
        is_active: bool,
        t: f64,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// State classes describe the override they apply around a draw.
    fn pipeline_state(&self, cx: &NodeCx<'_>, private: &Self::Private) -> Option<StateValue> {
        None
    }
}

/// Object-safe form of [`NodeOps`] over type-erased private data.
pub(crate) trait ClassOps {
    fn new_private(&self) -> Box<dyn Any>;
    fn private_size(&self) -> usize;
    fn custom_visit(&self) -> bool;
    fn init(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError>;
    fn prefetch(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError>;
    fn release(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any);
    fn uninit(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any);
    fn update(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any, t: f64) -> Result<(), EngineError>;
    fn draw(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError>;
    fn visit(
        &self,
        cx: &mut NodeCx<'_>,
        private: &mut dyn Any,
        is_active: bool,
        t: f64,
    ) -> Result<(), EngineError>;
    fn pipeline_state(&self, cx: &NodeCx<'_>, private: &dyn Any) -> Option<StateValue>;
}

fn typed<'p, P: 'static>(cx: &NodeCx<'_>, private: &'p mut dyn Any) -> Result<&'p mut P, EngineError> {
    private.downcast_mut::<P>().ok_or_else(|| {
        EngineError::invalid_usage(format!("private data of \"{}\" does not match its class", cx.name()))
    })
}

impl<T: NodeOps> ClassOps for T {
    fn new_private(&self) -> Box<dyn Any> {
        Box::<T::Private>::default()
    }

    fn private_size(&self) -> usize {
        std::mem::size_of::<T::Private>()
    }

    fn custom_visit(&self) -> bool {
        T::CUSTOM_VISIT
    }

    fn init(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError> {
        let p = typed::<T::Private>(cx, private)?;
        NodeOps::init(self, cx, p)
    }

    fn prefetch(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError> {
        let p = typed::<T::Private>(cx, private)?;
        NodeOps::prefetch(self, cx, p)
    }

    fn release(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) {
        match typed::<T::Private>(cx, private) {
            Ok(p) => NodeOps::release(self, cx, p),
            Err(e) => tracing::error!("release skipped: {e}"),
        }
    }

    fn uninit(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) {
        match typed::<T::Private>(cx, private) {
            Ok(p) => NodeOps::uninit(self, cx, p),
            Err(e) => tracing::error!("uninit skipped: {e}"),
        }
    }

    fn update(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any, t: f64) -> Result<(), EngineError> {
        let p = typed::<T::Private>(cx, private)?;
        NodeOps::update(self, cx, p, t)
    }

    fn draw(&self, cx: &mut NodeCx<'_>, private: &mut dyn Any) -> Result<(), EngineError> {
        let p = typed::<T::Private>(cx, private)?;
        NodeOps::draw(self, cx, p)
    }

    fn visit(
        &self,
        cx: &mut NodeCx<'_>,
        private: &mut dyn Any,
        is_active: bool,
        t: f64,
    ) -> Result<(), EngineError> {
        let p = typed::<T::Private>(cx, private)?;
        NodeOps::visit(self, cx, p, is_active, t)
    }

    fn pipeline_state(&self, cx: &NodeCx<'_>, private: &dyn Any) -> Option<StateValue> {
        let p = private.downcast_ref::<T::Private>()?;
        NodeOps::pipeline_state(self, cx, p)
    }
}

/// A registered class: identity, category, parameter schema and callbacks.
pub struct NodeClass {
    id: NodeType,
    name: &'static str,
    category: NodeCategory,
    params: Vec<ParamSpec>,
    ops: Box<dyn ClassOps>,
}

impl NodeClass {
    pub fn new<T: NodeOps>(
        id: NodeType,
        name: &'static str,
        category: NodeCategory,
        params: Vec<ParamSpec>,
        ops: T,
    ) -> Self {
        Self {
            id,
            name,
            category,
            params,
            ops: Box::new(ops),
        }
    }

    pub fn id(&self) -> NodeType {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Schema index and entry of a class parameter.
    pub fn param(&self, key: &str) -> Option<(usize, &ParamSpec)> {
        self.params.iter().enumerate().find(|(_, p)| p.name == key)
    }

    /// Size in bytes of one node's private data.
    pub fn private_size(&self) -> usize {
        self.ops.private_size()
    }

    pub fn has_custom_visit(&self) -> bool {
        self.ops.custom_visit()
    }

    pub(crate) fn ops(&self) -> &dyn ClassOps {
        self.ops.as_ref()
    }
}

impl fmt::Debug for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params.iter().map(|p| p.name).collect::<Vec<_>>())
            .finish()
    }
}
