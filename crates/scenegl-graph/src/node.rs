use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::class::{NodeCategory, NodeClass};
use crate::context::ContextId;
use crate::params::ParamValue;

/// Time stamp meaning "never": real frame times are non-negative.
pub(crate) const NEVER: f64 = -1.0;

/// Arena handle of a node. Ids are never reused within a scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resource lifecycle. Only ever moves along
/// `Uninitialized -> Initialized -> Ready <-> Idle`, back to `Uninitialized` on uninit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeState {
    Uninitialized,
    Initialized,
    Ready,
    Idle,
}

impl NodeState {
    pub fn name(self) -> &'static str {
        match self {
            NodeState::Uninitialized => "uninitialized",
            NodeState::Initialized => "initialized",
            NodeState::Ready => "ready",
            NodeState::Idle => "idle",
        }
    }
}

/// Default node name: the class name, lower-cased.
pub fn default_name(class: &NodeClass) -> String {
    class.name().to_ascii_lowercase()
}

pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) class: Arc<NodeClass>,
    pub(crate) name: String,
    pub(crate) states: Vec<NodeId>,
    pub(crate) params: Vec<ParamValue>,
    /// Taken out while one of this node's callbacks runs.
    pub(crate) private: Option<Box<dyn Any>>,
    pub(crate) state: NodeState,
    pub(crate) refcount: u32,
    pub(crate) ctx: Option<ContextId>,
    pub(crate) ctx_refcount: u32,
    pub(crate) visit_time: f64,
    pub(crate) last_update_time: f64,
    pub(crate) is_active: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, class: Arc<NodeClass>, params: Vec<ParamValue>) -> Self {
        let private = class.ops().new_private();
        Self {
            id,
            name: default_name(&class),
            class,
            states: Vec::new(),
            params,
            private: Some(private),
            state: NodeState::Uninitialized,
            refcount: 1,
            ctx: None,
            ctx_refcount: 0,
            visit_time: NEVER,
            last_update_time: NEVER,
            is_active: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &NodeClass {
        &self.class
    }

    pub fn category(&self) -> NodeCategory {
        self.class.category()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    pub fn ctx(&self) -> Option<ContextId> {
        self.ctx
    }

    /// Number of attach paths currently holding this node in its context.
    pub fn ctx_refcount(&self) -> u32 {
        self.ctx_refcount
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Frame time of the last visit, `None` if never visited.
    pub fn visit_time(&self) -> Option<f64> {
        (self.visit_time >= 0.0).then_some(self.visit_time)
    }

    /// Frame time of the last completed update, `None` if not updated since the last release.
    pub fn last_update_time(&self) -> Option<f64> {
        (self.last_update_time >= 0.0).then_some(self.last_update_time)
    }

    pub fn states(&self) -> &[NodeId] {
        &self.states
    }

    /// Whether the name is still the one assigned at creation.
    pub fn is_default_name(&self) -> bool {
        self.name == default_name(&self.class)
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        let (idx, _) = self.class.param(key)?;
        self.params.get(idx)
    }

    /// Nodes referenced by class parameters, in schema order.
    pub fn children(&self) -> Vec<NodeId> {
        self.params.iter().flat_map(ParamValue::node_refs).collect()
    }

    /// Every outgoing edge: children, then state overrides.
    pub(crate) fn edges(&self) -> Vec<NodeId> {
        let mut edges = self.children();
        edges.extend_from_slice(&self.states);
        edges
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("name", &self.name)
            .field("state", &self.state)
            .field("refcount", &self.refcount)
            .field("ctx", &self.ctx)
            .field("ctx_refcount", &self.ctx_refcount)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}
