#![forbid(unsafe_code)]

//! scenegl node execution engine.
//!
//! Nodes are reference-counted entries of a [`Scene`] arena and form a DAG through their
//! node-typed parameters. Each frame the scene runs four passes from a root:
//!
//! 1. **visit** marks which nodes are active at `t` (initializing them on the way),
//! 2. **reconcile** prefetches resources for active nodes and releases inactive ones,
//! 3. **update** refreshes each node at most once per `t`,
//! 4. **draw** renders, with pipeline-state overrides scoped to each node's draw.
//!
//! This crate holds no GL handles; backends plug in through [`GpuBackend`] and [`StateDriver`].
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

mod backend;
mod class;
mod context;
mod cx;
mod eval;
mod node;
mod params;
mod registry;
mod scene;
pub mod state;


pub use backend::{
    BackendStats, GpuBackend, GpuHandle, NullBackend, PipelineDesc, Uniform, UniformValue,
};
pub use class::{NodeCategory, NodeClass, NodeOps, NodeType};
pub use context::{mat4_mul, ContextId, ExecContext, Mat4, IDENTITY};
pub use cx::NodeCx;
pub use node::{default_name, Node, NodeId, NodeState};
pub use params::{NodeRefs, ParamFlags, ParamKind, ParamSpec, ParamValue};
pub use registry::ClassRegistry;
pub use scene::Scene;
pub use state::{SoftwareStateDriver, StateDriver, StateKind, StateValue};

pub use scenegl_core::{ActivityPolicy, EngineConfig, EngineError};
