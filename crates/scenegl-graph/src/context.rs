use std::fmt;

use scenegl_core::EngineError;

use crate::backend::GpuBackend;
use crate::node::NodeId;
use crate::state::StateDriver;

/// Column-major 4x4 matrix.
pub type Mat4 = [f32; 16];

pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// One execution context: the backend and pipeline state nodes draw into, plus the transform
/// stacks draws read from.
pub struct ExecContext {
    id: ContextId,
    backend: Box<dyn GpuBackend>,
    state: Box<dyn StateDriver>,
    render_pass_started: bool,
    modelview: Vec<Mat4>,
    projection: Vec<Mat4>,
    pub(crate) roots: Vec<NodeId>,
}

impl ExecContext {
    pub(crate) fn new(id: ContextId, backend: Box<dyn GpuBackend>, state: Box<dyn StateDriver>) -> Self {
        Self {
            id,
            backend,
            state,
            render_pass_started: false,
            modelview: vec![IDENTITY],
            projection: vec![IDENTITY],
            roots: Vec::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn GpuBackend {
        self.backend.as_mut()
    }

    pub fn state_driver_mut(&mut self) -> &mut dyn StateDriver {
        self.state.as_mut()
    }

    /// Nodes attached directly (not through a parent), in attach order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn render_pass_started(&self) -> bool {
        self.render_pass_started
    }

    /// Open the render pass if it is not open yet.
    pub fn begin_render_pass(&mut self) -> Result<(), EngineError> {
        if !self.render_pass_started {
            self.backend.begin_render_pass()?;
            self.render_pass_started = true;
        }
        Ok(())
    }

    pub fn end_render_pass(&mut self) {
        if self.render_pass_started {
            self.backend.end_render_pass();
            self.render_pass_started = false;
        }
    }

    pub fn modelview(&self) -> &Mat4 {
        self.modelview.last().unwrap_or(&IDENTITY)
    }

    pub fn projection(&self) -> &Mat4 {
        self.projection.last().unwrap_or(&IDENTITY)
    }

    /// Push `current * m`.
    pub fn push_modelview(&mut self, m: &Mat4) {
        let top = mat4_mul(self.modelview(), m);
        self.modelview.push(top);
    }

    pub fn pop_modelview(&mut self) -> Result<(), EngineError> {
        pop(&mut self.modelview, "modelview")
    }

    /// Push a projection that replaces the current one until popped.
    pub fn push_projection(&mut self, m: &Mat4) {
        self.projection.push(*m);
    }

    pub fn pop_projection(&mut self) -> Result<(), EngineError> {
        pop(&mut self.projection, "projection")
    }
}

fn pop(stack: &mut Vec<Mat4>, which: &str) -> Result<(), EngineError> {
    if stack.len() <= 1 {
        return Err(EngineError::invalid_usage(format!("{which} stack underflow")));
    }
    stack.pop();
    Ok(())
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("id", &self.id)
            .field("render_pass_started", &self.render_pass_started)
            .field("roots", &self.roots)
            .field("stats", &self.backend.stats())
            .finish_non_exhaustive()
    }
}
