//! GPU backend seam. Node classes create and destroy opaque pipeline handles through it; the
//! engine itself only opens and closes the render pass around a frame.

use std::collections::HashMap;
use std::fmt;

use scenegl_core::EngineError;

/// Opaque backend resource handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuHandle(pub u64);

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuHandle({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: String,
    pub value: UniformValue,
}

/// Counters every backend keeps; tests use them to check resource balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub pipelines_created: u64,
    pub pipelines_destroyed: u64,
    pub draws: u64,
    pub render_passes: u64,
}

impl BackendStats {
    pub fn live_pipelines(&self) -> u64 {
        self.pipelines_created.saturating_sub(self.pipelines_destroyed)
    }
}

pub trait GpuBackend {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<GpuHandle, EngineError>;
    fn destroy(&mut self, handle: GpuHandle);
    fn begin_render_pass(&mut self) -> Result<(), EngineError>;
    fn end_render_pass(&mut self);
    fn draw(&mut self, pipeline: GpuHandle, uniforms: &[Uniform]) -> Result<(), EngineError>;
    fn stats(&self) -> BackendStats;
}

/// Backend that allocates handles without touching a GPU.
#[derive(Debug, Default)]
pub struct NullBackend {
    next: u64,
    live: HashMap<GpuHandle, String>,
    stats: BackendStats,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels of the pipelines currently alive, sorted.
    pub fn live_labels(&self) -> Vec<String> {
        let mut labels: Vec<_> = self.live.values().cloned().collect();
        labels.sort();
        labels
    }
}

impl GpuBackend for NullBackend {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<GpuHandle, EngineError> {
        self.next += 1;
        let handle = GpuHandle(self.next);
        self.live.insert(handle, desc.label.clone());
        self.stats.pipelines_created += 1;
        Ok(handle)
    }

    fn destroy(&mut self, handle: GpuHandle) {
        if self.live.remove(&handle).is_some() {
            self.stats.pipelines_destroyed += 1;
        } else {
            tracing::warn!("destroying unknown pipeline {handle:?}");
        }
    }

    fn begin_render_pass(&mut self) -> Result<(), EngineError> {
        self.stats.render_passes += 1;
        Ok(())
    }

    fn end_render_pass(&mut self) {}

    fn draw(&mut self, pipeline: GpuHandle, uniforms: &[Uniform]) -> Result<(), EngineError> {
        if !self.live.contains_key(&pipeline) {
            return Err(EngineError::invalid_usage(format!(
                "draw with destroyed pipeline {pipeline:?}"
            )));
        }
        tracing::trace!("draw {pipeline:?} with {} uniforms", uniforms.len());
        self.stats.draws += 1;
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}
