use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glow::HasContext;
use tracing::{debug, warn};

use scenegl_core::EngineError;
use scenegl_graph::{BackendStats, GpuBackend, GpuHandle, PipelineDesc, Uniform, UniformValue};

use crate::program::{compile_program, FullscreenTriangle};

/// `GpuBackend` drawing every pipeline as a fullscreen triangle into the bound framebuffer.
pub struct GlowBackend {
    gl: Rc<glow::Context>,
    tri: FullscreenTriangle,
    programs: HashMap<GpuHandle, glow::NativeProgram>,
    next: u64,
    stats: BackendStats,
}

impl GlowBackend {
    /// The context must be current on this thread for the lifetime of the backend.
    pub unsafe fn new(gl: Rc<glow::Context>) -> Result<Self, EngineError> {
        let tri = FullscreenTriangle::new(&gl)?;
        Ok(Self {
            gl,
            tri,
            programs: HashMap::new(),
            next: 0,
            stats: BackendStats::default(),
        })
    }

    unsafe fn set_uniform(&self, program: glow::NativeProgram, uniform: &Uniform) {
        let Some(loc) = self.gl.get_uniform_location(program, &uniform.name) else {
            return;
        };
        match uniform.value {
            UniformValue::Float(v) => self.gl.uniform_1_f32(Some(&loc), v),
            UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(Some(&loc), x, y, z, w),
            UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, &m),
        }
    }
}

impl GpuBackend for GlowBackend {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<GpuHandle, EngineError> {
        // SAFETY: `new` requires the context to be current on this thread.
        let program = unsafe { compile_program(&self.gl, &desc.vertex, &desc.fragment)? };
        self.next += 1;
        let handle = GpuHandle(self.next);
        self.programs.insert(handle, program);
        self.stats.pipelines_created += 1;
        debug!("pipeline {handle:?} compiled for {}", desc.label);
        Ok(handle)
    }

    fn destroy(&mut self, handle: GpuHandle) {
        match self.programs.remove(&handle) {
            Some(program) => {
                // SAFETY: see `create_pipeline`.
                unsafe { self.gl.delete_program(program) };
                self.stats.pipelines_destroyed += 1;
            }
            None => warn!("destroying unknown pipeline {handle:?}"),
        }
    }

    fn begin_render_pass(&mut self) -> Result<(), EngineError> {
        // SAFETY: see `create_pipeline`.
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) };
        self.stats.render_passes += 1;
        Ok(())
    }

    fn end_render_pass(&mut self) {
        // SAFETY: see `create_pipeline`.
        unsafe { self.gl.flush() };
    }

    fn draw(&mut self, pipeline: GpuHandle, uniforms: &[Uniform]) -> Result<(), EngineError> {
        let program = *self.programs.get(&pipeline).ok_or_else(|| {
            EngineError::invalid_usage(format!("draw with destroyed pipeline {pipeline:?}"))
        })?;
        // SAFETY: see `create_pipeline`.
        unsafe {
            self.gl.use_program(Some(program));
            for uniform in uniforms {
                self.set_uniform(program, uniform);
            }
            self.tri.draw(&self.gl);
            self.gl.use_program(None);
        }
        self.stats.draws += 1;
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

impl Drop for GlowBackend {
    fn drop(&mut self) {
        // SAFETY: see `create_pipeline`.
        unsafe {
            for (_, program) in self.programs.drain() {
                self.gl.delete_program(program);
            }
            self.tri.destroy(&self.gl);
        }
    }
}

impl fmt::Debug for GlowBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowBackend")
            .field("tri", &self.tri)
            .field("programs", &self.programs.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
