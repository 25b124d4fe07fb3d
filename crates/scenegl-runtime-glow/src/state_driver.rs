use std::fmt;
use std::rc::Rc;

use glow::HasContext;
use tracing::warn;

use scenegl_graph::state::{
    BlendFactor, BlendOp, BlendState, CompareOp, PolygonMode, StencilOp, StencilState,
};
use scenegl_graph::{StateDriver, StateKind, StateValue};

use crate::gl_enums::*;

/// Reads and writes live GL pipeline state.
pub struct GlowStateDriver {
    gl: Rc<glow::Context>,
}

impl GlowStateDriver {
    /// The context must be current on this thread for as long as the driver is used.
    pub unsafe fn new(gl: Rc<glow::Context>) -> Self {
        Self { gl }
    }

    unsafe fn get_u32(&self, pname: u32) -> u32 {
        self.gl.get_parameter_i32(pname) as u32
    }

    unsafe fn read_blend(&self) -> BlendState {
        let factor = |pname: u32, fallback: BlendFactor| {
            let raw = self.get_u32(pname);
            blend_factor_from_gl(raw).unwrap_or_else(|| {
                warn!("unmapped blend factor 0x{raw:x}, treating it as {fallback:?}");
                fallback
            })
        };
        let equation = |pname: u32| {
            let raw = self.get_u32(pname);
            blend_op_from_gl(raw).unwrap_or_else(|| {
                warn!("unmapped blend equation 0x{raw:x}, treating it as add");
                BlendOp::Add
            })
        };
        BlendState {
            enabled: self.gl.is_enabled(glow::BLEND),
            src_color: factor(glow::BLEND_SRC_RGB, BlendFactor::One),
            dst_color: factor(glow::BLEND_DST_RGB, BlendFactor::Zero),
            src_alpha: factor(glow::BLEND_SRC_ALPHA, BlendFactor::One),
            dst_alpha: factor(glow::BLEND_DST_ALPHA, BlendFactor::Zero),
            color_op: equation(glow::BLEND_EQUATION_RGB),
            alpha_op: equation(glow::BLEND_EQUATION_ALPHA),
        }
    }

    unsafe fn read_stencil(&self) -> StencilState {
        let op = |pname: u32| stencil_op_from_gl(self.get_u32(pname)).unwrap_or(StencilOp::Keep);
        StencilState {
            enabled: self.gl.is_enabled(glow::STENCIL_TEST),
            write_mask: self.get_u32(glow::STENCIL_WRITEMASK),
            func: compare_op_from_gl(self.get_u32(glow::STENCIL_FUNC)).unwrap_or(CompareOp::Always),
            reference: self.gl.get_parameter_i32(glow::STENCIL_REF),
            read_mask: self.get_u32(glow::STENCIL_VALUE_MASK),
            fail: op(glow::STENCIL_FAIL),
            depth_fail: op(glow::STENCIL_PASS_DEPTH_FAIL),
            depth_pass: op(glow::STENCIL_PASS_DEPTH_PASS),
        }
    }

    unsafe fn set_enabled(&self, cap: u32, on: bool) {
        if on {
            self.gl.enable(cap);
        } else {
            self.gl.disable(cap);
        }
    }
}

impl StateDriver for GlowStateDriver {
    fn read(&mut self, kind: StateKind) -> StateValue {
        // SAFETY: `new` requires the context to be current on this thread.
        unsafe {
            match kind {
                StateKind::Blend => StateValue::Blend(self.read_blend()),
                StateKind::Stencil => StateValue::Stencil(self.read_stencil()),
                StateKind::ColorMask => {
                    let mut mask = [1i32; 4];
                    self.gl.get_parameter_i32_slice(glow::COLOR_WRITEMASK, &mut mask);
                    StateValue::ColorMask(mask.map(|c| c != 0))
                }
                StateKind::PolygonMode => {
                    let mut modes = [glow::FILL as i32; 2];
                    self.gl.get_parameter_i32_slice(glow::POLYGON_MODE, &mut modes);
                    let mode = polygon_mode_from_gl(modes[0] as u32).unwrap_or(PolygonMode::Fill);
                    StateValue::PolygonMode(mode)
                }
                StateKind::Capability(cap) => {
                    StateValue::Capability(cap, self.gl.is_enabled(capability_to_gl(cap)))
                }
            }
        }
    }

    fn write(&mut self, value: &StateValue) {
        // SAFETY: `new` requires the context to be current on this thread.
        unsafe {
            match *value {
                StateValue::Blend(b) => {
                    self.set_enabled(glow::BLEND, b.enabled);
                    self.gl.blend_func_separate(
                        blend_factor_to_gl(b.src_color),
                        blend_factor_to_gl(b.dst_color),
                        blend_factor_to_gl(b.src_alpha),
                        blend_factor_to_gl(b.dst_alpha),
                    );
                    self.gl
                        .blend_equation_separate(blend_op_to_gl(b.color_op), blend_op_to_gl(b.alpha_op));
                }
                StateValue::Stencil(s) => {
                    self.set_enabled(glow::STENCIL_TEST, s.enabled);
                    self.gl.stencil_mask(s.write_mask);
                    self.gl
                        .stencil_func(compare_op_to_gl(s.func), s.reference, s.read_mask);
                    self.gl.stencil_op(
                        stencil_op_to_gl(s.fail),
                        stencil_op_to_gl(s.depth_fail),
                        stencil_op_to_gl(s.depth_pass),
                    );
                }
                StateValue::ColorMask([r, g, b, a]) => self.gl.color_mask(r, g, b, a),
                StateValue::PolygonMode(mode) => self
                    .gl
                    .polygon_mode(glow::FRONT_AND_BACK, polygon_mode_to_gl(mode)),
                StateValue::Capability(cap, on) => self.set_enabled(capability_to_gl(cap), on),
            }
        }
    }
}

impl fmt::Debug for GlowStateDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowStateDriver").finish_non_exhaustive()
    }
}
