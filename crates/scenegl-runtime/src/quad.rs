use scenegl_graph::{
    mat4_mul, EngineError, GpuHandle, NodeCategory, NodeClass, NodeCx, NodeOps, ParamSpec,
    PipelineDesc, Uniform, UniformValue,
};
use tracing::error;

use crate::types;
use crate::uniform::UniformData;

pub const QUAD_VERT: &str = r#"#version 330 core
layout (location = 0) in vec2 a_pos;
layout (location = 1) in vec2 a_uv;
uniform mat4 uMVP;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = uMVP * vec4(a_pos, 0.0, 1.0);
}
"#;

pub const QUAD_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 FragColor;
uniform vec4 uColor;
uniform float uOpacity;
void main() {
    FragColor = vec4(uColor.rgb, uColor.a * uOpacity);
}
"#;

/// Per-node state of a `Quad`: its pipeline while prefetched, and the opacity read at update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadData {
    pub pipeline: Option<GpuHandle>,
    pub opacity: f32,
}

impl Default for QuadData {
    fn default() -> Self {
        Self {
            pipeline: None,
            opacity: 1.0,
        }
    }
}

struct Quad;

impl NodeOps for Quad {
    type Private = QuadData;

    fn prefetch(&self, cx: &mut NodeCx<'_>, data: &mut QuadData) -> Result<(), EngineError> {
        let desc = PipelineDesc {
            label: cx.name().to_string(),
            vertex: QUAD_VERT.to_string(),
            fragment: QUAD_FRAG.to_string(),
        };
        data.pipeline = Some(cx.exec()?.backend_mut().create_pipeline(&desc)?);
        Ok(())
    }

    fn release(&self, cx: &mut NodeCx<'_>, data: &mut QuadData) {
        let Some(pipeline) = data.pipeline.take() else {
            return;
        };
        match cx.exec() {
            Ok(exec) => exec.backend_mut().destroy(pipeline),
            Err(e) => error!("leaking pipeline {pipeline:?}: {e}"),
        }
    }

    fn update(&self, cx: &mut NodeCx<'_>, data: &mut QuadData, t: f64) -> Result<(), EngineError> {
        data.opacity = match cx.node("opacity")? {
            Some(opacity) => {
                cx.update(opacity, t)?;
                cx.peek::<UniformData>(opacity)?.value
            }
            None => 1.0,
        };
        Ok(())
    }

    fn draw(&self, cx: &mut NodeCx<'_>, data: &mut QuadData) -> Result<(), EngineError> {
        let pipeline = data.pipeline.ok_or_else(|| {
            EngineError::invalid_usage(format!("{} is drawn without a pipeline", cx.name()))
        })?;
        let color = cx.vec4("color")?;
        let exec = cx.exec()?;
        exec.begin_render_pass()?;
        let mvp = mat4_mul(exec.projection(), exec.modelview());
        let uniforms = [
            Uniform {
                name: "uMVP".to_string(),
                value: UniformValue::Mat4(mvp),
            },
            Uniform {
                name: "uColor".to_string(),
                value: UniformValue::Vec4(color),
            },
            Uniform {
                name: "uOpacity".to_string(),
                value: UniformValue::Float(data.opacity),
            },
        ];
        exec.backend_mut().draw(pipeline, &uniforms)
    }
}

pub(crate) fn class() -> NodeClass {
    NodeClass::new(
        types::QUAD,
        "Quad",
        NodeCategory::Render,
        vec![
            ParamSpec::vec4("color", [1.0, 1.0, 1.0, 1.0]),
            ParamSpec::node("opacity", &[NodeCategory::Value]),
        ],
        Quad,
    )
}
