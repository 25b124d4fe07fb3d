//! Conversions between the engine's pipeline-state enums and GL enum values.

use scenegl_graph::state::{BlendFactor, BlendOp, Capability, CompareOp, PolygonMode, StencilOp};

pub fn blend_factor_to_gl(f: BlendFactor) -> u32 {
    match f {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

pub fn blend_factor_from_gl(v: u32) -> Option<BlendFactor> {
    BlendFactor::ALL.iter().copied().find(|f| blend_factor_to_gl(*f) == v)
}

pub fn blend_op_to_gl(op: BlendOp) -> u32 {
    match op {
        BlendOp::Add => glow::FUNC_ADD,
        BlendOp::Subtract => glow::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => glow::MIN,
        BlendOp::Max => glow::MAX,
    }
}

pub fn blend_op_from_gl(v: u32) -> Option<BlendOp> {
    BlendOp::ALL.iter().copied().find(|op| blend_op_to_gl(*op) == v)
}

pub fn compare_op_to_gl(op: CompareOp) -> u32 {
    match op {
        CompareOp::Never => glow::NEVER,
        CompareOp::Less => glow::LESS,
        CompareOp::Equal => glow::EQUAL,
        CompareOp::LessEqual => glow::LEQUAL,
        CompareOp::Greater => glow::GREATER,
        CompareOp::NotEqual => glow::NOTEQUAL,
        CompareOp::GreaterEqual => glow::GEQUAL,
        CompareOp::Always => glow::ALWAYS,
    }
}

pub fn compare_op_from_gl(v: u32) -> Option<CompareOp> {
    CompareOp::ALL.iter().copied().find(|op| compare_op_to_gl(*op) == v)
}

pub fn stencil_op_to_gl(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::Replace => glow::REPLACE,
        StencilOp::Increment => glow::INCR,
        StencilOp::IncrementWrap => glow::INCR_WRAP,
        StencilOp::Decrement => glow::DECR,
        StencilOp::DecrementWrap => glow::DECR_WRAP,
        StencilOp::Invert => glow::INVERT,
    }
}

pub fn stencil_op_from_gl(v: u32) -> Option<StencilOp> {
    StencilOp::ALL.iter().copied().find(|op| stencil_op_to_gl(*op) == v)
}

pub fn polygon_mode_to_gl(mode: PolygonMode) -> u32 {
    match mode {
        PolygonMode::Fill => glow::FILL,
        PolygonMode::Line => glow::LINE,
        PolygonMode::Point => glow::POINT,
    }
}

pub fn polygon_mode_from_gl(v: u32) -> Option<PolygonMode> {
    PolygonMode::ALL.iter().copied().find(|m| polygon_mode_to_gl(*m) == v)
}

pub fn capability_to_gl(cap: Capability) -> u32 {
    match cap {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::Dither => glow::DITHER,
        Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
        Capability::SampleAlphaToCoverage => glow::SAMPLE_ALPHA_TO_COVERAGE,
    }
}
