//! State override classes. Each parses its parameters once in `init` into the [`StateValue`] the
//! engine applies around the owner's draw.

use scenegl_graph::state::{
    BlendFactor, BlendOp, BlendState, Capability, CompareOp, PolygonMode, StencilOp, StencilState,
};
use scenegl_graph::{
    EngineError, NodeCategory, NodeClass, NodeCx, NodeOps, NodeType, ParamSpec, StateValue,
};

use crate::types;

type Parse = fn(&NodeCx<'_>) -> Result<StateValue, EngineError>;

struct StateClass {
    parse: Parse,
}

impl NodeOps for StateClass {
    type Private = Option<StateValue>;

    fn init(&self, cx: &mut NodeCx<'_>, value: &mut Option<StateValue>) -> Result<(), EngineError> {
        *value = Some((self.parse)(cx)?);
        Ok(())
    }

    fn uninit(&self, _cx: &mut NodeCx<'_>, value: &mut Option<StateValue>) {
        *value = None;
    }

    fn pipeline_state(&self, _cx: &NodeCx<'_>, value: &Option<StateValue>) -> Option<StateValue> {
        *value
    }
}

fn named<T>(cx: &NodeCx<'_>, key: &str, from_name: fn(&str) -> Option<T>) -> Result<T, EngineError> {
    let text = cx.str(key)?;
    from_name(text).ok_or_else(|| {
        EngineError::invalid_usage(format!("{}.{key}: unknown value \"{text}\"", cx.name()))
    })
}

fn mask(cx: &NodeCx<'_>, key: &str) -> Result<u32, EngineError> {
    let raw = cx.int(key)?;
    u32::try_from(raw).map_err(|_| {
        EngineError::invalid_usage(format!("{}.{key}: {raw} is not a 32-bit mask", cx.name()))
    })
}

fn parse_blend(cx: &NodeCx<'_>) -> Result<StateValue, EngineError> {
    Ok(StateValue::Blend(BlendState {
        enabled: cx.bool("enabled")?,
        src_color: named(cx, "src_color", BlendFactor::from_name)?,
        dst_color: named(cx, "dst_color", BlendFactor::from_name)?,
        src_alpha: named(cx, "src_alpha", BlendFactor::from_name)?,
        dst_alpha: named(cx, "dst_alpha", BlendFactor::from_name)?,
        color_op: named(cx, "color_op", BlendOp::from_name)?,
        alpha_op: named(cx, "alpha_op", BlendOp::from_name)?,
    }))
}

fn parse_stencil(cx: &NodeCx<'_>) -> Result<StateValue, EngineError> {
    let reference = cx.int("reference")?;
    let reference = i32::try_from(reference).map_err(|_| {
        EngineError::invalid_usage(format!("{}.reference: {reference} is out of range", cx.name()))
    })?;
    Ok(StateValue::Stencil(StencilState {
        enabled: cx.bool("enabled")?,
        write_mask: mask(cx, "write_mask")?,
        func: named(cx, "func", CompareOp::from_name)?,
        reference,
        read_mask: mask(cx, "read_mask")?,
        fail: named(cx, "fail", StencilOp::from_name)?,
        depth_fail: named(cx, "depth_fail", StencilOp::from_name)?,
        depth_pass: named(cx, "depth_pass", StencilOp::from_name)?,
    }))
}

fn parse_color_mask(cx: &NodeCx<'_>) -> Result<StateValue, EngineError> {
    Ok(StateValue::ColorMask([
        cx.bool("red")?,
        cx.bool("green")?,
        cx.bool("blue")?,
        cx.bool("alpha")?,
    ]))
}

fn parse_polygon_mode(cx: &NodeCx<'_>) -> Result<StateValue, EngineError> {
    Ok(StateValue::PolygonMode(named(cx, "mode", PolygonMode::from_name)?))
}

fn parse_capability(cx: &NodeCx<'_>) -> Result<StateValue, EngineError> {
    Ok(StateValue::Capability(
        named(cx, "capability", Capability::from_name)?,
        cx.bool("enabled")?,
    ))
}

fn state_class(id: NodeType, name: &'static str, params: Vec<ParamSpec>, parse: Parse) -> NodeClass {
    NodeClass::new(id, name, NodeCategory::State, params, StateClass { parse })
}

pub(crate) fn classes() -> Vec<NodeClass> {
    vec![
        state_class(
            types::BLEND_STATE,
            "BlendState",
            vec![
                ParamSpec::bool("enabled", true),
                ParamSpec::string("src_color", "one"),
                ParamSpec::string("dst_color", "zero"),
                ParamSpec::string("src_alpha", "one"),
                ParamSpec::string("dst_alpha", "zero"),
                ParamSpec::string("color_op", "add"),
                ParamSpec::string("alpha_op", "add"),
            ],
            parse_blend,
        ),
        state_class(
            types::STENCIL_STATE,
            "StencilState",
            vec![
                ParamSpec::bool("enabled", true),
                ParamSpec::int("write_mask", 0xff),
                ParamSpec::string("func", "always"),
                ParamSpec::int("reference", 0),
                ParamSpec::int("read_mask", 0xff),
                ParamSpec::string("fail", "keep"),
                ParamSpec::string("depth_fail", "keep"),
                ParamSpec::string("depth_pass", "keep"),
            ],
            parse_stencil,
        ),
        state_class(
            types::COLOR_MASK_STATE,
            "ColorMaskState",
            vec![
                ParamSpec::bool("red", true),
                ParamSpec::bool("green", true),
                ParamSpec::bool("blue", true),
                ParamSpec::bool("alpha", true),
            ],
            parse_color_mask,
        ),
        state_class(
            types::POLYGON_MODE_STATE,
            "PolygonModeState",
            vec![ParamSpec::string("mode", "fill")],
            parse_polygon_mode,
        ),
        state_class(
            types::CAPABILITY_STATE,
            "CapabilityState",
            vec![
                ParamSpec::string("capability", "depth_test"),
                ParamSpec::bool("enabled", true),
            ],
            parse_capability,
        ),
    ]
}
