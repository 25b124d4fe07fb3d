use scenegl_graph::{EngineError, NodeCategory, NodeClass, NodeCx, NodeOps, ParamSpec};
use tracing::warn;

use crate::types;

/// Value published by `UniformFloat` for the nodes that read it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformData {
    pub value: f32,
}

struct UniformFloat;

impl NodeOps for UniformFloat {
    type Private = UniformData;

    fn init(&self, cx: &mut NodeCx<'_>, _: &mut UniformData) -> Result<(), EngineError> {
        let (min, max) = (cx.float("live_min")?, cx.float("live_max")?);
        if min.is_nan() || max.is_nan() {
            return Err(EngineError::invalid_usage(format!(
                "{}: live range [{min}, {max}] has a NaN bound",
                cx.name()
            )));
        }
        if min > max {
            return Err(EngineError::invalid_usage(format!(
                "{}: live_min {min} is greater than live_max {max}",
                cx.name()
            )));
        }
        Ok(())
    }

    fn update(&self, cx: &mut NodeCx<'_>, data: &mut UniformData, _t: f64) -> Result<(), EngineError> {
        let value = cx.float("value")?;
        let (min, max) = (cx.float("live_min")?, cx.float("live_max")?);
        let clamped = value.max(min).min(max);
        if clamped != value {
            warn!(
                "{}: value {value} is outside [{min}, {max}], clamped to {clamped}",
                cx.name()
            );
        }
        data.value = clamped as f32;
        Ok(())
    }
}

pub(crate) fn class() -> NodeClass {
    NodeClass::new(
        types::UNIFORM_FLOAT,
        "UniformFloat",
        NodeCategory::Value,
        vec![
            ParamSpec::float("value", 0.0),
            ParamSpec::float("live_min", f64::MIN),
            ParamSpec::float("live_max", f64::MAX),
        ],
        UniformFloat,
    )
}
