use scenegl_graph::{EngineError, NodeCategory, NodeClass, NodeCx, NodeId, NodeOps, ParamSpec};

use crate::types;

/// Keeps `child` active only for `start <= t < end`.
struct TimeRange;

/// The child, if it is active this frame.
fn live_child(cx: &NodeCx<'_>) -> Result<Option<NodeId>, EngineError> {
    match cx.node("child")? {
        Some(child) if cx.peek_node(child)?.is_active() => Ok(Some(child)),
        _ => Ok(None),
    }
}

impl NodeOps for TimeRange {
    type Private = ();
    const CUSTOM_VISIT: bool = true;

    fn init(&self, cx: &mut NodeCx<'_>, _: &mut ()) -> Result<(), EngineError> {
        let (start, end) = (cx.float("start")?, cx.float("end")?);
        if start > end {
            return Err(EngineError::invalid_usage(format!(
                "{}: range start {start} is after end {end}",
                cx.name()
            )));
        }
        Ok(())
    }

    fn visit(&self, cx: &mut NodeCx<'_>, _: &mut (), is_active: bool, t: f64) -> Result<(), EngineError> {
        let (start, end) = (cx.float("start")?, cx.float("end")?);
        if let Some(child) = cx.node("child")? {
            cx.visit(child, is_active && start <= t && t < end, t)?;
        }
        Ok(())
    }

    fn update(&self, cx: &mut NodeCx<'_>, _: &mut (), t: f64) -> Result<(), EngineError> {
        match live_child(cx)? {
            Some(child) => cx.update(child, t),
            None => Ok(()),
        }
    }

    fn draw(&self, cx: &mut NodeCx<'_>, _: &mut ()) -> Result<(), EngineError> {
        match live_child(cx)? {
            Some(child) => cx.draw(child),
            None => Ok(()),
        }
    }
}

pub(crate) fn class() -> NodeClass {
    NodeClass::new(
        types::TIME_RANGE,
        "TimeRange",
        NodeCategory::Render,
        vec![
            ParamSpec::node("child", &[NodeCategory::Render]),
            ParamSpec::float("start", 0.0),
            ParamSpec::float("end", f64::MAX),
        ],
        TimeRange,
    )
}
