use scenegl_graph::{EngineError, NodeCategory, NodeClass, NodeCx, NodeId, NodeOps, ParamSpec};

use crate::types;

/// Exactly one branch is live; the others are still visited so they can release.
struct Select;

fn selected(cx: &NodeCx<'_>) -> Result<Option<NodeId>, EngineError> {
    let index = cx.int("index")?;
    let branches = cx.nodes("branches")?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| branches.get(i).copied()))
}

impl NodeOps for Select {
    type Private = ();
    const CUSTOM_VISIT: bool = true;

    fn visit(&self, cx: &mut NodeCx<'_>, _: &mut (), is_active: bool, t: f64) -> Result<(), EngineError> {
        let index = cx.int("index")?;
        let branches = cx.nodes("branches")?;
        if usize::try_from(index).map_or(true, |i| i >= branches.len()) {
            tracing::trace!("{}: index {index} selects nothing", cx.name());
        }
        for (i, branch) in branches.into_iter().enumerate() {
            let chosen = usize::try_from(index).map_or(false, |idx| idx == i);
            cx.visit(branch, is_active && chosen, t)?;
        }
        Ok(())
    }

    fn update(&self, cx: &mut NodeCx<'_>, _: &mut (), t: f64) -> Result<(), EngineError> {
        match selected(cx)? {
            Some(branch) => cx.update(branch, t),
            None => Ok(()),
        }
    }

    fn draw(&self, cx: &mut NodeCx<'_>, _: &mut ()) -> Result<(), EngineError> {
        match selected(cx)? {
            Some(branch) => cx.draw(branch),
            None => Ok(()),
        }
    }
}

pub(crate) fn class() -> NodeClass {
    NodeClass::new(
        types::SELECT,
        "Select",
        NodeCategory::Render,
        vec![
            ParamSpec::node_list("branches", &[NodeCategory::Render]),
            ParamSpec::int("index", 0),
        ],
        Select,
    )
}
