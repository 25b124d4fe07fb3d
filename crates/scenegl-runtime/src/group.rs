use scenegl_graph::{EngineError, NodeCategory, NodeClass, NodeCx, NodeOps, ParamSpec};

use crate::types;

/// Updates and draws its children in declaration order.
struct Group;

impl NodeOps for Group {
    type Private = ();

    fn update(&self, cx: &mut NodeCx<'_>, _: &mut (), t: f64) -> Result<(), EngineError> {
        for child in cx.nodes("children")? {
            cx.update(child, t)?;
        }
        Ok(())
    }

    fn draw(&self, cx: &mut NodeCx<'_>, _: &mut ()) -> Result<(), EngineError> {
        for child in cx.nodes("children")? {
            cx.draw(child)?;
        }
        Ok(())
    }
}

pub(crate) fn class() -> NodeClass {
    NodeClass::new(
        types::GROUP,
        "Group",
        NodeCategory::Render,
        vec![ParamSpec::node_list("children", &[NodeCategory::Render])],
        Group,
    )
}

#[cfg(test)]
mod tests {
    use scenegl_graph::{NodeState, ParamValue};

    use crate::testutil::Harness;
    use crate::types;

    #[test]
    fn draws_every_child_in_order() {
        let mut h = Harness::new();
        let a = h.quad("a", [1.0, 0.0, 0.0, 1.0]);
        let b = h.quad("b", [0.0, 0.0, 1.0, 1.0]);
        let group = h.create(types::GROUP);
        h.scene
            .set_param(group, "children", ParamValue::NodeList(vec![a, b]))
            .expect("children");
        h.scene.attach(group, h.ctx).expect("attach");

        h.scene.render_frame(group, 0.0).expect("frame");
        let colors: Vec<_> = h.draws().iter().map(|d| d.color).collect();
        assert_eq!(colors, vec![[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]]);
        assert_eq!(h.scene.node(b).expect("b").state(), NodeState::Ready);
    }

    #[test]
    fn rejects_value_children() {
        let mut h = Harness::new();
        let u = h.create(types::UNIFORM_FLOAT);
        let group = h.create(types::GROUP);
        h.scene
            .set_param(group, "children", ParamValue::NodeList(vec![u]))
            .expect("set is unchecked");
        h.scene.attach(group, h.ctx).expect("attach");
        let err = h.scene.visit(group, 0.0).expect_err("uniform is not renderable");
        assert!(err.to_string().contains("does not accept value node"), "{err}");
    }
}
