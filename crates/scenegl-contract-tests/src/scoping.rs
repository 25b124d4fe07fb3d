use scenegl_graph::state::{BlendFactor, BlendState};
use scenegl_graph::{NodeId, ParamValue, StateKind, StateValue};
use scenegl_runtime::types;

use crate::bench::Bench;

fn outer_blend() -> BlendState {
    BlendState {
        enabled: true,
        src_color: BlendFactor::One,
        dst_color: BlendFactor::One,
        ..BlendState::default()
    }
}

fn premultiplied() -> BlendState {
    BlendState {
        enabled: true,
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        ..BlendState::default()
    }
}

/// root -> [a (blend override) -> [inner], b]
fn scoped_tree(b: &mut Bench) -> (NodeId, NodeId) {
    let root = b.counted("root");
    let a = b.counted("a");
    let inner = b.counted("inner");
    let sibling = b.counted("b");
    b.children(a, &[inner]);
    b.children(root, &[a, sibling]);

    let blend = b.scene.create(types::BLEND_STATE).expect("blend");
    b.scene
        .set_param(blend, "src_color", ParamValue::Str("src_alpha".into()))
        .expect("src");
    b.scene
        .set_param(blend, "dst_color", ParamValue::Str("one_minus_src_alpha".into()))
        .expect("dst");
    b.scene.param_add(a, "states", &[blend]).expect("states");
    b.scene.unref_node(blend).expect("owned by a");

    b.scene
        .context_mut(b.ctx)
        .expect("ctx")
        .state_driver_mut()
        .write(&StateValue::Blend(outer_blend()));
    b.scene.attach(root, b.ctx).expect("attach");
    (root, blend)
}

fn driver_blend(b: &mut Bench) -> StateValue {
    b.scene
        .context_mut(b.ctx)
        .expect("ctx")
        .state_driver_mut()
        .read(StateKind::Blend)
}

fn seen(b: &Bench) -> Vec<(String, StateValue)> {
    std::mem::take(&mut *b.counters.seen_blend.lock().expect("seen_blend lock"))
}

/// Scoping contract: an override holds for the owner's draw and everything it draws, and the
/// sibling drawn next sees the state the caller had set.
#[test]
fn override_covers_subtree_and_not_siblings() {
    let mut b = Bench::new();
    let (root, _) = scoped_tree(&mut b);
    b.frame(root, 0.0);

    let outer = StateValue::Blend(outer_blend());
    let inner = StateValue::Blend(premultiplied());
    assert_eq!(
        seen(&b),
        vec![
            ("root".to_string(), outer),
            ("a".to_string(), inner),
            ("inner".to_string(), inner),
            ("b".to_string(), outer),
        ]
    );
    assert_eq!(driver_blend(&mut b), outer);
}

#[test]
fn driver_is_restored_every_frame() {
    let mut b = Bench::new();
    let (root, _) = scoped_tree(&mut b);
    let outer = StateValue::Blend(outer_blend());
    for frame in 0..4 {
        b.frame(root, f64::from(frame));
        assert_eq!(driver_blend(&mut b), outer, "after frame {frame}");
        let seen = seen(&b);
        assert_eq!(seen.last().map(|(n, v)| (n.as_str(), *v)), Some(("b", outer)));
    }
}

#[test]
fn edited_override_takes_effect_on_next_draw() {
    let mut b = Bench::new();
    let (root, blend) = scoped_tree(&mut b);
    b.frame(root, 0.0);
    seen(&b);

    b.scene
        .set_param(blend, "enabled", ParamValue::Bool(false))
        .expect("disable");
    b.frame(root, 1.0);

    let disabled = StateValue::Blend(BlendState {
        enabled: false,
        ..premultiplied()
    });
    let seen = seen(&b);
    assert_eq!(seen[1], ("a".to_string(), disabled));
    assert_eq!(seen[3], ("b".to_string(), StateValue::Blend(outer_blend())));
}
