use std::sync::atomic::Ordering;

use scenegl_graph::{EngineError, NodeState, NullBackend, ParamValue, SoftwareStateDriver};
use scenegl_runtime::types;

use crate::bench::{Bench, Event};

/// Mutation contract: a parameter set on an initialized node sends it back to uninitialized and
/// the next init starts from fresh private data.
#[test]
fn parameter_set_forces_uninit_with_fresh_private_data() {
    let mut b = Bench::new();
    let n = b.counted("n");
    let child = b.counted("child");
    b.scene.attach(n, b.ctx).expect("attach");
    b.frame(n, 0.0);
    assert_eq!(b.scene.node(n).expect("n").state(), NodeState::Ready);

    b.children(n, &[child]);
    assert_eq!(b.scene.node(n).expect("n").state(), NodeState::Uninitialized);
    assert_eq!(b.calls("n", Event::Release), 1, "uninit releases first");
    assert_eq!(b.calls("n", Event::Uninit), 1);

    b.frame(n, 1.0);
    assert_eq!(b.calls("n", Event::Init), 2);
    assert_eq!(b.counters.stale_inits.load(Ordering::SeqCst), 0);
}

#[test]
fn rejected_parameter_set_changes_nothing() {
    let mut b = Bench::new();
    let n = b.counted("n");
    b.scene.attach(n, b.ctx).expect("attach");
    b.frame(n, 0.0);

    let err = b
        .scene
        .set_param(n, "children", ParamValue::Int(3))
        .expect_err("wrong kind");
    assert!(err.is_usage_error(), "{err}");
    assert_eq!(b.scene.node(n).expect("n").state(), NodeState::Ready);
    assert_eq!(b.calls("n", Event::Uninit), 0);
}

#[test]
fn conflicting_child_aborts_the_set() {
    let mut b = Bench::new();
    let other = b.scene.create_context(
        Box::new(NullBackend::new()),
        Box::new(SoftwareStateDriver::new()),
    );
    let n = b.counted("n");
    let mine = b.counted("mine");
    let theirs = b.counted("theirs");
    b.scene.attach(n, b.ctx).expect("attach");
    b.scene.attach(theirs, other).expect("attach elsewhere");
    b.frame(n, 0.0);

    let err = b
        .scene
        .set_param(n, "children", ParamValue::NodeList(vec![mine, theirs]))
        .expect_err("theirs belongs to another context");
    assert!(matches!(err, EngineError::ContextConflict { .. }), "{err}");
    assert_eq!(b.scene.param(n, "children").expect("children"), ParamValue::NodeList(vec![]));
    assert_eq!(b.scene.node(mine).expect("mine").ctx(), None);
    assert_eq!(b.scene.node(mine).expect("mine").refcount(), 1);
    assert_eq!(b.scene.node(n).expect("n").state(), NodeState::Ready);
}

/// Destruction contract: detach with refcount 2 keeps the node; the last unref destroys it, and
/// only once it is detached.
#[test]
fn detach_keeps_referenced_node_and_unref_requires_detach() {
    let mut b = Bench::new();
    let n = b.counted("n");
    b.scene.ref_node(n).expect("second reference");
    b.scene.attach(n, b.ctx).expect("attach");
    b.frame(n, 0.0);

    b.scene.detach(n).expect("detach");
    let node = b.scene.node(n).expect("still alive");
    assert_eq!(node.refcount(), 2);
    assert_eq!(node.ctx(), None);
    assert_eq!(node.state(), NodeState::Uninitialized);

    b.scene.attach(n, b.ctx).expect("re-attach");
    assert!(!b.scene.unref_node(n).expect("drop one of two refs"));
    let err = b.scene.unref_node(n).expect_err("last ref while attached");
    assert!(matches!(err, EngineError::InvalidUsage(_)), "{err}");
    assert_eq!(b.scene.node(n).expect("n").refcount(), 1, "refused unref leaves the count");

    b.scene.detach(n).expect("detach");
    assert!(b.scene.unref_node(n).expect("last ref"));
    let err = b.scene.node(n).expect_err("destroyed");
    assert!(matches!(err, EngineError::UnknownNode(_)), "{err}");
}

#[test]
fn destroying_a_parent_releases_its_references() {
    let mut b = Bench::new();
    let parent = b.counted("parent");
    let kept = b.counted("kept");
    let owned = b.counted("owned");
    b.children(parent, &[kept, owned]);
    b.scene.unref_node(owned).expect("parent owns it now");

    assert!(b.scene.unref_node(parent).expect("destroy parent"));
    assert!(!b.scene.contains(owned));
    assert_eq!(b.scene.node(kept).expect("kept").refcount(), 1);
}

#[test]
fn shared_child_is_uninitialized_when_its_last_path_detaches() {
    let mut b = Bench::new();
    let left = b.counted("left");
    let right = b.counted("right");
    let shared = b.counted("shared");
    let group = b.scene.create(types::GROUP).expect("group");
    b.input(left, shared);
    b.input(right, shared);
    b.scene
        .set_param(group, "children", ParamValue::NodeList(vec![left, right]))
        .expect("children");
    b.scene.attach(group, b.ctx).expect("attach");
    b.frame(group, 0.0);

    b.scene
        .set_param(group, "children", ParamValue::NodeList(vec![right]))
        .expect("drop left");
    assert_eq!(b.calls("shared", Event::Uninit), 0, "right still holds it");
    assert_eq!(b.scene.node(shared).expect("shared").state(), NodeState::Ready);

    b.scene.detach(group).expect("detach");
    assert_eq!(b.calls("shared", Event::Uninit), 1);
    assert_eq!(b.calls("shared", Event::Release), 1);
}

#[test]
fn set_on_owner_shared_by_two_roots_stays_balanced() {
    let mut b = Bench::new();
    let r1 = b.counted("r1");
    let r2 = b.counted("r2");
    let owner = b.counted("owner");
    let old = b.counted("old");
    let new = b.counted("new");
    b.children(owner, &[old]);
    b.children(r1, &[owner]);
    b.children(r2, &[owner]);
    b.scene.attach(r1, b.ctx).expect("attach r1");
    b.scene.attach(r2, b.ctx).expect("attach r2");
    b.frame(r1, 0.0);

    b.children(owner, &[new]);
    assert_eq!(b.calls("old", Event::Uninit), 1);
    assert_eq!(b.scene.node(old).expect("old").ctx(), None);

    b.scene.detach(r1).expect("detach r1");
    assert_eq!(b.calls("new", Event::Uninit), 0, "r2 still reaches it");
    b.frame(r2, 1.0);
    assert_eq!(b.calls("new", Event::Prefetch), 1);

    b.scene.detach(r2).expect("detach r2");
    assert_eq!(b.calls("new", Event::Uninit), 1);
    for id in [new, owner, old] {
        let node = b.scene.node(id).expect("alive");
        assert_eq!((node.ctx(), node.ctx_refcount()), (None, 0));
    }
    assert!(b.scene.unref_node(old).expect("old is free to go"));
}
