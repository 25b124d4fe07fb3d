//! Scene documents under `fixtures/`, loaded through the JSON scene loader.

use std::time::{SystemTime, UNIX_EPOCH};

use scenegl_core::{load_engine_config_from, ActivityPolicy};
use scenegl_graph::{EngineError, NodeId, NodeState, ParamValue};
use scenegl_runtime::scene_json::load_scene_str;

use crate::bench::{Bench, Event};

const DIAMOND: &str = include_str!("../fixtures/diamond.json");
const SELECT_SHARED: &str = include_str!("../fixtures/select_shared.json");
const CYCLE: &str = include_str!("../fixtures/cycle.json");
const UNKNOWN_CLASS: &str = include_str!("../fixtures/unknown_class.json");

#[test]
fn diamond_fixture_loads_and_drops_orphans() {
    let mut b = Bench::new();
    let root = load_scene_str(&mut b.scene, DIAMOND).expect("load diamond");
    assert_eq!(b.scene.len(), 4, "the unused entry is destroyed");
    assert_eq!(b.scene.node(root).expect("root").name(), "top");
    assert_eq!(b.scene.node(root).expect("root").refcount(), 1);

    b.scene.attach(root, b.ctx).expect("attach");
    b.frame(root, 0.0);
    assert_eq!(b.calls("shared", Event::Prefetch), 1);
    assert_eq!(b.calls("shared", Event::Update), 1);
    assert_eq!(b.calls("unused", Event::Init), 0);

    b.scene.detach(root).expect("detach");
    assert!(b.scene.unref_node(root).expect("unref"));
    assert!(b.scene.is_empty());
}

#[test]
fn select_fixture_keeps_unchosen_branch_cold() {
    let mut b = Bench::new();
    let root = load_scene_str(&mut b.scene, SELECT_SHARED).expect("load select");
    b.scene.attach(root, b.ctx).expect("attach");
    b.frame(root, 0.0);

    let state_of = |name: &str| {
        let id = named(&b, root, name).expect("named node");
        b.scene.node(id).expect("node").state()
    };
    assert_eq!(state_of("a"), NodeState::Initialized);
    assert_eq!(state_of("b"), NodeState::Ready);
    assert_eq!(state_of("shared"), NodeState::Ready);
    assert_eq!(b.calls("shared", Event::Release), 0);
    assert_eq!(b.calls("a", Event::Update), 0);
}

/// Depth-first search below `root` for a node called `name`.
fn named(b: &Bench, root: NodeId, name: &str) -> Option<NodeId> {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = b.scene.node(id).ok()?;
        if node.name() == name {
            return Some(id);
        }
        stack.extend(node.children());
    }
    None
}

#[test]
fn cycle_fixture_is_rejected_without_leaks() {
    let mut b = Bench::new();
    let err = load_scene_str(&mut b.scene, CYCLE).expect_err("cycle");
    assert!(matches!(err, EngineError::InvalidUsage(_)), "{err}");
    assert!(err.to_string().contains("cycle"), "{err}");
    assert!(b.scene.is_empty());
}

#[test]
fn unknown_class_fails_to_load() {
    let mut b = Bench::new();
    let err = load_scene_str(&mut b.scene, UNKNOWN_CLASS).expect_err("unknown class");
    assert!(matches!(err, EngineError::InvalidType(_)), "{err}");
    assert!(err.to_string().contains("Hologram"), "{err}");
    assert!(b.scene.is_empty());
}

#[test]
fn any_path_config_changes_shared_activity() {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("scenegl_contract_any_path_{ts}.json"));
    std::fs::write(&path, r#"{ "activity_policy": "any_path", "lazy_prefetch": false }"#)
        .expect("write config");
    let config = load_engine_config_from(&path).expect("config");
    let _ = std::fs::remove_file(&path);
    assert_eq!(config.activity_policy, ActivityPolicy::AnyPath);

    let mut b = Bench::with_config(config);
    let root = load_scene_str(&mut b.scene, SELECT_SHARED).expect("load select");
    b.scene.set_param(root, "index", ParamValue::Int(0)).expect("index");
    b.scene.attach(root, b.ctx).expect("attach");
    b.frame(root, 0.0);
    assert_eq!(b.calls("shared", Event::Prefetch), 1);
    assert_eq!(b.calls("shared", Event::Update), 1);
}
