//! A counting test class and a scene bench around it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scenegl_graph::{
    ClassRegistry, ContextId, EngineConfig, EngineError, NodeCategory, NodeClass, NodeCx, NodeId,
    NodeOps, NodeType, NullBackend, ParamSpec, ParamValue, Scene, SoftwareStateDriver, StateKind,
    StateValue,
};
use scenegl_runtime::register_builtins;

pub const COUNTED: NodeType = NodeType(u32::from_be_bytes(*b"CNTD"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Init,
    Prefetch,
    Release,
    Uninit,
    Update,
    Draw,
}

/// Per-node callback counters, keyed by node name.
#[derive(Debug, Default)]
pub struct Counters {
    calls: Mutex<HashMap<(String, Event), Arc<AtomicUsize>>>,
    /// Inits that found private data left over from an earlier life.
    pub stale_inits: AtomicUsize,
    /// Blend state each draw observed, in draw order.
    pub seen_blend: Mutex<Vec<(String, StateValue)>>,
}

impl Counters {
    fn counter(&self, name: &str, event: Event) -> Arc<AtomicUsize> {
        let mut calls = self.calls.lock().expect("counters lock");
        calls
            .entry((name.to_string(), event))
            .or_default()
            .clone()
    }

    fn bump(&self, name: &str, event: Event) {
        self.counter(name, event).fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, name: &str, event: Event) -> usize {
        self.counter(name, event).load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CountedData {
    initialized: bool,
    updates: u32,
}

struct Counted {
    counters: Arc<Counters>,
}

impl NodeOps for Counted {
    type Private = CountedData;

    fn init(&self, cx: &mut NodeCx<'_>, p: &mut CountedData) -> Result<(), EngineError> {
        if p.initialized || p.updates != 0 {
            self.counters.stale_inits.fetch_add(1, Ordering::SeqCst);
        }
        p.initialized = true;
        self.counters.bump(cx.name(), Event::Init);
        Ok(())
    }

    fn prefetch(&self, cx: &mut NodeCx<'_>, _p: &mut CountedData) -> Result<(), EngineError> {
        self.counters.bump(cx.name(), Event::Prefetch);
        Ok(())
    }

    fn release(&self, cx: &mut NodeCx<'_>, _p: &mut CountedData) {
        self.counters.bump(cx.name(), Event::Release);
    }

    fn uninit(&self, cx: &mut NodeCx<'_>, _p: &mut CountedData) {
        self.counters.bump(cx.name(), Event::Uninit);
    }

    fn update(&self, cx: &mut NodeCx<'_>, p: &mut CountedData, t: f64) -> Result<(), EngineError> {
        p.updates += 1;
        self.counters.bump(cx.name(), Event::Update);
        let mut deps = cx.nodes("children")?;
        deps.extend(cx.node("input")?);
        for dep in deps {
            cx.update(dep, t)?;
        }
        Ok(())
    }

    fn draw(&self, cx: &mut NodeCx<'_>, _p: &mut CountedData) -> Result<(), EngineError> {
        self.counters.bump(cx.name(), Event::Draw);
        let blend = cx.exec()?.state_driver_mut().read(StateKind::Blend);
        self.counters
            .seen_blend
            .lock()
            .expect("seen_blend lock")
            .push((cx.name().to_string(), blend));
        for child in cx.nodes("children")? {
            cx.draw(child)?;
        }
        Ok(())
    }
}

pub struct Bench {
    pub scene: Scene,
    pub ctx: ContextId,
    pub counters: Arc<Counters>,
}

impl Bench {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let counters = Arc::new(Counters::default());
        let mut reg = ClassRegistry::new();
        register_builtins(&mut reg).expect("builtins");
        reg.register(NodeClass::new(
            COUNTED,
            "Counted",
            NodeCategory::Render,
            vec![
                ParamSpec::node_list("children", &[NodeCategory::Render]),
                ParamSpec::node("input", &[NodeCategory::Render]),
            ],
            Counted {
                counters: counters.clone(),
            },
        ))
        .expect("counted class");

        let mut scene = Scene::with_config(Arc::new(reg), config);
        let ctx = scene.create_context(
            Box::new(NullBackend::new()),
            Box::new(SoftwareStateDriver::new()),
        );
        Self {
            scene,
            ctx,
            counters,
        }
    }

    pub fn counted(&mut self, name: &str) -> NodeId {
        let id = self.scene.create(COUNTED).expect("create counted");
        self.scene.set_name(id, name).expect("name");
        id
    }

    pub fn children(&mut self, parent: NodeId, children: &[NodeId]) {
        self.scene
            .set_param(parent, "children", ParamValue::NodeList(children.to_vec()))
            .expect("children");
    }

    pub fn input(&mut self, parent: NodeId, input: NodeId) {
        self.scene
            .set_param(parent, "input", ParamValue::Node(Some(input)))
            .expect("input");
    }

    pub fn calls(&self, name: &str, event: Event) -> usize {
        self.counters.get(name, event)
    }

    pub fn frame(&mut self, root: NodeId, t: f64) {
        self.scene.render_frame(root, t).expect("frame");
    }
}
