//! Headless scene harness for the built-in class tests.

use std::cell::RefCell;
use std::rc::Rc;

use scenegl_graph::{
    BackendStats, ContextId, EngineError, GpuBackend, GpuHandle, NodeId, NodeType, NullBackend,
    ParamValue, PipelineDesc, Scene, SoftwareStateDriver, StateDriver, StateKind, StateValue,
    Uniform, UniformValue,
};

use crate::{builtin_registry, types};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DrawCall {
    pub color: [f32; 4],
    pub opacity: f32,
}

#[derive(Default)]
struct Recorded {
    backend: NullBackend,
    draws: Vec<DrawCall>,
    driver: SoftwareStateDriver,
}

struct RecordingBackend(Rc<RefCell<Recorded>>);

impl GpuBackend for RecordingBackend {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<GpuHandle, EngineError> {
        self.0.borrow_mut().backend.create_pipeline(desc)
    }

    fn destroy(&mut self, handle: GpuHandle) {
        self.0.borrow_mut().backend.destroy(handle);
    }

    fn begin_render_pass(&mut self) -> Result<(), EngineError> {
        self.0.borrow_mut().backend.begin_render_pass()
    }

    fn end_render_pass(&mut self) {
        self.0.borrow_mut().backend.end_render_pass();
    }

    fn draw(&mut self, pipeline: GpuHandle, uniforms: &[Uniform]) -> Result<(), EngineError> {
        let mut rec = self.0.borrow_mut();
        rec.backend.draw(pipeline, uniforms)?;
        let mut call = DrawCall {
            color: [0.0; 4],
            opacity: 0.0,
        };
        for u in uniforms {
            match (u.name.as_str(), u.value) {
                ("uColor", UniformValue::Vec4(c)) => call.color = c,
                ("uOpacity", UniformValue::Float(o)) => call.opacity = o,
                _ => {}
            }
        }
        rec.draws.push(call);
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.0.borrow().backend.stats()
    }
}

struct RecordingDriver(Rc<RefCell<Recorded>>);

impl StateDriver for RecordingDriver {
    fn read(&mut self, kind: StateKind) -> StateValue {
        self.0.borrow_mut().driver.read(kind)
    }

    fn write(&mut self, value: &StateValue) {
        self.0.borrow_mut().driver.write(value);
    }
}

pub(crate) struct Harness {
    pub scene: Scene,
    pub ctx: ContextId,
    rec: Rc<RefCell<Recorded>>,
}

impl Harness {
    pub fn new() -> Self {
        let mut scene = Scene::new(builtin_registry().expect("builtins"));
        let rec = Rc::new(RefCell::new(Recorded::default()));
        let ctx = scene.create_context(
            Box::new(RecordingBackend(rec.clone())),
            Box::new(RecordingDriver(rec.clone())),
        );
        Self { scene, ctx, rec }
    }

    pub fn create(&mut self, ty: NodeType) -> NodeId {
        self.scene.create(ty).expect("create")
    }

    pub fn quad(&mut self, name: &str, color: [f32; 4]) -> NodeId {
        let quad = self.create(types::QUAD);
        self.scene.set_name(quad, name).expect("name");
        self.scene
            .set_param(quad, "color", ParamValue::Vec4(color))
            .expect("color");
        quad
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.rec.borrow().draws.clone()
    }

    pub fn live_labels(&self) -> Vec<String> {
        self.rec.borrow().backend.live_labels()
    }

    pub fn stats(&self) -> BackendStats {
        self.rec.borrow().backend.stats()
    }

    pub fn state_writes(&self) -> Vec<StateValue> {
        self.rec.borrow().driver.writes().to_vec()
    }
}
