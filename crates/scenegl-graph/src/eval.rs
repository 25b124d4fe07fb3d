//! The per-frame passes: visit, reconcile, update and draw.
//!
//! A frame at time `t` is `visit(root, t)`, `reconcile(root, t)`, then update and draw from the
//! root. [`Scene::render_frame`] runs all four.

use scenegl_core::{ActivityPolicy, EngineError};
use tracing::{debug, trace};

use crate::context::ContextId;
use crate::node::{NodeId, NodeState};
use crate::scene::Scene;
use crate::state::{self, StateValue};

impl Scene {
    fn require_attached(&self, id: NodeId) -> Result<ContextId, EngineError> {
        let node = self.node(id)?;
        node.ctx.ok_or_else(|| {
            EngineError::invalid_usage(format!("\"{}\" is not attached to a context", node.name))
        })
    }

    /// Pre-order walk marking which nodes are active at `t`. Initializes nodes on the way.
    pub fn visit(&mut self, root: NodeId, t: f64) -> Result<(), EngineError> {
        self.require_attached(root)?;
        self.visit_node(root, true, t)
    }

    pub(crate) fn visit_node(&mut self, id: NodeId, is_active: bool, t: f64) -> Result<(), EngineError> {
        self.init_node(id)?;

        let policy = self.config.activity_policy;
        let node = self.node_mut(id)?;
        let active = match policy {
            ActivityPolicy::LastWriterWins => is_active,
            ActivityPolicy::AnyPath if node.visit_time == t => node.is_active || is_active,
            ActivityPolicy::AnyPath => is_active,
        };
        node.is_active = active;
        node.visit_time = t;
        let custom = node.class.has_custom_visit();
        let children = node.children();

        if custom {
            self.with_class(id, |ops, cx, p| ops.visit(cx, p, active, t))?
        } else {
            for child in children {
                self.visit_node(child, active, t)?;
            }
            Ok(())
        }
    }

    /// Post-order walk acquiring resources for active nodes and releasing them for inactive ones.
    /// Nodes not visited at `t` are left alone.
    pub fn reconcile(&mut self, root: NodeId, t: f64) -> Result<(), EngineError> {
        self.require_attached(root)?;
        self.reconcile_node(root, t)
    }

    fn reconcile_node(&mut self, id: NodeId, t: f64) -> Result<(), EngineError> {
        let node = self.node(id)?;
        if node.visit_time != t {
            return Ok(());
        }
        for child in node.children() {
            self.reconcile_node(child, t)?;
        }
        if self.node(id)?.is_active {
            self.prefetch_node(id)
        } else {
            self.release_node(id);
            Ok(())
        }
    }

    /// Bring `id` up to date for `t`. Repeated calls with the same `t` do nothing until the node
    /// is released.
    pub fn update(&mut self, id: NodeId, t: f64) -> Result<(), EngineError> {
        let node = self.node(id)?;
        if node.ctx.is_none() {
            return Err(EngineError::invalid_usage(format!(
                "\"{}\" is not attached to a context",
                node.name
            )));
        }
        if node.last_update_time == t {
            trace!("{} already updated at t={t}", node.name);
            return Ok(());
        }
        if node.state != NodeState::Ready {
            if !self.config.lazy_prefetch {
                return Err(EngineError::invalid_usage(format!(
                    "\"{}\" is {} and cannot update at t={t}",
                    node.name,
                    node.state.name()
                )));
            }
            debug!("\"{}\" not ready at t={t}, prefetching on demand", node.name);
            self.prefetch_node(id)?;
        }

        trace!("UPDATE {} @ {id} t={t}", self.node(id)?.name);
        self.with_class(id, |ops, cx, p| ops.update(cx, p, t))??;
        self.node_mut(id)?.last_update_time = t;
        Ok(())
    }

    /// Draw `id` with its state overrides applied for exactly the duration of the call.
    ///
    /// A kind overridden more than once on the same node is restored to the value seen before
    /// its first override.
    pub fn draw(&mut self, id: NodeId) -> Result<(), EngineError> {
        let ctx = self.require_attached(id)?;
        let states = self.node(id)?.states.clone();
        let overrides = states
            .into_iter()
            .map(|sid| self.state_value(sid))
            .collect::<Result<Vec<_>, _>>()?;

        let saved = state::apply_overrides(self.context_mut(ctx)?.state_driver_mut(), &overrides);
        trace!("DRAW {} @ {id}", self.node(id)?.name);
        let ret = self
            .with_class(id, |ops, cx, p| ops.draw(cx, p))
            .and_then(|r| r);
        if let Ok(exec) = self.context_mut(ctx) {
            state::restore(exec.state_driver_mut(), &saved);
        }
        ret
    }

    fn state_value(&mut self, sid: NodeId) -> Result<StateValue, EngineError> {
        self.init_node(sid)?;
        let value = self.with_class(sid, |ops, cx, p| ops.pipeline_state(cx, p))?;
        value.ok_or_else(|| {
            let name = self.node(sid).map_or("<destroyed>", |n| n.name.as_str());
            EngineError::unsupported(format!("\"{name}\" does not describe a pipeline state"))
        })
    }

    /// One complete frame: visit, reconcile, update and draw from `root`, then close the render
    /// pass if a draw opened one.
    pub fn render_frame(&mut self, root: NodeId, t: f64) -> Result<(), EngineError> {
        let _frame = tracing::trace_span!("frame", t = t).entered();
        let ctx = self.require_attached(root)?;
        self.visit(root, t)?;
        self.reconcile(root, t)?;
        self.update(root, t)?;
        let ret = self.draw(root);
        if let Ok(exec) = self.context_mut(ctx) {
            exec.end_render_pass();
        }
        ret
    }
}
