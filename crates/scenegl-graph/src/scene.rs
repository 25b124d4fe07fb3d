//! The node arena: creation, reference counting, context attachment, parameter mutation and the
//! lifecycle transitions every pass goes through.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use scenegl_core::{EngineConfig, EngineError};
use tracing::{debug, error, trace, warn};

use crate::backend::GpuBackend;
use crate::class::{ClassOps, NodeCategory, NodeClass, NodeType};
use crate::context::{ContextId, ExecContext};
use crate::cx::NodeCx;
use crate::node::{Node, NodeId, NodeState, NEVER};
use crate::params::{ParamFlags, ParamKind, ParamValue};
use crate::registry::ClassRegistry;
use crate::state::StateDriver;

/// Base parameters every node has on top of its class schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Name,
    States,
    Class(usize),
}

pub struct Scene {
    registry: Arc<ClassRegistry>,
    pub(crate) config: EngineConfig,
    pub(crate) nodes: HashMap<NodeId, Node>,
    next_node: u32,
    contexts: HashMap<ContextId, ExecContext>,
    next_ctx: u32,
}

impl Scene {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: Arc<ClassRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            nodes: HashMap::new(),
            next_node: 0,
            contexts: HashMap::new(),
            next_ctx: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, EngineError> {
        self.nodes.get(&id).ok_or(EngineError::UnknownNode(id.0))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EngineError> {
        self.nodes.get_mut(&id).ok_or(EngineError::UnknownNode(id.0))
    }

    // ---- creation and reference counting -------------------------------------------------

    /// Create a node of class `ty` with refcount 1, default parameters and fresh private data.
    pub fn create(&mut self, ty: NodeType) -> Result<NodeId, EngineError> {
        let class = self.registry.resolve(ty)?;
        self.create_from(class)
    }

    /// Create a node from a registered class name.
    pub fn create_by_name(&mut self, class: &str) -> Result<NodeId, EngineError> {
        let class = self.registry.resolve_name(class)?;
        self.create_from(class)
    }

    fn create_from(&mut self, class: Arc<NodeClass>) -> Result<NodeId, EngineError> {
        let oom = |what: &str| EngineError::out_of_memory(format!("{what} for a {} node", class.name()));
        let next = self
            .next_node
            .checked_add(1)
            .ok_or_else(|| oom("no node id left"))?;
        self.nodes.try_reserve(1).map_err(|_| oom("no arena slot"))?;
        let mut params = Vec::new();
        params
            .try_reserve_exact(class.params().len())
            .map_err(|_| oom("no parameter storage"))?;
        params.extend(class.params().iter().map(|p| p.default.clone()));

        let id = NodeId(self.next_node);
        self.next_node = next;
        let node = Node::new(id, class, params);
        debug!("CREATED {} @ {id} ({} bytes private)", node.name, node.class.private_size());
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Take an additional reference.
    pub fn ref_node(&mut self, id: NodeId) -> Result<NodeId, EngineError> {
        let node = self.node_mut(id)?;
        node.refcount += 1;
        Ok(id)
    }

    /// Drop a reference. At zero the node is destroyed and its children are unreferenced in turn.
    /// Returns whether the node was destroyed.
    ///
    /// Dropping the last reference of a node that is still attached is refused.
    pub fn unref_node(&mut self, id: NodeId) -> Result<bool, EngineError> {
        let node = self.node_mut(id)?;
        if node.refcount == 1 && node.ctx.is_some() {
            error!("\"{}\" is still attached to a context, refusing to destroy it", node.name);
            return Err(EngineError::invalid_usage(format!(
                "cannot destroy \"{}\" while it is attached to a context",
                node.name
            )));
        }
        node.refcount -= 1;
        if node.refcount > 0 {
            return Ok(false);
        }

        let Some(node) = self.nodes.remove(&id) else {
            return Ok(false);
        };
        debug!("DELETE {} @ {id}", node.name);
        for child in node.edges() {
            if let Err(e) = self.unref_node(child) {
                error!("dropping child {child} of \"{}\" failed: {e}", node.name);
            }
        }
        Ok(true)
    }

    // ---- contexts ------------------------------------------------------------------------

    pub fn create_context(
        &mut self,
        backend: Box<dyn GpuBackend>,
        state: Box<dyn StateDriver>,
    ) -> ContextId {
        let id = ContextId(self.next_ctx);
        self.next_ctx += 1;
        self.contexts.insert(id, ExecContext::new(id, backend, state));
        debug!("context {id:?} created");
        id
    }

    pub fn context(&self, ctx: ContextId) -> Result<&ExecContext, EngineError> {
        self.contexts
            .get(&ctx)
            .ok_or_else(|| EngineError::invalid_usage(format!("unknown context {ctx:?}")))
    }

    pub fn context_mut(&mut self, ctx: ContextId) -> Result<&mut ExecContext, EngineError> {
        self.contexts
            .get_mut(&ctx)
            .ok_or_else(|| EngineError::invalid_usage(format!("unknown context {ctx:?}")))
    }

    /// Detach every root of `ctx` and drop the context.
    pub fn release_context(&mut self, ctx: ContextId) -> Result<(), EngineError> {
        let roots = std::mem::take(&mut self.context_mut(ctx)?.roots);
        for root in roots {
            self.detach_node(root)?;
        }
        if let Some(mut exec) = self.contexts.remove(&ctx) {
            exec.end_render_pass();
        }
        debug!("context {ctx:?} released");
        Ok(())
    }

    /// Associate `id` and everything it references with `ctx`.
    ///
    /// Attaching does not initialize anything; the first visit does.
    pub fn attach(&mut self, id: NodeId, ctx: ContextId) -> Result<(), EngineError> {
        self.context(ctx)?;
        self.attach_node(id, ctx)?;
        self.context_mut(ctx)?.roots.push(id);
        Ok(())
    }

    /// Undo one `attach` of `id`. Detaching a node that is not attached is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<(), EngineError> {
        let Some(ctx) = self.node(id)?.ctx else {
            warn!("\"{}\" is not attached", self.node(id)?.name);
            return Ok(());
        };
        if let Some(exec) = self.contexts.get_mut(&ctx) {
            if let Some(pos) = exec.roots.iter().position(|r| *r == id) {
                exec.roots.remove(pos);
            }
        }
        self.detach_node(id)
    }

    pub(crate) fn attach_node(&mut self, id: NodeId, ctx: ContextId) -> Result<(), EngineError> {
        let node = self.node(id)?;
        if let Some(current) = node.ctx {
            if current != ctx {
                error!(
                    "\"{}\" already belongs to {current:?}, cannot attach it to {ctx:?}",
                    node.name
                );
                return Err(EngineError::ContextConflict {
                    node: node.name.clone(),
                });
            }
        }
        let children = node.edges();

        let mut attached = Vec::with_capacity(children.len());
        for child in children {
            if let Err(e) = self.attach_node(child, ctx) {
                for done in attached.into_iter().rev() {
                    if let Err(undo) = self.detach_node(done) {
                        error!("rolling back attach of {done} failed: {undo}");
                    }
                }
                return Err(e);
            }
            attached.push(child);
        }

        let node = self.node_mut(id)?;
        node.ctx = Some(ctx);
        node.ctx_refcount += 1;
        Ok(())
    }

    pub(crate) fn detach_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.node_mut(id)?;
        if node.ctx.is_none() {
            return Ok(());
        }
        node.ctx_refcount = node.ctx_refcount.saturating_sub(1);
        let last = node.ctx_refcount == 0;
        let children = node.edges();

        if last {
            self.uninit_node(id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.ctx = None;
            }
        }
        for child in children {
            self.detach_node(child)?;
        }
        Ok(())
    }

    // ---- parameters ----------------------------------------------------------------------

    fn slot(&self, id: NodeId, key: &str) -> Result<(Slot, ParamKind), EngineError> {
        let node = self.node(id)?;
        match key {
            "name" => Ok((Slot::Name, ParamKind::Str)),
            "states" => Ok((Slot::States, ParamKind::NodeList)),
            _ => node
                .class
                .param(key)
                .map(|(idx, spec)| (Slot::Class(idx), spec.kind))
                .ok_or_else(|| {
                    EngineError::invalid_usage(format!(
                        "parameter \"{key}\" not found in {}",
                        node.class.name()
                    ))
                }),
        }
    }

    fn slot_value(&self, id: NodeId, slot: Slot) -> Result<ParamValue, EngineError> {
        let node = self.node(id)?;
        Ok(match slot {
            Slot::Name => ParamValue::Str(node.name.clone()),
            Slot::States => ParamValue::NodeList(node.states.clone()),
            Slot::Class(idx) => node
                .params
                .get(idx)
                .cloned()
                .ok_or_else(|| EngineError::other(format!("parameter slot {idx} missing")))?,
        })
    }

    /// Read a parameter, including the base `name` and `states` parameters.
    pub fn param(&self, id: NodeId, key: &str) -> Result<ParamValue, EngineError> {
        let (slot, _) = self.slot(id, key)?;
        self.slot_value(id, slot)
    }

    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), EngineError> {
        self.set_param(id, "name", ParamValue::Str(name.to_string()))
    }

    /// Replace a parameter value.
    ///
    /// Newly referenced nodes gain a reference (and the owner's context, if any); nodes no longer
    /// referenced lose both. Any change forces the owner back to `Uninitialized` so the next
    /// visit re-runs init with the new value.
    pub fn set_param(&mut self, id: NodeId, key: &str, value: ParamValue) -> Result<(), EngineError> {
        let (slot, kind) = self.slot(id, key)?;
        let node = self.node(id)?;
        if value.kind() != kind {
            return Err(EngineError::invalid_usage(format!(
                "{}.{key} expects a {} value, got {}",
                node.name,
                kind.name(),
                value.kind().name()
            )));
        }
        let ctx = node.ctx;
        // Children are attached once per path that attaches the owner.
        let paths = if ctx.is_some() { node.ctx_refcount } else { 0 };

        let new_refs: Vec<NodeId> = value.node_refs().collect();
        for &child in &new_refs {
            self.node(child)?;
            if child == id || self.reaches(child, id) {
                return Err(EngineError::invalid_usage(format!(
                    "setting {}.{key} to {child} would create a cycle",
                    self.node(id)?.name
                )));
            }
        }
        let old = self.slot_value(id, slot)?;

        if let Some(ctx) = ctx {
            let mut attached = Vec::with_capacity(new_refs.len() * paths as usize);
            let per_path = (0..paths).flat_map(|_| new_refs.iter().copied());
            for child in per_path {
                if let Err(e) = self.attach_node(child, ctx) {
                    for done in attached.into_iter().rev() {
                        if let Err(undo) = self.detach_node(done) {
                            error!("rolling back attach of {done} failed: {undo}");
                        }
                    }
                    return Err(e);
                }
                attached.push(child);
            }
        }
        for &child in &new_refs {
            self.ref_node(child)?;
        }

        self.uninit_node(id);
        let node = self.node_mut(id)?;
        match (slot, value) {
            (Slot::Name, ParamValue::Str(name)) => node.name = name,
            (Slot::States, ParamValue::NodeList(states)) => node.states = states,
            (Slot::Class(idx), value) => {
                if let Some(dst) = node.params.get_mut(idx) {
                    *dst = value;
                }
            }
            _ => return Err(EngineError::other("parameter slot and value disagree")),
        }
        trace!("{}.{key} set", node.name);

        for child in old.node_refs() {
            for _ in 0..paths {
                self.detach_node(child)?;
            }
            if let Err(e) = self.unref_node(child) {
                error!("dropping previous value of {key}: {e}");
            }
        }
        Ok(())
    }

    /// Append nodes to a `NodeList` parameter (including `states`).
    pub fn param_add(&mut self, id: NodeId, key: &str, nodes: &[NodeId]) -> Result<(), EngineError> {
        match self.param(id, key)? {
            ParamValue::NodeList(mut list) => {
                list.extend_from_slice(nodes);
                self.set_param(id, key, ParamValue::NodeList(list))
            }
            other => Err(EngineError::invalid_usage(format!(
                "cannot append nodes to {key}, a {} parameter",
                other.kind().name()
            ))),
        }
    }

    /// Insert or replace one entry of a `NodeDict` parameter.
    pub fn param_insert(
        &mut self,
        id: NodeId,
        key: &str,
        entry: &str,
        node: NodeId,
    ) -> Result<(), EngineError> {
        match self.param(id, key)? {
            ParamValue::NodeDict(mut dict) => {
                dict.insert(entry.to_string(), node);
                self.set_param(id, key, ParamValue::NodeDict(dict))
            }
            other => Err(EngineError::invalid_usage(format!(
                "cannot insert into {key}, a {} parameter",
                other.kind().name()
            ))),
        }
    }

    /// Convenience for building a dict value from pairs.
    pub fn dict<'a>(entries: impl IntoIterator<Item = (&'a str, NodeId)>) -> ParamValue {
        ParamValue::NodeDict(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    /// Whether `to` is reachable from `from` along any edge.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.edges());
            }
        }
        false
    }

    // ---- lifecycle -----------------------------------------------------------------------

    /// Run one class callback with the node's private data lent out of its slot.
    pub(crate) fn with_class<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&dyn ClassOps, &mut NodeCx<'_>, &mut dyn Any) -> R,
    ) -> Result<R, EngineError> {
        let node = self.node_mut(id)?;
        let class = Arc::clone(&node.class);
        let Some(mut private) = node.private.take() else {
            return Err(EngineError::invalid_usage(format!(
                "\"{}\" was re-entered from one of its own callbacks",
                node.name
            )));
        };
        let out = {
            let mut cx = NodeCx::new(self, id);
            f(class.ops(), &mut cx, &mut *private)
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.private = Some(private);
        }
        Ok(out)
    }

    fn check_fields(&self, id: NodeId) -> Result<(), EngineError> {
        let node = self.node(id)?;
        for (spec, value) in node.class.params().iter().zip(&node.params) {
            if !spec.kind.is_node() {
                continue;
            }
            if spec.flags.contains(ParamFlags::NON_NULL) && value.node_refs().next().is_none() {
                return Err(EngineError::invalid_usage(format!(
                    "{}.{} must be set",
                    node.name, spec.name
                )));
            }
            for child in value.node_refs() {
                let child = self.node(child)?;
                if !spec.accepts(child.category()) {
                    return Err(EngineError::unsupported(format!(
                        "{}.{} does not accept {} node \"{}\"",
                        node.name,
                        spec.name,
                        child.category().name(),
                        child.name
                    )));
                }
            }
        }
        for &sid in &node.states {
            let state = self.node(sid)?;
            if state.category() != NodeCategory::State {
                return Err(EngineError::unsupported(format!(
                    "\"{}\" is not a state node and cannot be in the states of \"{}\"",
                    state.name, node.name
                )));
            }
        }
        Ok(())
    }

    /// `Uninitialized -> Initialized`. State overrides are initialized first.
    pub(crate) fn init_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.node(id)?;
        if node.state != NodeState::Uninitialized {
            return Ok(());
        }
        if node.ctx.is_none() {
            return Err(EngineError::invalid_usage(format!(
                "\"{}\" must be attached to a context before it can initialize",
                node.name
            )));
        }
        let states = node.states.clone();
        self.check_fields(id)?;
        for sid in states {
            self.init_node(sid)?;
        }

        debug!("INIT {} @ {id}", self.node(id)?.name);
        if let Err(e) = self.with_class(id, |ops, cx, p| ops.init(cx, p))? {
            let node = self.node_mut(id)?;
            error!("initializing \"{}\" failed: {e}", node.name);
            node.private = Some(node.class.ops().new_private());
            return Err(e);
        }
        self.node_mut(id)?.state = NodeState::Initialized;
        Ok(())
    }

    /// `Initialized | Idle -> Ready`. A failed prefetch leaves the state untouched.
    pub(crate) fn prefetch_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        match self.node(id)?.state {
            NodeState::Ready => return Ok(()),
            NodeState::Uninitialized => self.init_node(id)?,
            NodeState::Initialized | NodeState::Idle => {}
        }

        trace!("PREFETCH {} @ {id}", self.node(id)?.name);
        if let Err(e) = self.with_class(id, |ops, cx, p| ops.prefetch(cx, p))? {
            error!("prefetching \"{}\" failed: {e}", self.node(id)?.name);
            return Err(e);
        }
        self.node_mut(id)?.state = NodeState::Ready;
        Ok(())
    }

    /// `Ready -> Idle`. Anything else is left alone.
    pub(crate) fn release_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.state != NodeState::Ready {
            return;
        }
        trace!("RELEASE {} @ {id}", node.name);
        if let Err(e) = self.with_class(id, |ops, cx, p| ops.release(cx, p)) {
            error!("release of {id} skipped: {e}");
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.state = NodeState::Idle;
            node.last_update_time = NEVER;
        }
    }

    /// Any state `-> Uninitialized`, releasing first. Private data is reset to its default.
    pub(crate) fn uninit_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.state == NodeState::Uninitialized {
            return;
        }
        self.release_node(id);
        if let Some(node) = self.nodes.get(&id) {
            debug!("UNINIT {} @ {id}", node.name);
        }
        if let Err(e) = self.with_class(id, |ops, cx, p| ops.uninit(cx, p)) {
            error!("uninit of {id} skipped: {e}");
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.private = Some(node.class.ops().new_private());
            node.state = NodeState::Uninitialized;
            node.visit_time = NEVER;
            node.last_update_time = NEVER;
            node.is_active = false;
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("contexts", &self.contexts.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
