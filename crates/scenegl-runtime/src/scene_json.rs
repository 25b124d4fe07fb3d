//! JSON scene files.
//!
//! ```json
//! {
//!   "root": "main",
//!   "nodes": {
//!     "main": { "type": "Group", "params": { "children": ["bg"] } },
//!     "bg":   { "type": "Quad", "name": "background", "params": { "color": [0, 0, 0, 1] },
//!               "states": ["blend"] },
//!     "blend": { "type": "BlendState" }
//!   }
//! }
//! ```
//!
//! Node-typed parameters name other entries by key. The loader keeps only the reference returned
//! for the root; every other node is owned by its parents, and entries nothing references are
//! destroyed before returning.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use scenegl_core::{load_json_value, parse_loaded_json};
use scenegl_graph::{EngineError, NodeId, ParamKind, ParamValue, Scene};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneFile {
    root: String,
    nodes: BTreeMap<String, NodeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeEntry {
    #[serde(rename = "type")]
    class: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    params: BTreeMap<String, Value>,
    #[serde(default)]
    states: Vec<String>,
}

/// Load a scene file into `scene` and return its root.
pub fn load_scene_json(scene: &mut Scene, path: impl AsRef<Path>) -> Result<NodeId, EngineError> {
    let file: SceneFile = parse_loaded_json(load_json_value(path)?)?;
    build(scene, file)
}

/// Same as [`load_scene_json`] for an in-memory document.
pub fn load_scene_str(scene: &mut Scene, text: &str) -> Result<NodeId, EngineError> {
    let file: SceneFile = serde_json::from_str(text).map_err(|source| EngineError::Json {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    build(scene, file)
}

fn build(scene: &mut Scene, file: SceneFile) -> Result<NodeId, EngineError> {
    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    let mut created = Vec::with_capacity(file.nodes.len());

    let ret = populate(scene, &file, &mut ids, &mut created);
    let root = match ret {
        Ok(root) => root,
        Err(e) => {
            for id in created {
                if let Err(undo) = scene.unref_node(id) {
                    error!("dropping partially loaded node {id}: {undo}");
                }
            }
            return Err(e);
        }
    };

    for (key, id) in ids {
        if id == root {
            continue;
        }
        if scene.unref_node(id)? {
            debug!("scene entry \"{key}\" is not reachable from the root, dropped");
        }
    }
    Ok(root)
}

fn populate<'f>(
    scene: &mut Scene,
    file: &'f SceneFile,
    ids: &mut HashMap<&'f str, NodeId>,
    created: &mut Vec<NodeId>,
) -> Result<NodeId, EngineError> {
    for (key, entry) in &file.nodes {
        let id = scene.create_by_name(&entry.class)?;
        created.push(id);
        ids.insert(key.as_str(), id);
    }

    for (key, entry) in &file.nodes {
        let id = lookup(ids, key)?;
        if let Some(name) = &entry.name {
            scene.set_name(id, name)?;
        }
        for (param, raw) in &entry.params {
            let kind = match scene.node(id)?.class().param(param) {
                Some((_, spec)) => spec.kind,
                None => {
                    return Err(EngineError::invalid_usage(format!(
                        "{key}: {} has no parameter \"{param}\"",
                        entry.class
                    )))
                }
            };
            let value = to_param(ids, kind, raw)
                .map_err(|msg| EngineError::invalid_usage(format!("{key}.{param}: {msg}")))?;
            scene.set_param(id, param, value)?;
        }
        if !entry.states.is_empty() {
            let states = entry
                .states
                .iter()
                .map(|s| lookup(ids, s))
                .collect::<Result<Vec<_>, _>>()?;
            scene.param_add(id, "states", &states)?;
        }
    }

    lookup(ids, &file.root)
}

fn lookup(ids: &HashMap<&str, NodeId>, key: &str) -> Result<NodeId, EngineError> {
    ids.get(key)
        .copied()
        .ok_or_else(|| EngineError::invalid_usage(format!("no scene entry named \"{key}\"")))
}

fn to_param(ids: &HashMap<&str, NodeId>, kind: ParamKind, raw: &Value) -> Result<ParamValue, String> {
    let expected = || format!("expected a {} value, got {raw}", kind.name());
    let node = |v: &Value| -> Result<NodeId, String> {
        let key = v.as_str().ok_or_else(|| format!("expected a node key, got {v}"))?;
        ids.get(key)
            .copied()
            .ok_or_else(|| format!("no scene entry named \"{key}\""))
    };

    Ok(match kind {
        ParamKind::Bool => ParamValue::Bool(raw.as_bool().ok_or_else(expected)?),
        ParamKind::Int => ParamValue::Int(raw.as_i64().ok_or_else(expected)?),
        ParamKind::Float => ParamValue::Float(raw.as_f64().ok_or_else(expected)?),
        ParamKind::Str => ParamValue::Str(raw.as_str().ok_or_else(expected)?.to_string()),
        ParamKind::Vec4 => {
            let items = raw.as_array().filter(|a| a.len() == 4).ok_or_else(expected)?;
            let mut out = [0.0f32; 4];
            for (dst, item) in out.iter_mut().zip(items) {
                *dst = item.as_f64().ok_or_else(expected)? as f32;
            }
            ParamValue::Vec4(out)
        }
        ParamKind::Node if raw.is_null() => ParamValue::Node(None),
        ParamKind::Node => ParamValue::Node(Some(node(raw)?)),
        ParamKind::NodeList => ParamValue::NodeList(
            raw.as_array()
                .ok_or_else(expected)?
                .iter()
                .map(node)
                .collect::<Result<_, _>>()?,
        ),
        ParamKind::NodeDict => ParamValue::NodeDict(
            raw.as_object()
                .ok_or_else(expected)?
                .iter()
                .map(|(k, v)| -> Result<(String, NodeId), String> { Ok((k.clone(), node(v)?)) })
                .collect::<Result<_, _>>()?,
        ),
    })
}
