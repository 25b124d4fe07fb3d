#![forbid(unsafe_code)]

//! Standard library of built-in node classes.
//!
//! Containers (`Group`, `Select`, `TimeRange`) decide what is active, `UniformFloat` produces a
//! value, `Quad` owns a backend pipeline, and the state classes describe overrides applied around
//! a draw. Everything here goes through the public `scenegl-graph` API; none of it is special to
//! the engine.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use std::sync::Arc;

use scenegl_graph::{ClassRegistry, EngineError};

mod group;
mod quad;
mod select;
mod states;
mod time_range;
mod uniform;

#[cfg(feature = "serde")]
pub mod scene_json;

#[cfg(test)]
mod testutil;

pub use quad::{QuadData, QUAD_FRAG, QUAD_VERT};
pub use uniform::UniformData;

/// Class ids of the built-ins, as big-endian four-character codes.
pub mod types {
    use scenegl_graph::NodeType;

    const fn fourcc(tag: &[u8; 4]) -> NodeType {
        NodeType(u32::from_be_bytes(*tag))
    }

    pub const GROUP: NodeType = fourcc(b"GRP ");
    pub const SELECT: NodeType = fourcc(b"SEL ");
    pub const TIME_RANGE: NodeType = fourcc(b"TRNG");
    pub const UNIFORM_FLOAT: NodeType = fourcc(b"UFLT");
    pub const QUAD: NodeType = fourcc(b"QUAD");
    pub const BLEND_STATE: NodeType = fourcc(b"BLND");
    pub const STENCIL_STATE: NodeType = fourcc(b"STCL");
    pub const COLOR_MASK_STATE: NodeType = fourcc(b"CMSK");
    pub const POLYGON_MODE_STATE: NodeType = fourcc(b"PMOD");
    pub const CAPABILITY_STATE: NodeType = fourcc(b"CAPS");
}

/// Register every built-in class.
pub fn register_builtins(reg: &mut ClassRegistry) -> Result<(), EngineError> {
    reg.register(group::class())?;
    reg.register(select::class())?;
    reg.register(time_range::class())?;
    reg.register(uniform::class())?;
    reg.register(quad::class())?;
    for class in states::classes() {
        reg.register(class)?;
    }
    Ok(())
}

/// A registry holding only the built-ins.
pub fn builtin_registry() -> Result<Arc<ClassRegistry>, EngineError> {
    let mut reg = ClassRegistry::new();
    register_builtins(&mut reg)?;
    Ok(Arc::new(reg))
}
