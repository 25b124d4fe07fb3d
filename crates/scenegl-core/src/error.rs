use std::path::PathBuf;

/// Engine-level errors used across scenegl crates.
///
/// Contract rule: this type lives in `scenegl-core` and is re-exported by the graph and runtimes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ---- Node lifecycle ----
    /// No class is registered for the requested node type.
    #[error("unknown node type {0}")]
    InvalidType(String),

    #[error("out of memory while {0}")]
    OutOfMemory(String),

    /// The caller broke an engine invariant (stale state, wrong parameter kind, ...).
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// A dependency has a shape the node cannot consume.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("\"{node}\" is associated with another rendering context")]
    ContextConflict { node: String },

    /// The handle refers to a node that was destroyed (or never created).
    #[error("node #{0} does not exist")]
    UnknownNode(u32),

    // ---- Config / assets ----
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json parse error at {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config at {}: {msg}", .path.display())]
    InvalidConfig { path: PathBuf, msg: String },

    // ---- Runtime-facing (backend) ----
    #[error("vertex shader compile error: {0}")]
    VertexCompile(String),
    #[error("fragment shader compile error: {0}")]
    FragmentCompile(String),
    #[error("program link error: {0}")]
    Link(String),
    #[error("backend object creation failed: {0}")]
    GlCreate(String),

    // ---- Fallback ----
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn other<T: Into<String>>(s: T) -> Self {
        EngineError::Other(s.into())
    }

    pub fn invalid_usage<T: Into<String>>(s: T) -> Self {
        EngineError::InvalidUsage(s.into())
    }

    pub fn unsupported<T: Into<String>>(s: T) -> Self {
        EngineError::Unsupported(s.into())
    }

    pub fn out_of_memory<T: Into<String>>(what: T) -> Self {
        EngineError::OutOfMemory(what.into())
    }

    /// True for errors raised by a broken caller contract rather than by the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidUsage(_)
                | EngineError::UnknownNode(_)
                | EngineError::ContextConflict { .. }
        )
    }
}
