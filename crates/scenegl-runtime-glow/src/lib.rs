//! scenegl runtime (glow/OpenGL backend)
//
// Realises the engine's collaborator traits on a live GL context:
// - `GlowStateDriver`: pipeline-state reads/writes for override scoping
// - `GlowBackend`: program compilation and fullscreen draws
//
// It does NOT create windows or contexts; the host makes a context current and hands it in.
#![allow(clippy::missing_safety_doc)]

mod backend;
pub mod gl_enums;
mod program;
mod state_driver;

pub use backend::GlowBackend;
pub use program::{compile_program, FullscreenTriangle};
pub use scenegl_core::EngineError;
pub use state_driver::GlowStateDriver;
