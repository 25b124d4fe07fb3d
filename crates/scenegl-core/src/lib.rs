#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

//! Shared vocabulary for the scenegl crates: errors, configuration, logging setup.

pub mod config;
pub mod error;
pub mod logging;

pub use error::EngineError;

pub use config::{
    load_engine_config_from, load_json_value, load_typed_json, parse_loaded_json, ActivityPolicy,
    EngineConfig, LoadedJson,
};
pub use logging::init_tracing;
