//! Task execution engine: drives a Task from `created` to a terminal status
//! through a per-step build/act/judge cycle, against injected collaborator
//! ports rather than a concrete browser/LLM/storage stack.

pub mod app_context;
#[cfg(feature = "testkit")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod ports;
pub mod telemetry;
pub mod webhook;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use app_context::EngineContext;
pub use config::EngineSettings;
pub use errors::{EngineError, EngineResult};
