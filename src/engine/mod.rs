//! The task execution engine: StepRecorder, ArtifactSink, PromptBuilder,
//! StepExecutor, StepPolicy, TaskDriver, Responder.

mod artifact_sink;
mod driver;
mod executor;
mod policy;
mod prompt_builder;
mod recorder;
mod responder;

pub use artifact_sink::ArtifactSink;
pub use driver::TaskDriver;
pub use executor::StepExecutor;
pub use policy::{StepOutcome, StepPolicy};
pub use prompt_builder::PromptBuilder;
pub use recorder::StepRecorder;
pub use responder::Responder;
