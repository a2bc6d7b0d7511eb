//! Submission of generated prompts to a local ComfyUI service.

pub mod client;
pub mod error;
pub mod sink;
pub mod workflow;

pub use client::{ComfyClient, DEFAULT_BASE_URL, QueueStatus};
pub use error::SinkError;
pub use sink::{
    PromptSink, SubmissionJob, SubmissionOutcome, SubmissionReport, SubmitOptions, submit_batch,
};
pub use workflow::{WorkflowSpec, build_workflow, filename_prefix};
