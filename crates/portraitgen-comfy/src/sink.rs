use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

use portraitgen_generate::OutputRow;

use crate::error::SinkError;
use crate::workflow::{WorkflowSpec, build_workflow, filename_prefix};

/// Port for anything that accepts workflow graphs.
#[async_trait]
pub trait PromptSink: Send + Sync {
    /// `true` when the service answers its health endpoint.
    async fn probe(&self) -> bool;

    /// Queue one workflow, returning the service-side job id.
    async fn submit(&self, workflow: &Value) -> Result<String, SinkError>;
}

/// One prompt to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionJob {
    pub prompt: String,
    pub seed: u32,
    pub filename_prefix: String,
}

impl SubmissionJob {
    pub fn from_row<R: OutputRow>(row: &R) -> Self {
        Self {
            prompt: row.prompt().to_string(),
            seed: row.seed(),
            filename_prefix: filename_prefix(row.race(), &row.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitOptions {
    /// Pause between consecutive submissions.
    #[serde(with = "millis")]
    pub delay: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub filename_prefix: String,
    pub seed: u32,
    pub prompt_id: Option<String>,
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(&self) -> bool {
        self.prompt_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub outcomes: Vec<SubmissionOutcome>,
}

impl SubmissionReport {
    fn record(&mut self, outcome: SubmissionOutcome) {
        self.attempted += 1;
        if outcome.succeeded() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Submit `jobs` one at a time. Failures are logged and counted, never returned.
pub async fn submit_batch<S: PromptSink + ?Sized>(
    sink: &S,
    spec: &WorkflowSpec,
    jobs: &[SubmissionJob],
    options: &SubmitOptions,
) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    info!(jobs = jobs.len(), delay_ms = options.delay.as_millis() as u64, "submission started");

    for (index, job) in jobs.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            sleep(options.delay).await;
        }
        let workflow = build_workflow(spec, &job.prompt, job.seed, &job.filename_prefix);
        let outcome = match sink.submit(&workflow).await {
            Ok(prompt_id) => {
                info!(prefix = %job.filename_prefix, prompt_id = %prompt_id, "job queued");
                SubmissionOutcome {
                    filename_prefix: job.filename_prefix.clone(),
                    seed: job.seed,
                    prompt_id: Some(prompt_id),
                    error: None,
                }
            }
            Err(err) => {
                warn!(prefix = %job.filename_prefix, error = %err, "job submission failed");
                SubmissionOutcome {
                    filename_prefix: job.filename_prefix.clone(),
                    seed: job.seed,
                    prompt_id: None,
                    error: Some(err.to_string()),
                }
            }
        };
        report.record(outcome);
    }

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        "submission finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use portraitgen_generate::PortraitRow;

    use super::*;

    struct RecordingSink {
        workflows: Mutex<Vec<Value>>,
        fail_every_other: bool,
    }

    #[async_trait]
    impl PromptSink for RecordingSink {
        async fn probe(&self) -> bool {
            true
        }

        async fn submit(&self, workflow: &Value) -> Result<String, SinkError> {
            let mut workflows = self.workflows.lock().expect("lock");
            workflows.push(workflow.clone());
            if self.fail_every_other && workflows.len() % 2 == 0 {
                return Err(SinkError::MissingPromptId);
            }
            Ok(format!("job-{}", workflows.len()))
        }
    }

    fn jobs() -> Vec<SubmissionJob> {
        (0..3)
            .map(|index| SubmissionJob {
                prompt: format!("prompt {index}"),
                seed: 10_000 + index,
                filename_prefix: format!("人类_{index}"),
            })
            .collect()
    }

    fn no_delay() -> SubmitOptions {
        SubmitOptions {
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn failures_are_counted_and_the_batch_continues() {
        let sink = RecordingSink {
            workflows: Mutex::new(Vec::new()),
            fail_every_other: true,
        };
        let report = submit_batch(&sink, &WorkflowSpec::character(), &jobs(), &no_delay()).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(report.outcomes[1].error.is_some());
        assert_eq!(sink.workflows.lock().expect("lock").len(), 3);
    }

    #[tokio::test]
    async fn workflow_carries_job_fields() {
        let sink = RecordingSink {
            workflows: Mutex::new(Vec::new()),
            fail_every_other: false,
        };
        submit_batch(&sink, &WorkflowSpec::unit(), &jobs()[..1], &no_delay()).await;

        let workflows = sink.workflows.lock().expect("lock");
        assert_eq!(workflows[0]["12"]["inputs"]["positive"], "prompt 0");
        assert_eq!(workflows[0]["3"]["inputs"]["seed"], 10_000);
        assert_eq!(workflows[0]["9"]["inputs"]["filename_prefix"], "人类_0");
    }

    #[test]
    fn job_prefix_comes_from_row_label() {
        let row = PortraitRow {
            race: "人类".to_string(),
            style: "女吟游诗人_人类_双马尾_银色_中胸_corrupted".to_string(),
            prompt: "p".to_string(),
            seed: 10_001,
        };
        let job = SubmissionJob::from_row(&row);
        assert_eq!(job.filename_prefix, "人类_女吟游诗人_人类_双马尾_银色_中胸_corrupted");
        assert_eq!(job.seed, 10_001);
    }
}
