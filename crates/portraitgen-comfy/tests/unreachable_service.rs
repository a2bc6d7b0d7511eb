use std::time::{Duration, Instant};

use portraitgen_comfy::{
    ComfyClient, PromptSink, SubmissionJob, SubmitOptions, WorkflowSpec, submit_batch,
};

// Port 1 is reserved and refuses connections on loopback.
const DEAD_URL: &str = "http://127.0.0.1:1";

#[tokio::test]
async fn probe_fails_within_timeout() {
    let client = ComfyClient::new(DEAD_URL);
    let start = Instant::now();
    assert!(!client.probe().await);
    assert!(start.elapsed() < Duration::from_secs(6));
}

#[tokio::test]
async fn batch_keeps_going_when_service_is_down() {
    let client = ComfyClient::new(DEAD_URL);
    let jobs: Vec<SubmissionJob> = (0..3)
        .map(|index| SubmissionJob {
            prompt: "1girl, solo".to_string(),
            seed: 20_000 + index,
            filename_prefix: format!("人类_骑士_{index}"),
        })
        .collect();
    let options = SubmitOptions {
        delay: Duration::ZERO,
    };

    let report = submit_batch(&client, &WorkflowSpec::character(), &jobs, &options).await;
    assert_eq!(report.attempted, 3);
    assert_eq!(report.failed, 3);
    assert_eq!(report.succeeded, 0);
    assert!(report.outcomes.iter().all(|outcome| outcome.error.is_some()));
}

#[tokio::test]
async fn queue_status_reports_error_when_down() {
    let client = ComfyClient::new(DEAD_URL);
    assert!(client.queue_status().await.is_err());
}
