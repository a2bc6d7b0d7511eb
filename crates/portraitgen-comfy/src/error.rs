use thiserror::Error;

/// Failures talking to the image service. Never escapes `submit_batch`.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("service unreachable at {0}")]
    Unreachable(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response carried no prompt_id")]
    MissingPromptId,
}
