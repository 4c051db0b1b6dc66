use thiserror::Error;

/// Every way a submission can fail. None of these reach the user beyond the
/// fixed failure message; the detail goes to the log.
#[derive(Debug, Error)]
pub enum AnalysisFailure {
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("analysis service responded with status {status}")]
    Status { status: u16 },

    #[error("malformed analysis response: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("malformed analysis response: body is not a JSON object")]
    NotAnObject,
}

impl AnalysisFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisFailure::Transport(_) => "transport",
            AnalysisFailure::Status { .. } => "status",
            AnalysisFailure::MalformedBody(_) | AnalysisFailure::NotAnObject => "malformed_body",
        }
    }
}
