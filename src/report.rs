use crate::{
    config::OverlapPolicy,
    handler::{Outcome, Settlement},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started: String,
    pub finished: String,
    pub endpoint: String,
    pub overlap: OverlapPolicy,
    pub submissions: Vec<SubmissionReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub seq: u64,
    pub input: Option<String>,
    pub status: SubmissionStatus,
    pub displayed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Succeeded,
    Failed,
    Cancelled,
    Superseded,
}

impl SubmissionReport {
    pub fn from_settlement(input: Option<String>, settlement: &Settlement) -> Self {
        let status = match (&settlement.outcome, settlement.displayed) {
            (Outcome::Cancelled, _) => SubmissionStatus::Cancelled,
            (_, false) => SubmissionStatus::Superseded,
            (Outcome::Succeeded(_), true) => SubmissionStatus::Succeeded,
            (Outcome::Failed, true) => SubmissionStatus::Failed,
        };
        Self {
            seq: settlement.seq,
            input,
            status,
            displayed: settlement.displayed,
        }
    }
}
