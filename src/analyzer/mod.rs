pub mod http;
pub mod types;

use crate::error::AnalysisFailure;
use async_trait::async_trait;

pub use http::HttpAnalyzer;
pub use types::{AnalysisResult, SelectedFile};

#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Sends one file (or nothing, when no file was selected) for analysis.
    async fn analyze(&self, file: Option<&SelectedFile>) -> Result<AnalysisResult, AnalysisFailure>;
}
