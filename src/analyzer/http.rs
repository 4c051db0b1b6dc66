use super::{
    Analyzer,
    types::{AnalysisResult, SelectedFile},
};
use crate::{config::Config, error::AnalysisFailure};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    Url,
    multipart::{Form, Part},
};
use std::time::Duration;
use tracing::debug;

/// Talks to the analysis service over HTTP: one multipart POST per submission.
#[derive(Clone)]
pub struct HttpAnalyzer {
    endpoint: Url,
    field_name: String,
    client: reqwest::Client,
}

impl HttpAnalyzer {
    pub fn new(cfg: &Config) -> Result<Self> {
        let raw = format!(
            "{}/{}",
            cfg.service.base_url.trim_end_matches('/'),
            cfg.service.analyze_path.trim_start_matches('/')
        );
        let endpoint =
            Url::parse(&raw).with_context(|| format!("invalid analysis endpoint: {raw}"))?;

        let mut builder = reqwest::Client::builder().user_agent(cfg.service.user_agent.as_str());
        if cfg.service.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(cfg.service.timeout_seconds));
        }
        if cfg.service.connect_timeout_seconds > 0 {
            builder =
                builder.connect_timeout(Duration::from_secs(cfg.service.connect_timeout_seconds));
        }
        let client = builder.build().with_context(|| "building HTTP client")?;

        Ok(Self {
            endpoint,
            field_name: cfg.service.field_name.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form(&self, file: Option<&SelectedFile>) -> Result<Form, AnalysisFailure> {
        let Some(file) = file else {
            return Ok(Form::new().text(self.field_name.clone(), ""));
        };
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(AnalysisFailure::Transport)?;
        Ok(Form::new().part(self.field_name.clone(), part))
    }

    /// Any HTTP answer from the endpoint counts as reachable; the status is
    /// returned as-is since the service only defines POST.
    pub async fn probe(&self) -> Result<u16> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .with_context(|| format!("connecting to {}", self.endpoint))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, file: Option<&SelectedFile>) -> Result<AnalysisResult, AnalysisFailure> {
        let form = self.form(file)?;
        debug!(
            endpoint = %self.endpoint,
            file = file.map(|f| f.name.as_str()).unwrap_or("<none>"),
            bytes = file.map(|f| f.bytes.len()).unwrap_or(0),
            "posting image"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(AnalysisFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisFailure::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(AnalysisFailure::Transport)?;
        parse_result(&body)
    }
}

/// Only a JSON object is a result; arrays and scalars are malformed even
/// though serde would accept an array positionally.
pub fn parse_result(body: &[u8]) -> Result<AnalysisResult, AnalysisFailure> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(AnalysisFailure::MalformedBody)?;
    if !value.is_object() {
        return Err(AnalysisFailure::NotAnObject);
    }
    serde_json::from_value(value).map_err(AnalysisFailure::MalformedBody)
}
