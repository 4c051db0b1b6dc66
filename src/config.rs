use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub submission: Submission,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub base_url: String,
    pub analyze_path: String,
    /// Multipart field the selected file is sent under.
    pub field_name: String,
    /// 0 disables the request timeout.
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub user_agent: String,
}
impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            analyze_path: "/analyze".into(),
            field_name: "image".into(),
            timeout_seconds: 0,
            connect_timeout_seconds: 0,
            user_agent: concat!("seed-check/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// What happens when a submission is triggered while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    #[default]
    LastWriterWins,
    Serialize,
    CancelPrevious,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub validate: bool,
    pub allowed_extensions: Vec<String>,
    /// 0 means unlimited.
    pub max_file_bytes: u64,
}
impl Default for Selection {
    fn default() -> Self {
        Self {
            validate: false,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            max_file_bytes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    #[default]
    Text,
    Html,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub format: RenderFormat,
    /// Empty means the display region is printed to stdout after the run.
    pub display_path: String,
    pub write_dataset: bool,
    pub dataset_path: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            format: RenderFormat::Text,
            display_path: "".into(),
            write_dataset: false,
            dataset_path: "out/seed-dataset.jsonl".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
