use crate::{
    analyzer::HttpAnalyzer,
    config::{Config, OverlapPolicy, RenderFormat},
    dataset::{DatasetRow, append_row, germination_series, read_rows, recordable, render_chart},
    display::DisplayRegion,
    handler::UploadHandler,
    report::{RunReport, SubmissionReport},
    selection::load_selection,
    util::{ensure_dir, now_rfc3339, sha256_hex},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "seed-check")]
#[command(about = "Seed image analysis client (multipart upload + result rendering)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./seed-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctor {},
    /// Submit images for analysis and print the display region.
    Analyze {
        /// Image to submit; repeat for overlapping submissions. With none,
        /// an empty payload is submitted.
        #[arg(long)]
        input: Vec<PathBuf>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long, value_enum)]
        overlap: Option<OverlapPolicy>,
        #[arg(long, value_enum)]
        format: Option<RenderFormat>,
    },
    /// Germination rate per seed, from the local dataset.
    Chart {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long, default_value_t = 40)]
        width: usize,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    if let Command::Analyze {
        base_url,
        overlap,
        format,
        ..
    } = &args.cmd
    {
        if let Some(url) = base_url {
            cfg.service.base_url = url.clone();
        }
        if let Some(policy) = overlap {
            cfg.submission.overlap = *policy;
        }
        if let Some(format) = format {
            cfg.output.format = *format;
        }
    }

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg).await,
        Command::Analyze { input, .. } => analyze(&cfg, input).await,
        Command::Chart { dataset, width } => chart(&cfg, dataset.as_deref(), *width),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["seed-check.toml", "seed-check.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the display region, so logs go to stderr.
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // A subscriber installed by an embedding process (or an earlier dispatch)
    // stays in place.
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        debug!("keeping existing subscriber: {err}");
    }

    Ok(guard)
}

async fn doctor(cfg: &Config) -> Result<()> {
    let analyzer = HttpAnalyzer::new(cfg)?;
    let probe = match analyzer.probe().await {
        Ok(status) => serde_json::json!({ "reachable": true, "status": status }),
        Err(err) => {
            warn!("analysis service unreachable: {err:#}");
            serde_json::json!({ "reachable": false, "error": format!("{err:#}") })
        }
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "endpoint": analyzer.endpoint().as_str(),
            "field_name": cfg.service.field_name,
            "overlap": cfg.submission.overlap,
            "probe": probe,
        }))?
    );
    Ok(())
}

async fn analyze(cfg: &Config, inputs: &[PathBuf]) -> Result<()> {
    let mut selections = Vec::with_capacity(inputs.len());
    for input in inputs {
        let file = load_selection(cfg, input)?;
        let digest = sha256_hex(&file.bytes);
        selections.push((input.display().to_string(), digest, file));
    }

    let analyzer = HttpAnalyzer::new(cfg)?;
    let endpoint = analyzer.endpoint().to_string();
    let region = if cfg.output.display_path.is_empty() {
        DisplayRegion::new()
    } else {
        DisplayRegion::mirrored_to(Path::new(&cfg.output.display_path))
    };
    let handler = UploadHandler::new(
        Arc::new(analyzer),
        region,
        cfg.submission.overlap,
        cfg.output.format,
    );

    info!(
        "endpoint={endpoint} overlap={:?} submissions={}",
        cfg.submission.overlap,
        selections.len().max(1)
    );
    let started = now_rfc3339();

    let mut pending = Vec::new();
    if selections.is_empty() {
        warn!("no input selected; submitting an empty payload");
        pending.push((None, String::new(), handler.trigger(None)));
    }
    for (input, digest, file) in selections {
        pending.push((Some(input), digest, handler.trigger(Some(file))));
    }

    let mut submissions = Vec::with_capacity(pending.len());
    for (input, digest, submission) in pending {
        let settlement = submission.settled().await;
        if cfg.output.write_dataset {
            if let Some(result) = recordable(&settlement) {
                let row = DatasetRow::new(input.as_deref().unwrap_or(""), digest, result.clone());
                append_row(Path::new(&cfg.output.dataset_path), &row)?;
            }
        }
        submissions.push(SubmissionReport::from_settlement(input, &settlement));
    }

    if cfg.output.display_path.is_empty() {
        println!("{}", handler.display());
    } else {
        info!("display written to {}", cfg.output.display_path);
    }

    if cfg.global.print_summary {
        let report = RunReport {
            started,
            finished: now_rfc3339(),
            endpoint,
            overlap: handler.policy(),
            submissions,
        };
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn chart(cfg: &Config, dataset: Option<&Path>, width: usize) -> Result<()> {
    let path = dataset
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.output.dataset_path));
    let rows = read_rows(&path)?;
    info!("dataset {} rows={}", path.display(), rows.len());
    println!("{}", render_chart(&germination_series(&rows), width));
    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    let dataset = Path::new(&cfg.output.dataset_path);
    let dir = dataset.parent().unwrap_or_else(|| Path::new("."));
    Some(dir.join("seed-check.log"))
}
