use crate::{
    classifier::StubClassifier,
    config::Config,
    pipeline::Pipeline,
    render::{RenderOptions, render_now},
    report::BatchReport,
    request::{ApiError, ApiResponse, BatchRequest, CallerIdentity, encode_base64_image},
    status::model_status,
    store::ReportStore,
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rubber-qc")]
#[command(about = "Rubber sheet quality control: defect classification, batch verdicts and reports")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./rubber-qc.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classifier asset and supported labels.
    Status {},
    /// Assess a batch of sample images.
    Predict {
        #[arg(long)]
        batch_id: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        tester: String,
        #[arg(long, default_value_t = 0)]
        sheet_count: u32,
        #[arg(long, default_value_t = 0.0)]
        batch_weight: f64,
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
        /// Identity forwarded by the calling auth layer.
        #[arg(long, default_value = "cli")]
        caller: String,
        /// Render and save the report to the store.
        #[arg(long)]
        export: bool,
        /// Also write the report JSON here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render and store a previously saved report JSON.
    Export {
        #[arg(long)]
        report: PathBuf,
    },
    Reports {
        #[command(subcommand)]
        cmd: ReportsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportsCommand {
    List {},
    Show { name: String },
    Delete { name: String },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Status {} => status(&cfg),
        Command::Predict {
            batch_id,
            category,
            tester,
            sheet_count,
            batch_weight,
            images,
            caller,
            export,
            out,
        } => {
            let req = BatchRequest {
                images: read_images(images)?,
                batch_id: batch_id.clone(),
                category: category.clone(),
                sheet_count: *sheet_count,
                batch_weight: *batch_weight,
                tester_name: tester.clone(),
            };
            predict(&cfg, &req, &CallerIdentity::new(caller.as_str()), *export, out.as_deref())
        }
        Command::Export { report } => {
            let raw = std::fs::read_to_string(report)
                .with_context(|| format!("reading report: {}", report.display()))?;
            let report: BatchReport =
                serde_json::from_str(&raw).with_context(|| "parsing report JSON")?;
            let stored = export(&cfg, &report)?;
            print_json(&cfg, &stored)
        }
        Command::Reports { cmd } => reports(&cfg, cmd),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("rubber-qc.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output, so logs go to stderr.
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
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
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

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.reports_dir).join("rubber-qc.log"))
}

fn print_json<T: Serialize>(cfg: &Config, value: &T) -> Result<()> {
    let s = if cfg.output.pretty_json {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{s}");
    Ok(())
}

fn read_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|p| {
            let bytes =
                std::fs::read(p).with_context(|| format!("reading image: {}", p.display()))?;
            Ok(encode_base64_image(&bytes))
        })
        .collect()
}

fn status(cfg: &Config) -> Result<()> {
    let classifier = StubClassifier::from_config(cfg)?;
    let status = model_status(cfg, &classifier);
    print_json(cfg, &ApiResponse::ok("Model status", status))
}

fn predict(
    cfg: &Config,
    req: &BatchRequest,
    caller: &CallerIdentity,
    export_report: bool,
    out: Option<&Path>,
) -> Result<()> {
    let classifier = StubClassifier::from_config(cfg)?;
    let pipeline = Pipeline::new(cfg, classifier);

    let report = match pipeline.run_batch(req, caller) {
        Ok(report) => report,
        Err(err) => {
            print_json(cfg, &ApiError::from(&err))?;
            return Err(err).with_context(|| format!("prediction failed for {}", req.batch_id));
        }
    };

    if let Some(path) = out {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report JSON: {}", path.display()))?;
    }

    if export_report {
        let stored = export(cfg, &report)?;
        info!("exported {}", stored.path.display());
    }

    if cfg.output.print_summary {
        print_json(cfg, &ApiResponse::ok("Prediction completed successfully", &report))?;
    }
    Ok(())
}

fn export(cfg: &Config, report: &BatchReport) -> Result<crate::store::StoredReport> {
    let doc = render_now(report, &RenderOptions::from_config(cfg))?;
    let store = ReportStore::from_config(cfg);
    let stored = store
        .save(&doc, &report.batch_id)
        .with_context(|| format!("saving report for {}", report.batch_id))?;
    Ok(stored)
}

fn reports(cfg: &Config, cmd: &ReportsCommand) -> Result<()> {
    let store = ReportStore::from_config(cfg);
    match cmd {
        ReportsCommand::List {} => print_json(cfg, &store.list()),
        ReportsCommand::Show { name } => print_json(cfg, &store.open(name)?),
        ReportsCommand::Delete { name } => {
            let deleted = store.delete(name)?;
            print_json(cfg, &serde_json::json!({ "name": name, "deleted": deleted }))
        }
    }
}
