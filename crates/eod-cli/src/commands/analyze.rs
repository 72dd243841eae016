//! Analyze command - extract, check and optionally audit a single report.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use eod_core::error::AuditError;
use eod_core::models::config::{AuditModel, EodConfig};
use eod_core::pipeline::{AnalysisReport, AuditOutcome, ReportAnalyzer};
use eod_core::source::{load_text, text_from_bytes};

use crate::client::OpenAiClient;
use crate::format::{format_report, OutputFormat};

use super::config::load_config;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (.txt or .pdf), or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    audit: AuditFlags,
}

/// AI audit switches shared by analyze and batch.
#[derive(Args, Clone)]
pub struct AuditFlags {
    /// Run the AI audit
    #[arg(long, conflicts_with = "no_ai")]
    ai: bool,

    /// Never run the AI audit, even when auto_run is configured
    #[arg(long)]
    no_ai: bool,

    /// Audit model: fast, deep, gpt-5-mini (same as fast) or gpt-5 (same as deep)
    #[arg(short, long)]
    model: Option<String>,
}

impl AuditFlags {
    /// Apply the flags to `config`; returns whether the audit should run.
    pub fn apply(&self, config: &mut EodConfig) -> anyhow::Result<bool> {
        if let Some(model) = &self.model {
            config.audit.model = AuditModel::from_id(model)
                .ok_or_else(|| anyhow::anyhow!("Unknown model: {} (expected fast, deep, gpt-5-mini or gpt-5)", model))?;
        }
        Ok(self.ai || (config.audit.auto_run && !self.no_ai))
    }
}

/// Audit client for this run, or the reason there is none.
pub fn audit_client(config: &EodConfig, run_ai: bool) -> Result<OpenAiClient, String> {
    if !run_ai {
        return Err("AI audit not requested".to_string());
    }
    OpenAiClient::from_env(&config.audit).map_err(|e| match e {
        AuditError::NoCredential(var) => format!("No {} set.", var),
        other => other.to_string(),
    })
}

/// Analyze one report text with an already-resolved client.
pub async fn analyze_text(
    analyzer: &ReportAnalyzer,
    text: &str,
    client: &Result<OpenAiClient, String>,
) -> eod_core::Result<AnalysisReport> {
    match client {
        Ok(client) => analyzer.analyze(text, client).await,
        Err(reason) => {
            let mut report = analyzer.analyze_local(text)?;
            report.audit = AuditOutcome::skipped(reason.clone());
            Ok(report)
        }
    }
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        return Ok(text_from_bytes(&data)?);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    Ok(load_text(input)?)
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    let run_ai = args.audit.apply(&mut config)?;

    info!("Analyzing report: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    pb.set_message("Reading report...");
    let text = read_input(&args.input)?;

    let client = audit_client(&config, run_ai);
    if run_ai {
        if let Err(reason) = &client {
            pb.suspend(|| eprintln!("{} {} Skipping AI audit.", style("⚠").yellow(), reason));
        }
    }

    pb.set_message(if client.is_ok() { "Extracting and auditing..." } else { "Extracting..." });
    let analyzer = ReportAnalyzer::from_config(&config);
    let report = analyze_text(&analyzer, &text, &client).await?;

    pb.finish_and_clear();

    if let AuditOutcome::Failed { error } = &report.audit {
        eprintln!("{} AI audit failed: {}", style("⚠").yellow(), error);
    }

    let source = args.input.display().to_string();
    let output = format_report(&report, &source, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
