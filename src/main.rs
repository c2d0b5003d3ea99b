use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use fairml_audit::{AuditConfig, full_auto_pipeline, rank_candidates};
use fairml_data::binary_labels;
use fairml_gbdt::GradientBoostingConfig;
use fairml_io::{DatasetSettings, ExperimentName, ReportWriter, Settings};

const DEFAULT_N_ESTIMATORS: usize = 100;

#[derive(Parser)]
#[command(name = "fairml")]
#[command(about = "Detect and mitigate demographic-parity bias of binary classifiers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Train/test split seed (defaults to the audit default of 2)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Dataset selection and output location shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DatasetArgs {
    /// YAML settings file with `default` and `datasets` sections
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Dataset entry to audit
    #[arg(long)]
    dataset: String,

    /// Output file prefix (defaults to the dataset name)
    #[arg(long)]
    experiment: Option<String>,

    /// Directory for JSON reports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Rank candidate attributes, then mitigate the most unfair one
    Audit {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Rank candidate attributes by unfairness only
    Detect {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AuditOutput {
    experiment: String,
    dataset: String,
    n_rows: usize,
    sensitive_feature: String,
    baseline_fairness: f64,
    exponentiated_gradient_fairness: f64,
    grid_search_selected: String,
    grid_search_fairness: f64,
    audit_report: PathBuf,
    tradeoff_report: PathBuf,
}

#[derive(Serialize)]
struct DetectOutput {
    experiment: String,
    dataset: String,
    n_rows: usize,
    most_unfair: Vec<String>,
    ranking_report: PathBuf,
}

/// Resolved inputs of one run.
struct Prepared {
    settings: DatasetSettings,
    config: AuditConfig,
    estimator: GradientBoostingConfig,
    writer: ReportWriter,
    experiment: String,
}

fn prepare(args: &DatasetArgs, seed: Option<u64>) -> Result<Prepared> {
    let settings = Settings::load(&args.config)
        .with_context(|| format!("failed to load settings {}", args.config.display()))?
        .dataset(&args.dataset)
        .context("failed to resolve dataset settings")?;
    let config = settings
        .audit_config(seed)
        .context("invalid audit settings")?;

    let n_estimators = settings.options().n_estimators.unwrap_or(DEFAULT_N_ESTIMATORS);
    let mut estimator =
        GradientBoostingConfig::new(n_estimators).context("invalid n_estimators")?;
    if let Some(seed) = seed {
        estimator = estimator.with_seed(seed);
    }

    let experiment = args.experiment.clone().unwrap_or_else(|| args.dataset.clone());
    let writer = ReportWriter::new(&args.output_dir, ExperimentName::new(experiment.clone())?)
        .context("failed to prepare output directory")?;

    info!(
        dataset = settings.name(),
        path = %settings.path().display(),
        candidates = ?config.sensitive_features(),
        control_feature = ?config.control_feature(),
        quality_metric = %config.quality_metric(),
        n_estimators,
        "settings resolved"
    );
    Ok(Prepared {
        settings,
        config,
        estimator,
        writer,
        experiment,
    })
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(output).context("failed to serialize summary")?
    );
    Ok(())
}

fn run_audit(args: &DatasetArgs, seed: Option<u64>) -> Result<()> {
    let run = prepare(args, seed)?;
    let table = run
        .settings
        .load_table()
        .context("failed to read dataset")?;
    let n_rows = table.n_rows();

    let report = full_auto_pipeline(&run.estimator, table, run.settings.label(), &run.config)
        .with_context(|| format!("audit of dataset {} failed", run.settings.name()))?;

    let audit_report = run
        .writer
        .write_audit(&report)
        .context("failed to write audit report")?;
    let tradeoff_report = run
        .writer
        .write_tradeoff(&report.sensitive_feature, &report.grid_search)
        .context("failed to write tradeoff report")?;

    print_json(&AuditOutput {
        experiment: run.experiment,
        dataset: run.settings.name().to_string(),
        n_rows,
        baseline_fairness: report.baseline.fairness,
        exponentiated_gradient_fairness: report.exponentiated_gradient.evaluation.fairness,
        grid_search_selected: report.grid_search.selected.clone(),
        grid_search_fairness: report.grid_search.selected_evaluation.fairness,
        sensitive_feature: report.sensitive_feature,
        audit_report,
        tradeoff_report,
    })
}

fn run_detect(args: &DatasetArgs, seed: Option<u64>) -> Result<()> {
    let run = prepare(args, seed)?;
    let mut table = run
        .settings
        .load_table()
        .context("failed to read dataset")?;
    let n_rows = table.n_rows();
    let labels = binary_labels(&table.pop(run.settings.label())?)
        .with_context(|| format!("label column {} is not binary", run.settings.label()))?;

    let detections = rank_candidates(&run.estimator, &table, &labels, &run.config)
        .context("unfairness detection failed")?;
    let ranking: Vec<_> = detections
        .iter()
        .enumerate()
        .map(|(i, d)| d.entry(i + 1))
        .collect();
    let most_unfair = ranking
        .iter()
        .filter(|e| e.fairness.is_some())
        .take(run.config.num_of_mitigated_features())
        .map(|e| e.sensitive_feature.clone())
        .collect();

    let ranking_report = run
        .writer
        .write_ranking(&ranking)
        .context("failed to write ranking report")?;

    print_json(&DetectOutput {
        experiment: run.experiment,
        dataset: run.settings.name().to_string(),
        n_rows,
        most_unfair,
        ranking_report,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match &cli.command {
        Command::Audit { dataset } => run_audit(dataset, cli.seed),
        Command::Detect { dataset } => run_detect(dataset, cli.seed),
    }
}
