//! govaudit: Government Website Compliance CLI

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use govaudit::analyzer::criteria::{catalog, CATALOG_VERSION};
use govaudit::analyzer::nlp::analyzer_from_config;
use govaudit::analyzer::{EvaluationEngine, EvaluationSummary};
use govaudit::config::{load_config, write_default_config, Config, LogFormat};
use govaudit::evaluation::Evaluation;
use govaudit::extraction::{FileExtractionProvider, DEFAULT_EXTRACTION_DIR};
use govaudit::history::{previous_score, HistoryEntry};
use govaudit::reporter::{ConsoleReporter, JsonReporter};
use govaudit::store::{EvaluationStore, JsonFileStore, DEFAULT_STORE_DIR};
use govaudit::telemetry::{init_tracing, parse_level};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

/// govaudit: compliance scoring for government websites
#[derive(Parser, Debug)]
#[command(name = "govaudit")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: search .govauditrc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct StoreArgs {
    /// Directory of stored evaluations (default: .govaudit/evaluations)
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one or more websites from their extractions
    Evaluate {
        /// Website ids; each needs `<extraction-dir>/<id>.json`
        #[arg(required = true, num_args = 1..)]
        website_ids: Vec<u64>,

        /// Directory holding extraction documents (default: extractions)
        #[arg(long)]
        extraction_dir: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,

        /// Quiet mode (one line per website)
        #[arg(long, short)]
        quiet: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Never call the text analysis service; use heuristics
        #[arg(long)]
        offline: bool,

        /// Minimum total score (exit 1 if any website is below)
        #[arg(long, short)]
        threshold: Option<u8>,
    },

    /// Show a stored evaluation
    Show {
        evaluation_id: Uuid,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the stored evaluations of a website, oldest first
    History {
        website_id: u64,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Print the criterion catalog
    Catalog {
        /// Output format as JSON
        #[arg(long, short)]
        json: bool,

        /// Include criterion descriptions
        #[arg(long, short)]
        verbose: bool,
    },

    /// Create .govauditrc.json with sensible defaults
    Init {
        /// Minimum score threshold (e.g. 70)
        #[arg(long)]
        threshold: Option<u8>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    if let Commands::Init { threshold, ref dir } = args.command {
        return run_init(threshold, dir.as_deref().unwrap_or(cwd.as_path()));
    }

    // Load config (CLI flags override config file)
    let config = load_config(&cwd, args.config.as_deref())?;
    let verbose = matches!(
        args.command,
        Commands::Evaluate { verbose: true, .. } | Commands::Show { verbose: true, .. }
    );
    setup_logging(&config, verbose);

    match args.command {
        Commands::Evaluate {
            website_ids,
            extraction_dir,
            store,
            json,
            quiet,
            verbose,
            offline,
            threshold,
        } => {
            let config = config.merge_with_cli(threshold, extraction_dir, store.store_dir);
            let options = EvaluateOptions {
                json,
                quiet,
                verbose,
                offline,
            };
            run_evaluate(&config, &website_ids, &options)
        }
        Commands::Show {
            evaluation_id,
            store,
            json,
            verbose,
        } => {
            let config = config.merge_with_cli(None, None, store.store_dir);
            run_show(&config, &evaluation_id, json, verbose)
        }
        Commands::History {
            website_id,
            store,
            json,
        } => {
            let config = config.merge_with_cli(None, None, store.store_dir);
            run_history(&config, website_id, json)
        }
        Commands::Catalog { json, verbose } => {
            if json {
                println!(
                    "{}",
                    JsonReporter::new()
                        .pretty()
                        .report_catalog(catalog(), CATALOG_VERSION)
                );
            } else {
                let mut reporter = ConsoleReporter::new();
                if verbose {
                    reporter = reporter.verbose();
                }
                reporter.report_catalog(catalog(), CATALOG_VERSION);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn setup_logging(config: &Config, verbose: bool) {
    let level = match config.logging.level.as_deref() {
        Some(name) => parse_level(name),
        None if verbose => Level::INFO,
        None => Level::WARN,
    };
    init_tracing(config.logging.format == LogFormat::Json, level);
}

struct EvaluateOptions {
    json: bool,
    quiet: bool,
    verbose: bool,
    offline: bool,
}

fn store_for(config: &Config) -> JsonFileStore {
    JsonFileStore::new(
        config
            .store_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
    )
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

fn run_evaluate(config: &Config, website_ids: &[u64], options: &EvaluateOptions) -> Result<ExitCode> {
    let extraction_dir = config
        .extraction_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXTRACTION_DIR));
    if !extraction_dir.is_dir() {
        anyhow::bail!(
            "Extraction directory not found: {}",
            extraction_dir.display()
        );
    }

    let store = Arc::new(store_for(config));
    let engine = EvaluationEngine::new(
        Arc::new(FileExtractionProvider::new(extraction_dir)),
        analyzer_from_config(&config.nlp, options.offline),
        store.clone(),
    )
    .with_nlp_timeout(config.nlp.timeout())
    .with_rule_settings(config.rule_settings());

    let rt = runtime()?;
    let reports = rt.block_on(async {
        let summaries = engine.evaluate_many(website_ids).await;
        let mut reports = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let (stored, previous) = load_with_previous(store.as_ref(), &summary).await?;
            reports.push((summary, stored, previous));
        }
        Ok::<_, anyhow::Error>(reports)
    })?;

    if options.json {
        let summaries: Vec<EvaluationSummary> = reports.iter().map(|(s, _, _)| s.clone()).collect();
        println!("{}", JsonReporter::new().pretty().report_summaries(&summaries));
    } else if options.quiet {
        let reporter = ConsoleReporter::new();
        for (summary, _, previous) in &reports {
            reporter.report_quiet(summary, *previous);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if options.verbose {
            reporter = reporter.verbose();
        }
        for (summary, stored, previous) in &reports {
            match stored {
                Some(evaluation) => reporter.report(evaluation, *previous),
                None => reporter.report_unpersisted(summary),
            }
        }
        if reports.len() > 1 {
            let summaries: Vec<EvaluationSummary> =
                reports.iter().map(|(s, _, _)| s.clone()).collect();
            reporter.report_batch(&summaries);
        }
    }

    let failed = reports.iter().filter(|(s, _, _)| !s.is_completed()).count();
    if failed > 0 {
        if !options.quiet && !options.json {
            eprintln!(
                "\n{}: {} of {} evaluations failed",
                "Failed".red().bold(),
                failed,
                reports.len()
            );
        }
        return Ok(ExitCode::from(1));
    }

    // Check threshold (config or CLI)
    if let Some(threshold) = config.threshold {
        let below: Vec<&EvaluationSummary> = reports
            .iter()
            .map(|(s, _, _)| s)
            .filter(|s| s.total_score < f64::from(threshold))
            .collect();
        if !below.is_empty() {
            if !options.quiet && !options.json {
                for summary in below {
                    eprintln!(
                        "\n{}: Website {} scored {:.1}, below threshold {}",
                        "Failed".red().bold(),
                        summary.website_id,
                        summary.total_score,
                        threshold
                    );
                }
            }
            return Ok(ExitCode::from(1));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Stored evaluation of a run plus the site's previous completed total
async fn load_with_previous(
    store: &dyn EvaluationStore,
    summary: &EvaluationSummary,
) -> Result<(Option<Evaluation>, Option<f64>)> {
    if !summary.persisted {
        return Ok((None, None));
    }
    let stored = store
        .get(&summary.evaluation_id)
        .await
        .with_context(|| format!("Failed to read evaluation {}", summary.evaluation_id))?;
    let Some(evaluation) = stored else {
        return Ok((None, None));
    };
    let history = store
        .list_for_website(summary.website_id)
        .await
        .with_context(|| format!("Failed to read history of website {}", summary.website_id))?;
    let previous = previous_score(&history, &evaluation);
    Ok((Some(evaluation), previous))
}

fn run_show(config: &Config, evaluation_id: &Uuid, json: bool, verbose: bool) -> Result<ExitCode> {
    let store = store_for(config);
    let rt = runtime()?;
    let found = rt.block_on(async {
        let Some(evaluation) = store
            .get(evaluation_id)
            .await
            .with_context(|| format!("Failed to read evaluation {}", evaluation_id))?
        else {
            return Ok::<_, anyhow::Error>(None);
        };
        let history = store
            .list_for_website(evaluation.website_id)
            .await
            .context("Failed to read evaluation history")?;
        let previous = previous_score(&history, &evaluation);
        Ok(Some((evaluation, previous)))
    })?;

    let Some((evaluation, previous)) = found else {
        eprintln!(
            "{}: No evaluation {} in {}",
            "Error".red().bold(),
            evaluation_id,
            store.dir().display()
        );
        return Ok(ExitCode::from(2));
    };

    if json {
        println!("{}", JsonReporter::new().pretty().report(&evaluation));
    } else {
        let mut reporter = ConsoleReporter::new();
        if verbose {
            reporter = reporter.verbose();
        }
        reporter.report(&evaluation, previous);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_history(config: &Config, website_id: u64, json: bool) -> Result<ExitCode> {
    let store = store_for(config);
    let rt = runtime()?;
    let evaluations = rt
        .block_on(store.list_for_website(website_id))
        .with_context(|| format!("Failed to read history of website {}", website_id))?;
    let entries: Vec<HistoryEntry> = evaluations.iter().map(HistoryEntry::from).collect();

    if json {
        println!("{}", JsonReporter::new().pretty().report_history(&entries));
    } else {
        ConsoleReporter::new().report_history(website_id, &entries);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init(threshold: Option<u8>, dir: &Path) -> Result<ExitCode> {
    match write_default_config(dir, threshold)? {
        Some(path) => {
            eprintln!("{}: Created {}", "Info".blue(), path.display());
        }
        None => {
            eprintln!(
                "{}: {} already exists; use --dir to write elsewhere or remove it first",
                "Warning".yellow(),
                dir.join(govaudit::config::CONFIG_FILENAME).display()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
