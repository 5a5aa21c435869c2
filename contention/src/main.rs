use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use contention::{Comparator, Config, Reporter, report::JsonReporter};
use tracing_subscriber::EnvFilter;

/// Run a batch of synthetic work under different concurrency strategies and
/// print the reports as JSON.
#[derive(Debug, Parser)]
#[command(name = "contention", version, about)]
struct Cli {
    /// TOML config file. Defaults are used when omitted.
    #[arg(long, env = "CONTENTION_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One task after another.
    Sequential(Items),
    /// Semaphore-bounded workers sharing a counter and a store.
    Parallel(ParallelArgs),
    /// Cooperative tasks interleaved on a single task.
    Async(Items),
    /// All three strategies on the same shared state, then a system snapshot.
    Compare(ParallelArgs),
    /// Print the system snapshot only.
    Info,
}

#[derive(Debug, Args)]
struct Items {
    /// Number of tasks.
    #[arg(long, short = 'n', default_value_t = 5)]
    items: usize,
}

#[derive(Debug, Args)]
struct ParallelArgs {
    #[command(flatten)]
    items: Items,
    /// Admission tokens. Defaults to `parallel.max_concurrency` from the config.
    #[arg(long, short = 'k')]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    tracing::debug!(?config, "Configuration loaded");

    let comparator = Comparator::from_config(&config);
    let reporter = JsonReporter::stdout(cli.pretty);

    match cli.command {
        Command::Sequential(args) => {
            let report = comparator.run_sequential(args.items).await?;
            reporter.report(&report).await?;
        }
        Command::Parallel(args) => {
            let k = args.concurrency.unwrap_or(comparator.default_concurrency());
            let report = comparator.run_parallel(args.items.items, k).await?;
            reporter.report(&report).await?;
        }
        Command::Async(args) => {
            let report = comparator.run_async(args.items).await?;
            reporter.report(&report).await?;
        }
        Command::Compare(args) => {
            let n = args.items.items;
            let k = args.concurrency.unwrap_or(comparator.default_concurrency());
            let reports = [
                comparator.run_sequential(n).await?,
                comparator.run_parallel(n, k).await?,
                comparator.run_async(n).await?,
            ];
            for report in &reports {
                reporter.report(report).await?;
            }
            reporter.report(&comparator.system_info()).await?;
        }
        Command::Info => {
            reporter.report(&comparator.system_info()).await?;
        }
    }

    Ok(())
}
