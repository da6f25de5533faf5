mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::aggregate::AggregateArgs;
use commands::forecast::ForecastArgs;
use commands::scoring::{CapabilitiesArgs, ScoreArgs};
use commands::suggest::SuggestArgs;
use output::ResultKind;

/// Cash-flow forecasting and financial health scoring
#[derive(Parser)]
#[command(
    name = "cfx",
    version,
    about = "Cash-flow forecasting and financial health scoring",
    long_about = "A CLI for aggregating financial records, projecting cash-flow scenarios \
                  and scoring a company's financial health with decimal precision. \
                  Reads JSON (or YAML / CSV records) from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate dated records into monthly or quarterly buckets
    Aggregate(AggregateArgs),
    /// Project baseline, optimistic and pessimistic cash-flow scenarios
    Forecast(ForecastArgs),
    /// Compute the composite financial-health score of a calculation history
    Score(ScoreArgs),
    /// Show which financial domains a calculation history covers
    Capabilities(CapabilitiesArgs),
    /// Suggest calculators for a free-text question
    Suggest(SuggestArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (kind, result): (ResultKind, Result<serde_json::Value, Box<dyn std::error::Error>>) =
        match cli.command {
            Commands::Aggregate(args) => {
                (ResultKind::Aggregation, commands::aggregate::run_aggregate(args))
            }
            Commands::Forecast(args) => {
                let kind = if args.summary {
                    ResultKind::ForecastSummary
                } else {
                    ResultKind::Forecast
                };
                (kind, commands::forecast::run_forecast(args))
            }
            Commands::Score(args) => (ResultKind::Score, commands::scoring::run_score(args)),
            Commands::Capabilities(args) => (
                ResultKind::Capabilities,
                commands::scoring::run_capabilities(args),
            ),
            Commands::Suggest(args) => {
                (ResultKind::Suggestions, commands::suggest::run_suggest(args))
            }
            Commands::Version => {
                println!("cfx {}", env!("CARGO_PKG_VERSION"));
                return;
            }
        };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, kind, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
