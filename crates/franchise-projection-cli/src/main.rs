mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::audit::AuditArgs;
use commands::project::ProjectArgs;
use commands::scenarios::ScenarioArgs;
use commands::seed::SeedArgs;

/// Franchise financial projections with accounting identity checks
#[derive(Parser)]
#[command(
    name = "fpe",
    version,
    about = "Franchise financial projections with accounting identity checks",
    long_about = "Projects a franchise location's first 60 months (P&L, cash flow and \
                  balance sheet) from a plan snapshot, rolls them into annual summaries, \
                  ROI, ROIC and valuation metrics, and audits the result against a \
                  battery of accounting identities. All money is computed in integer cents."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full 60-month projection
    Project(ProjectArgs),
    /// Run the projection and report only the identity checks
    Audit(AuditArgs),
    /// Compare base, conservative, optimistic and custom scenarios
    Scenarios(ScenarioArgs),
    /// Emit a plan snapshot seeded from a brand-defaults file
    Seed(SeedArgs),
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

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Audit(args) => commands::audit::run_audit(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Seed(args) => commands::seed::run_seed(args),
        Commands::Version => {
            println!("fpe {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
