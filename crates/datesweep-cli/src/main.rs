//! datesweep command-line entry point.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use datesweep_cli::commands::{candidates_cmd, ledger_cmd, offsets_cmd, run_cmd};
use datesweep_cli::{config, OutputMode, Overrides};

#[derive(Parser)]
#[command(
    name = "datesweep",
    about = "Discover and download sequentially numbered documents with unpublished dates",
    version
)]
struct Cli {
    /// Path to a TOML config file (default: $DATESWEEP_CONFIG, then ./datesweep.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress bars and human-readable output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the identifier range, probing and downloading each document.
    Run {
        /// First identifier to process.
        #[arg(long)]
        start: Option<u32>,

        /// Last identifier to process (default: same as start).
        #[arg(long)]
        end: Option<u32>,

        /// Identifier whose date is known.
        #[arg(long)]
        seed_id: Option<u32>,

        /// Known date of the seed identifier (YYYY-MM-DD).
        #[arg(long)]
        seed_date: Option<NaiveDate>,

        /// Directory receiving downloads and the ledger.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Directory URL candidate filenames are joined onto.
        #[arg(long)]
        base_url: Option<String>,

        /// Pause after each identifier that touched the network, in milliseconds.
        #[arg(long)]
        pause_ms: Option<u64>,
    },

    /// Print the candidate URLs for one identifier and date. No network access.
    Candidates {
        /// Identifier.
        identifier: u32,

        /// Date (YYYY-MM-DD).
        date: NaiveDate,
    },

    /// Print the search plan's day offsets in probe order.
    Offsets,

    /// Summarize the ledger written by the last run.
    Ledger,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   datesweep completions bash > ~/.local/share/bash-completion/completions/datesweep
    ///   datesweep completions zsh > ~/.zfunc/_datesweep
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
    };

    if let Err(e) = dispatch(cli, mode).await {
        if mode.is_json() {
            let err = serde_json::json!({ "error": format!("{e:#}") });
            eprintln!("{err}");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli, mode: OutputMode) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            start,
            end,
            seed_id,
            seed_date,
            output_dir,
            base_url,
            pause_ms,
        } => {
            let mut cfg = config::load(cli.config.as_deref())?;
            Overrides {
                start,
                end,
                seed_id,
                seed_date,
                output_dir,
                base_url,
                pause_ms,
            }
            .apply(&mut cfg)?;
            run_cmd::run(cfg, mode).await
        }

        Commands::Candidates { identifier, date } => {
            let cfg = config::load(cli.config.as_deref())?;
            candidates_cmd::run(&cfg, identifier, date, mode)
        }

        Commands::Offsets => {
            let cfg = config::load(cli.config.as_deref())?;
            offsets_cmd::run(&cfg, mode)
        }

        Commands::Ledger => {
            let cfg = config::load(cli.config.as_deref())?;
            ledger_cmd::run(&cfg, mode)
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "datesweep", &mut std::io::stdout());
            Ok(())
        }
    }
}
