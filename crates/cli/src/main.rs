mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Eclipse deck parser and schedule inspector.
#[derive(Parser)]
#[command(
    name = "deckhand",
    version,
    about = "Eclipse deck parser and schedule inspector"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress warnings and other non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log more (-v warn, -vv info, -vvv debug, -vvvv trace); RUST_LOG wins
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: deckhand.toml in the current directory, if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Error keys to raise as errors; accepts wildcards and ':' lists
    #[arg(long, global = true, value_name = "PATTERN")]
    throw: Vec<String>,

    /// Error keys to report as warnings and continue
    #[arg(long, global = true, value_name = "PATTERN")]
    warn: Vec<String>,

    /// Error keys to skip silently
    #[arg(long, global = true, value_name = "PATTERN")]
    ignore: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a deck and list its keywords
    Parse {
        /// Path to the .DATA file
        file: PathBuf,
    },

    /// Parse a deck and print its report steps and well history
    Schedule {
        /// Path to the .DATA file
        file: PathBuf,
        /// Only show this well
        #[arg(long)]
        well: Option<String>,
    },

    /// List the keyword dictionary (built-in plus configured files)
    Keywords,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = config::Overrides {
        throw: &cli.throw,
        warn: &cli.warn,
        ignore: &cli.ignore,
    };
    let settings = match config::Settings::resolve(cli.config.as_deref(), &overrides) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Parse { file } => {
            commands::parse::cmd_parse(&file, &settings, cli.output, cli.quiet);
        }
        Commands::Schedule { file, well } => {
            commands::schedule::cmd_schedule(
                &file,
                well.as_deref(),
                &settings,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Keywords => {
            commands::keywords::cmd_keywords(&settings, cli.output);
        }
    }
}

/// Logs go to stderr. Policy warnings are printed from the message list, so
/// the default level stays at `error`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
