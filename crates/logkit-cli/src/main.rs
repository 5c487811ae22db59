//! logkit CLI
//!
//! Thin wrapper around logkit-core for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Print a request id
//! logkit request-id
//!
//! # Print five request ids
//! logkit request-id -n 5
//!
//! # Write the demo sequence to log/oauth/<date>.log and stdout
//! logkit demo --dir log/oauth --dev --trace --output stdout
//!
//! # Same, ending with a fatal record (exit status 1)
//! logkit demo --dir log/oauth --fatal
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logkit_core::{generate_request_id, LogOptions, Logger, Params};
use serde_json::json;

/// logkit - structured logging helpers
#[derive(Parser)]
#[command(name = "logkit")]
#[command(version)]
#[command(about = "Request ids and opinionated structured logging")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print request ids, one per line
    RequestId {
        /// How many ids to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Build a logger and write the demo records
    Demo {
        /// Log directory (default: ./log)
        #[arg(long, default_value = "")]
        dir: String,

        /// File name prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Development mode: console encoding, debug level
        #[arg(long)]
        dev: bool,

        /// Attach a trace-id to every record
        #[arg(long)]
        trace: bool,

        /// Attach this ref-id to every record
        #[arg(long, default_value = "")]
        ref_id: String,

        /// IANA time zone (default: Asia/Jakarta)
        #[arg(long)]
        time_zone: Option<String>,

        /// Extra sink: stdout, stderr or a file path (repeatable)
        #[arg(long = "output")]
        outputs: Vec<String>,

        /// Read options from LOGKIT_* environment variables instead
        #[arg(long, conflicts_with_all = ["dev", "trace", "ref_id", "time_zone", "outputs"])]
        from_env: bool,

        /// Finish with a fatal record
        #[arg(long)]
        fatal: bool,
    },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

#[derive(Debug)]
struct DemoError;

impl std::fmt::Display for DemoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("found an error in the service")
    }
}

impl std::error::Error for DemoError {}

/// The canonical call sequence: every shape of the params/error call,
/// then one `tracing` event through the logger's own dispatcher.
fn run_demo(logger: &Logger) {
    let mut full = Params::new();
    full.insert("request".into(), json!("a request"));
    full.insert("response".into(), json!("a response"));

    logger.log("a full service", Some(&full), None);
    logger.log("an empty service", None, None);
    logger.log("a full error service", Some(&full), Some(&DemoError));
    logger.log("an empty error service", None, Some(&DemoError));

    tracing::dispatcher::with_default(&logger.dispatch(), || {
        tracing::info!(source = "tracing", "instrumented code logs here too");
    });
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::RequestId { count } => {
            for _ in 0..count {
                let id = generate_request_id().context("failed to generate request id")?;
                println!("{}", id);
            }
        }

        Commands::Demo {
            dir,
            prefix,
            dev,
            trace,
            ref_id,
            time_zone,
            outputs,
            from_env,
            fatal,
        } => {
            let opts = if from_env {
                LogOptions::from_env()?
            } else {
                LogOptions {
                    development: dev,
                    time_zone,
                    with_trace: trace,
                    ref_id,
                    output: outputs,
                }
            };
            tracing::debug!(?opts, "building logger");

            let logger = Logger::new(&dir, &prefix, &opts).context("failed to build logger")?;
            run_demo(&logger);

            if fatal {
                logger.sugar().fatal("stop logger...");
            }

            logger.sync();
            println!("{}", logger.output_file().display());
        }
    }

    Ok(())
}
