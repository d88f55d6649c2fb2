//! # Catcher CLI
//!
//! Installs the catcher on this process and raises one fault, so sinks
//! and the halt policy can be checked end to end.
//!
//! # Usage
//!
//! ```bash
//! # Warning on the console, plain text
//! catcher-cli --plain warning "disk almost full"
//!
//! # Fatal error: report, then exit 255
//! catcher-cli error "cannot continue"
//!
//! # Same, but keep running, and log to a file with a backtrace
//! catcher-cli --no-halt --backtrace --log-file /tmp/faults.log error
//!
//! # Sinks and policy from a TOML file
//! catcher-cli --config catcher.toml recoverable
//! ```

#![deny(warnings)]

use catcher::{Catcher, CatcherConfig, ConfigLoader, code};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Diagnostic code outside every known severity bit.
const UNRECOGNISED_CODE: i32 = 0x4000;

/// Kind of fault to raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Fault {
    /// Unhandled exception (panic)
    Panic,
    /// Fatal error
    Error,
    /// Recoverable error
    Recoverable,
    Warning,
    Notice,
    /// Strict notice
    Strict,
    /// Diagnostic with an unrecognised code
    Unknown,
}

impl Fault {
    fn code(self) -> Option<i32> {
        match self {
            Fault::Panic => None,
            Fault::Error => Some(code::USER_ERROR),
            Fault::Recoverable => Some(code::RECOVERABLE_ERROR),
            Fault::Warning => Some(code::USER_WARNING),
            Fault::Notice => Some(code::USER_NOTICE),
            Fault::Strict => Some(code::STRICT),
            Fault::Unknown => Some(UNRECOGNISED_CODE),
        }
    }
}

/// Catcher - process-wide fault interceptor harness
#[derive(Parser, Debug)]
#[command(name = "catcher-cli")]
#[command(version)]
#[command(about = "Install the fault catcher and raise a fault")]
#[command(long_about = None)]
struct Args {
    /// Fault to raise
    #[arg(value_enum)]
    fault: Fault,

    /// Fault message
    #[arg(default_value = "raised from the command line")]
    message: String,

    /// Catcher configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append reports to this file
    #[arg(short, long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Append a backtrace to error reports
    #[arg(short, long)]
    backtrace: bool,

    /// Print reports without display markup
    #[arg(short, long)]
    plain: bool,

    /// Never halt on fatal errors
    #[arg(long)]
    no_halt: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("catcher failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_tracing(&args);

    info!("Catcher v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            CatcherConfig::load(path)?
        }
        None => CatcherConfig::default(),
    };
    if let Some(path) = &args.log_file {
        config.output.log_file = Some(path.clone());
    }
    if args.backtrace {
        config.output.backtrace = true;
    }
    if args.plain {
        config.output.markup = false;
    }
    if args.no_halt {
        config.policy.halt_on_fatal = false;
        config.policy.halt_on_unknown_severity = false;
    }
    config.validate()?;

    let catcher = Catcher::install(config);

    match args.fault.code() {
        Some(raw) => {
            info!(code = raw, "raising {:?}", args.fault);
            catcher::raise(raw, args.message.as_str());
        }
        None => {
            info!("panicking");
            let message = args.message.clone();
            let _ = std::panic::catch_unwind(move || panic!("{message}"));
        }
    }

    if let Some(last) = catcher.last_error().or_else(|| catcher.last_exception()) {
        info!(kind = ?last.kind, "process resumed after fault");
    }
    catcher.teardown();
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
///
/// Logs go to stderr; stdout belongs to the console sink.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
