//! Aloft CLI - Command-line interface for the Aloft decision engine
//!
//! Commands:
//! - decide: Decide how to respond to one message
//! - proactive: Run the timer-driven outreach check on one snapshot
//! - run: Process a stream of NDJSON requests from stdin
//! - config: Print the default configuration or validate a file
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use aloft::encoder::DecisionEncoder;
use aloft::pipeline::DecisionEngine;
use aloft::types::UserState;
use aloft::{EngineConfig, EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// Aloft - Real-time decision engine for flight-anxiety support
#[derive(Parser)]
#[command(name = "aloft")]
#[command(author = "Aloft Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Decide how to respond to an anxious flyer", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "aloft=trace"); falls back to RUST_LOG, then "warn"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide how to respond to one message
    Decide {
        /// UserState JSON file (use - for stdin)
        #[arg(short, long)]
        state: PathBuf,

        /// Latest user message
        #[arg(short, long, default_value = "")]
        message: String,

        /// Engine configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Wrap the output in a decision envelope
        #[arg(long)]
        envelope: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Run the outreach check on one snapshot
    Proactive {
        /// UserState JSON file (use - for stdin)
        #[arg(short, long)]
        state: PathBuf,

        /// Engine configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the full unsolicited decision instead of the check result
        #[arg(long)]
        full: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Process NDJSON requests from stdin, one result per line
    Run {
        /// Engine configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Wrap decisions in envelopes
        #[arg(long)]
        envelope: bool,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Print the default configuration or validate a configuration file
    Config {
        /// Configuration file to validate
        #[arg(long)]
        validate: Option<PathBuf>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// One line of `run` input. Without a message it is a proactive check.
#[derive(Deserialize)]
struct RunRequest {
    #[serde(default)]
    message: Option<String>,
    state: UserState,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = serde_json::to_string(&CliError::from(e))
                .unwrap_or_else(|_| "Unknown error".to_string());
            eprintln!("{}", report);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only JSON
fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run(cli: Cli) -> Result<(), AloftCliError> {
    match cli.command {
        Commands::Decide {
            state,
            message,
            config,
            envelope,
            output_format,
        } => cmd_decide(&state, &message, config.as_deref(), envelope, output_format),

        Commands::Proactive {
            state,
            config,
            full,
            output_format,
        } => cmd_proactive(&state, config.as_deref(), full, output_format),

        Commands::Run {
            config,
            envelope,
            flush,
        } => cmd_run(config.as_deref(), envelope, flush),

        Commands::Config { validate } => cmd_config(validate.as_deref()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_decide(
    state_path: &Path,
    message: &str,
    config: Option<&Path>,
    envelope: bool,
    output_format: OutputFormat,
) -> Result<(), AloftCliError> {
    let engine = load_engine(config)?;
    let state = read_state(state_path)?;

    let output = engine.decide(message, &state);
    let rendered = if envelope {
        let envelope = DecisionEncoder::new().encode(&state, &output);
        format_output(&envelope, &output_format)?
    } else {
        format_output(&output, &output_format)?
    };

    println!("{}", rendered);
    Ok(())
}

fn cmd_proactive(
    state_path: &Path,
    config: Option<&Path>,
    full: bool,
    output_format: OutputFormat,
) -> Result<(), AloftCliError> {
    let engine = load_engine(config)?;
    let state = read_state(state_path)?;

    let rendered = if full {
        format_output(&engine.proactive_output(&state), &output_format)?
    } else {
        format_output(&engine.check_proactive(&state), &output_format)?
    };

    println!("{}", rendered);
    Ok(())
}

fn cmd_run(config: Option<&Path>, envelope: bool, flush: bool) -> Result<(), AloftCliError> {
    let engine = load_engine(config)?;
    let encoder = DecisionEncoder::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut processed = 0usize;

    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let request: RunRequest = serde_json::from_str(trimmed).map_err(|e| {
            AloftCliError::ParseError(format!(
                "Failed to parse request on line {}: {}",
                index + 1,
                e
            ))
        })?;

        let rendered = match request.message {
            Some(message) => {
                let output = engine.decide(&message, &request.state);
                if envelope {
                    serde_json::to_string(&encoder.encode(&request.state, &output))?
                } else {
                    serde_json::to_string(&output)?
                }
            }
            None => serde_json::to_string(&engine.check_proactive(&request.state))?,
        };

        writeln!(stdout, "{}", rendered)?;
        if flush {
            stdout.flush()?;
        }
        processed += 1;
    }

    stdout.flush()?;
    debug!(processed, "stream finished");
    Ok(())
}

fn cmd_config(validate: Option<&Path>) -> Result<(), AloftCliError> {
    match validate {
        Some(path) => {
            EngineConfig::from_file(path)?;
            println!("{}: valid", path.display());
        }
        None => println!("{}", EngineConfig::default().to_json()?),
    }
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), AloftCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Aloft version {}", ENGINE_VERSION),
    });

    // Check configuration file if provided
    let mut loaded = EngineConfig::default();
    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, defaults will be used".to_string(),
            }
        } else {
            match EngineConfig::from_file(config_path) {
                Ok(parsed) => {
                    let check = DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (bands {}/{}/{}, {} crisis phrases)",
                            parsed.bands.crisis,
                            parsed.bands.high,
                            parsed.bands.moderate,
                            parsed.phrases.crisis.len()
                        ),
                    };
                    loaded = parsed;
                    check
                }
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", e),
                },
            }
        };
        checks.push(check);
    }

    checks.push(phrase_check(&loaded));

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Aloft Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AloftCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

/// An empty crisis or catastrophic list silently disables a safety gate
fn phrase_check(config: &EngineConfig) -> DoctorCheck {
    let phrases = &config.phrases;
    let empty: Vec<&str> = [
        ("crisis", phrases.crisis.is_empty()),
        ("catastrophic", phrases.catastrophic.is_empty()),
    ]
    .into_iter()
    .filter_map(|(name, empty)| empty.then_some(name))
    .collect();

    if empty.is_empty() {
        DoctorCheck {
            name: "phrases".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} crisis and {} catastrophic phrases",
                phrases.crisis.len(),
                phrases.catastrophic.len()
            ),
        }
    } else {
        DoctorCheck {
            name: "phrases".to_string(),
            status: CheckStatus::Warning,
            message: format!("Empty phrase list: {}", empty.join(", ")),
        }
    }
}

fn load_engine(config: Option<&Path>) -> Result<DecisionEngine, AloftCliError> {
    let engine = match config {
        Some(path) => DecisionEngine::with_config(EngineConfig::from_file(path)?)?,
        None => DecisionEngine::new(),
    };
    Ok(engine)
}

fn read_state(path: &Path) -> Result<UserState, AloftCliError> {
    let data = if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&data)?)
}

fn format_output<T: Serialize>(value: &T, format: &OutputFormat) -> Result<String, AloftCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum AloftCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for AloftCliError {
    fn from(e: io::Error) -> Self {
        AloftCliError::Io(e)
    }
}

impl From<EngineError> for AloftCliError {
    fn from(e: EngineError) -> Self {
        AloftCliError::Engine(e)
    }
}

impl From<serde_json::Error> for AloftCliError {
    fn from(e: serde_json::Error) -> Self {
        AloftCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AloftCliError> for CliError {
    fn from(e: AloftCliError) -> Self {
        match e {
            AloftCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AloftCliError::Engine(EngineError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'aloft config' to see every option and its default".to_string()),
            },
            AloftCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the state matches the UserState shape".to_string()),
            },
            AloftCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AloftCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            AloftCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some(
                    "Each line must be {\"message\"?: string, \"state\": UserState}".to_string(),
                ),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Debug, PartialEq, Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
