//! Fusion CLI - Command-line interface for Interview Fusion
//!
//! Commands:
//! - score: Score sessions into full session reports (audits accumulate across the batch)
//! - align: Emit fused windows only
//! - doctor: Diagnose configuration, model backends and audit history

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use interview_fusion::adapter::{parse_sessions_array, parse_sessions_ndjson, SessionInput};
use interview_fusion::audit::AuditState;
use interview_fusion::config::{ENV_DISABLE_MODELS, ENV_WINDOW_SIZE};
use interview_fusion::pipeline::{ScoringService, SessionReport};
use interview_fusion::types::FusedWindow;
use interview_fusion::{
    ComputeError, EncoderBackendKind, FusionConfig, FUSION_VERSION, PRODUCER_NAME,
};

/// Env var holding the tracing filter directive
const LOG_ENV: &str = "FUSION_LOG";

/// Fusion - Multimodal interview scoring engine
#[derive(Parser)]
#[command(name = "fusion")]
#[command(version = FUSION_VERSION)]
#[command(about = "Fuse interview feature streams into session scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score sessions into full session reports
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        model: ModelArgs,

        /// Disable the attention encoder and use the linear fallback
        #[arg(long)]
        no_encoder: bool,

        /// Load audit history from file
        #[arg(long)]
        load_audit: Option<PathBuf>,

        /// Save audit history to file after processing
        #[arg(long)]
        save_audit: Option<PathBuf>,
    },

    /// Align sessions into fused windows without scoring
    Align {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Diagnose configuration and audit history
    Doctor {
        /// Check an audit history file
        #[arg(long)]
        audit_file: Option<PathBuf>,

        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every command that builds a pipeline
#[derive(clap::Args)]
struct ModelArgs {
    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window size in seconds (clamped to 0.5)
    #[arg(long)]
    window_size: Option<f64>,

    /// Pass fused vectors through the learned fusion map
    #[arg(long)]
    learned_fusion: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one session per line)
    Ndjson,
    /// A single session object or a JSON array of sessions
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), FusionCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            model,
            no_encoder,
            load_audit,
            save_audit,
        } => {
            let mut config = build_config(&model)?;
            if no_encoder {
                config.use_attention_encoder = false;
            }
            cmd_score(
                &input,
                &output,
                input_format,
                output_format,
                config,
                load_audit.as_deref(),
                save_audit.as_deref(),
            )
        }

        Commands::Align {
            input,
            output,
            input_format,
            output_format,
            model,
        } => {
            let config = build_config(&model)?;
            cmd_align(&input, &output, input_format, output_format, config)
        }

        Commands::Doctor {
            audit_file,
            config,
            json,
        } => cmd_doctor(audit_file.as_deref(), config.as_deref(), json),
    }
}

/// File config, then environment, then flags
fn build_config(model: &ModelArgs) -> Result<FusionConfig, FusionCliError> {
    let base = match &model.config {
        Some(path) => FusionConfig::from_file(path)?,
        None => FusionConfig::default(),
    };
    let mut config = base.with_env_overrides()?;
    if let Some(window_size) = model.window_size {
        config.window_size_seconds = window_size;
    }
    if model.learned_fusion {
        config.use_learned_fusion = true;
    }
    Ok(config)
}

fn cmd_score(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: FusionConfig,
    load_audit: Option<&Path>,
    save_audit: Option<&Path>,
) -> Result<(), FusionCliError> {
    let sessions = read_sessions(input, &input_format)?;

    let mut service = ScoringService::new(config);
    if let Some(audit_path) = load_audit {
        let audit_json = fs::read_to_string(audit_path)?;
        service.load_audit_history(&audit_json)?;
    }

    let reports: Vec<SessionReport> = sessions.iter().map(|s| service.process(s)).collect();

    if let Some(audit_path) = save_audit {
        fs::write(audit_path, service.save_audit_history()?)?;
    }

    write_output(output, &format_output(&reports, &output_format)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlignedSession {
    session_id: String,
    window_size_seconds: f64,
    learned_fusion: bool,
    windows: Vec<FusedWindow>,
}

fn cmd_align(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: FusionConfig,
) -> Result<(), FusionCliError> {
    let sessions = read_sessions(input, &input_format)?;
    let service = ScoringService::new(config);

    let aligned: Vec<AlignedSession> = sessions
        .iter()
        .map(|session| AlignedSession {
            session_id: session.session_id.clone(),
            window_size_seconds: service.config().effective_window_size(),
            learned_fusion: service.learned_fusion_active(),
            windows: service.align(session),
        })
        .collect();

    write_output(output, &format_output(&aligned, &output_format)?)
}

fn cmd_doctor(
    audit_file: Option<&Path>,
    config_file: Option<&Path>,
    json: bool,
) -> Result<(), FusionCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck::ok(
        "fusion_version",
        format!("{} {}", PRODUCER_NAME, FUSION_VERSION),
    ));

    let config = match config_file {
        Some(path) => match FusionConfig::from_file(path) {
            Ok(config) => {
                checks.push(DoctorCheck::ok("config", format!("{} is valid", path.display())));
                config
            }
            Err(e) => {
                checks.push(DoctorCheck::error("config", e.to_string()));
                FusionConfig::default()
            }
        },
        None => FusionConfig::default(),
    };

    let config = match config.clone().with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            checks.push(DoctorCheck::error("environment", e.to_string()));
            config
        }
    };
    for var in [ENV_DISABLE_MODELS, ENV_WINDOW_SIZE, LOG_ENV] {
        if let Ok(value) = std::env::var(var) {
            checks.push(DoctorCheck::ok("environment", format!("{}={}", var, value)));
        }
    }

    let requested = config.window_size_seconds;
    let effective = config.effective_window_size();
    if requested == effective {
        checks.push(DoctorCheck::ok("window_size", format!("{} s", effective)));
    } else {
        checks.push(DoctorCheck::warning(
            "window_size",
            format!("requested {} s, clamped to {} s", requested, effective),
        ));
    }

    let service = ScoringService::new(config.clone());
    let backend = service.encoder_backend();
    let backend_check = format!("advanced scorer uses the {} encoder", backend.as_str());
    if config.use_attention_encoder && !EncoderBackendKind::Attention.is_available() {
        checks.push(DoctorCheck::warning(
            "encoder",
            format!("{} (built without the learned feature)", backend_check),
        ));
    } else {
        checks.push(DoctorCheck::ok("encoder", backend_check));
    }

    checks.push(match (config.use_learned_fusion, service.learned_fusion_active()) {
        (true, true) => DoctorCheck::ok("learned_fusion", "enabled".to_string()),
        (true, false) => DoctorCheck::warning(
            "learned_fusion",
            "requested but unavailable in this build".to_string(),
        ),
        (false, _) => DoctorCheck::ok("learned_fusion", "disabled".to_string()),
    });

    if let Some(audit_path) = audit_file {
        checks.push(check_audit_file(audit_path, &config));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck::ok("stdin", "stdin is a TTY (interactive mode)".to_string())
    } else {
        DoctorCheck::ok("stdin", "stdin is a pipe (batch input ready)".to_string())
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FUSION_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Fusion Doctor Report");
        println!("====================");
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
        Err(FusionCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_audit_file(path: &Path, config: &FusionConfig) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck::warning("audit_history", "Audit history file does not exist".to_string());
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return DoctorCheck::error(
                "audit_history",
                format!("Cannot read audit history file: {}", e),
            )
        }
    };
    match AuditState::from_json(
        &content,
        config.neutral_history_capacity,
        config.sensitive_history_capacity,
    ) {
        Ok(state) => DoctorCheck::ok(
            "audit_history",
            format!(
                "Audit history valid ({} neutral, {} sensitive samples)",
                state.neutral.sample_count(),
                state.bias.sample_count()
            ),
        ),
        Err(e) => DoctorCheck::error("audit_history", e.to_string()),
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, FusionCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_sessions(input: &Path, format: &InputFormat) -> Result<Vec<SessionInput>, FusionCliError> {
    let data = read_input(input)?;
    let sessions = match format {
        InputFormat::Ndjson => parse_sessions_ndjson(&data)?,
        InputFormat::Json if data.trim_start().starts_with('[') => parse_sessions_array(&data)?,
        InputFormat::Json => vec![interview_fusion::parse_session(&data)?],
    };
    if sessions.is_empty() {
        return Err(FusionCliError::NoSessions);
    }
    Ok(sessions)
}

fn write_output(output: &Path, data: &str) -> Result<(), FusionCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output<T: Serialize>(records: &[T], format: &OutputFormat) -> Result<String, FusionCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

// Error types

#[derive(Debug)]
enum FusionCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoSessions,
    DoctorFailed,
}

impl From<io::Error> for FusionCliError {
    fn from(e: io::Error) -> Self {
        FusionCliError::Io(e)
    }
}

impl From<ComputeError> for FusionCliError {
    fn from(e: ComputeError) -> Self {
        FusionCliError::Compute(e)
    }
}

impl From<serde_json::Error> for FusionCliError {
    fn from(e: serde_json::Error) -> Self {
        FusionCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<FusionCliError> for CliError {
    fn from(e: FusionCliError) -> Self {
        match e {
            FusionCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            FusionCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure input sessions carry sessionId, video, audio and text arrays",
                    ),
                    ComputeError::ConfigError(_) => (
                        "CONFIG_ERROR",
                        "Check the config file and FUSION_* environment variables",
                    ),
                    ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Report serialization failed"),
                    ComputeError::HistoryError(_) => (
                        "HISTORY_ERROR",
                        "Run 'fusion doctor --audit-file <path>' to inspect the history",
                    ),
                };
                CliError::new(code, e.to_string(), hint)
            }
            FusionCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            FusionCliError::NoSessions => CliError::new(
                "NO_SESSIONS",
                "No sessions found in input".to_string(),
                "Ensure input file is not empty",
            ),
            FusionCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
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

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
