//! Triage CLI - Command-line interface for the TeenCare risk engine
//!
//! Commands:
//! - score: Score quiz telemetry
//! - report: Aggregate a session document into a report or export envelope
//! - chat: Run an interactive conversational intake on stdin
//! - questions: Print decision-task scenarios
//! - doctor: Diagnose configuration and model availability

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use teencare_risk::config::EngineConfig;
use teencare_risk::encoder::ReportEncoder;
use teencare_risk::model::OllamaClient;
use teencare_risk::pipeline::{generate_summary, SessionAssessor};
use teencare_risk::quiz::{score_quiz, QuizData};
use teencare_risk::types::{ChatTurn, RawSessionData, SessionInput, SessionRecord, SourceKind};
use teencare_risk::{AssessmentError, ENGINE_VERSION, PRODUCER_NAME};

const DEFAULT_LOG_FILTER: &str = "teencare_risk=info";

/// Triage - Session risk assessment for adolescent wellbeing screening
#[derive(Parser)]
#[command(name = "triage")]
#[command(author = "TeenCare")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score screening quizzes and run conversational intakes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score quiz telemetry
    Score {
        /// Quiz JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Chat transcript JSON file, used for emotional bias
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Aggregate a {source, raw_data} session document
    Report {
        /// Session JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Emit an export envelope for this participant instead of the bare report
        #[arg(long)]
        participant: Option<String>,
    },

    /// Run an interactive conversational intake on stdin
    Chat {
        #[command(flatten)]
        model: ModelArgs,

        /// Participant whose session record is written on exit
        #[arg(long, default_value = "anonymous")]
        participant: String,

        /// Write the completed session envelope to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Print decision-task scenarios as JSON
    Questions {
        #[command(flatten)]
        model: ModelArgs,

        /// Context to tailor the scenarios to
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Diagnose configuration and model availability
    Doctor {
        #[command(flatten)]
        model: ModelArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Model and policy configuration shared by commands that talk to a model
#[derive(Args)]
struct ModelArgs {
    /// Engine config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model endpoint base URL (enables the model)
    #[arg(long)]
    model_url: Option<String>,

    /// Model name
    #[arg(long)]
    model_name: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Use the fallback policy only
    #[arg(long)]
    no_model: bool,
}

impl ModelArgs {
    /// Config file, then environment, then flags
    fn load(&self) -> Result<EngineConfig, TriageCliError> {
        let base = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        let mut config = base.with_env_overrides()?;

        if let Some(url) = &self.model_url {
            config.model_url = url.clone();
            config.model_enabled = true;
        }
        if let Some(name) = &self.model_name {
            config.model_name = name.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if self.no_model {
            config.model_enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TriageCliError> {
    match cli.command {
        Commands::Score { input, transcript } => cmd_score(&input, transcript.as_deref()),

        Commands::Report { input, participant } => cmd_report(&input, participant.as_deref()),

        Commands::Chat {
            model,
            participant,
            save,
        } => cmd_chat(&model.load()?, &participant, save.as_deref()),

        Commands::Questions { model, context } => cmd_questions(&model.load()?, &context),

        Commands::Doctor { model, json } => cmd_doctor(&model, json),
    }
}

fn read_input(input: &Path) -> Result<String, TriageCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn cmd_score(input: &Path, transcript: Option<&Path>) -> Result<(), TriageCliError> {
    let quiz: QuizData = serde_json::from_str(&read_input(input)?)?;

    let turns: Vec<ChatTurn> = match transcript {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let assessment = score_quiz(&quiz, &turns);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn cmd_report(input: &Path, participant: Option<&str>) -> Result<(), TriageCliError> {
    let session: SessionInput = serde_json::from_str(&read_input(input)?)
        .map_err(|e| TriageCliError::ParseError(format!("Invalid session document: {}", e)))?;

    match participant {
        Some(participant) => {
            let mut record = SessionRecord::new(participant, session.source, session.raw_data);
            record.complete();
            println!("{}", ReportEncoder::new().encode_to_json(&record)?);
        }
        None => {
            let report = generate_summary(session.source, &session.raw_data);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn cmd_chat(config: &EngineConfig, participant: &str, save: Option<&Path>) -> Result<(), TriageCliError> {
    let assessor = SessionAssessor::new(config);
    let mut session = assessor.start_triage();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if atty::is(atty::Stream::Stdin) {
        writeln!(stdout, "(type your message and press enter; Ctrl-D to quit)")?;
    }

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let reply = assessor.triage_turn(&mut session, trimmed);
        writeln!(stdout, "{}", reply.display)?;
        stdout.flush()?;

        if session.state().is_terminal() {
            break;
        }
    }

    if let Some(path) = save {
        let mut record = SessionRecord::new(participant, SourceKind::Chat, RawSessionData::default());
        assessor.attach_triage(&mut record, &session);
        fs::write(path, assessor.complete_record(&mut record)?)?;
    }

    Ok(())
}

fn cmd_questions(config: &EngineConfig, context: &str) -> Result<(), TriageCliError> {
    let assessor = SessionAssessor::new(config);
    let questions = assessor.questions(context);
    println!("{}", serde_json::to_string_pretty(&questions)?);
    Ok(())
}

fn cmd_doctor(args: &ModelArgs, json: bool) -> Result<(), TriageCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    match args.load() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!("Config valid (closing depth {})", config.closing_depth),
            });
            checks.push(model_check(&config));
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            });
        }
    }

    // Check stdin is available (for chat mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive chat)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (scripted chat ready)".to_string(),
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
        println!("Triage Doctor Report");
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
        Err(TriageCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

/// An unreachable model only degrades replies, so it is a warning
fn model_check(config: &EngineConfig) -> DoctorCheck {
    if !config.model_enabled {
        return DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: "Model disabled; replies use the fallback policy".to_string(),
        };
    }

    let status = OllamaClient::from_config(config).and_then(|client| client.is_model_available());
    match status {
        Ok(true) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} available at {}", config.model_name, config.model_url),
        },
        Ok(false) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} is not installed at {}", config.model_name, config.model_url),
        },
        Err(e) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: format!("Model endpoint unavailable: {}", e),
        },
    }
}

// Error types

#[derive(Debug)]
enum TriageCliError {
    Io(io::Error),
    Engine(AssessmentError),
    Json(serde_json::Error),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for TriageCliError {
    fn from(e: io::Error) -> Self {
        TriageCliError::Io(e)
    }
}

impl From<AssessmentError> for TriageCliError {
    fn from(e: AssessmentError) -> Self {
        TriageCliError::Engine(e)
    }
}

impl From<serde_json::Error> for TriageCliError {
    fn from(e: serde_json::Error) -> Self {
        TriageCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TriageCliError> for CliError {
    fn from(e: TriageCliError) -> Self {
        match e {
            TriageCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TriageCliError::Engine(AssessmentError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the config file and TEENCARE_* environment variables".to_string()),
            },
            TriageCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a {source, raw_data} session document".to_string()),
            },
            TriageCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TriageCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            TriageCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
