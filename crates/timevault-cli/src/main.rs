// crates/timevault-cli/src/main.rs
// ============================================================================
// Module: Timevault CLI Entry Point
// Description: Command dispatcher for backup lifecycle operations.
// Purpose: Drive the backup engine from the command line with JSON summaries.
// Dependencies: clap, serde, serde_json, thiserror, timevault-core,
// timevault-engine.
// ============================================================================

//! ## Overview
//! The Timevault CLI wraps the backup engine behind four subcommands: capture
//! a dump, restore a dump, verify a dump read-only, and prune expired dumps.
//! Every command emits a machine-readable JSON summary by default, with a
//! human-readable text alternative. Exit codes are the contract: success only
//! when the operation completed and, for `verify`, the dump is valid.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use timevault_core::VerificationResult;
use timevault_engine::BackupEngine;
use timevault_engine::BackupOutcome;
use timevault_engine::EngineConfig;
use timevault_engine::RestoreOutcome;
use timevault_engine::SweepOutcome;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "timevault", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture a full backup of the attendance database.
    Backup(BackupCommand),
    /// Restore a backup file, replacing all current data.
    Restore(RestoreCommand),
    /// Verify a backup file without touching the database.
    Verify(VerifyCommand),
    /// Delete expired backup files from the backup directory.
    Prune(PruneCommand),
}

/// Database and backup-directory location inputs.
#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Optional config file path (TOML engine configuration).
    #[arg(long, value_name = "PATH", conflicts_with = "db")]
    config: Option<PathBuf>,
    /// Direct database file path (defaults applied for everything else).
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Override the backup directory.
    #[arg(long = "backup-dir", value_name = "DIR")]
    backup_dir: Option<PathBuf>,
}

/// Output formats for command summaries.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Machine-readable JSON output.
    Json,
    /// Human-readable text output.
    Text,
}

/// Arguments for `backup`.
#[derive(Args, Debug)]
struct BackupCommand {
    /// Store location settings.
    #[command(flatten)]
    store: StoreArgs,
    /// Optional destination path (defaults to a timestamped file in the
    /// backup directory).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Output format for the capture summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments for `restore`.
#[derive(Args, Debug)]
struct RestoreCommand {
    /// Store location settings.
    #[command(flatten)]
    store: StoreArgs,
    /// Backup file to restore.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Output format for the restore summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Store location settings.
    #[command(flatten)]
    store: StoreArgs,
    /// Backup file to verify.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Output format for the verification report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments for `prune`.
#[derive(Args, Debug)]
struct PruneCommand {
    /// Store location settings.
    #[command(flatten)]
    store: StoreArgs,
    /// Override the retention horizon in days.
    #[arg(long = "retention-days", value_name = "DAYS")]
    retention_days: Option<u32>,
    /// Output format for the sweep summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Backup(command) => command_backup(command),
        Commands::Restore(command) => command_restore(command),
        Commands::Verify(command) => command_verify(command),
        Commands::Prune(command) => command_prune(command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `backup` command.
fn command_backup(command: BackupCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.store, None)?;
    let outcome = match command.output {
        Some(destination) => engine.create_backup(&destination),
        None => engine.create_backup_auto(),
    }
    .map_err(|err| CliError::new(format!("backup failed: {err}")))?;
    emit_backup_summary(&outcome, command.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `restore` command.
fn command_restore(command: RestoreCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.store, None)?;
    let outcome = engine
        .restore_backup(&command.input)
        .map_err(|err| CliError::new(format!("restore failed: {err}")))?;
    emit_restore_summary(&outcome, command.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `verify` command.
///
/// Exits with failure when the dump is invalid so scripts can gate on it.
fn command_verify(command: VerifyCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.store, None)?;
    let report = engine.verify_backup(&command.input);
    emit_verify_report(&report, command.format)?;
    if report.is_valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Executes the `prune` command.
fn command_prune(command: PruneCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.store, command.retention_days)?;
    let outcome = engine
        .delete_old_backups()
        .map_err(|err| CliError::new(format!("prune failed: {err}")))?;
    emit_sweep_summary(&outcome, command.format)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Engine Setup
// ============================================================================

/// Resolves an engine configuration from CLI inputs and opens the engine.
fn open_engine(store: &StoreArgs, retention_days: Option<u32>) -> CliResult<BackupEngine> {
    let mut config = match (&store.config, &store.db) {
        (Some(path), _) => EngineConfig::from_toml_path(path)
            .map_err(|err| CliError::new(format!("config load failed: {err}")))?,
        (None, Some(db_path)) => EngineConfig::new(db_path),
        (None, None) => {
            return Err(CliError::new("either --config or --db is required".to_string()));
        }
    };
    if let Some(dir) = &store.backup_dir {
        config.backup_dir = dir.clone();
    }
    if let Some(days) = retention_days {
        config.retention_days = days;
    }
    config
        .validate()
        .map_err(|err| CliError::new(format!("invalid configuration: {err}")))?;
    BackupEngine::new(config)
        .map_err(|err| CliError::new(format!("engine startup failed: {err}")))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Emits a capture summary in the selected format.
fn emit_backup_summary(outcome: &BackupOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => emit_json(outcome),
        OutputFormat::Text => {
            emit_line(&format!(
                "backup complete: {} records written to {}",
                outcome.records,
                outcome.path.display()
            ))?;
            emit_warning_lines(&outcome.warnings)
        }
    }
}

/// Emits a restore summary in the selected format.
fn emit_restore_summary(outcome: &RestoreOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => emit_json(outcome),
        OutputFormat::Text => {
            emit_line(&format!(
                "restore complete: {} applied, {} skipped, {} failed",
                outcome.applied, outcome.skipped, outcome.failed
            ))?;
            emit_warning_lines(&outcome.warnings)
        }
    }
}

/// Emits a verification report in the selected format.
fn emit_verify_report(report: &VerificationResult, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => emit_json(report),
        OutputFormat::Text => {
            let verdict = if report.is_valid { "valid" } else { "invalid" };
            emit_line(&format!(
                "backup is {verdict}: {} statements parsed, {} declared",
                report.statements_parsed,
                report.declared_total.map_or_else(|| "no".to_string(), |n| n.to_string())
            ))?;
            for error in &report.errors {
                emit_line(&format!("error: {error}"))?;
            }
            emit_warning_lines(&report.warnings)
        }
    }
}

/// Emits a sweep summary in the selected format.
fn emit_sweep_summary(outcome: &SweepOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => emit_json(outcome),
        OutputFormat::Text => {
            emit_line(&format!(
                "prune complete: {} deleted, {} retained",
                outcome.deleted, outcome.retained
            ))?;
            emit_warning_lines(&outcome.warnings)
        }
    }
}

/// Serializes a summary value as pretty JSON on stdout.
fn emit_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("summary serialization failed: {err}")))?;
    emit_line(&text)
}

/// Writes warning lines to stdout.
fn emit_warning_lines(warnings: &[String]) -> CliResult<()> {
    for warning in warnings {
        emit_line(&format!("warning: {warning}"))?;
    }
    Ok(())
}

/// Writes one line to stdout.
fn emit_line(text: &str) -> CliResult<()> {
    write_stdout_line(text).map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes one line to stdout through an explicit handle.
fn write_stdout_line(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.write_all(b"\n")
}

/// Writes an error line to stderr and returns the failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(b"error: ");
    let _ = stderr.write_all(message.as_bytes());
    let _ = stderr.write_all(b"\n");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
