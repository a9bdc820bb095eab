//! CLI argument definitions
//!
//! All Clap derive structs for `cvpipeline` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Interactive résumé staged as a self-healing CI pipeline.
#[derive(Parser, Debug)]
#[command(name = "cvpipeline", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CVPIPELINE_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "CVPIPELINE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play the narrative in the terminal.
    Play(PlayArgs),

    /// Write the healthy résumé as a Markdown document.
    Export(ExportArgs),

    /// Validate configuration files without playing.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Play
// ============================================================================

/// Arguments for `play`.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "CVPIPELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Résumé dataset replacing the built-in one.
    #[arg(long, env = "CVPIPELINE_RESUME")]
    pub resume: Option<PathBuf>,

    /// Issue each awaited command automatically.
    #[arg(long, conflicts_with = "skip")]
    pub auto: bool,

    /// Delay before an automatic command (with --auto).
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration, requires = "auto")]
    pub think: Duration,

    /// Skip straight to the healthy résumé.
    #[arg(long)]
    pub skip: bool,

    /// Playback speed multiplier (overrides `timing.speed`).
    #[arg(long)]
    pub speed: Option<f64>,

    /// Do not call the page-view counter.
    #[arg(long)]
    pub no_visits: bool,

    /// Write structured session events (JSONL) to this file.
    #[arg(long, env = "CVPIPELINE_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "CVPIPELINE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Write the document here once the pipeline is green.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

// ============================================================================
// Export / Validate
// ============================================================================

/// Arguments for `export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Résumé dataset replacing the built-in one.
    #[arg(long, env = "CVPIPELINE_RESUME")]
    pub resume: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
