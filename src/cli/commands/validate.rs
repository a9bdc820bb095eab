//! Configuration validation command
//!
//! Loads every file through the regular loader and reports all issues,
//! in human or JSON form. `--strict` promotes warnings to errors.

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, CvPipelineError, Severity, ValidationIssue};

#[derive(Debug, Serialize)]
struct IssueReport {
    path: String,
    message: String,
}

impl From<&ValidationIssue> for IssueReport {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: issue.path.clone(),
            message: issue.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<IssueReport>,
    warnings: Vec<IssueReport>,
}

/// Validate each configuration file.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every error if any file
/// is invalid.
pub fn run(args: &ValidateArgs) -> Result<(), CvPipelineError> {
    let loader = ConfigLoader::with_defaults().without_env();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut failed: Vec<ValidationIssue> = Vec::new();

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let file = path.display().to_string();

        let (mut errors, mut warnings) = match loader.load(path) {
            Ok(result) => (Vec::new(), result.warnings),
            Err(ConfigError::ValidationError { errors, .. }) => (errors, Vec::new()),
            Err(e) => (
                vec![ValidationIssue {
                    path: file.clone(),
                    message: e.to_string(),
                    severity: Severity::Error,
                }],
                Vec::new(),
            ),
        };
        if args.strict {
            errors.extend(warnings.drain(..).map(|w| ValidationIssue {
                severity: Severity::Error,
                ..w
            }));
        }

        reports.push(FileReport {
            file,
            valid: errors.is_empty(),
            errors: errors.iter().map(IssueReport::from).collect(),
            warnings: warnings.iter().map(IssueReport::from).collect(),
        });
        failed.extend(errors);
    }

    match args.format {
        OutputFormat::Human => print_human(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    if failed.is_empty() {
        Ok(())
    } else {
        let files: Vec<&str> = reports
            .iter()
            .filter(|r| !r.valid)
            .map(|r| r.file.as_str())
            .collect();
        Err(ConfigError::ValidationError {
            path: files.join(", "),
            errors: failed,
        }
        .into())
    }
}

fn print_human(reports: &[FileReport]) {
    for report in reports {
        if report.valid {
            println!("✓ {}", report.file);
        } else {
            println!("✘ {}", report.file);
        }
        for issue in &report.errors {
            println!("    error: {} at {}", issue.message, issue.path);
        }
        for issue in &report.warnings {
            println!("    warning: {} at {}", issue.message, issue.path);
        }
    }
}
