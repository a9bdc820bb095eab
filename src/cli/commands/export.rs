//! Document export command
//!
//! Writes the healthy résumé without playing the narrative.

use std::io::Write;

use crate::cli::args::ExportArgs;
use crate::collaborators::{render_markdown, write_document};
use crate::content::Resume;
use crate::error::CvPipelineError;

/// Render the résumé to `--output`, or stdout.
///
/// # Errors
///
/// Returns a config error if the dataset cannot be loaded, or an export
/// error if the file cannot be written.
pub fn run(args: &ExportArgs) -> Result<(), CvPipelineError> {
    let resume = Resume::load_or_builtin(args.resume.as_deref())?;

    match &args.output {
        Some(path) => write_document(&resume, path)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(render_markdown(&resume).as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
