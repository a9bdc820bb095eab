//! Document export.
//!
//! The "download" action: the healthy résumé rendered as a Markdown
//! document. Only offered once the pipeline is green.

use std::fmt::Write as _;
use std::path::Path;

use crate::content::Resume;
use crate::error::ExportError;
use crate::phase::ViewFlags;

/// Default file name for the exported document.
pub const DEFAULT_EXPORT_NAME: &str = "resume.md";

/// Renders `resume` as Markdown.
#[must_use]
pub fn render_markdown(resume: &Resume) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", resume.name);
    let _ = writeln!(out, "**{}**\n", resume.roles);

    let mut contact = vec![
        resume.location.clone(),
        resume.phone.clone(),
        resume.email.clone(),
    ];
    if let Some(linkedin) = &resume.linkedin {
        contact.push(linkedin.clone());
    }
    let _ = writeln!(out, "{}\n", contact.join(" | "));
    if let Some(citizenship) = &resume.citizenship {
        let _ = writeln!(out, "{citizenship}\n");
    }

    if !resume.summary.is_empty() {
        out.push_str("## Professional Summary\n\n");
        if let Some(motto) = &resume.motto {
            let _ = writeln!(out, "> {motto}\n");
        }
        for paragraph in &resume.summary {
            let _ = writeln!(out, "{paragraph}\n");
        }
    }

    if !resume.experience.is_empty() {
        out.push_str("## Work Experience\n\n");
        for job in &resume.experience {
            let _ = writeln!(out, "### {}\n", job.role);
            let _ = writeln!(out, "*{}* | {}\n", job.company, job.dates);
            for detail in &job.details {
                let _ = writeln!(out, "- {detail}");
            }
            if !job.tags.is_empty() {
                let _ = writeln!(out, "\nStack: {}", job.tags.join(", "));
            }
            out.push('\n');
        }
    }

    if !resume.certifications.is_empty() {
        out.push_str("## Certifications\n\n");
        for cert in &resume.certifications {
            let _ = write!(out, "- **{}**, {}", cert.title, cert.issuer);
            if let Some(date) = &cert.date {
                let _ = write!(out, " ({date})");
            }
            if let Some(id) = &cert.credential_id {
                let _ = write!(out, ". Credential {id}");
            }
            if let Some(url) = &cert.url {
                let _ = write!(out, ". <{url}>");
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !resume.education.is_empty() {
        out.push_str("## Education\n\n");
        for entry in &resume.education {
            let _ = writeln!(
                out,
                "- **{}**, {} ({})",
                entry.title, entry.institution, entry.dates
            );
        }
        out.push('\n');
    }

    if !resume.tech_stack.is_empty() {
        out.push_str("## Tech Stack\n\n");
        let _ = writeln!(out, "{}\n", resume.tech_stack.join(", "));
    }

    if !resume.repositories.is_empty() {
        out.push_str("## Repositories\n\n");
        for repo in &resume.repositories {
            let _ = writeln!(out, "- [{}]({}): {}", repo.name, repo.url, repo.description);
        }
        out.push('\n');
    }

    if let Some(showcase) = &resume.showcase {
        let _ = writeln!(out, "## {}\n\n{}\n", showcase.title, showcase.description);
    }

    let _ = writeln!(
        out,
        "---\n{} | Updated {}",
        resume.version, resume.last_updated
    );
    out
}

/// Writes the Markdown document to `path`.
///
/// # Errors
///
/// Returns `ExportError::Write` if the file cannot be written.
pub fn write_document(resume: &Resume, path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, render_markdown(resume)).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "document exported");
    Ok(())
}

/// The download action: writes the document if the page is healthy.
///
/// # Errors
///
/// Returns `ExportError::NotReady` while the degraded view is shown, or
/// `ExportError::Write` if the file cannot be written.
pub fn export_document(view: &ViewFlags, resume: &Resume, path: &Path) -> Result<(), ExportError> {
    if view.is_degraded_view {
        return Err(ExportError::NotReady);
    }
    write_document(resume, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{NarrativeState, Phase, project};

    fn resume() -> &'static Resume {
        Resume::builtin().unwrap()
    }

    #[test]
    fn test_markdown_has_sections() {
        let md = render_markdown(resume());
        assert!(md.starts_with("# Cecilia Ponce Molinas\n"));
        for heading in [
            "## Professional Summary",
            "## Work Experience",
            "## Certifications",
            "## Education",
            "## Tech Stack",
            "## Repositories",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert_eq!(md.matches("\n### ").count(), resume().experience.len());
    }

    #[test]
    fn test_degraded_markdown_omits_sections() {
        let md = render_markdown(&resume().degraded());
        assert!(md.contains("Sizilia Ponse M."));
        assert!(!md.contains("## Education"));
        assert!(!md.contains("## Tech Stack"));
    }

    #[test]
    fn test_export_refused_while_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let view = project(&NarrativeState::default());
        assert!(matches!(
            export_document(&view, resume(), &path),
            Err(ExportError::NotReady)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_when_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let state = NarrativeState {
            phase: Phase::Fixed,
            ..NarrativeState::default()
        };
        export_document(&project(&state), resume(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## Work Experience"));
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("cv.md");
        assert!(matches!(
            write_document(resume(), &path),
            Err(ExportError::Write { .. })
        ));
    }
}
