//! Résumé content
//!
//! The dataset behind the page. A built-in copy is embedded at compile
//! time; a file can replace it. [`Resume::degraded`] derives the corrupted
//! rendition shown while the pipeline is broken, matching the defects the
//! failure report and the ticket describe.

use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Embedded dataset.
const BUILTIN_YAML: &str = include_str!("../../data/resume.yaml");

static BUILTIN: LazyLock<Result<Resume, String>> =
    LazyLock::new(|| serde_yaml::from_str(BUILTIN_YAML).map_err(|e| e.to_string()));

// ============================================================================
// Types
// ============================================================================

/// The full résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resume {
    /// Full name
    pub name: String,
    /// Role headline
    pub roles: String,
    /// Location line
    pub location: String,
    /// Phone number
    pub phone: String,
    /// Contact email
    pub email: String,
    /// Citizenship note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizenship: Option<String>,
    /// `LinkedIn` profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    /// Version badge
    pub version: String,
    /// "Updated" label
    pub last_updated: String,
    /// Quoted motto above the summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motto: Option<String>,
    /// Summary paragraphs
    #[serde(default)]
    pub summary: Vec<String>,
    /// Work experience, newest first
    #[serde(default)]
    pub experience: Vec<Experience>,
    /// Certifications
    #[serde(default)]
    pub certifications: Vec<Certification>,
    /// Formal education
    #[serde(default)]
    pub education: Vec<Education>,
    /// Tools and languages
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Featured repositories
    #[serde(default)]
    pub repositories: Vec<Repository>,
    /// Project showcase block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showcase: Option<Showcase>,
}

/// One job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Experience {
    /// Role title
    pub role: String,
    /// Employer and customers
    pub company: String,
    /// Date range
    pub dates: String,
    /// Bullet points
    #[serde(default)]
    pub details: Vec<String>,
    /// Technology tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Certification {
    /// Course or certificate title
    pub title: String,
    /// Issuing body
    pub issuer: String,
    /// Issue date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Credential identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Verification link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A degree or diploma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Education {
    /// Degree title
    pub title: String,
    /// School
    pub institution: String,
    /// Date or range
    pub dates: String,
}

/// A featured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Link
    pub url: String,
    /// One-line description
    pub description: String,
}

/// Showcase block at the bottom of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Showcase {
    /// Block title
    pub title: String,
    /// Block text
    pub description: String,
}

// ============================================================================
// Loading
// ============================================================================

impl Resume {
    /// Returns the embedded dataset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the embedded YAML is invalid.
    pub fn builtin() -> Result<&'static Self, ConfigError> {
        BUILTIN.as_ref().map_err(|message| ConfigError::ParseError {
            path: "<builtin>".into(),
            line: None,
            message: message.clone(),
        })
    }

    /// Loads a dataset from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFile` if the file cannot be read,
    /// `ConfigError::ParseError` for invalid YAML and
    /// `ConfigError::InvalidValue` if the name is empty.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let resume: Self = serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;
        if resume.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "name".to_string(),
                value: String::new(),
                expected: "a non-empty name".to_string(),
            });
        }
        tracing::debug!(path = %path.display(), jobs = resume.experience.len(), "résumé loaded");
        Ok(resume)
    }

    /// Loads `path` when given, otherwise clones the embedded dataset.
    ///
    /// # Errors
    ///
    /// See [`Self::load`] and [`Self::builtin`].
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin().cloned(),
        }
    }

    // ========================================================================
    // Degraded rendition
    // ========================================================================

    /// The corrupted copy shown while the deployment is broken.
    ///
    /// Header fields are garbled, the summary is a stack trace, only the
    /// first job survives (with placeholder data) and every other section
    /// is missing.
    #[must_use]
    pub fn degraded(&self) -> Self {
        Self {
            name: "Sizilia Ponse M.".to_string(),
            roles: "Junior Manual Tester".to_string(),
            location: "Undefined Location".to_string(),
            phone: "555-0000-ERROR".to_string(),
            email: "null@undefined.com".to_string(),
            citizenship: None,
            linkedin: None,
            version: self.version.clone(),
            last_updated: self.last_updated.clone(),
            motto: None,
            summary: vec![
                "Exception in thread \"main\" java.lang.NullPointerException".to_string(),
                "growth + learning = NaN".to_string(),
            ],
            experience: self
                .experience
                .first()
                .map(|_| Experience {
                    role: "Manual Tester".to_string(),
                    company: "Unknown Corp".to_string(),
                    dates: "1990 - 1991".to_string(),
                    details: Vec::new(),
                    tags: Vec::new(),
                })
                .into_iter()
                .collect(),
            certifications: Vec::new(),
            education: Vec::new(),
            tech_stack: Vec::new(),
            repositories: Vec::new(),
            showcase: None,
        }
    }
}
