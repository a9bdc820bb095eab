//! User commands accepted by the narrative
//!
//! The four buttons of the page, parsed from terminal input. Each is
//! gated by the controller; parsing only decides which one was meant.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A user-invocable narrative command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// "Review logs": leave the failure alert.
    Start,
    /// "View BDD scenarios": open the scenario file from the console.
    OpenScenarios,
    /// "Report bug": file the defect once evaluation finished.
    ReportDefect,
    /// "Skip to full CV": jump straight to the end.
    Skip,
}

impl Command {
    /// All commands in the order they appear in the narrative.
    pub const ALL: [Self; 4] = [Self::Start, Self::OpenScenarios, Self::ReportDefect, Self::Skip];

    /// Primary input keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::OpenScenarios => "scenarios",
            Self::ReportDefect => "report",
            Self::Skip => "skip",
        }
    }

    /// Button caption used by the renderer.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Start => "REVIEW LOGS (Heal CV)",
            Self::OpenScenarios => "VIEW BDD SCENARIOS",
            Self::ReportDefect => "REPORT BUG TO JIRA",
            Self::Skip => "SKIP TO FULL CV",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Start => &["review", "logs"],
            Self::OpenScenarios => &["bdd", "gherkin"],
            Self::ReportDefect => &["bug", "jira"],
            Self::Skip => &["ff"],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Input that did not name any command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand {
    /// Trimmed input
    pub input: String,
    /// Closest keyword, if any is close enough
    pub suggestion: Option<&'static str>,
}

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}'", self.input)?;
        if let Some(s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.keyword() == input || c.aliases().contains(&input.as_str()))
            .ok_or_else(|| UnknownCommand {
                suggestion: suggest_keyword(&input, Self::ALL.map(Self::keyword).as_slice()),
                input,
            })
    }
}

/// Suggests the closest keyword for typo correction.
///
/// Returns the closest match if its Damerau-Levenshtein distance is ≤ 2.
#[must_use]
pub fn suggest_keyword(input: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords
        .iter()
        .map(|k| (*k, strsim::damerau_levenshtein(input, k)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
        .map(|(k, _)| k)
}
