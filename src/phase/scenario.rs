//! BDD scenario script
//!
//! The feature file shown in the scenario overlay. The same eight lines
//! are read by two phases with opposite outcomes: while the defect is
//! present the sensitive lines fail, after the fix they pass. That
//! reinterpretation lives only in [`verdict`].

use serde::Serialize;

use super::state::Phase;

/// File name displayed in the overlay title.
pub const FEATURE_FILE: &str = "cv-validations.feature";

/// Feature title.
pub const FEATURE_TITLE: &str = "Feature: Full CV Rendering Validation";

/// One evaluated line of the feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioLine {
    /// 1-based position, compared against the scenario counter
    pub number: u8,
    /// Gherkin text
    pub text: &'static str,
    /// Whether the line fails while the defect is present
    pub defect_sensitive: bool,
}

/// A titled group of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario title
    pub title: &'static str,
    /// Lines in evaluation order
    pub lines: &'static [ScenarioLine],
}

const fn line(number: u8, text: &'static str, defect_sensitive: bool) -> ScenarioLine {
    ScenarioLine {
        number,
        text,
        defect_sensitive,
    }
}

/// The three scenarios, eight lines in total.
pub const SCENARIOS: [Scenario; 3] = [
    Scenario {
        title: "Verify Candidate Core Profile",
        lines: &[
            line(1, "Given the user accesses the CV portal", false),
            line(
                2,
                "Then the profile name should be \"Cecilia Ponce Molinas\"",
                true,
            ),
            line(3, "And the role should match \"QA Architect\"", true),
        ],
    },
    Scenario {
        title: "Verify Work Experience Complete List",
        lines: &[
            line(4, "Given the profile is loaded", false),
            line(5, "When I check the experience section", false),
            line(6, "Then there should be at least 11 job entries visible", true),
        ],
    },
    Scenario {
        title: "Verify Tech Stack Rendering",
        lines: &[
            line(7, "Then the tech stack container should be visible", true),
            line(
                8,
                "And it should contain \"WebdriverIO\" and \"Playwright\"",
                true,
            ),
        ],
    },
];

/// Iterates all lines in evaluation order.
pub fn lines() -> impl Iterator<Item = &'static ScenarioLine> {
    SCENARIOS.iter().flat_map(|s| s.lines.iter())
}

/// Outcome shown next to an evaluated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Line passed.
    Pass,
    /// Line failed.
    Fail,
}

impl Verdict {
    /// Glyph used by the renderer.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Pass => "✓ PASS",
            Self::Fail => "✘ FAIL",
        }
    }
}

/// Returns `true` while the corrupted résumé is still deployed.
#[must_use]
pub const fn defect_present(phase: Phase) -> bool {
    phase.index() < Phase::PipelineRunPass.index()
}

/// Verdict of `line` given the reading phase and the scenario counter.
///
/// `None` means the line has not been evaluated yet.
#[must_use]
pub const fn verdict(phase: Phase, step: u8, line: &ScenarioLine) -> Option<Verdict> {
    if step < line.number {
        None
    } else if line.defect_sensitive && defect_present(phase) {
        Some(Verdict::Fail)
    } else {
        Some(Verdict::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::state::SCENARIO_STEPS;

    #[test]
    fn test_eight_lines_numbered_in_order() {
        let numbers: Vec<u8> = lines().map(|l| l.number).collect();
        assert_eq!(numbers, (1..=SCENARIO_STEPS).collect::<Vec<_>>());
    }

    #[test]
    fn test_sensitive_lines() {
        let sensitive: Vec<u8> = lines()
            .filter(|l| l.defect_sensitive)
            .map(|l| l.number)
            .collect();
        assert_eq!(sensitive, vec![2, 3, 6, 7, 8]);
    }

    #[test]
    fn test_unevaluated_lines_have_no_verdict() {
        for l in lines() {
            assert_eq!(verdict(Phase::Gherkin, l.number - 1, l), None);
        }
    }

    #[test]
    fn test_failing_rendition() {
        let fails = lines()
            .filter(|l| verdict(Phase::Gherkin, 8, l) == Some(Verdict::Fail))
            .count();
        assert_eq!(fails, 5);
    }

    #[test]
    fn test_passing_rendition() {
        assert!(lines().all(|l| verdict(Phase::PipelineRunPass, 8, l) == Some(Verdict::Pass)));
        assert!(lines().all(|l| verdict(Phase::Fixed, 8, l) == Some(Verdict::Pass)));
    }
}
