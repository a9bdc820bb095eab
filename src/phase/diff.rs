//! Code-fix diff script
//!
//! Two hunks of the page source, revealed in four steps: strike the
//! corrupted header, add the restored header, strike the truncated data,
//! add the restored data.

use serde::Serialize;

/// Source file shown in the editor tab.
pub const SOURCE_FILE: &str = "App.jsx";

/// Display state of a diff line at a given fix step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    /// Shown as-is (not yet struck).
    Pending,
    /// Struck through.
    Removed,
    /// Newly inserted.
    Added,
}

/// One line of the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    /// Line number in the source file
    pub number: u32,
    /// Source text
    pub text: &'static str,
    /// State at the requested step
    pub state: LineState,
}

struct Edit {
    number: u32,
    before: &'static str,
    after: &'static str,
    /// Step at which `before` is struck; `after` appears one step later.
    strike_at: u8,
}

const EDITS: [Edit; 4] = [
    Edit {
        number: 42,
        before: "<h1>Sizilia Ponse M.</h1>",
        after: "<h1>Cecilia Ponce Molinas</h1>",
        strike_at: 1,
    },
    Edit {
        number: 43,
        before: "<h2>Junior Manual Tester</h2>",
        after: "<h2>QA Architect / QA Lead / QA Automation</h2>",
        strike_at: 1,
    },
    Edit {
        number: 88,
        before: "const experience = [ data[0] ]; // BUG: Truncated array",
        after: "const experience = data; // Restored full array (11 items)",
        strike_at: 3,
    },
    Edit {
        number: 120,
        before: "{/* <TechStackSection /> */}",
        after: "<TechStackSection isVisible={true} />",
        strike_at: 3,
    },
];

/// Returns the visible diff lines at `fix_step`, grouped per hunk.
///
/// Each edit shows its original line (pending, then removed) and, from
/// the following step, the replacement line.
#[must_use]
pub fn visible_lines(fix_step: u8) -> Vec<DiffLine> {
    let mut out = Vec::with_capacity(EDITS.len() * 2);
    for hunk in EDITS.chunk_by(|a, b| a.strike_at == b.strike_at) {
        for edit in hunk {
            let state = if fix_step >= edit.strike_at {
                LineState::Removed
            } else {
                LineState::Pending
            };
            out.push(DiffLine {
                number: edit.number,
                text: edit.before,
                state,
            });
        }
        for edit in hunk {
            if fix_step > edit.strike_at {
                out.push(DiffLine {
                    number: edit.number,
                    text: edit.after,
                    state: LineState::Added,
                });
            }
        }
    }
    out
}
