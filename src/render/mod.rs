//! Text renderer
//!
//! Turns the narrative state and its projected view flags into a plain
//! text frame. Pure: no I/O, no clock. The play command decides when and
//! where to print.

use std::fmt::Write as _;

use crate::collaborators::VisitCount;
use crate::content::Resume;
use crate::phase::diff::{self, LineState};
use crate::phase::scenario::{self, FEATURE_FILE, FEATURE_TITLE, SCENARIOS};
use crate::phase::{
    Command, LogKind, MarkerState, NarrativeState, Overlay, ScenarioBanner, TrackerMarker,
    ViewFlags,
};

/// Horizontal rule width.
const WIDTH: usize = 72;

/// Inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Narrative state
    pub state: &'a NarrativeState,
    /// Projection of `state`
    pub view: &'a ViewFlags,
    /// Healthy résumé; the degraded copy is derived when needed
    pub resume: &'a Resume,
    /// Page views for the header
    pub visits: VisitCount,
}

/// Renders a complete frame.
#[must_use]
pub fn render(frame: &Frame<'_>) -> String {
    let mut out = String::new();
    render_tracker(&mut out, frame.view);
    render_action_panel(&mut out, frame.view);
    if frame.view.is_console_open {
        render_console(&mut out, frame.state);
    }
    if let Some(overlay) = frame.view.overlay {
        render_overlay(&mut out, overlay, frame.state, frame.view);
    }
    if frame.view.is_degraded_view {
        render_resume(&mut out, &frame.resume.degraded(), true, frame.visits);
    } else {
        render_resume(&mut out, frame.resume, false, frame.visits);
    }
    out
}

fn rule(out: &mut String, title: &str) {
    let pad = WIDTH.saturating_sub(title.chars().count() + 4);
    let _ = writeln!(out, "── {title} {}", "─".repeat(pad));
}

// ============================================================================
// Sidebar and panels
// ============================================================================

/// Glyph of one tracker marker.
#[must_use]
pub const fn marker_glyph(marker: &TrackerMarker) -> &'static str {
    match (marker.state, marker.failed) {
        (MarkerState::Pending, _) => "[ ]",
        (MarkerState::Current, false) => "[▶]",
        (MarkerState::Current, true) => "[!]",
        (MarkerState::Done, false) => "[✓]",
        (MarkerState::Done, true) => "[✘]",
    }
}

fn render_tracker(out: &mut String, view: &ViewFlags) {
    rule(out, "PIPELINE");
    for (i, marker) in view.tracker.iter().enumerate() {
        let _ = writeln!(
            out,
            " {} {}. {}",
            marker_glyph(marker),
            i + 1,
            marker.phase.label()
        );
    }
}

fn render_action_panel(out: &mut String, view: &ViewFlags) {
    if view.is_waiting_on_user {
        rule(out, "AWAITING ACTION");
    } else {
        rule(out, "PROCESSING");
    }
    let _ = writeln!(out, " {}", view.guidance_text);
    if let Some(command) = view.pending_command {
        let _ = writeln!(out, " > [{}] {}", command.keyword(), command.caption());
    }
    if view.phase.is_terminal() {
        out.push_str("   [download] DOWNLOAD CV\n");
    } else {
        let _ = writeln!(
            out,
            "   [{}] {}",
            Command::Skip.keyword(),
            Command::Skip.caption()
        );
    }
}

/// Glyph prefixed to a console line.
#[must_use]
pub const fn log_glyph(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Info => " ",
        LogKind::Error => "✘",
        LogKind::Success => "✓",
        LogKind::Command => "$",
        LogKind::System => "»",
    }
}

fn render_console(out: &mut String, state: &NarrativeState) {
    rule(out, "CONSOLE");
    for entry in &state.logs {
        let _ = writeln!(out, " {} {}", log_glyph(entry.kind), entry.message);
    }
}

// ============================================================================
// Overlays
// ============================================================================

fn render_overlay(out: &mut String, overlay: Overlay, state: &NarrativeState, view: &ViewFlags) {
    match overlay {
        Overlay::Alert => render_alert(out),
        Overlay::Scenarios => render_scenarios(out, state, view),
        Overlay::Ticket => render_ticket(out, state, view),
        Overlay::CodeFix => render_code_fix(out, state),
    }
}

fn render_alert(out: &mut String) {
    rule(out, "PIPELINE FAILED");
    out.push_str(" This is not an error.\n\n");
    out.push_str(" This is an interactive CV. A deployment pipeline failure has been\n");
    out.push_str(" simulated. Run `start` to begin the automated self-healing process.\n\n");
    out.push_str(" Happy Testing!\n\n");
    out.push_str(" In a rush? `skip` goes straight to the CV, but you'll miss the game.\n");
}

fn render_scenarios(out: &mut String, state: &NarrativeState, view: &ViewFlags) {
    rule(out, FEATURE_FILE);
    let _ = writeln!(out, " {FEATURE_TITLE}");
    for scenario in &SCENARIOS {
        let _ = writeln!(out, "\n   Scenario: {}", scenario.title);
        for line in scenario.lines {
            let _ = write!(out, "     {}", line.text);
            if let Some(verdict) = scenario::verdict(state.phase, state.scenario_step, line) {
                let _ = write!(out, "  {}", verdict.glyph());
            }
            out.push('\n');
        }
    }
    match view.scenario_banner {
        Some(ScenarioBanner::CriticalFailures) => {
            out.push_str("\n ✘ EVALUATION FINISHED WITH CRITICAL FAILURES\n");
        }
        Some(ScenarioBanner::AutomationPassed) => {
            out.push_str("\n ✓ AUTOMATION PASSED\n");
        }
        None => {}
    }
}

fn render_ticket(out: &mut String, state: &NarrativeState, view: &ViewFlags) {
    rule(out, "CV-PORTAL / Defect  BUG-404");
    out.push_str(" Regression: CV Data corrupted and missing sections\n\n");
    out.push_str(" E2E pipeline failed during nightly run.\n");
    out.push_str(" - Name is incorrectly displayed as \"Sizilia Ponse M.\"\n");
    out.push_str(" - Experience list is truncated to 1 item.\n");
    out.push_str(" - Education & Tech Stack blocks are completely missing from DOM.\n\n");
    let _ = writeln!(out, " Status:   {}", state.ticket.status.label());
    let _ = writeln!(out, " Assignee: {}", state.ticket.assignee.label());
    if view.ticket_resolved {
        out.push_str(" ✓ Resolved\n");
    } else {
        out.push_str(" … Automating...\n");
    }
}

fn render_code_fix(out: &mut String, state: &NarrativeState) {
    rule(out, &format!("{}  Fixing BUG-404", diff::SOURCE_FILE));
    for line in diff::visible_lines(state.fix_step) {
        let marker = match line.state {
            LineState::Pending => ' ',
            LineState::Removed => '-',
            LineState::Added => '+',
        };
        let _ = writeln!(out, " {:>4} {marker} {}", line.number, line.text);
    }
}

// ============================================================================
// Résumé body
// ============================================================================

fn render_resume(out: &mut String, resume: &Resume, degraded: bool, visits: VisitCount) {
    rule(out, "CV");
    let _ = writeln!(
        out,
        " {} | Updated {} | Page views {visits}",
        resume.version, resume.last_updated
    );
    let _ = writeln!(out, "\n {}", resume.name);
    let _ = writeln!(out, " {}", resume.roles);
    let _ = writeln!(
        out,
        " {} | {} | {}",
        resume.location, resume.phone, resume.email
    );
    if let Some(citizenship) = &resume.citizenship {
        let _ = writeln!(out, " {citizenship}");
    }

    if degraded {
        out.push_str("\n ERR_SUMMARY\n");
    } else {
        out.push_str("\n PROFESSIONAL SUMMARY\n");
    }
    if let Some(motto) = &resume.motto {
        let _ = writeln!(out, "   \"{motto}\"");
    }
    for paragraph in &resume.summary {
        let _ = writeln!(out, "   {paragraph}");
    }

    out.push_str("\n WORK EXPERIENCE\n");
    for job in &resume.experience {
        let _ = writeln!(out, "   {} @ {} ({})", job.role, job.company, job.dates);
        for detail in &job.details {
            let _ = writeln!(out, "     - {detail}");
        }
    }

    if !resume.certifications.is_empty() {
        out.push_str("\n CERTIFICATIONS\n");
        for cert in &resume.certifications {
            let _ = writeln!(out, "   {} ({})", cert.title, cert.issuer);
        }
    }
    if !resume.education.is_empty() {
        out.push_str("\n EDUCATION\n");
        for entry in &resume.education {
            let _ = writeln!(out, "   {}, {} ({})", entry.title, entry.institution, entry.dates);
        }
    }
    if !resume.tech_stack.is_empty() {
        out.push_str("\n TECH STACK\n");
        let _ = writeln!(out, "   {}", resume.tech_stack.join(" · "));
    }
    if !resume.repositories.is_empty() {
        out.push_str("\n REPOSITORIES\n");
        for repo in &resume.repositories {
            let _ = writeln!(out, "   {} {}", repo.name, repo.url);
        }
    }
}
