//! External collaborators
//!
//! Side services the page talks to. None of them can influence the
//! narrative: their results are display-only and their failures are
//! logged and dropped.

pub mod analytics;
pub mod export;
pub mod visits;

pub use analytics::{AnalyticsSink, TagManager, spawn_bootstrap};
pub use export::{export_document, render_markdown, write_document};
pub use visits::{VisitCount, VisitCounter};
