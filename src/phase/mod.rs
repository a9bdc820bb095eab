//! Narrative phase state machine
//!
//! Eight ordered phases take the viewer from a simulated pipeline failure
//! to the healthy résumé. Three of them wait for the viewer; the rest are
//! driven by timed autorun tracks.
//!
//! # Architecture
//!
//! - [`NarrativeState`]: plain state (phase, console, ticket, counters)
//! - [`PhaseController`]: single writer (guards, epochs, autorun tracks)
//! - [`script`]: what each phase entry schedules
//! - [`project`]: pure view flags for the renderer
//! - [`scenario`] and [`diff`]: the two scripted overlays

pub mod choreography;
pub mod command;
pub mod diff;
pub mod engine;
pub mod projector;
pub mod scenario;
pub mod script;
pub mod state;

pub use choreography::Choreography;
pub use command::{Command, UnknownCommand};
pub use engine::{Change, PhaseController, PhaseTransition, TransitionReason};
pub use projector::{MarkerState, Overlay, ScenarioBanner, TrackerMarker, ViewFlags, project};
pub use scenario::{Verdict, verdict};
pub use state::{
    Assignee, FIX_STEPS, LogEntry, LogKind, NarrativeState, Phase, SCENARIO_STEPS, TicketState,
    TicketStatus,
};
