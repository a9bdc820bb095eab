//! `cvpipeline` - Interactive résumé staged as a self-healing CI pipeline
//!
//! A phase state machine walks a corrupted résumé through a simulated
//! failing deployment, defect ticket, code fix and green re-run until the
//! healthy résumé is live. This library provides the controller, its pure
//! view projection, the résumé content and the terminal surface around it.

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod content;
pub mod error;
pub mod observability;
pub mod phase;
pub mod render;
