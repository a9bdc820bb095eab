//! Command-line interface
//!
//! Argument parsing and command handlers for the `cvpipeline` binary.

pub mod args;
pub mod commands;
