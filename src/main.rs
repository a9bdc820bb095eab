//! `cvpipeline` - Interactive résumé staged as a self-healing CI pipeline

use std::sync::atomic::{AtomicI32, Ordering};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cvpipeline::cli::args::Cli;
use cvpipeline::cli::commands;
use cvpipeline::error::ExitCode;
use cvpipeline::observability::init_logging;

/// Exit code requested by the first signal received.
static SIGNAL_EXIT: AtomicI32 = AtomicI32::new(ExitCode::SUCCESS);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(handle_signals(cancel.clone()));

    let result = commands::dispatch(cli, cancel).await;

    match result {
        Ok(()) => std::process::exit(SIGNAL_EXIT.load(Ordering::SeqCst)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Cancels the session on the first SIGINT/SIGTERM; a second one exits
/// immediately.
async fn handle_signals(cancel: CancellationToken) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                None
            }
        };

    let code = tokio::select! {
        _ = tokio::signal::ctrl_c() => ExitCode::INTERRUPTED,
        Some(()) = recv(sigterm.as_mut()) => ExitCode::TERMINATED,
    };
    SIGNAL_EXIT.store(code, Ordering::SeqCst);
    cancel.cancel();
    eprintln!("\nShutting down... (press Ctrl+C again to force)");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
        Some(()) = recv(sigterm.as_mut()) => std::process::exit(ExitCode::TERMINATED),
    }
}

async fn recv(signal: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => std::future::pending().await,
    }
}
