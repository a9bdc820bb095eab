//! Narrative playback command
//!
//! Drives a [`PhaseController`] from terminal input, or automatically with
//! `--auto`, and prints a frame after every batch of changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::args::PlayArgs;
use crate::collaborators::export::DEFAULT_EXPORT_NAME;
use crate::collaborators::{
    TagManager, VisitCount, VisitCounter, export_document, spawn_bootstrap,
};
use crate::config::ConfigLoader;
use crate::content::Resume;
use crate::error::{CvPipelineError, ExportError};
use crate::observability::{Event, EventEmitter, init_metrics};
use crate::phase::command::suggest_keyword;
use crate::phase::{Change, Choreography, Command, PhaseController, project};
use crate::render::{Frame, render};

/// Every keyword accepted at the prompt, for typo suggestions.
const INPUT_KEYWORDS: [&str; 7] = [
    "start",
    "scenarios",
    "report",
    "skip",
    "download",
    "status",
    "quit",
];

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Narrative(Command),
    Download,
    Status,
    Quit,
    Empty,
    Unknown {
        input: String,
        suggestion: Option<&'static str>,
    },
}

fn parse_input(line: &str) -> Input {
    let input = line.trim().to_ascii_lowercase();
    match input.as_str() {
        "" => Input::Empty,
        "download" | "d" => Input::Download,
        "status" | "?" => Input::Status,
        "quit" | "exit" | "q" => Input::Quit,
        other => other.parse::<Command>().map_or_else(
            |_| Input::Unknown {
                suggestion: suggest_keyword(other, &INPUT_KEYWORDS),
                input: other.to_string(),
            },
            Input::Narrative,
        ),
    }
}

/// Play the narrative.
///
/// # Errors
///
/// Returns a config error if configuration or the résumé cannot be
/// loaded, an I/O error if the events file or metrics listener cannot be
/// opened, or an export error if `--export` fails on completion.
pub async fn run(args: &PlayArgs, cancel: CancellationToken) -> Result<(), CvPipelineError> {
    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let loaded = ConfigLoader::with_defaults().load_optional(args.config.as_deref())?;
    let choreography = match args.speed {
        Some(speed) => {
            let mut timing = loaded.config.timing.clone();
            timing.speed = Some(speed);
            Choreography::from_config(&timing)?
        }
        None => loaded.choreography,
    };
    let speed = args.speed.or(loaded.config.timing.speed).unwrap_or(1.0);

    let resume_path = args.resume.as_deref().or(loaded.config.resume.as_deref());
    let resume = Resume::load_or_builtin(resume_path)?;

    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });
    events.emit(Event::SessionStarted {
        timestamp: Utc::now(),
        version: resume.version.clone(),
        speed,
    });
    info!(session = %events.session(), speed, "narrative session started");

    if let Some(tags) = TagManager::from_config(&loaded.config.analytics, Arc::clone(&events)) {
        spawn_bootstrap(Arc::new(tags));
    }

    let (visits_tx, visits) = watch::channel(VisitCount::Loading);
    if loaded.config.visits.enabled && !args.no_visits {
        match VisitCounter::from_config(&loaded.config.visits) {
            Ok(counter) => {
                let events = Arc::clone(&events);
                tokio::spawn(async move {
                    let count = counter.load().await;
                    if let VisitCount::Loaded(count) = count {
                        events.emit(Event::VisitsLoaded {
                            timestamp: Utc::now(),
                            count,
                        });
                    }
                    let _ = visits_tx.send(count);
                });
            }
            Err(e) => warn!(error = %e, "page view counter disabled"),
        }
    } else {
        drop(visits_tx);
    }

    let mut session = Session {
        controller: PhaseController::new(choreography),
        resume,
        visits: VisitCount::Loading,
        events: Arc::clone(&events),
        export: args.export.clone(),
        exported: false,
        auto_scheduled: None,
    };

    let outcome = session.drive(args, &cancel, visits).await;
    session.controller.shutdown();

    let reason = match &outcome {
        Ok(reason) => (*reason).to_string(),
        Err(e) => format!("error: {e}"),
    };
    let phase = session.controller.phase();
    info!(%phase, reason, "narrative session ended");
    events.emit(Event::SessionEnded {
        timestamp: Utc::now(),
        phase,
        reason,
    });
    outcome.map(|_| ())
}

struct Session {
    controller: PhaseController,
    resume: Resume,
    visits: VisitCount,
    events: Arc<EventEmitter>,
    export: Option<PathBuf>,
    exported: bool,
    /// Epoch and command of the last automatic command scheduled
    auto_scheduled: Option<(u64, Command)>,
}

impl Session {
    /// Runs the input/change loop; returns why the session ended.
    async fn drive(
        &mut self,
        args: &PlayArgs,
        cancel: &CancellationToken,
        mut visits: watch::Receiver<VisitCount>,
    ) -> Result<&'static str, CvPipelineError> {
        let mut changes = self.controller.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut visits_pending = true;

        self.draw();
        if args.skip {
            self.issue(Command::Skip);
        }

        loop {
            if args.auto {
                self.schedule_auto(args.think);
            }
            if let Some(reason) = self.finished(args.auto, stdin_open) {
                return Ok(reason);
            }

            tokio::select! {
                () = cancel.cancelled() => return Ok("interrupted"),

                received = changes.recv() => match received {
                    Ok(change) => {
                        self.apply_batch(change, &mut changes)?;
                        self.draw();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "change feed lagged");
                        self.draw();
                    }
                    Err(RecvError::Closed) => return Ok("closed"),
                },

                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if self.handle_input(&line) {
                            return Ok("quit");
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read input");
                        stdin_open = false;
                    }
                },

                changed = visits.changed(), if visits_pending => {
                    if changed.is_ok() {
                        self.visits = *visits.borrow_and_update();
                        self.draw();
                    } else {
                        visits_pending = false;
                    }
                }
            }
        }
    }

    /// Handles `first` and every change already queued behind it.
    fn apply_batch(
        &mut self,
        first: Change,
        changes: &mut broadcast::Receiver<Change>,
    ) -> Result<(), CvPipelineError> {
        let mut next = Some(first);
        while let Some(change) = next.take() {
            self.on_change(&change)?;
            next = loop {
                match changes.try_recv() {
                    Ok(change) => break Some(change),
                    Err(TryRecvError::Lagged(skipped)) => {
                        debug!(skipped, "change feed lagged");
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break None,
                }
            };
        }
        Ok(())
    }

    fn on_change(&mut self, change: &Change) -> Result<(), CvPipelineError> {
        let Change::PhaseEntered {
            from,
            to,
            reason,
            epoch,
        } = change
        else {
            return Ok(());
        };
        self.events.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            from: *from,
            to: *to,
            reason: reason.label().to_string(),
            epoch: *epoch,
        });
        if to.is_terminal() && !self.exported {
            if let Some(path) = self.export.clone() {
                self.download(&path)?;
                self.exported = true;
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_input(&self, line: &str) -> bool {
        match parse_input(line) {
            Input::Narrative(command) => {
                self.issue(command);
            }
            Input::Download => {
                let path = self
                    .export
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_NAME));
                match self.download(&path) {
                    Ok(()) => {}
                    Err(CvPipelineError::Export(ExportError::NotReady)) => {
                        println!("The document is available once the CV is operational.");
                    }
                    Err(e) => println!("download failed: {e}"),
                }
            }
            Input::Status => {
                let view = self.controller.view();
                println!(
                    "phase {} ({}/8): {}",
                    view.phase,
                    view.progress_index + 1,
                    view.guidance_text
                );
                if let Some(command) = view.pending_command {
                    println!("waiting for: {}", command.keyword());
                }
            }
            Input::Quit => return true,
            Input::Empty => {}
            Input::Unknown { input, suggestion } => {
                match suggestion {
                    Some(s) => println!("unknown command '{input}' (did you mean '{s}'?)"),
                    None => println!(
                        "unknown command '{input}'; try one of: {}",
                        INPUT_KEYWORDS.join(", ")
                    ),
                }
            }
        }
        false
    }

    fn issue(&self, command: Command) -> bool {
        issue_and_record(&self.controller, &self.events, command)
    }

    fn download(&self, path: &Path) -> Result<(), CvPipelineError> {
        let view = self.controller.view();
        export_document(&view, &self.resume, path)?;
        println!("Document written to {}", path.display());
        Ok(())
    }

    /// Schedules the awaited command once per wait.
    fn schedule_auto(&mut self, think: Duration) {
        let view = self.controller.view();
        let (true, Some(command)) = (view.is_waiting_on_user, view.pending_command) else {
            return;
        };
        let key = (self.controller.epoch(), command);
        if self.auto_scheduled == Some(key) {
            return;
        }
        self.auto_scheduled = Some(key);

        let controller = self.controller.clone();
        let events = Arc::clone(&self.events);
        let token = controller.session_token();
        debug!(%command, ?think, "scheduling automatic command");
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(think) => {
                    issue_and_record(&controller, &events, command);
                }
            }
        });
    }

    fn finished(&self, auto: bool, stdin_open: bool) -> Option<&'static str> {
        let view = self.controller.view();
        if view.phase.is_terminal() && (auto || !stdin_open) {
            Some("completed")
        } else if !auto && !stdin_open && view.is_waiting_on_user {
            Some("input closed")
        } else {
            None
        }
    }

    fn draw(&self) {
        let state = self.controller.snapshot();
        let view = project(&state);
        let frame = Frame {
            state: &state,
            view: &view,
            resume: &self.resume,
            visits: self.visits,
        };
        println!("{}", render(&frame));
    }
}

fn issue_and_record(controller: &PhaseController, events: &EventEmitter, command: Command) -> bool {
    let accepted = controller.issue(command).is_some();
    events.emit(Event::CommandIssued {
        timestamp: Utc::now(),
        command,
        accepted,
    });
    if !accepted {
        println!(
            "'{}' is not available in phase {}",
            command.keyword(),
            controller.phase()
        );
    }
    accepted
}
