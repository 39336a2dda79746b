//! # Interactive Session Module
//!
//! Il loop in foreground: unico proprietario dello stato dell'interfaccia.
//!
//! ## Responsabilità:
//! - Applica i comandi dell'utente al `SelectionController`
//! - Avvia un run solo se l'azione di avvio è abilitata e confermata
//! - Riceve `RunEvent` dal worker e aggiorna progress bar e controller
//! - Notifica il risultato (successo con path e dimensioni, errore con messaggio)
//!
//! ## Concorrenza:
//! - Un solo worker per run, nessuna coda
//! - I comandi vengono letti anche durante un run: `start` risulta disabilitato
//! - Solo questo loop modifica controller e progresso
//!
//! ## Comandi:
//! `input <file>`, `folder <dir>`, `name <file>`, `overwrite on|off`,
//! `split <n>|off`, `start`, `status`, `help`, `quit`

use crate::{
    config::Config,
    controller::{Job, JobMode, SelectionController},
    error::{OptimizeError, OptimizeResult},
    json_output::JsonMessage,
    notifier::Notifier,
    optimizer::{
        path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
        runner::{OptimizationRunner, RunEvent, RunReport},
    },
    pdf_processor::PdfEngine,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

pub const HELP: &str = "\
input <file>        select the PDF to optimize
folder <dir>        select the output folder
name <file>         set the output filename
overwrite on|off    modify the original file in place
split <n>|off       write parts of at most n pages
start               run the optimization
status              show the current selection
help                show this help
quit                leave";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(PathBuf),
    Folder(PathBuf),
    Name(String),
    Overwrite(bool),
    Split(Option<u32>),
    Start,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, unquote(rest.trim())),
            None => (line, ""),
        };

        let needs_arg = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", word, what))
            } else {
                Ok(rest)
            }
        };

        match word.to_lowercase().as_str() {
            "input" | "open" => Ok(Self::Input(PathBuf::from(needs_arg("a file")?))),
            "folder" | "dir" => Ok(Self::Folder(PathBuf::from(needs_arg("a folder")?))),
            "name" => Ok(Self::Name(needs_arg("a filename")?.to_string())),
            "overwrite" => match rest.to_lowercase().as_str() {
                "on" | "yes" | "true" => Ok(Self::Overwrite(true)),
                "off" | "no" | "false" => Ok(Self::Overwrite(false)),
                _ => Err("usage: overwrite on|off".to_string()),
            },
            "split" => match rest.to_lowercase().as_str() {
                "off" | "no" => Ok(Self::Split(None)),
                n => match n.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(Self::Split(Some(n))),
                    _ => Err("usage: split <pages per file>|off".to_string()),
                },
            },
            "start" | "run" => Ok(Self::Start),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{}' (type 'help')", other)),
        }
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

async fn next_event(events: &mut Option<UnboundedReceiver<RunEvent>>) -> Option<RunEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Foreground loop state
pub struct Session<E: PdfEngine, N: Notifier> {
    controller: SelectionController,
    runner: OptimizationRunner<E>,
    notifier: N,
    tracker: ProgressTracker,
    config: Config,
}

impl<E: PdfEngine, N: Notifier> Session<E, N> {
    pub fn new(config: Config, runner: OptimizationRunner<E>, notifier: N) -> Self {
        let mut controller = SelectionController::new(config.output_suffix.clone());
        controller.set_split_pages(config.split_pages);

        Self {
            controller,
            runner,
            notifier,
            tracker: ProgressTracker::new(config.json_output),
            config,
        }
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SelectionController {
        &mut self.controller
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn runner(&self) -> &OptimizationRunner<E> {
        &self.runner
    }

    pub fn report_error(&mut self, title: &str, err: &OptimizeError) {
        if self.config.json_output {
            JsonMessage::error(err).emit();
        } else {
            self.notifier.error(title, &err.to_string());
        }
    }

    fn report_success(&mut self, report: &RunReport) {
        if self.config.json_output {
            JsonMessage::complete(report).emit();
            return;
        }

        let outputs: Vec<String> = report.outputs.iter().map(|p| p.display().to_string()).collect();
        self.notifier.info(
            "Optimization complete",
            &format!("{}\n{}", outputs.join("\n"), report.format_summary()),
        );
    }

    fn disabled_reason(&self) -> &'static str {
        let selection = self.controller.selection();
        if self.controller.is_running() {
            "An optimization is already running"
        } else if selection.input_path.is_none() {
            "Select a PDF file first"
        } else {
            "Select an output folder or enable overwrite"
        }
    }

    async fn confirm<R: AsyncBufRead + Unpin>(
        &mut self,
        lines: &mut Lines<R>,
        question: &str,
    ) -> std::io::Result<bool> {
        if self.config.assume_yes {
            return Ok(true);
        }
        // no prompts in the middle of a JSON stream
        if self.config.json_output {
            return Ok(false);
        }

        self.notifier.prompt(question);
        let answer = lines.next_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    /// Validate the selection and ask for confirmations; `None` when nothing starts
    async fn prepare_start<R: AsyncBufRead + Unpin>(
        &mut self,
        lines: &mut Lines<R>,
    ) -> std::io::Result<Option<Job>> {
        if !self.controller.can_start() {
            let err = OptimizeError::Validation(self.disabled_reason().to_string());
            self.report_error("Cannot start", &err);
            return Ok(None);
        }

        let job = match self.controller.begin_run() {
            Ok(job) => job,
            Err(e) => {
                self.report_error("Cannot start", &e);
                return Ok(None);
            }
        };

        let question = Self::overwrite_question(&job);

        if let Some(question) = question {
            let confirmed = match self.confirm(lines, &question).await {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    self.controller.finish_run();
                    return Err(e);
                }
            };

            if !confirmed {
                self.controller.finish_run();
                let err = OptimizeError::Validation(format!("Cancelled: {}", question));
                self.report_error("Cancelled", &err);
                return Ok(None);
            }
        }

        Ok(Some(job))
    }

    /// Question to ask before `job` replaces existing files, if any
    fn overwrite_question(job: &Job) -> Option<String> {
        if job.overwrite_original {
            return Some("Overwrite the original file? Keeping a backup is recommended.".to_string());
        }

        match job.mode {
            JobMode::Optimize if job.output_path.exists() => {
                Some(format!("{} already exists. Overwrite it?", job.output_path.display()))
            }
            JobMode::Optimize => None,
            JobMode::Split { .. } => {
                let existing = PathResolver::existing_split_parts(&job.input_path, &job.output_path);
                match existing.as_slice() {
                    [] => None,
                    [only] => Some(format!("{} already exists. Overwrite it?", only.display())),
                    [first, rest @ ..] => Some(format!(
                        "{} and {} more part files already exist. Overwrite them?",
                        first.display(),
                        rest.len()
                    )),
                }
            }
        }
    }

    fn start_run(&mut self, job: Job) -> UnboundedReceiver<RunEvent> {
        if self.config.json_output {
            JsonMessage::start(&job, self.runner.engine_name()).emit();
        }

        let label = job
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.tracker.start(&label);

        let (tx, rx) = mpsc::unbounded_channel();
        self.runner.spawn(job, tx);
        rx
    }

    /// Apply one worker event; returns the outcome on completion
    fn handle_event(&mut self, event: RunEvent) -> Option<OptimizeResult<RunReport>> {
        match event {
            RunEvent::Progress(percent) => {
                self.tracker.update(percent);
                None
            }
            RunEvent::Completed(result) => {
                self.controller.finish_run();
                match &result {
                    Ok(report) => {
                        self.tracker.finish(&report.format_summary());
                        self.report_success(report);
                    }
                    Err(e) => {
                        self.tracker.abandon("failed");
                        self.report_error("Optimization failed", e);
                    }
                }
                Some(result)
            }
        }
    }

    /// The worker hung up without a completion event
    fn handle_lost_worker(&mut self) -> OptimizeResult<RunReport> {
        warn!("Optimization worker stopped without reporting");
        let err = OptimizeError::Save("Optimization worker stopped without reporting".to_string());
        self.controller.finish_run();
        self.tracker.abandon("failed");
        self.report_error("Optimization failed", &err);
        Err(err)
    }

    /// Start with the current selection and wait for the outcome.
    ///
    /// `Ok(None)` means the run never started (disabled, invalid or declined).
    pub async fn run_once<R: AsyncBufRead + Unpin>(
        &mut self,
        lines: &mut Lines<R>,
    ) -> anyhow::Result<Option<OptimizeResult<RunReport>>> {
        let job = match self.prepare_start(lines).await? {
            Some(job) => job,
            None => return Ok(None),
        };

        let mut events = self.start_run(job);
        while let Some(event) = events.recv().await {
            if let Some(outcome) = self.handle_event(event) {
                return Ok(Some(outcome));
            }
        }

        Ok(Some(self.handle_lost_worker()))
    }

    /// Read commands until `quit` or end of input
    pub async fn run_interactive<R: AsyncBufRead + Unpin>(&mut self, lines: &mut Lines<R>) -> anyhow::Result<()> {
        if !self.config.json_output {
            self.notifier.info("PDF Optimizer", HELP);
        }

        let mut events: Option<UnboundedReceiver<RunEvent>> = None;
        let mut input_closed = false;

        loop {
            tokio::select! {
                event = next_event(&mut events) => {
                    match event {
                        Some(event) => {
                            if self.handle_event(event).is_some() {
                                events = None;
                            }
                        }
                        None => {
                            let _ = self.handle_lost_worker();
                            events = None;
                        }
                    }
                    if events.is_none() && input_closed {
                        break;
                    }
                }
                line = lines.next_line(), if !input_closed => {
                    let line = match line? {
                        Some(line) => line,
                        None => {
                            debug!("Input closed");
                            if events.is_none() {
                                break;
                            }
                            // let the running optimization finish
                            input_closed = true;
                            continue;
                        }
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    match Command::parse(&line) {
                        Ok(Command::Quit) => {
                            if events.is_some() {
                                let err = OptimizeError::Validation(
                                    "An optimization is running; quit once it completes".to_string(),
                                );
                                self.report_error("Cannot quit", &err);
                            } else {
                                break;
                            }
                        }
                        Ok(Command::Start) => {
                            if let Some(job) = self.prepare_start(lines).await? {
                                events = Some(self.start_run(job));
                            }
                        }
                        Ok(command) => self.apply(command),
                        Err(message) => self.notifier.error("Invalid command", &message),
                    }
                }
            }
        }

        Ok(())
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Input(path) => match self.controller.set_input(&path) {
                Ok(()) => {
                    let message = format!(
                        "{}\nOutput name: {}",
                        path.display(),
                        self.controller.selection().output_filename
                    );
                    self.notifier.info("Input selected", &message);
                }
                Err(e) => self.report_error("Invalid input", &e),
            },
            Command::Folder(path) => {
                let message = path.display().to_string();
                self.controller.set_output_folder(path);
                self.notifier.info("Output folder selected", &message);
            }
            Command::Name(name) => {
                self.notifier.info("Output name set", &name);
                self.controller.set_output_filename(name);
            }
            Command::Overwrite(overwrite) => {
                self.controller.set_overwrite_original(overwrite);
                let state = if overwrite { "on" } else { "off" };
                self.notifier.info("Overwrite original", state);
            }
            Command::Split(pages) => {
                self.controller.set_split_pages(pages);
                let message = pages.map_or("off".to_string(), |n| format!("{} pages per file", n));
                self.notifier.info("Split", &message);
            }
            Command::Status => {
                let status = self.status_text();
                self.notifier.info("Status", &status);
            }
            Command::Help => self.notifier.info("Commands", HELP),
            // handled by the loop
            Command::Start | Command::Quit => {}
        }
    }

    pub fn status_text(&self) -> String {
        let selection = self.controller.selection();
        let show = |p: &Option<PathBuf>| p.as_ref().map_or("-".to_string(), |p| p.display().to_string());

        format!(
            "Input:     {}\nFolder:    {}\nFilename:  {}\nOverwrite: {}\nStart:     {}\nProgress:  {}%",
            show(&selection.input_path),
            show(&selection.output_folder),
            selection.output_filename,
            if selection.overwrite_original { "on" } else { "off" },
            if self.controller.can_start() { "enabled" } else { "disabled" },
            self.tracker.percent()
        )
    }
}
