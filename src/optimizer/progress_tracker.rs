//! # Progress Tracking Module
//!
//! Unifica stato del progresso, progress bar e output JSON in un singolo tracker.
//! Vive nel loop in foreground: il worker invia solo percentuali via canale.
//!
//! Il progresso è "pagine visitate", non lavoro reale: il salvataggio avviene
//! in un'unica chiamata opaca alla libreria PDF che non espone avanzamento.

use crate::{json_output::JsonMessage, progress::ProgressManager};

/// Percent reported after visiting `visited` of `total` pages, rounded half up
pub fn page_percent(visited: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let visited = visited.min(total);
    ((visited as f64 / total as f64) * 100.0).round() as u8
}

/// Percent in `[0, 100]` that never moves backwards within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    percent: u8,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Back to 0 at the start of a run
    pub fn reset(&mut self) {
        self.percent = 0;
    }

    /// Apply a reported value; returns true when the displayed value changed
    pub fn advance(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if percent > self.percent {
            self.percent = percent;
            true
        } else {
            false
        }
    }
}

/// Tracker progress unificato: stato + progress bar o eventi JSON
pub struct ProgressTracker {
    state: ProgressState,
    bar: Option<ProgressManager>,
    json_output: bool,
}

impl ProgressTracker {
    /// Crea un nuovo tracker; la barra è nascosta in modalità JSON
    pub fn new(json_output: bool) -> Self {
        Self {
            state: ProgressState::new(),
            bar: None,
            json_output,
        }
    }

    pub fn percent(&self) -> u8 {
        self.state.percent()
    }

    /// Inizio di un run: reset a 0 e nuova barra
    pub fn start(&mut self, message: &str) {
        self.state.reset();
        if !self.json_output {
            let bar = ProgressManager::new(100);
            bar.set_message(message);
            self.bar = Some(bar);
        }
    }

    /// Aggiorna progress bar o emette evento JSON
    pub fn update(&mut self, percent: u8) {
        if !self.state.advance(percent) {
            return;
        }

        let current = self.state.percent();
        if self.json_output {
            JsonMessage::progress(current).emit();
        } else if let Some(ref bar) = self.bar {
            bar.set_position(current as u64);
        }
    }

    /// Finalizza progress bar
    pub fn finish(&mut self, summary: &str) {
        if let Some(bar) = self.bar.take() {
            bar.finish(summary);
        }
    }

    /// Abbandona la barra lasciando visibile il punto raggiunto
    pub fn abandon(&mut self, summary: &str) {
        if let Some(bar) = self.bar.take() {
            bar.abandon(summary);
        }
    }
}
