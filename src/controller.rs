//! # Selection Controller Module
//!
//! Questo modulo possiede tutto lo stato scelto dall'utente prima di un'ottimizzazione.
//!
//! ## Responsabilità:
//! - Traccia input, cartella di output, nome file di output e flag "modifica originale"
//! - Valida l'input (file esistente, estensione PDF) prima di registrarlo
//! - Deriva lo stato di abilitazione dell'azione di avvio come funzione pura dello stato
//! - Produce un `Job` con path di output completamente risolto
//! - Segna l'inizio/fine di un run per disabilitare/riabilitare l'avvio
//!
//! ## Abilitazione:
//! `can_start()` = input impostato AND (overwrite OR cartella impostata) AND nessun run in corso
//!
//! ## Esempio:
//! ```ignore
//! let mut controller = SelectionController::new("_optimized");
//! controller.set_input("report.pdf")?;
//! controller.set_output_folder("/out");
//! let job = controller.begin_run()?;
//! // ... run ...
//! controller.finish_run();
//! ```

use crate::error::{OptimizeError, OptimizeResult};
use crate::file_manager::FileManager;
use crate::optimizer::path_resolver::PathResolver;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a run should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JobMode {
    /// One optimized file
    Optimize,
    /// Numbered parts of at most `pages_per_file` pages
    Split { pages_per_file: u32 },
}

/// A fully resolved unit of work. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub overwrite_original: bool,
    pub mode: JobMode,
}

/// User selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub input_path: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub output_filename: String,
    pub overwrite_original: bool,
}

impl Selection {
    /// Start is possible once there is an input and somewhere to write
    pub fn is_complete(&self) -> bool {
        self.input_path.is_some() && (self.overwrite_original || self.output_folder.is_some())
    }
}

/// Owns the [`Selection`] and the in-flight flag
#[derive(Debug, Clone)]
pub struct SelectionController {
    selection: Selection,
    output_suffix: String,
    split_pages: Option<u32>,
    running: bool,
}

impl SelectionController {
    pub fn new(output_suffix: impl Into<String>) -> Self {
        Self {
            selection: Selection::default(),
            output_suffix: output_suffix.into(),
            split_pages: None,
            running: false,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record the input file and derive the default output filename.
    ///
    /// State is left untouched when validation fails.
    pub fn set_input(&mut self, path: impl AsRef<Path>) -> OptimizeResult<()> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(OptimizeError::Validation(format!(
                "Input file does not exist: {}",
                path.display()
            )));
        }
        if !FileManager::is_pdf(path) {
            return Err(OptimizeError::Validation(format!(
                "Input is not a PDF file: {}",
                path.display()
            )));
        }

        let filename = PathResolver::default_output_filename(path, &self.output_suffix)?;
        debug!("Input set to {} (default output name: {})", path.display(), filename);

        self.selection.input_path = Some(path.to_path_buf());
        self.selection.output_filename = filename;
        Ok(())
    }

    pub fn set_output_folder(&mut self, path: impl Into<PathBuf>) {
        self.selection.output_folder = Some(path.into());
    }

    pub fn set_output_filename(&mut self, name: impl Into<String>) {
        self.selection.output_filename = name.into();
    }

    pub fn set_overwrite_original(&mut self, overwrite: bool) {
        self.selection.overwrite_original = overwrite;
    }

    /// `None` for a single output file
    pub fn set_split_pages(&mut self, pages_per_file: Option<u32>) {
        self.split_pages = pages_per_file;
    }

    pub fn can_start(&self) -> bool {
        !self.running && self.selection.is_complete()
    }

    pub fn resolve_output_path(&self) -> OptimizeResult<PathBuf> {
        let input = self
            .selection
            .input_path
            .as_deref()
            .ok_or_else(|| OptimizeError::Validation("Select a PDF file first".to_string()))?;

        PathResolver::resolve_output_path(
            input,
            self.selection.output_folder.as_deref(),
            &self.selection.output_filename,
            self.selection.overwrite_original,
        )
    }

    /// Validate the selection, build the [`Job`] and disable start.
    pub fn begin_run(&mut self) -> OptimizeResult<Job> {
        if self.running {
            return Err(OptimizeError::Validation("An optimization is already running".to_string()));
        }

        let input_path = self
            .selection
            .input_path
            .clone()
            .ok_or_else(|| OptimizeError::Validation("Select a PDF file first".to_string()))?;

        // the file may have vanished since it was selected
        if !input_path.is_file() {
            return Err(OptimizeError::Validation(format!(
                "Input file does not exist: {}",
                input_path.display()
            )));
        }

        let output_path = self.resolve_output_path()?;

        let mode = match self.split_pages {
            Some(pages_per_file) if !self.selection.overwrite_original => JobMode::Split { pages_per_file },
            Some(_) => {
                return Err(OptimizeError::Validation(
                    "Splitting cannot be combined with overwriting the original".to_string(),
                ))
            }
            None => JobMode::Optimize,
        };

        self.running = true;
        Ok(Job {
            input_path,
            output_path,
            overwrite_original: self.selection.overwrite_original,
            mode,
        })
    }

    /// Re-enable start whatever the outcome of the run
    pub fn finish_run(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pdf_in(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.5\n%%EOF").unwrap();
        path
    }

    #[test]
    fn test_set_input_derives_default_filename() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "report.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();

        assert_eq!(controller.selection().input_path.as_deref(), Some(input.as_path()));
        assert_eq!(controller.selection().output_filename, "report_optimized.pdf");
    }

    #[test]
    fn test_set_input_missing_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "report.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();
        let before = controller.selection().clone();

        let err = controller.set_input(dir.path().join("missing.pdf")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.selection(), &before);

        // directories are not regular files
        let err = controller.set_input(dir.path()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.selection(), &before);
    }

    #[test]
    fn test_set_input_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut controller = SelectionController::new("_optimized");
        assert!(controller.set_input(&path).unwrap_err().is_validation());
        assert!(controller.selection().input_path.is_none());
    }

    #[test]
    fn test_can_start_transitions() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "report.pdf");
        let out = TempDir::new().unwrap();

        let mut controller = SelectionController::new("_optimized");
        assert!(!controller.can_start());

        controller.set_input(&input).unwrap();
        assert!(!controller.can_start());

        controller.set_output_folder(out.path());
        assert!(controller.can_start());

        let job = controller.begin_run().unwrap();
        assert!(!controller.can_start());
        assert_eq!(job.output_path, out.path().join("report_optimized.pdf"));

        controller.finish_run();
        assert!(controller.can_start());
    }

    #[test]
    fn test_overwrite_enables_without_folder() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "a.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();
        controller.set_overwrite_original(true);
        assert!(controller.can_start());
        assert_eq!(controller.resolve_output_path().unwrap(), input);

        controller.set_overwrite_original(false);
        assert!(!controller.can_start());
    }

    #[test]
    fn test_identical_path_without_overwrite_fails() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "report.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();
        controller.set_output_folder(dir.path());
        controller.set_output_filename("report.pdf");

        assert!(controller.resolve_output_path().unwrap_err().is_validation());
        assert!(controller.begin_run().unwrap_err().is_validation());
        assert!(!controller.is_running());
    }

    #[test]
    fn test_begin_run_twice_rejected() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "a.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();
        controller.set_overwrite_original(true);

        controller.begin_run().unwrap();
        assert!(controller.begin_run().unwrap_err().is_validation());
    }

    #[test]
    fn test_split_mode() {
        let dir = TempDir::new().unwrap();
        let input = pdf_in(&dir, "a.pdf");

        let mut controller = SelectionController::new("_optimized");
        controller.set_input(&input).unwrap();
        controller.set_output_folder(dir.path());
        controller.set_split_pages(Some(2));

        let job = controller.begin_run().unwrap();
        assert_eq!(job.mode, JobMode::Split { pages_per_file: 2 });
        controller.finish_run();

        controller.set_overwrite_original(true);
        assert!(controller.begin_run().unwrap_err().is_validation());
    }
}
