//! # Optimization Runner Module
//!
//! Worker per l'ottimizzazione di un singolo `Job`.
//! Separato dal loop in foreground: comunica solo tramite `RunEvent` su canale.
//!
//! ## Flusso di un run:
//! 1. Apre l'input con il motore PDF (`Open` in caso di errore)
//! 2. Visita le pagine riportando `round(i/N*100)` per i = 1..N
//! 3. Salva con i flag di ottimizzazione (`Save` in caso di errore)
//! 4. Il documento è consumato dal salvataggio: l'handle è rilasciato prima del report
//! 5. Riporta 100 e poi il completamento con `RunReport`
//!
//! Nessun retry, nessuna cancellazione, nessun timeout.

use crate::{
    controller::{Job, JobMode},
    error::{OptimizeError, OptimizeResult},
    file_manager::FileManager,
    optimizer::{path_resolver::PathResolver, progress_tracker::page_percent},
    pdf_processor::PdfEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Messages from the worker to the foreground loop
#[derive(Debug)]
pub enum RunEvent {
    Progress(u8),
    Completed(OptimizeResult<RunReport>),
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub input_path: PathBuf,
    /// Files written: one, or the parts in split mode
    pub outputs: Vec<PathBuf>,
    pub pages: usize,
    pub original_size: u64,
    /// Sum over all outputs
    pub optimized_size: u64,
    pub duration: Duration,
}

impl RunReport {
    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.optimized_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "{} → {} ({:.1}% reduction)",
            FileManager::format_size(self.original_size),
            FileManager::format_size(self.optimized_size),
            self.reduction_percent()
        )
    }
}

/// Runs one job at a time against a [`PdfEngine`]
pub struct OptimizationRunner<E: PdfEngine> {
    engine: Arc<E>,
}

impl<E: PdfEngine> Clone for OptimizationRunner<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: PdfEngine> OptimizationRunner<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Execute `job` on the current thread, reporting progress through `on_progress`
    pub fn execute(&self, job: &Job, on_progress: &mut dyn FnMut(u8)) -> OptimizeResult<RunReport> {
        execute_job(self.engine.as_ref(), job, on_progress)
    }

    /// Execute `job` on the blocking pool.
    ///
    /// Every progress value and exactly one `Completed` event are sent on
    /// `events`, even if the worker panics.
    pub fn spawn(&self, job: Job, events: UnboundedSender<RunEvent>) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);

        tokio::spawn(async move {
            let progress_tx = events.clone();
            let worker = tokio::task::spawn_blocking(move || {
                execute_job(engine.as_ref(), &job, &mut |percent| {
                    let _ = progress_tx.send(RunEvent::Progress(percent));
                })
            });

            let outcome = match worker.await {
                Ok(result) => result,
                Err(e) => Err(OptimizeError::Save(format!("Optimization worker failed: {}", e))),
            };

            // receiver gone means nobody is waiting for the result
            let _ = events.send(RunEvent::Completed(outcome));
        })
    }
}

fn execute_job<E: PdfEngine>(engine: &E, job: &Job, on_progress: &mut dyn FnMut(u8)) -> OptimizeResult<RunReport> {
    let start_time = Instant::now();
    info!(
        "Optimizing {} -> {} with {}",
        job.input_path.display(),
        job.output_path.display(),
        engine.name()
    );

    let original_size = FileManager::file_size(&job.input_path)
        .map_err(|e| OptimizeError::Open(format!("{}: {}", job.input_path.display(), e)))?;

    let doc = engine.open(&job.input_path)?;
    let pages = engine.page_count(&doc);
    debug!("Opened {} ({} pages)", job.input_path.display(), pages);

    // pages visited, not work done: the save below is one opaque call
    for i in 0..pages {
        on_progress(page_percent(i + 1, pages));
    }

    PathResolver::ensure_parent_dirs(&job.output_path)?;

    let outputs = match job.mode {
        JobMode::Optimize => {
            engine.save_optimized(doc, &job.input_path, &job.output_path)?;
            vec![job.output_path.clone()]
        }
        JobMode::Split { pages_per_file } => {
            engine.save_split(doc, &job.input_path, &job.output_path, pages_per_file)?
        }
    };

    let mut optimized_size = 0;
    for output in &outputs {
        optimized_size += FileManager::file_size(output)
            .map_err(|e| OptimizeError::Save(format!("{}: {}", output.display(), e)))?;
    }

    on_progress(100);

    let report = RunReport {
        input_path: job.input_path.clone(),
        outputs,
        pages,
        original_size,
        optimized_size,
        duration: start_time.elapsed(),
    };
    info!("Finished {}: {}", job.input_path.display(), report.format_summary());

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pdf_processor::{test_pdf, LopdfProcessor};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    /// Engine that records calls without touching any PDF library
    #[derive(Default)]
    pub struct CountingEngine {
        pub pages: usize,
        pub opens: AtomicUsize,
        pub saves: AtomicUsize,
        pub fail_save: bool,
    }

    impl PdfEngine for CountingEngine {
        type Document = usize;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn open(&self, _path: &Path) -> OptimizeResult<usize> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages)
        }

        fn page_count(&self, doc: &usize) -> usize {
            *doc
        }

        fn save_optimized(&self, _doc: usize, input: &Path, output: &Path) -> OptimizeResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_save {
                return Err(OptimizeError::Save("No space left on device".to_string()));
            }
            std::fs::copy(input, output)?;
            Ok(())
        }

        fn save_split(&self, _doc: usize, input: &Path, output: &Path, _n: u32) -> OptimizeResult<Vec<PathBuf>> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let part = PathResolver::split_part_path(input, output, 1);
            std::fs::copy(input, &part)?;
            Ok(vec![part])
        }
    }

    fn job(input: &Path, output: &Path) -> Job {
        Job {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            overwrite_original: input == output,
            mode: JobMode::Optimize,
        }
    }

    #[test]
    fn test_three_page_run_reports_progress_and_writes_output() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        let output = out.path().join("report_optimized.pdf");
        test_pdf::write(&input, 3);

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let mut progress = Vec::new();
        let report = runner.execute(&job(&input, &output), &mut |p| progress.push(p)).unwrap();

        assert_eq!(progress, vec![33, 67, 100, 100]);
        assert!(output.exists());
        assert_eq!(report.outputs, vec![output.clone()]);
        assert_eq!(report.pages, 3);
        assert!(report.optimized_size < report.original_size);
    }

    #[test]
    fn test_progress_is_non_decreasing_and_ends_at_100() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF").unwrap();

        for pages in [1usize, 2, 7, 13] {
            let engine = CountingEngine {
                pages,
                ..Default::default()
            };
            let runner = OptimizationRunner::new(engine);
            let mut progress = Vec::new();
            runner
                .execute(&job(&input, &dir.path().join("out.pdf")), &mut |p| progress.push(p))
                .unwrap();

            assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
            assert_eq!(progress.last(), Some(&100));
            for i in 1..=pages {
                let expected = ((i as f64 / pages as f64) * 100.0).round() as u8;
                assert_eq!(progress[i - 1], expected);
            }
        }
    }

    #[test]
    fn test_overwrite_in_place_replaces_original() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.pdf");
        test_pdf::write(&input, 2);
        let before = std::fs::metadata(&input).unwrap().len();

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let report = runner.execute(&job(&input, &input), &mut |_| {}).unwrap();

        assert_eq!(report.outputs, vec![input.clone()]);
        assert!(std::fs::metadata(&input).unwrap().len() < before);
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_input_is_open_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.pdf");
        let output = dir.path().join("broken_optimized.pdf");
        std::fs::write(&input, b"garbage").unwrap();

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let mut progress = Vec::new();
        let err = runner.execute(&job(&input, &output), &mut |p| progress.push(p)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Open);
        assert!(progress.is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_save_failure_skips_final_progress() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF").unwrap();

        let engine = CountingEngine {
            pages: 2,
            fail_save: true,
            ..Default::default()
        };
        let runner = OptimizationRunner::new(engine);
        let mut progress = Vec::new();
        let err = runner
            .execute(&job(&input, &dir.path().join("out.pdf")), &mut |p| progress.push(p))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Save);
        assert_eq!(err.to_string(), "Cannot save optimized PDF: No space left on device");
        assert_eq!(progress, vec![50, 100]);
    }

    #[test]
    fn test_split_job() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        test_pdf::write(&input, 4);

        let mut split = job(&input, &dir.path().join("report_optimized.pdf"));
        split.mode = JobMode::Split { pages_per_file: 3 };

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let report = runner.execute(&split, &mut |_| {}).unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert!(report.outputs.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_split_parts_never_replace_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("x_part1.pdf");
        test_pdf::write(&input, 4);
        let original = std::fs::read(&input).unwrap();

        let mut split = job(&input, &dir.path().join("x.pdf"));
        split.mode = JobMode::Split { pages_per_file: 2 };

        let engine = LopdfProcessor::default();
        let report = OptimizationRunner::new(engine.clone()).execute(&split, &mut |_| {}).unwrap();

        assert_eq!(
            report.outputs,
            vec![dir.path().join("x_part1_part1.pdf"), dir.path().join("x_part1_part2.pdf")]
        );
        assert_eq!(std::fs::read(&input).unwrap(), original);
        assert_eq!(engine.page_count(&engine.open(&input).unwrap()), 4);
    }

    #[tokio::test]
    async fn test_spawn_sends_progress_then_completion() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        let output = dir.path().join("report_optimized.pdf");
        test_pdf::write(&input, 3);

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        runner.spawn(job(&input, &output), tx).await.unwrap();

        let mut progress = Vec::new();
        let mut completion = None;
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Progress(p) => {
                    assert!(completion.is_none(), "progress after completion");
                    progress.push(p);
                }
                RunEvent::Completed(result) => completion = Some(result),
            }
        }

        assert_eq!(progress, vec![33, 67, 100, 100]);
        let report = completion.expect("completion event").unwrap();
        assert_eq!(report.outputs, vec![output]);
    }

    #[tokio::test]
    async fn test_spawn_reports_failure_as_event() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.pdf");
        std::fs::write(&input, b"not a pdf").unwrap();

        let runner = OptimizationRunner::new(LopdfProcessor::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        runner.spawn(job(&input, &dir.path().join("out.pdf")), tx);

        match rx.recv().await {
            Some(RunEvent::Completed(Err(err))) => assert_eq!(err.kind(), ErrorKind::Open),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
