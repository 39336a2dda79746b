//! # Ghostscript Processing Module
//!
//! Motore alternativo che delega la riscrittura a Ghostscript (`pdfwrite`).
//!
//! ## Responsabilità:
//! - Localizza l'eseguibile con `ToolPathResolver` (bundled o PATH)
//! - Apre il documento con lopdf solo per validarlo e contare le pagine
//! - Esegue `gs` su un file temporaneo e lo sposta sulla destinazione
//! - In modalità split usa `-dFirstPage`/`-dLastPage` per ogni parte
//!
//! ## Comando:
//! ```text
//! gs -dNOPAUSE -dBATCH -dSAFER -sDEVICE=pdfwrite -dPDFSETTINGS=/ebook -sOutputFile=<tmp> <input>
//! ```

use crate::error::{OptimizeError, OptimizeResult};
use crate::file_manager::FileManager;
use crate::optimizer::path_resolver::PathResolver;
use crate::pdf_processor::{save_error, LopdfProcessor, PdfEngine};
use crate::tool_resolver::ToolPathResolver;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Engine running an external Ghostscript binary
#[derive(Debug, Clone)]
pub struct GhostscriptProcessor {
    gs_path: PathBuf,
    preset: String,
    reader: LopdfProcessor,
}

impl GhostscriptProcessor {
    /// Locate Ghostscript; fails with `MissingDependency` when absent
    pub fn new(resolver: &ToolPathResolver, preset: impl Into<String>) -> OptimizeResult<Self> {
        let gs_path = resolver
            .check_ghostscript()
            .map_err(OptimizeError::MissingDependency)?;

        Ok(Self::with_binary(gs_path, preset))
    }

    pub fn with_binary(gs_path: PathBuf, preset: impl Into<String>) -> Self {
        Self {
            gs_path,
            preset: preset.into(),
            reader: LopdfProcessor::default(),
        }
    }

    /// Arguments for one pdfwrite pass, optionally restricted to a page range
    pub fn build_args(&self, input: &Path, output: &Path, pages: Option<(usize, usize)>) -> Vec<String> {
        let mut args = vec![
            "-dNOPAUSE".to_string(),
            "-dBATCH".to_string(),
            "-dSAFER".to_string(),
            "-sDEVICE=pdfwrite".to_string(),
            format!("-dPDFSETTINGS=/{}", self.preset),
        ];

        if let Some((first, last)) = pages {
            args.push(format!("-dFirstPage={}", first));
            args.push(format!("-dLastPage={}", last));
        }

        if !tracing::enabled!(tracing::Level::DEBUG) {
            args.push("-q".to_string());
        }

        args.push(format!("-sOutputFile={}", output.display()));
        args.push(input.display().to_string());
        args
    }

    fn run(&self, input: &Path, output: &Path, pages: Option<(usize, usize)>) -> OptimizeResult<()> {
        FileManager::write_atomically_via_path(output, |temp_path| {
            let args = self.build_args(input, temp_path, pages);
            debug!("Running {} {}", self.gs_path.display(), args.join(" "));

            let start_time = std::time::Instant::now();
            let result = Command::new(&self.gs_path)
                .args(&args)
                .output()
                .map_err(|e| OptimizeError::Ghostscript(format!("Failed to execute {}: {}", self.gs_path.display(), e)))?;

            if !result.status.success() {
                let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
                return Err(OptimizeError::Ghostscript(if stderr.is_empty() {
                    format!("exited with {}", result.status)
                } else {
                    stderr
                }));
            }

            debug!("Ghostscript finished in {:.1}s", start_time.elapsed().as_secs_f64());
            Ok(())
        })
        .map_err(save_error)
    }
}

impl PdfEngine for GhostscriptProcessor {
    type Document = Document;

    fn name(&self) -> &'static str {
        "ghostscript"
    }

    fn open(&self, path: &Path) -> OptimizeResult<Document> {
        self.reader.open(path)
    }

    fn page_count(&self, doc: &Document) -> usize {
        self.reader.page_count(doc)
    }

    fn save_optimized(&self, doc: Document, input: &Path, output: &Path) -> OptimizeResult<()> {
        // gs reads the file itself
        drop(doc);
        self.run(input, output, None)
    }

    fn save_split(
        &self,
        doc: Document,
        input: &Path,
        output: &Path,
        pages_per_file: u32,
    ) -> OptimizeResult<Vec<PathBuf>> {
        let total = self.reader.page_count(&doc);
        drop(doc);

        if total == 0 {
            return Err(OptimizeError::Save("Document has no pages to split".to_string()));
        }

        let step = pages_per_file.max(1) as usize;
        let mut parts = Vec::new();
        for (index, first) in (1..=total).step_by(step).enumerate() {
            let last = (first + step - 1).min(total);
            let part_path = PathResolver::split_part_path(input, output, index + 1);
            self.run(input, &part_path, Some((first, last)))?;
            parts.push(part_path);
        }

        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_build_args() {
        let engine = GhostscriptProcessor::with_binary(PathBuf::from("gs"), "ebook");
        let args = engine.build_args(Path::new("in.pdf"), Path::new("out.pdf"), Some((3, 4)));

        assert_eq!(&args[..5], &["-dNOPAUSE", "-dBATCH", "-dSAFER", "-sDEVICE=pdfwrite", "-dPDFSETTINGS=/ebook"]);
        assert!(args.contains(&"-dFirstPage=3".to_string()));
        assert!(args.contains(&"-dLastPage=4".to_string()));
        assert_eq!(args[args.len() - 2], "-sOutputFile=out.pdf");
        assert_eq!(args[args.len() - 1], "in.pdf");
    }

    #[test]
    fn test_missing_ghostscript_is_missing_dependency() {
        let empty = TempDir::new().unwrap();
        let resolver = ToolPathResolver::with_locations(None, Some(empty.path().as_os_str().to_owned()));

        let err = GhostscriptProcessor::new(&resolver, "ebook").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
    }

    #[test]
    fn test_unrunnable_binary_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        let output = dir.path().join("report_optimized.pdf");
        crate::pdf_processor::test_pdf::write(&input, 2);

        let engine = GhostscriptProcessor::with_binary(dir.path().join("no-such-gs"), "ebook");
        let doc = engine.open(&input).unwrap();
        assert_eq!(engine.page_count(&doc), 2);

        let err = engine.save_optimized(doc, &input, &output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ghostscript);
        assert!(!output.exists());
    }
}
