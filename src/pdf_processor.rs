//! # PDF Processing Module
//!
//! Questo modulo incapsula il collaboratore esterno che riscrive davvero il PDF.
//!
//! ## Responsabilità:
//! - Definisce il trait `PdfEngine`: "apri documento e conta pagine" + "salva con flag"
//! - Implementa `LopdfProcessor`, il motore nativo basato su `lopdf`
//! - Applica le opzioni di salvataggio (prune, compress, clean)
//! - Scrive sempre l'output in modo atomico tramite `FileManager`
//!
//! ## Pipeline di salvataggio (lopdf):
//! 1. `delete_zero_length_streams()` se clean è attivo
//! 2. `prune_objects()`: rimuove oggetti non più referenziati (garbage collection)
//! 3. `renumber_objects()` se clean è attivo: numerazione compatta
//! 4. `compress()`: deflate di tutti gli stream non ancora compressi
//! 5. `save_to()` su file temporaneo, poi rename sulla destinazione
//!
//! Il parsing, l'attraversamento del grafo di oggetti e la compressione sono
//! interamente delegati a lopdf.
//!
//! ## Esempio:
//! ```ignore
//! let engine = LopdfProcessor::new(RewriteOptions::default());
//! let doc = engine.open(&input)?;
//! let pages = engine.page_count(&doc);
//! engine.save_optimized(doc, &input, &output)?;
//! ```

use crate::config::Config;
use crate::error::{OptimizeError, OptimizeResult};
use crate::file_manager::FileManager;
use crate::optimizer::path_resolver::PathResolver;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags passed to the engine's save routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    pub prune_objects: bool,
    pub compress_streams: bool,
    pub clean_structure: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            prune_objects: true,
            compress_streams: true,
            clean_structure: true,
        }
    }
}

impl From<&Config> for RewriteOptions {
    fn from(config: &Config) -> Self {
        Self {
            prune_objects: config.prune_objects,
            compress_streams: config.compress_streams,
            clean_structure: config.clean_structure,
        }
    }
}

/// The external PDF library seen through the two calls a run needs.
///
/// Save methods take the document by value: the handle is released when they
/// return, on success and on error alike.
pub trait PdfEngine: Send + Sync + 'static {
    type Document: Send;

    fn name(&self) -> &'static str;

    fn open(&self, path: &Path) -> OptimizeResult<Self::Document>;

    fn page_count(&self, doc: &Self::Document) -> usize;

    fn save_optimized(&self, doc: Self::Document, input: &Path, output: &Path) -> OptimizeResult<()>;

    /// Write `<input stem>_part<k>` files of at most `pages_per_file` pages
    /// into the folder of `output`
    fn save_split(
        &self,
        doc: Self::Document,
        input: &Path,
        output: &Path,
        pages_per_file: u32,
    ) -> OptimizeResult<Vec<PathBuf>>;
}

/// Native engine backed by lopdf
#[derive(Debug, Clone, Default)]
pub struct LopdfProcessor {
    options: RewriteOptions,
}

impl LopdfProcessor {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    fn rewrite(&self, doc: &mut Document) {
        if self.options.clean_structure {
            let removed = doc.delete_zero_length_streams();
            debug!("Removed {} empty streams", removed.len());
        }

        if self.options.prune_objects {
            let pruned = doc.prune_objects();
            debug!("Pruned {} unreferenced objects", pruned.len());
        }

        if self.options.clean_structure {
            doc.renumber_objects();
        }

        if self.options.compress_streams {
            doc.compress();
        }
    }

    fn write(doc: &mut Document, output: &Path) -> OptimizeResult<()> {
        FileManager::write_atomically(output, |file| {
            doc.save_to(file).map_err(|e| OptimizeError::Save(e.to_string()))
        })
        .map_err(save_error)
    }
}

impl PdfEngine for LopdfProcessor {
    type Document = Document;

    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn open(&self, path: &Path) -> OptimizeResult<Document> {
        Document::load(path).map_err(|e| OptimizeError::Open(format!("{}: {}", path.display(), e)))
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }

    fn save_optimized(&self, mut doc: Document, _input: &Path, output: &Path) -> OptimizeResult<()> {
        self.rewrite(&mut doc);
        Self::write(&mut doc, output)
    }

    fn save_split(
        &self,
        doc: Document,
        input: &Path,
        output: &Path,
        pages_per_file: u32,
    ) -> OptimizeResult<Vec<PathBuf>> {
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err(OptimizeError::Save("Document has no pages to split".to_string()));
        }

        let mut parts = Vec::new();
        for (index, chunk) in pages.chunks(pages_per_file.max(1) as usize).enumerate() {
            let mut part = doc.clone();
            let delete: Vec<u32> = pages.iter().copied().filter(|p| !chunk.contains(p)).collect();
            part.delete_pages(&delete);
            self.rewrite(&mut part);

            let part_path = PathResolver::split_part_path(input, output, index + 1);
            debug!("Writing pages {:?} to {}", chunk, part_path.display());
            Self::write(&mut part, &part_path)?;
            parts.push(part_path);
        }

        Ok(parts)
    }
}

/// Failures while writing are save failures, whatever layer raised them
pub(crate) fn save_error(err: OptimizeError) -> OptimizeError {
    match err {
        OptimizeError::Io(e) => OptimizeError::Save(e.to_string()),
        other => other,
    }
}
