//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file.
//!
//! ## Responsabilità:
//! - Determinazione formato file (solo PDF accettati)
//! - Scrittura atomica dell'output tramite file temporaneo + rename
//! - Utilità per calcoli dimensioni e percentuali
//! - Formattazione human-readable delle dimensioni
//!
//! ## Sicurezza operazioni:
//! - L'output viene scritto in un file temporaneo nella stessa directory
//! - Il file temporaneo sostituisce la destinazione solo a scrittura completata
//! - In caso di errore il file temporaneo viene rimosso e la destinazione resta intatta
//!
//! ## Esempio:
//! ```ignore
//! FileManager::write_atomically(&output, |file| doc.save_to(file))?;
//! println!("{}", FileManager::format_size(1536)); // "1.50 KB"
//! ```

use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Manages file operations
pub struct FileManager;

impl FileManager {
    /// Check if a file has a `.pdf` extension (case-insensitive)
    pub fn is_pdf(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    /// Size of a file in bytes
    pub fn file_size(path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    /// Write `path` through a sibling temporary file.
    ///
    /// `write` receives the temporary file; the destination is replaced by a
    /// rename only if it returns `Ok`, so readers never observe a half-written
    /// file and a failed write leaves the previous content untouched.
    pub fn write_atomically<E, F>(path: &Path, write: F) -> Result<(), E>
    where
        E: From<io::Error>,
        F: FnOnce(&mut File) -> Result<(), E>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        debug!("Writing {} via {}", path.display(), temp.path().display());

        write(temp.as_file_mut())?;
        temp.as_file_mut().sync_all()?;
        Self::keep_permissions(path, temp.as_file());

        temp.persist(path).map_err(|e| E::from(e.error))?;
        Ok(())
    }

    /// Like [`write_atomically`](Self::write_atomically) for writers that need
    /// a path (external tools) instead of an open file.
    pub fn write_atomically_via_path<E, F>(path: &Path, write: F) -> Result<(), E>
    where
        E: From<io::Error>,
        F: FnOnce(&Path) -> Result<(), E>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = NamedTempFile::new_in(dir)?;
        write(temp.path())?;
        Self::keep_permissions(path, temp.as_file());

        temp.persist(path).map_err(|e| E::from(e.error))?;
        Ok(())
    }

    /// A replaced file keeps its mode instead of the temp file's 0600
    fn keep_permissions(path: &Path, temp: &File) {
        if let Ok(meta) = std::fs::metadata(path) {
            if let Err(e) = temp.set_permissions(meta.permissions()) {
                debug!("Could not copy permissions of {}: {}", path.display(), e);
            }
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction (negative when the file grew)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
