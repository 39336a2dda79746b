//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output.
//! Evita duplicazione tra SelectionController e OptimizationRunner.

use crate::error::{OptimizeError, OptimizeResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Nome file di default: stem + suffisso, estensione preservata
    pub fn default_output_filename(input_path: &Path, suffix: &str) -> OptimizeResult<String> {
        let file_stem = input_path
            .file_stem()
            .ok_or_else(|| OptimizeError::Validation(format!("Invalid file name: {}", input_path.display())))?
            .to_string_lossy();

        let filename = match input_path.extension() {
            Some(ext) => format!("{}{}.{}", file_stem, suffix, ext.to_string_lossy()),
            None => format!("{}{}", file_stem, suffix),
        };

        Ok(filename)
    }

    /// Path finale di output per una selezione
    pub fn resolve_output_path(
        input_path: &Path,
        output_folder: Option<&Path>,
        output_filename: &str,
        overwrite_original: bool,
    ) -> OptimizeResult<PathBuf> {
        if overwrite_original {
            return Ok(input_path.to_path_buf());
        }

        let output_folder = output_folder
            .ok_or_else(|| OptimizeError::Validation("Select an output folder".to_string()))?;

        let filename = output_filename.trim();
        if filename.is_empty() {
            return Err(OptimizeError::Validation("Output filename cannot be empty".to_string()));
        }
        if Path::new(filename).file_name() != Some(std::ffi::OsStr::new(filename)) {
            return Err(OptimizeError::Validation(format!(
                "Output filename must not contain a directory: {}",
                filename
            )));
        }

        let resolved = output_folder.join(filename);
        debug!("Resolved output path: {} -> {}", input_path.display(), resolved.display());

        if Self::is_same_file(input_path, &resolved) {
            return Err(OptimizeError::Validation(format!(
                "Output path is the input file itself: {} (enable overwrite to modify the original)",
                resolved.display()
            )));
        }

        Ok(resolved)
    }

    /// Path della parte `index` (1-based) in modalità split.
    ///
    /// Il nome deriva dallo stem dell'input (`<stem>_part<k>.<ext>`) e la parte
    /// finisce nella cartella di `output_path`: il nome differisce sempre da
    /// quello dell'input, quindi una parte non può sostituire l'originale.
    pub fn split_part_path(input_path: &Path, output_path: &Path, index: usize) -> PathBuf {
        let (prefix, suffix) = Self::split_part_affixes(input_path);
        output_path.with_file_name(format!("{}{}{}", prefix, index, suffix))
    }

    /// Parti di un run split precedente già presenti nella cartella di output
    pub fn existing_split_parts(input_path: &Path, output_path: &Path) -> Vec<PathBuf> {
        let (prefix, suffix) = Self::split_part_affixes(input_path);
        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut parts: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                    .map_or(false, |n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
            .map(|entry| entry.path())
            .collect();
        parts.sort();
        parts
    }

    fn split_part_affixes(input_path: &Path) -> (String, String) {
        let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
        let suffix = input_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        (format!("{}_part", stem), suffix)
    }

    /// Confronta due path a livello di filesystem.
    ///
    /// Se entrambi esistono decide l'identità del file (device + inode, o
    /// l'equivalente su Windows), quindi hard link e differenze di maiuscole
    /// su filesystem case-insensitive sono riconosciuti. Il path di output può
    /// non esistere ancora: in quel caso si canonicalizza la directory padre e
    /// si riattacca il nome file.
    pub fn is_same_file(a: &Path, b: &Path) -> bool {
        if let Ok(same) = same_file::is_same_file(a, b) {
            return same;
        }

        match (Self::canonical(a), Self::canonical(b)) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        }
    }

    fn canonical(path: &Path) -> Option<PathBuf> {
        if let Ok(canonical) = path.canonicalize() {
            return Some(canonical);
        }

        let name = path.file_name()?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        parent.canonicalize().ok().map(|dir| dir.join(name))
    }

    /// Crea le directory parent se necessario
    pub fn ensure_parent_dirs(path: &Path) -> OptimizeResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OptimizeError::Save(format!(
                        "Failed to create parent directories for {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_output_filename_preserves_extension() {
        let name = PathResolver::default_output_filename(Path::new("/docs/report.pdf"), "_optimized").unwrap();
        assert_eq!(name, "report_optimized.pdf");

        let name = PathResolver::default_output_filename(Path::new("scan.PDF"), "_small").unwrap();
        assert_eq!(name, "scan_small.PDF");
    }

    #[test]
    fn test_overwrite_returns_input() {
        let input = Path::new("a.pdf");
        let resolved = PathResolver::resolve_output_path(input, None, "", true).unwrap();
        assert_eq!(resolved, input);
    }

    #[test]
    fn test_missing_folder_is_validation_error() {
        let err = PathResolver::resolve_output_path(Path::new("a.pdf"), None, "a_optimized.pdf", false)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_identical_path_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, b"%PDF-1.5").unwrap();

        let err = PathResolver::resolve_output_path(&input, Some(dir.path()), "report.pdf", false)
            .unwrap_err();
        assert!(err.is_validation());

        // same file reached through a relative component
        let dotted = dir.path().join(".");
        let err = PathResolver::resolve_output_path(&input, Some(&dotted), "report.pdf", false)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_filename_with_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let err = PathResolver::resolve_output_path(
            Path::new("a.pdf"),
            Some(dir.path()),
            "../escape.pdf",
            false,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_split_part_path_uses_input_stem() {
        let part = PathResolver::split_part_path(
            Path::new("/docs/report.pdf"),
            Path::new("/out/report_optimized.pdf"),
            2,
        );
        assert_eq!(part, PathBuf::from("/out/report_part2.pdf"));
    }

    #[test]
    fn test_split_part_never_names_the_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("x_part1.pdf");
        std::fs::write(&input, b"%PDF-1.5").unwrap();

        let output = dir.path().join("x.pdf");
        for index in 1..=3 {
            let part = PathResolver::split_part_path(&input, &output, index);
            assert!(!PathResolver::is_same_file(&input, &part), "{}", part.display());
        }
    }

    #[test]
    fn test_existing_split_parts() {
        let dir = TempDir::new().unwrap();
        for name in ["report_part1.pdf", "report_part12.pdf", "report_partX.pdf", "report.pdf", "other_part1.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let parts = PathResolver::existing_split_parts(
            Path::new("/docs/report.pdf"),
            &dir.path().join("report_optimized.pdf"),
        );
        assert_eq!(
            parts,
            vec![dir.path().join("report_part1.pdf"), dir.path().join("report_part12.pdf")]
        );

        let missing = dir.path().join("nope").join("report_optimized.pdf");
        assert!(PathResolver::existing_split_parts(Path::new("report.pdf"), &missing).is_empty());
    }

    #[test]
    fn test_is_same_file_detects_hard_link() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("Report.pdf");
        let alias = dir.path().join("alias.pdf");
        std::fs::write(&input, b"%PDF-1.5").unwrap();
        std::fs::hard_link(&input, &alias).unwrap();

        assert!(PathResolver::is_same_file(&input, &alias));

        let err = PathResolver::resolve_output_path(&input, Some(dir.path()), "alias.pdf", false).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_is_same_file_for_missing_output() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("missing.pdf");
        let b = dir.path().join(".").join("missing.pdf");
        assert!(PathResolver::is_same_file(&a, &b));
        assert!(!PathResolver::is_same_file(&a, &dir.path().join("other.pdf")));
    }
}
