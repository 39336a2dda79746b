//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri di input
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `output_suffix`: Suffisso del nome file di default (default: "_optimized")
//! - `engine`: Motore di ottimizzazione (`native` con lopdf o `ghostscript`)
//! - `gs_preset`: Preset `-dPDFSETTINGS` di Ghostscript (default: "ebook")
//! - `prune_objects` / `compress_streams` / `clean_structure`: flag di salvataggio
//! - `split_pages`: Pagine per file in modalità split (default: None = nessuno split)
//! - `json_output`: Eventi JSON su stdout invece della progress bar
//! - `assume_yes`: Salta le conferme di sovrascrittura
//!
//! ## Validazione:
//! - Il suffisso non può essere vuoto né contenere separatori di path
//! - Il preset Ghostscript deve essere uno di quelli supportati
//! - `split_pages` deve essere > 0
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     split_pages: Some(10),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::{OptimizeError, OptimizeResult};
use serde::{Deserialize, Serialize};

/// Presets accepted by Ghostscript's `-dPDFSETTINGS`
pub const GS_PRESETS: &[&str] = &["screen", "ebook", "printer", "prepress", "default"];

/// Which engine performs the rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process rewrite with lopdf
    Native,
    /// External `gs` pdfwrite pass
    Ghostscript,
}

/// Configuration for PDF optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Appended to the input stem to build the default output filename
    pub output_suffix: String,
    /// Rewrite engine
    pub engine: EngineKind,
    /// Ghostscript `-dPDFSETTINGS` preset (without the leading slash)
    pub gs_preset: String,
    /// Drop objects no longer referenced from the trailer
    pub prune_objects: bool,
    /// Deflate every stream that is not already filtered
    pub compress_streams: bool,
    /// Remove empty streams and renumber objects densely
    pub clean_structure: bool,
    /// Write parts of at most this many pages instead of a single file
    pub split_pages: Option<u32>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Answer yes to every overwrite confirmation
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_suffix: "_optimized".to_string(),
            engine: EngineKind::Native,
            gs_preset: "ebook".to_string(),
            prune_objects: true,
            compress_streams: true,
            clean_structure: true,
            split_pages: None,
            json_output: false,
            assume_yes: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> OptimizeResult<()> {
        if self.output_suffix.is_empty() {
            return Err(OptimizeError::Validation("Output suffix cannot be empty".to_string()));
        }

        if self.output_suffix.contains(['/', '\\']) {
            return Err(OptimizeError::Validation(format!(
                "Output suffix cannot contain path separators: {}",
                self.output_suffix
            )));
        }

        if !GS_PRESETS.contains(&self.gs_preset.as_str()) {
            return Err(OptimizeError::Validation(format!(
                "Unknown Ghostscript preset '{}' (expected one of: {})",
                self.gs_preset,
                GS_PRESETS.join(", ")
            )));
        }

        if self.split_pages == Some(0) {
            return Err(OptimizeError::Validation("Pages per file must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.output_suffix = String::new();
        assert!(config.validate().is_err());

        config.output_suffix = "_small/".to_string();
        assert!(config.validate().is_err());

        config.output_suffix = "_small".to_string();
        config.gs_preset = "tiny".to_string();
        assert!(config.validate().is_err());

        config.gs_preset = "screen".to_string();
        config.split_pages = Some(0);
        assert!(config.validate().is_err());

        config.split_pages = Some(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.output_suffix, "_optimized");
        assert_eq!(config.engine, EngineKind::Native);
        assert_eq!(config.gs_preset, "ebook");
        assert!(config.prune_objects);
        assert!(config.compress_streams);
        assert!(config.clean_structure);
        assert!(config.split_pages.is_none());
        assert!(!config.json_output);
        assert!(!config.assume_yes);
    }

    #[test]
    fn test_config_serializes_engine_lowercase() {
        let config = Config {
            engine: EngineKind::Ghostscript,
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["engine"], "ghostscript");

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back.engine, EngineKind::Ghostscript);
    }
}
