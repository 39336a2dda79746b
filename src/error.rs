//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//! - Espone `ErrorKind` per l'output JSON e per i test
//!
//! ## Categorie di errori:
//! - `Validation`: Input mancante o non valido, sovrascrittura ambigua (prima di ogni lavoro)
//! - `Open`: Il PDF non può essere aperto dal motore (file corrotto, permessi)
//! - `Save`: Il salvataggio ottimizzato è fallito (disco pieno, permessi)
//! - `Io`: Errori di I/O generici
//! - `MissingDependency`: Tool esterno mancante (ghostscript)
//! - `Ghostscript`: Ghostscript terminato con errore
//!
//! ## Esempio:
//! ```ignore
//! if !path.is_file() {
//!     return Err(OptimizeError::Validation(format!("Input file does not exist: {}", path.display())));
//! }
//! ```

use serde::Serialize;

/// Custom error types for PDF optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("{0}")]
    Validation(String),

    #[error("Cannot open PDF: {0}")]
    Open(String),

    #[error("Cannot save optimized PDF: {0}")]
    Save(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Ghostscript error: {0}")]
    Ghostscript(String),
}

/// Coarse classification of an [`OptimizeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Open,
    Save,
    Io,
    MissingDependency,
    Ghostscript,
}

impl OptimizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Open(_) => ErrorKind::Open,
            Self::Save(_) => ErrorKind::Save,
            Self::Io(_) => ErrorKind::Io,
            Self::MissingDependency(_) => ErrorKind::MissingDependency,
            Self::Ghostscript(_) => ErrorKind::Ghostscript,
        }
    }

    /// True for errors raised before any background work started
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;
