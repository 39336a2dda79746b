//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout per ogni evento di un run
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio ottimizzazione (job risolto e motore)
//! - `progress`: Percentuale corrente (0-100)
//! - `complete`: Fine run con dimensioni e file prodotti
//! - `error`: Errore di validazione o del motore

use crate::controller::Job;
use crate::error::{ErrorKind, OptimizeError};
use crate::optimizer::runner::RunReport;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del processo di ottimizzazione
    Start {
        input: PathBuf,
        output: PathBuf,
        overwrite_original: bool,
        engine: String,
    },

    /// Progresso corrente
    Progress { percentage: u8 },

    /// Processo completato
    Complete {
        outputs: Vec<PathBuf>,
        pages: usize,
        original_size: u64,
        optimized_size: u64,
        reduction_percent: f64,
        duration_seconds: f64,
    },

    /// Errore
    Error { kind: ErrorKind, message: String },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(job: &Job, engine: &str) -> Self {
        Self::Start {
            input: job.input_path.clone(),
            output: job.output_path.clone(),
            overwrite_original: job.overwrite_original,
            engine: engine.to_string(),
        }
    }

    pub fn progress(percentage: u8) -> Self {
        Self::Progress { percentage }
    }

    pub fn complete(report: &RunReport) -> Self {
        Self::Complete {
            outputs: report.outputs.clone(),
            pages: report.pages,
            original_size: report.original_size,
            optimized_size: report.optimized_size,
            reduction_percent: report.reduction_percent(),
            duration_seconds: report.duration.as_secs_f64(),
        }
    }

    pub fn error(err: &OptimizeError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
