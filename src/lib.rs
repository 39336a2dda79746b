//! # PDF Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom (validazione, apertura, salvataggio)
//! - `controller`: Stato della selezione e abilitazione dell'avvio
//! - `file_manager`: Operazioni sui file e scrittura atomica
//! - `pdf_processor`: Motore PDF nativo (lopdf) e trait `PdfEngine`
//! - `ghostscript_processor`: Motore alternativo tramite Ghostscript
//! - `tool_resolver`: Ricerca dei binari esterni
//! - `optimizer`: Worker di un run, progress e path
//! - `session`: Loop in foreground con comandi e notifiche
//! - `progress` / `json_output` / `notifier`: Feedback all'utente
//!
//! ## Utilizzo:
//! ```ignore
//! use pdf_optimizer::{Config, LopdfProcessor, OptimizationRunner, Session, TerminalNotifier};
//!
//! let runner = OptimizationRunner::new(LopdfProcessor::default());
//! let mut session = Session::new(Config::default(), runner, TerminalNotifier);
//! session.controller_mut().set_input("report.pdf")?;
//! session.controller_mut().set_output_folder("/out");
//! session.run_once(&mut lines).await?;
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod file_manager;
pub mod ghostscript_processor;
pub mod json_output;
pub mod notifier;
pub mod optimizer;
pub mod pdf_processor;
pub mod progress;
pub mod session;
pub mod tool_resolver;

pub use config::{Config, EngineKind};
pub use controller::{Job, JobMode, Selection, SelectionController};
pub use error::{ErrorKind, OptimizeError, OptimizeResult};
pub use ghostscript_processor::GhostscriptProcessor;
pub use notifier::{Notifier, TerminalNotifier};
pub use optimizer::{OptimizationRunner, RunEvent, RunReport};
pub use pdf_processor::{LopdfProcessor, PdfEngine, RewriteOptions};
pub use session::Session;
pub use tool_resolver::ToolPathResolver;
