//! # Optimizer Module
//!
//! Separa le responsabilità di un run in sottomoduli:
//! - `runner`: Worker che esegue un singolo `Job` sul motore PDF
//! - `progress_tracker`: Percentuali per pagina e progress bar
//! - `path_resolver`: Calcolo del path di output centralizzato

pub mod path_resolver;
pub mod progress_tracker;
pub mod runner;

pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use runner::{OptimizationRunner, RunEvent, RunReport};
