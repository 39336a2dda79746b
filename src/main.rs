//! # PDF Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Creazione e validazione della configurazione
//! - Scelta del motore (lopdf nativo o Ghostscript) e avvio della sessione
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Crea e valida `Config`
//! 4. Con un file in input: applica la selezione ed esegue un singolo run
//! 5. Senza file: avvia la sessione interattiva su stdin
//!
//! ## Esempio di utilizzo:
//! ```bash
//! pdf-optimizer report.pdf --output-dir /out --verbose
//! pdf-optimizer scan.pdf --overwrite --yes --engine ghostscript --gs-preset screen
//! pdf-optimizer            # sessione interattiva
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use pdf_optimizer::{
    Config, EngineKind, GhostscriptProcessor, LopdfProcessor, OptimizationRunner, PdfEngine, RewriteOptions,
    Session, TerminalNotifier, ToolPathResolver,
};

#[derive(Parser)]
#[command(name = "pdf-optimizer")]
#[command(about = "Shrink PDF files by rewriting them with compression and cleanup")]
struct Args {
    /// PDF file to optimize (omit to start an interactive session)
    input: Option<PathBuf>,

    /// Folder for the optimized file (default: the input's folder)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output filename (default: <name>_optimized.pdf)
    #[arg(short = 'n', long)]
    output_name: Option<String>,

    /// Replace the original file in place
    #[arg(long)]
    overwrite: bool,

    /// Write parts of at most N pages each
    #[arg(long, value_name = "N")]
    split: Option<u32>,

    /// Optimization engine
    #[arg(long, value_enum, default_value = "native")]
    engine: EngineKind,

    /// Shortcut for --engine ghostscript
    #[arg(long)]
    ghostscript: bool,

    /// Ghostscript -dPDFSETTINGS preset
    #[arg(long, default_value = "ebook")]
    gs_preset: String,

    /// Suffix of the default output filename
    #[arg(long, default_value = "_optimized")]
    suffix: String,

    /// Keep unreferenced objects
    #[arg(long)]
    no_prune: bool,

    /// Leave uncompressed streams as they are
    #[arg(long)]
    no_compress: bool,

    /// Skip empty stream removal and object renumbering
    #[arg(long)]
    no_clean: bool,

    /// Output progress and status as JSON lines
    #[arg(long)]
    json: bool,

    /// Answer yes to overwrite confirmations
    #[arg(short = 'y', long)]
    yes: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            output_suffix: self.suffix.clone(),
            engine: if self.ghostscript { EngineKind::Ghostscript } else { self.engine },
            gs_preset: self.gs_preset.clone(),
            prune_objects: !self.no_prune,
            compress_streams: !self.no_compress,
            clean_structure: !self.no_clean,
            split_pages: self.split,
            json_output: self.json,
            assume_yes: self.yes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // stdout carries notifications and JSON, logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.config();
    config.validate()?;
    debug!("Configuration: {:?}", config);

    match config.engine {
        EngineKind::Native => {
            let engine = LopdfProcessor::new(RewriteOptions::from(&config));
            run(args, config, engine).await
        }
        EngineKind::Ghostscript => {
            let engine = GhostscriptProcessor::new(&ToolPathResolver::new(), config.gs_preset.clone())?;
            run(args, config, engine).await
        }
    }
}

async fn run<E: PdfEngine>(args: Args, config: Config, engine: E) -> Result<ExitCode> {
    info!("Using {} engine", engine.name());

    let mut session = Session::new(config, OptimizationRunner::new(engine), TerminalNotifier);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let Some(input) = args.input else {
        session.run_interactive(&mut lines).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let controller = session.controller_mut();
    if let Err(e) = controller.set_input(&input) {
        session.report_error("Invalid input", &e);
        return Ok(ExitCode::FAILURE);
    }

    controller.set_overwrite_original(args.overwrite);
    let folder = args.output_dir.or_else(|| {
        (!args.overwrite).then(|| {
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf()
        })
    });
    if let Some(folder) = folder {
        controller.set_output_folder(folder);
    }
    if let Some(name) = args.output_name {
        controller.set_output_filename(name);
    }

    match session.run_once(&mut lines).await? {
        Some(Ok(_)) => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}
