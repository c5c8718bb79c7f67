//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the logger
//! - dispatches to the offline pipeline, the web server or the generator
//! - prints reports

use clap::Parser;

use crate::cli::{Cli, Command, IngestArgs, ServeArgs, SynthArgs, TrainArgs};
use crate::domain::ArtifactPaths;
use crate::error::{AppError, ErrorKind};
use crate::logger::Logger;
use crate::predict::PredictPipeline;

pub mod pipeline;

/// Entry point for the `score` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logger = Logger::init(&cli.log.to_config())?;

    let result = match cli.command {
        Command::Ingest(args) => handle_ingest(args),
        Command::Train(args) => handle_train(args),
        Command::Serve(args) => handle_serve(args),
        Command::Synth(args) => handle_synth(args),
    };

    if let (Err(_), Some(path)) = (&result, logger.file_path()) {
        eprintln!("Details in {}", path.display());
    }
    result
}

fn handle_ingest(args: IngestArgs) -> Result<(), AppError> {
    let ingest = pipeline::run_ingestion(&args.to_config())?;
    println!("{}", crate::report::format_ingestion_summary(&ingest));
    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let run = pipeline::run_training(&config)?;

    println!("{}", crate::report::format_ingestion_summary(&run.ingest));
    println!(
        "{}",
        crate::report::format_training_summary(&run.outcome, &run.preprocessor_path)
    );
    println!("{}", run.outcome.r2);
    Ok(())
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    // Artifacts are loaded once, before the listener exists.
    let pipeline = PredictPipeline::new(&ArtifactPaths::new(&args.artifacts))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::wrap(ErrorKind::Server, "Failed to start the async runtime", e))?;
    runtime.block_on(crate::web::serve(args.addr(), pipeline))
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let table = crate::data::write_synthetic_dataset(&args.output, args.rows, args.seed)?;
    tracing::info!("Wrote {} synthetic rows to {}", table.len(), args.output.display());
    println!("Wrote {} rows to {}", table.len(), args.output.display());
    Ok(())
}
