//! Command-line parsing for the student-score trainer and server.
//!
//! Argument parsing stays here; dispatch lives in `app`. Every path and
//! address flag falls back to an environment variable (a `.env` file is
//! loaded before parsing).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    ArtifactPaths, DEFAULT_ARTIFACTS_DIR, DEFAULT_SOURCE_PATH, IngestionConfig, MIN_ACCEPTABLE_R2, ModelKind,
    TrainConfig, TrainerConfig,
};
use crate::logger::LogConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "score", version, about = "Student math-score predictor: training pipeline and web front end")]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy the raw dataset into the artifacts directory and split it.
    Ingest(IngestArgs),
    /// Ingest, fit the preprocessor, evaluate every regressor and save the best.
    Train(TrainArgs),
    /// Serve the prediction form over HTTP.
    Serve(ServeArgs),
    /// Write a synthetic dataset with the raw schema.
    Synth(SynthArgs),
}

/// Logging options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Directory for the per-run log file.
    #[arg(long, global = true, env = "STUDENT_SCORE_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Log level or filter directive (overridden by RUST_LOG).
    #[arg(long, global = true, env = "STUDENT_SCORE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log to stderr only.
    #[arg(long, global = true)]
    pub no_log_file: bool,
}

impl LogArgs {
    /// File logging is on unless disabled; the console mirror is on when
    /// there is no file.
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            dir: (!self.no_log_file).then(|| self.log_dir.clone()),
            level: self.log_level.clone(),
            console: self.no_log_file,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// Raw dataset CSV.
    #[arg(long, env = "STUDENT_SCORE_SOURCE", default_value = DEFAULT_SOURCE_PATH)]
    pub source: PathBuf,

    /// Directory for split data and trained artifacts.
    #[arg(long, env = "STUDENT_SCORE_ARTIFACTS", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Seed for the train/test shuffle.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for testing.
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,
}

impl IngestArgs {
    pub fn to_config(&self) -> IngestionConfig {
        IngestionConfig {
            source_path: self.source.clone(),
            artifacts: ArtifactPaths::new(&self.artifacts),
            test_size: self.test_size,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Minimum test R² required to save a model.
    #[arg(long, default_value_t = MIN_ACCEPTABLE_R2)]
    pub min_score: f64,

    /// Seed for the randomized regressors.
    #[arg(long, default_value_t = 42)]
    pub model_seed: u64,

    /// Write the model report to this JSON file.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

impl TrainArgs {
    pub fn to_config(&self) -> TrainConfig {
        let ingestion = self.ingest.to_config();
        TrainConfig {
            trainer: TrainerConfig {
                model_path: ingestion.artifacts.model.clone(),
                min_score: self.min_score,
                seed: self.model_seed,
                models: ModelKind::ALL.to_vec(),
            },
            ingestion,
            export_report: self.export_report.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Directory holding `model.pkl` and `preprocessor.pkl`.
    #[arg(long, env = "STUDENT_SCORE_ARTIFACTS", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(long, env = "STUDENT_SCORE_SOURCE", default_value = DEFAULT_SOURCE_PATH)]
    pub output: PathBuf,

    /// Number of students to generate.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_defaults() {
        let cli = Cli::try_parse_from(["score", "train", "--artifacts", "out"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        let config = args.to_config();
        assert_eq!(config.trainer.model_path, PathBuf::from("out").join("model.pkl"));
        assert_eq!(config.trainer.min_score, 0.6);
        assert_eq!(config.ingestion.test_size, 0.2);
        assert_eq!(config.trainer.models.len(), 8);
        assert!(config.export_report.is_none());
    }

    #[test]
    fn serve_address_flags() {
        let cli = Cli::try_parse_from(["score", "serve", "--host", "0.0.0.0", "--port", "8080"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn global_log_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["score", "synth", "--rows", "10", "--no-log-file", "--log-level", "debug"]).unwrap();
        let log = cli.log.to_config();
        assert!(log.dir.is_none());
        assert!(log.console);
        assert_eq!(log.level, "debug");
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(Cli::try_parse_from(["score", "serve", "--port", "http"]).is_err());
    }
}
