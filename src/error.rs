//! Application error type.
//!
//! Every failure is wrapped once, where it is caught, into an [`AppError`]
//! carrying:
//!
//! - an [`ErrorKind`] (which stage failed; also selects the exit code)
//! - a human-readable message
//! - the underlying cause, if any
//! - the source location of the wrap site (via `#[track_caller]`)
//!
//! and then bubbles up with `?` to the binary entry point.

use std::panic::Location;
use std::sync::Arc;

/// Which part of the system produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad CLI/env configuration.
    Config,
    /// Source dataset missing, unreadable or malformed.
    Ingestion,
    /// Preprocessor fit/transform failure.
    Transformation,
    /// Model fitting failed or no model cleared the score threshold.
    Training,
    /// Artifact missing or corrupt on load, or not writable on save.
    Persistence,
    /// Failure inside a single prediction call.
    Prediction,
    /// Web server bind/serve failure.
    Server,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Ingestion => "ingestion",
            ErrorKind::Transformation => "transformation",
            ErrorKind::Training => "training",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Prediction => "prediction",
            ErrorKind::Server => "server",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Ingestion => 3,
            ErrorKind::Transformation => 4,
            ErrorKind::Training => 5,
            ErrorKind::Persistence => 6,
            ErrorKind::Prediction => 7,
            ErrorKind::Server => 8,
        }
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    cause: Option<Cause>,
    location: &'static Location<'static>,
}

impl AppError {
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            location: Location::caller(),
        }
    }

    /// Wrap an underlying error with a kind and context message.
    #[track_caller]
    pub fn wrap<E>(kind: ErrorKind, message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            message: message.into(),
            cause: Some(Arc::new(cause)),
            location: Location::caller(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} error at {}:{}: {}",
            self.kind.label(),
            self.location.file(),
            self.location.line(),
            self.message
        )?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .field("location", &format_args!("{}:{}", self.location.file(), self.location.line()))
            .finish()
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}
