//! Error types for esload operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for esload operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for [`TransformService`](crate::TransformService) calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Message reported by both adapters when no service is attached to the compiler.
pub const MISSING_SERVICE_MESSAGE: &str = "[esload] You need to install the esbuild service on the compiler first (Compiler::install_service or EsbuildServicePlugin)";

/// Errors surfaced by the adapters to the host.
#[derive(Debug, Error)]
pub enum Error {
    /// No service handle was attached to the compiler before an adapter ran.
    #[error("{}", MISSING_SERVICE_MESSAGE)]
    MissingService,

    /// The service finished without producing an output payload.
    #[error("[esload] esbuild loader failed on: {}", path.display())]
    NoOutput { path: PathBuf },

    /// Failure reported by the service, passed through unchanged.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The host named an asset that is not in its asset store.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// A source map could not be parsed or composed.
    #[error("Invalid source map: {0}")]
    SourceMap(String),

    /// Configuration could not be loaded or extracted.
    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A loader dropped its completion callback without reporting.
    #[error("[esload] loader for {} finished without reporting a result", path.display())]
    LoaderDropped { path: PathBuf },
}

impl From<figment::Error> for Error {
    fn from(error: figment::Error) -> Self {
        Error::Config(Box::new(error))
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::MissingService => "MISSING_SERVICE",
            Error::NoOutput { .. } => "NO_OUTPUT",
            Error::Service(_) => "SERVICE_ERROR",
            Error::AssetNotFound(_) => "ASSET_NOT_FOUND",
            Error::SourceMap(_) => "SOURCE_MAP",
            Error::Config(_) => "INVALID_CONFIG",
            Error::LoaderDropped { .. } => "LOADER_DROPPED",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::MissingService => Some(Box::new(
                "Apply EsbuildServicePlugin (or call Compiler::install_service) before the loader or minify plugin runs.",
            )),
            Error::NoOutput { path } => Some(Box::new(format!(
                "esbuild produced no output for '{}'. Check that `write` is not enabled in buildOptions.",
                path.display()
            ))),
            Error::Config(err) => Some(Box::new(format!(
                "Check esload.toml / esload.json and ESLOAD_* variables.\nError: {}",
                err
            ))),
            _ => None,
        }
    }
}

/// Errors raised by a [`TransformService`](crate::TransformService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service ran and reported a failure.
    #[error("{message}")]
    Failed { message: String },

    /// The service process could not be started.
    #[error("failed to start esbuild: {0}")]
    Spawn(#[source] std::io::Error),

    /// I/O with a running service failed.
    #[error("esbuild I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Service output could not be decoded.
    #[error("could not decode esbuild output: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn failed(message: impl Into<String>) -> Self {
        ServiceError::Failed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn service_errors_pass_through_unchanged() {
        let err: Error = ServiceError::failed("Unexpected \"}\"").into();
        assert_eq!(err.to_string(), "Unexpected \"}\"");
    }

    #[test]
    fn no_output_names_the_path() {
        let err = Error::NoOutput {
            path: PathBuf::from("/src/app.js"),
        };
        assert!(err.to_string().contains("/src/app.js"));
    }

    #[test]
    fn missing_service_has_code_and_help() {
        let err = Error::MissingService;
        assert_eq!(err.code().unwrap().to_string(), "MISSING_SERVICE");
        assert!(err.help().is_some());
        assert_eq!(err.to_string(), MISSING_SERVICE_MESSAGE);
    }
}
