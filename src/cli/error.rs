//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::from(ApplicationError::Domain(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(domain) => match domain {
                        DomainError::InvalidTraversalOrder(_)
                        | DomainError::InvalidDevice(_)
                        | DomainError::InvalidMeterFormat(_) => crate::exitcode::USAGE,
                        DomainError::UnsupportedType { .. }
                        | DomainError::UnknownMutableKind(_) => crate::exitcode::DATAERR,
                        DomainError::NodeNotFound(_) => crate::exitcode::SOFTWARE,
                    },
                    ApplicationError::FileNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Parse { .. } => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;
    use std::path::PathBuf;

    #[test]
    fn given_invalid_order_then_usage_exit_code() {
        let err = CliError::from(DomainError::InvalidTraversalOrder("x".into()));
        assert_eq!(err.exit_code(), exitcode::USAGE);
        assert_eq!(
            err.to_string(),
            "invalid traversal order: \"x\" (expected \"pre\" or \"post\")"
        );
    }

    #[test]
    fn given_missing_input_then_noinput_exit_code() {
        let err = CliError::from(ApplicationError::FileNotFound(PathBuf::from("a.toml")));
        assert_eq!(err.exit_code(), exitcode::NOINPUT);
    }

    #[test]
    fn given_unsupported_payload_then_dataerr_exit_code() {
        let err = CliError::from(DomainError::UnsupportedType {
            value: "null".into(),
            type_name: "NoneType".into(),
        });
        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_io_error_then_ioerr_exit_code() {
        let err = CliError::from(InfraError::io(
            "write config",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert_eq!(err.exit_code(), exitcode::IOERR);
    }
}
