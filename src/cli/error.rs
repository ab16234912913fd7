//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
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
                    ApplicationError::FileNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Domain(_)
                    | ApplicationError::InvalidInput(_)
                    | ApplicationError::EmptyTree => crate::exitcode::DATAERR,
                    ApplicationError::TooLargeToRender { .. } => crate::exitcode::USAGE,
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
    use crate::domain::DomainError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes_follow_sysexits() {
        let missing = CliError::from(ApplicationError::FileNotFound(PathBuf::from("x")));
        assert_eq!(missing.exit_code(), crate::exitcode::NOINPUT);

        let bad_value = CliError::from(ApplicationError::Domain(DomainError::ValueOutOfRange {
            value: 0,
            max: 1000,
        }));
        assert_eq!(bad_value.exit_code(), crate::exitcode::DATAERR);

        assert_eq!(
            CliError::Usage("menu".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }
}
