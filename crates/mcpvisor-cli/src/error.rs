//! CLI-specific error types and exit code mapping.

use mcpvisor_core::{ProviderError, SettingsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provider manager error.
    #[error("{0}")]
    Provider(String),

    /// No provider matches the given identifier.
    #[error("No provider found matching '{0}'")]
    NotFound(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider store could not be read or written.
    #[error("Store error: {0}")]
    Store(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// Follows sysexits.h where a category fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Provider(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::NotFound(_) => 66, // EX_NOINPUT
            Self::Io(_) => 74,       // EX_IOERR
            Self::Store(_) => 73,    // EX_CANTCREAT
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(id) => Self::NotFound(id.to_string()),
            ProviderError::Duplicate { .. }
            | ProviderError::InvalidConfig(_)
            | ProviderError::Import(_) => Self::Arguments(err.to_string()),
            ProviderError::Repository(e) => Self::Store(e.to_string()),
            ProviderError::ShuttingDown | ProviderError::Internal(_) => {
                Self::Provider(err.to_string())
            }
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use mcpvisor_core::{ImportValidationError, ProviderId, RepositoryError};

    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Arguments(String::new()).exit_code(), 2);
        assert_eq!(CliError::Config(String::new()).exit_code(), 78);
        assert_eq!(CliError::Provider(String::new()).exit_code(), 1);
    }

    #[test]
    fn test_provider_error_mapping() {
        let not_found: CliError = ProviderError::NotFound(ProviderId::from("x")).into();
        assert!(matches!(not_found, CliError::NotFound(ref id) if id == "x"));

        let import: CliError =
            ProviderError::Import(ImportValidationError::entry(2, "missing field")).into();
        assert!(matches!(import, CliError::Arguments(_)));
        assert!(import.to_string().contains("entry 2"));

        let store: CliError =
            ProviderError::Repository(RepositoryError::Internal("disk full".to_string())).into();
        assert_eq!(store.exit_code(), 73);
    }
}
