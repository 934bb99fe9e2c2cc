use anyhow::Error;
use phonebook_client::ClientError;
use phonebook_config::ConfigError;
use phonebook_core::{CoreError, Outcome, ServiceErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Failed(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

/// Turns an unsuccessful outcome into an error carrying the notification
/// text the directory raised for it.
pub fn outcome_error(outcome: &Outcome, message: impl Into<String>) -> Option<Error> {
    let message = message.into();
    let err = match outcome {
        Outcome::Loaded(_)
        | Outcome::Added(_)
        | Outcome::Updated(_)
        | Outcome::Removed(_)
        | Outcome::Cancelled => return None,
        Outcome::Invalid(_) => CliError::InvalidInput(message),
        Outcome::Conflict(_) => CliError::Conflict(message),
        Outcome::Failed(ServiceErrorKind::NotFound) => CliError::NotFound(message),
        Outcome::Failed(ServiceErrorKind::Rejected) => CliError::InvalidInput(message),
        Outcome::Failed(_) => CliError::Failed(message),
    };
    Some(err.into())
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) | CliError::Conflict(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
                CliError::Failed(_) => EXIT_FAILURE,
            });
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if let Some(client_err) = cause.downcast_ref::<ClientError>() {
            return ExitCode::from(client_exit_code(client_err));
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidBaseUrl { .. }
        | ConfigError::InvalidDuration { .. }
        | ConfigError::InvalidMaxRetries(_)
        | ConfigError::InvalidRetryStatus(_)
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Http(_) => EXIT_FAILURE,
        ClientError::InvalidBaseUrl(_) | ClientError::InvalidToken => EXIT_INVALID_INPUT,
    }
}
