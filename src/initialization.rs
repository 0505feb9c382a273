use std::env;
use log::info;
use thiserror::Error;
use crate::config::{load_config, resolve_credentials, Config, CredentialsError, LoadConfigurationError};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_meteomatics::{Meteomatics, MeteomaticsError};
use crate::models::Credentials;

pub struct Mgr {
    pub meteomatics: Meteomatics,
}

/// Initializes and returns configuration, credentials and a Mgr struct holding initialized managers
///
pub fn init() -> Result<(Config, Credentials, Mgr), InitializationError> {
    let args: Vec<String> = env::args().skip(1).collect();

    // Load configuration, compiled in defaults if no file is given
    let config = match config_path(&args)? {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    // Setup logging
    let _ = setup_logger(config.general.log_path.as_deref(), config.general.log_level, config.general.log_to_stderr)?;

    // Print version
    info!("starting meteomatics query version: {}", env!("CARGO_PKG_VERSION"));

    let credentials = resolve_credentials(&config.meteomatics, |key| env::var(key).ok())?;

    // Instantiate structs
    let meteomatics = Meteomatics::new(&config.meteomatics)?;

    let mgr = Mgr {
        meteomatics,
    };

    Ok((config, credentials, mgr))
}

/// Returns the configuration file path if given as --config=<path>
///
/// # Arguments
///
/// * 'args' - command line arguments excluding the program name
fn config_path(args: &[String]) -> Result<Option<&str>, InitializationError> {
    let mut path = None;
    for arg in args {
        match arg.split_once('=') {
            Some(("--config", p)) if !p.is_empty() => path = Some(p),
            _ => return Err(InitializationError::ArgumentError(arg.to_string())),
        }
    }

    Ok(path)
}

/// Error depicting errors that occur while initializing the query
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ArgumentError: unknown argument '{0}', usage: meteomatics_query [--config=<path>]")]
    ArgumentError(String),
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("CredentialsError: {0}")]
    CredentialsError(#[from] CredentialsError),
    #[error("ClientSetupError: {0}")]
    ClientSetupError(#[from] MeteomaticsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn no_arguments_means_no_config_file() {
        assert_eq!(config_path(&[]).unwrap(), None);
    }

    #[test]
    fn config_argument_is_picked_up() {
        let a = args(&["--config=/etc/meteomatics_query.toml"]);
        assert_eq!(config_path(&a).unwrap(), Some("/etc/meteomatics_query.toml"));
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(matches!(config_path(&args(&["--verbose"])), Err(InitializationError::ArgumentError(_))));
        assert!(matches!(config_path(&args(&["--config="])), Err(InitializationError::ArgumentError(_))));
    }
}
