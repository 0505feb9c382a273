use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use thiserror::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)(utc)} {l} {M} - {m}{n}";

/// Sets up logging to stderr and/or a log file. Stdout is never used since it carries the result.
///
/// # Arguments
///
/// * 'log_path' - optional path to a log file
/// * 'log_level' - maximum level to log
/// * 'log_to_stderr' - whether to log to stderr
pub fn setup_logger(log_path: Option<&str>, log_level: LevelFilter, log_to_stderr: bool) -> Result<Handle, LoggerError> {
    let config = logger_config(log_path, log_level, log_to_stderr)?;
    let handle = log4rs::init_config(config)?;

    Ok(handle)
}

/// Builds the log4rs configuration
///
/// # Arguments
///
/// * 'log_path' - optional path to a log file
/// * 'log_level' - maximum level to log
/// * 'log_to_stderr' - whether to log to stderr
fn logger_config(log_path: Option<&str>, log_level: LevelFilter, log_to_stderr: bool) -> Result<Config, LoggerError> {
    let mut builder = Config::builder();
    let mut root = Root::builder();

    if log_to_stderr {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stderr", Box::new(stderr)));
        root = root.appender("stderr");
    }

    if let Some(path) = log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)
            .map_err(|e| LoggerError::FileError(format!("{}: {}", path, e)))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    let config = builder.build(root.build(log_level))?;

    Ok(config)
}

/// Error depicting errors that occur while setting up the logger
///
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("FileError: {0}")]
    FileError(String),
    #[error("ConfigError: {0}")]
    ConfigError(#[from] log4rs::config::runtime::ConfigErrors),
    #[error("SetLoggerError: {0}")]
    SetLoggerError(#[from] log::SetLoggerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_only_config_builds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.log");

        let config = logger_config(path.to_str(), LevelFilter::Debug, false).unwrap();
        assert_eq!(config.root().appenders(), &["file".to_string()]);
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert!(path.exists());
    }

    #[test]
    fn stderr_and_file_config_builds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.log");

        let config = logger_config(path.to_str(), LevelFilter::Info, true).unwrap();
        assert_eq!(config.root().appenders().len(), 2);
    }

    #[test]
    fn unwritable_log_path_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dir").join("query.log");
        let blocker = dir.path().join("missing");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let res = logger_config(path.to_str(), LevelFilter::Info, false);
        assert!(matches!(res, Err(LoggerError::FileError(_))));
    }
}
