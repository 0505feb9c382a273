use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use crate::models::{Coordinate, Credentials};

pub const USERNAME_VAR: &str = "METEOMATICS_USERNAME";
pub const PASSWORD_VAR: &str = "METEOMATICS_PASSWORD";

/// Named parameter lists
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterPreset {
    /// Temperature, precipitation and wind speed
    #[default]
    Basic,
    /// Ten parameters for agricultural monitoring
    Extended,
}

impl ParameterPreset {
    pub fn parameters(&self) -> Vec<String> {
        let list: &[&str] = match self {
            ParameterPreset::Basic => &["t_2m:C", "precip_1h:mm", "wind_speed_10m:ms"],
            ParameterPreset::Extended => &[
                "wind_speed_10m:ms",
                "msl_pressure:hPa",
                "soil_moisture_deficit:mm",
                "evapotranspiration_1h:mm",
                "air_quality:idx",
                "pm2p5:ugm3",
                "forest_fire_warning:idx",
                "t_2m:C",
                "precip_1h:mm",
                "leaf_wetness:idx",
            ],
        };

        list.iter().map(|p| p.to_string()).collect()
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct QueryParameters {
    pub coordinates: Vec<Coordinate>,
    pub preset: ParameterPreset,
    pub parameters: Option<Vec<String>>,
    pub model: String,
    pub step_minutes: i64,
}

impl Default for QueryParameters {
    fn default() -> Self {
        QueryParameters {
            coordinates: vec![Coordinate::new(47.11, 11.47)],
            preset: ParameterPreset::Basic,
            parameters: None,
            model: "mix".to_string(),
            step_minutes: 60,
        }
    }
}

impl QueryParameters {
    /// Returns the explicit parameter list if given, otherwise the preset's list
    pub fn parameter_list(&self) -> Vec<String> {
        match &self.parameters {
            Some(p) => p.clone(),
            None => self.preset.parameters(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct MeteomaticsParameters {
    pub base_url: String,
    pub timeout_secs: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MeteomaticsParameters {
    fn default() -> Self {
        MeteomaticsParameters {
            base_url: "https://api.meteomatics.com".to_string(),
            timeout_secs: 30,
            username: None,
            password: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_to_stderr: bool,
}

impl Default for General {
    fn default() -> Self {
        General {
            log_path: None,
            log_level: LevelFilter::Info,
            log_to_stderr: true,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub query: QueryParameters,
    pub meteomatics: MeteomaticsParameters,
    pub general: General,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| LoadConfigurationError::ReadError(format!("{}: {}", config_path, e)))?;

    parse_config(&toml)
}

/// Parses and checks a configuration document
///
/// # Arguments
///
/// * 'toml' - the configuration in TOML format
pub fn parse_config(toml: &str) -> Result<Config, LoadConfigurationError> {
    let config: Config = toml::from_str(toml)?;

    if config.query.coordinates.is_empty() {
        return Err(LoadConfigurationError::InvalidValue("query.coordinates is empty".into()));
    }
    if config.query.parameters.as_ref().is_some_and(|p| p.is_empty()) {
        return Err(LoadConfigurationError::InvalidValue("query.parameters is empty".into()));
    }
    if config.query.step_minutes <= 0 {
        return Err(LoadConfigurationError::InvalidValue(format!("query.step_minutes must be positive, got {}", config.query.step_minutes)));
    }

    Ok(config)
}

/// Resolves credentials, environment first and configuration file second
///
/// # Arguments
///
/// * 'config' - API configuration possibly holding fallback credentials
/// * 'lookup' - environment lookup, normally std::env::var
pub fn resolve_credentials<F>(config: &MeteomaticsParameters, lookup: F) -> Result<Credentials, CredentialsError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = lookup(USERNAME_VAR)
        .filter(|u| !u.is_empty())
        .or_else(|| config.username.clone())
        .filter(|u| !u.is_empty())
        .ok_or(CredentialsError::MissingUsername)?;
    let password = lookup(PASSWORD_VAR)
        .filter(|p| !p.is_empty())
        .or_else(|| config.password.clone())
        .filter(|p| !p.is_empty())
        .ok_or(CredentialsError::MissingPassword)?;

    Ok(Credentials::new(&username, &password))
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum LoadConfigurationError {
    #[error("ReadError: {0}")]
    ReadError(String),
    #[error("ParseError: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("InvalidValue: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("MissingUsername: set {} or meteomatics.username", USERNAME_VAR)]
    MissingUsername,
    #[error("MissingPassword: set {} or meteomatics.password", PASSWORD_VAR)]
    MissingPassword,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;

    #[test]
    fn empty_document_gives_script_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.query.coordinates, vec![Coordinate::new(47.11, 11.47)]);
        assert_eq!(config.query.parameter_list(), vec!["t_2m:C", "precip_1h:mm", "wind_speed_10m:ms"]);
        assert_eq!(config.query.model, "mix");
        assert_eq!(config.query.step_minutes, 60);
        assert_eq!(config.meteomatics.base_url, "https://api.meteomatics.com");
        assert_eq!(config.meteomatics.timeout_secs, 30);
        assert_eq!(config.general.log_level, LevelFilter::Info);
        assert!(config.general.log_to_stderr);
    }

    #[test]
    fn extended_preset_has_ten_parameters() {
        let config = parse_config("[query]\npreset = \"extended\"\n").unwrap();
        let params = config.query.parameter_list();

        assert_eq!(params.len(), 10);
        assert_eq!(params[0], "wind_speed_10m:ms");
        assert_eq!(params[9], "leaf_wetness:idx");
    }

    #[test]
    fn explicit_parameters_override_preset() {
        let toml = r#"
            [query]
            preset = "extended"
            parameters = ["msl_pressure:hPa", "t_2m:C"]
            coordinates = [[59.33, 18.07], { lat = 47.11, lon = 11.47 }]
        "#;
        let config = parse_config(toml).unwrap();

        assert_eq!(config.query.parameter_list(), vec!["msl_pressure:hPa", "t_2m:C"]);
        assert_eq!(config.query.coordinates.len(), 2);
        assert_eq!(config.query.coordinates[1], Coordinate::new(47.11, 11.47));
    }

    #[test]
    fn rejects_empty_lists_and_bad_step() {
        assert!(matches!(parse_config("[query]\nparameters = []\n"), Err(LoadConfigurationError::InvalidValue(_))));
        assert!(matches!(parse_config("[query]\ncoordinates = []\n"), Err(LoadConfigurationError::InvalidValue(_))));
        assert!(matches!(parse_config("[query]\nstep_minutes = 0\n"), Err(LoadConfigurationError::InvalidValue(_))));
        assert!(matches!(parse_config("[query]\npreset = \"huge\"\n"), Err(LoadConfigurationError::ParseError(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nlog_level = \"debug\"\nlog_to_stderr = false").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.general.log_level, LevelFilter::Debug);
        assert!(!config.general.log_to_stderr);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let res = load_config("/nonexistent/meteomatics_query.toml");
        assert!(matches!(res, Err(LoadConfigurationError::ReadError(_))));
    }

    #[test]
    fn environment_credentials_win_over_file() {
        let config = MeteomaticsParameters {
            username: Some("file_user".into()),
            password: Some("file_pass".into()),
            ..Default::default()
        };
        let env = |key: &str| match key {
            USERNAME_VAR => Some("env_user".to_string()),
            PASSWORD_VAR => Some("env_pass".to_string()),
            _ => None,
        };

        let creds = resolve_credentials(&config, env).unwrap();
        assert_eq!(creds, Credentials::new("env_user", "env_pass"));

        let creds = resolve_credentials(&config, |_| None).unwrap();
        assert_eq!(creds, Credentials::new("file_user", "file_pass"));
    }

    #[test]
    fn missing_credentials_fail() {
        let config = MeteomaticsParameters::default();
        assert!(matches!(resolve_credentials(&config, |_| None), Err(CredentialsError::MissingUsername)));

        let only_user = |key: &str| (key == USERNAME_VAR).then(|| "user".to_string());
        assert!(matches!(resolve_credentials(&config, only_user), Err(CredentialsError::MissingPassword)));
    }

    #[test]
    fn empty_environment_falls_back_to_file() {
        let config = MeteomaticsParameters {
            username: Some("file_user".into()),
            password: Some("file_pass".into()),
            ..Default::default()
        };
        let empty = |_: &str| Some(String::new());

        let creds = resolve_credentials(&config, empty).unwrap();
        assert_eq!(creds, Credentials::new("file_user", "file_pass"));

        let no_file = MeteomaticsParameters::default();
        assert!(matches!(resolve_credentials(&no_file, empty), Err(CredentialsError::MissingUsername)));
    }
}
