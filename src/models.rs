use std::fmt;
use std::fmt::{Display, Formatter};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;

/// A location given as latitude and longitude in decimal degrees
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Time range of a time series query, both ends inclusive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: TimeDelta,
}

impl TimeWindow {
    /// Returns a single point window at the top of the hour that `now` falls into
    ///
    /// # Arguments
    ///
    /// * 'now' - the time to truncate, normally Utc::now()
    /// * 'step' - step between points in the series
    pub fn current_hour(now: DateTime<Utc>, step: TimeDelta) -> Result<TimeWindow, RequestError> {
        let hour = now.duration_trunc(TimeDelta::hours(1))
            .map_err(|e| RequestError::DateError(e.to_string()))?;

        Ok(TimeWindow { start: hour, end: hour, step })
    }

    /// Number of time steps covered by the window, including both ends
    pub fn points(&self) -> usize {
        if self.step <= TimeDelta::zero() || self.end < self.start {
            return 0;
        }
        let span = (self.end - self.start).num_seconds();
        (span / self.step.num_seconds().max(1)) as usize + 1
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}:{}", format_timestamp(self.start), format_timestamp(self.end), iso_duration(self.step))
    }
}

/// Username and password used to authenticate a single query
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Credentials {
        Credentials { username: username.to_string(), password: password.to_string() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// A fully assembled time series query
#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub coordinates: Vec<Coordinate>,
    pub parameters: Vec<String>,
    pub window: TimeWindow,
    pub model: String,
    pub credentials: Credentials,
}

impl QueryRequest {
    /// Builds a query request after checking its structure.
    /// Parameter identifiers are passed on as given, the service decides whether they are valid.
    ///
    /// # Arguments
    ///
    /// * 'coordinates' - locations to query, at least one
    /// * 'parameters' - parameter identifiers in output column order, at least one
    /// * 'window' - start, end and step of the series
    /// * 'model' - model identifier, e.g. 'mix'
    /// * 'credentials' - credentials to authenticate with
    pub fn new(coordinates: Vec<Coordinate>, parameters: Vec<String>, window: TimeWindow, model: &str, credentials: Credentials) -> Result<QueryRequest, RequestError> {
        if coordinates.is_empty() {
            return Err(RequestError::NoCoordinates);
        }
        if parameters.is_empty() {
            return Err(RequestError::NoParameters);
        }
        if window.step <= TimeDelta::zero() {
            return Err(RequestError::StepError(format!("step must be positive, got {}", window.step)));
        }
        if window.step.subsec_nanos() != 0 {
            return Err(RequestError::StepError(format!("{} is not a whole number of seconds", window.step)));
        }
        if window.end < window.start {
            return Err(RequestError::WindowError(window.start, window.end));
        }

        Ok(QueryRequest { coordinates, parameters, window, model: model.to_string(), credentials })
    }
}

/// One row of a time series table, indexed by location and time
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub coordinate: Coordinate,
    pub valid_date: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Time series result with one column per parameter and one row per location and time
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TimeSeriesTable {
    /// Returns (rows, columns) excluding the index columns
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

impl Display for TimeSeriesTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut header: Vec<String> = vec!["lat".into(), "lon".into(), "validdate".into()];
        header.extend(self.columns.iter().cloned());

        let cells = self.rows.iter()
            .map(|r| {
                let mut line = vec![
                    r.coordinate.lat.to_string(),
                    r.coordinate.lon.to_string(),
                    r.valid_date.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
                ];
                line.extend(r.values.iter().map(|v| v.to_string()));
                line
            })
            .collect::<Vec<Vec<String>>>();

        let mut widths = header.iter().map(|h| h.len()).collect::<Vec<usize>>();
        for line in cells.iter() {
            for (w, c) in widths.iter_mut().zip(line.iter()) {
                *w = (*w).max(c.len());
            }
        }

        write_line(f, &header, &widths)?;
        for line in cells.iter() {
            writeln!(f)?;
            write_line(f, line, &widths)?;
        }

        Ok(())
    }
}

/// Writes one right aligned table line
///
/// # Arguments
///
/// * 'f' - formatter to write to
/// * 'line' - cell texts
/// * 'widths' - column widths
fn write_line(f: &mut Formatter<'_>, line: &[String], widths: &[usize]) -> fmt::Result {
    for (i, (c, w)) in line.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            write!(f, "  ")?;
        }
        write!(f, "{:>width$}", c, width = *w)?;
    }
    Ok(())
}

/// Formats a timestamp the way the API expects it, e.g. 2024-01-01T00:00:00Z
pub fn format_timestamp(date_time: DateTime<Utc>) -> String {
    date_time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Formats a step as an ISO 8601 duration using the largest whole unit of hours, minutes or seconds.
/// Sub-second parts are not representable, QueryRequest::new rejects such steps.
///
/// # Arguments
///
/// * 'step' - the step to format
pub fn iso_duration(step: TimeDelta) -> String {
    let secs = step.num_seconds();
    if secs % 3600 == 0 {
        format!("PT{}H", secs / 3600)
    } else if secs % 60 == 0 {
        format!("PT{}M", secs / 60)
    } else {
        format!("PT{}S", secs)
    }
}

/// Error depicting structural problems in a query request
///
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("NoCoordinates: at least one coordinate is required")]
    NoCoordinates,
    #[error("NoParameters: at least one parameter is required")]
    NoParameters,
    #[error("StepError: {0}")]
    StepError(String),
    #[error("WindowError: start {0} is after end {1}")]
    WindowError(DateTime<Utc>, DateTime<Utc>),
    #[error("DateError: {0}")]
    DateError(String),
}
