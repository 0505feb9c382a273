use std::io::Write;
use chrono::{DateTime, TimeDelta, Utc};
use log::{info, warn};
use thiserror::Error;
use crate::config::QueryParameters;
use crate::manager_meteomatics::{MeteomaticsError, TimeSeriesQuery};
use crate::models::{Credentials, QueryRequest, RequestError, TimeWindow};

/// Builds a single point query for the hour that `now` falls into
///
/// # Arguments
///
/// * 'query' - coordinates, parameters, model and step from configuration
/// * 'credentials' - credentials to authenticate with
/// * 'now' - current time, the window is truncated to the top of its hour
pub fn build_request(query: &QueryParameters, credentials: Credentials, now: DateTime<Utc>) -> Result<QueryRequest, RequestError> {
    let step = TimeDelta::try_minutes(query.step_minutes)
        .ok_or_else(|| RequestError::StepError(format!("step of {} minutes is out of range", query.step_minutes)))?;
    let window = TimeWindow::current_hour(now, step)?;

    QueryRequest::new(
        query.coordinates.clone(),
        query.parameter_list(),
        window,
        &query.model,
        credentials,
    )
}

/// Runs the query and writes the resulting table.
/// Nothing is written if the query fails, the error is returned as is.
///
/// # Arguments
///
/// * 'ts' - the time series query capability
/// * 'request' - the request to send
/// * 'out' - where to write the table, stdout in normal runs
pub fn run<Q: TimeSeriesQuery, W: Write>(ts: &Q, request: &QueryRequest, out: &mut W) -> Result<(), WorkerError> {
    info!("Querying {} parameter(s) for {} coordinate(s), window {}, model {}, user {}",
        request.parameters.len(), request.coordinates.len(), request.window, request.model, request.credentials.username);

    let table = ts.query_time_series(request)?;

    let (rows, columns) = table.shape();
    let expected = request.coordinates.len() * request.window.points();
    if rows != expected {
        warn!("Received {} row(s), expected {}", rows, expected);
    }
    info!("Received table with {} row(s) and {} column(s)", rows, columns);

    writeln!(out, "{}", table)?;
    out.flush()?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    QueryError(#[from] MeteomaticsError),
    #[error("OutputError: {0}")]
    OutputError(#[from] std::io::Error),
}
