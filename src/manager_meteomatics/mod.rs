mod models;

use std::time::Duration;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use crate::config::MeteomaticsParameters;
use crate::models::{QueryRequest, TableRow, TimeSeriesTable};
use crate::manager_meteomatics::models::TimeSeriesDocument;

/// A capability that can answer time series queries
pub trait TimeSeriesQuery {
    /// Sends the request and blocks until a table or an error is returned
    ///
    /// # Arguments
    ///
    /// * 'request' - the query to execute
    fn query_time_series(&self, request: &QueryRequest) -> Result<TimeSeriesTable, MeteomaticsError>;
}

/// Struct for querying the Meteomatics weather API
pub struct Meteomatics {
    client: Client,
    base_url: String,
}

impl Meteomatics {
    /// Returns a Meteomatics struct ready for querying time series
    ///
    /// # Arguments
    ///
    /// * 'config' - API configuration to use
    pub fn new(config: &MeteomaticsParameters) -> Result<Meteomatics, MeteomaticsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Meteomatics {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the request url, excluding the query string
    ///
    /// # Arguments
    ///
    /// * 'request' - the query to build an url for
    fn build_url(&self, request: &QueryRequest) -> String {
        let parameters = request.parameters.join(",");
        let coordinates = request.coordinates
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join("+");

        format!("{}/{}/{}/{}/json", self.base_url, request.window, parameters, coordinates)
    }
}

impl TimeSeriesQuery for Meteomatics {
    fn query_time_series(&self, request: &QueryRequest) -> Result<TimeSeriesTable, MeteomaticsError> {
        let url = self.build_url(request);
        debug!("GET {}", url);

        let response = self.client
            .get(url)
            .query(&[("model", request.model.as_str())])
            .basic_auth(&request.credentials.username, Some(&request.credentials.password))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        info!("Meteomatics responded with status {}", status);

        check_status(status, body.as_str())?;

        let document: TimeSeriesDocument = serde_json::from_str(&body)
            .map_err(|e| MeteomaticsError::DocumentError(e.to_string()))?;

        to_table(request, document)
    }
}

/// Classifies a non-success status into the matching error
///
/// # Arguments
///
/// * 'status' - http status of the response
/// * 'body' - response body, kept as error detail
fn check_status(status: StatusCode, body: &str) -> Result<(), MeteomaticsError> {
    if status.is_success() {
        return Ok(());
    }

    let body = body.trim().to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MeteomaticsError::AuthenticationError(body)),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Err(MeteomaticsError::ValidationError(body)),
        s if s.is_server_error() => Err(MeteomaticsError::ServerError { status: s.as_u16(), body }),
        s => Err(MeteomaticsError::HttpError { status: s.as_u16(), body }),
    }
}

/// Transforms the response document to a table with rows in request coordinate order
/// and columns in request parameter order
///
/// # Arguments
///
/// * 'request' - the request the document answers
/// * 'document' - the deserialized response
fn to_table(request: &QueryRequest, document: TimeSeriesDocument) -> Result<TimeSeriesTable, MeteomaticsError> {
    if let Some(status) = document.status.as_deref() {
        if status != "OK" {
            return Err(MeteomaticsError::DocumentError(format!("document status: {}", status)));
        }
    }

    let mut rows: Vec<TableRow> = Vec::new();
    let mut dates_per_coordinate: Option<usize> = None;

    for (column, parameter) in request.parameters.iter().enumerate() {
        let series = document.data
            .iter()
            .find(|s| &s.parameter == parameter)
            .ok_or_else(|| MeteomaticsError::DocumentError(format!("parameter missing in response: {}", parameter)))?;

        if series.coordinates.len() != request.coordinates.len() {
            return Err(MeteomaticsError::DocumentError(
                format!("expected {} coordinates for {}, got {}", request.coordinates.len(), parameter, series.coordinates.len())));
        }

        for (i, (coordinate, cs)) in request.coordinates.iter().zip(series.coordinates.iter()).enumerate() {
            let n = *dates_per_coordinate.get_or_insert(cs.dates.len());
            if cs.dates.len() != n {
                return Err(MeteomaticsError::DocumentError(
                    format!("uneven number of dates for {} at {},{}", parameter, cs.lat, cs.lon)));
            }

            for (k, dv) in cs.dates.iter().enumerate() {
                if column == 0 {
                    rows.push(TableRow { coordinate: *coordinate, valid_date: dv.date, values: Vec::with_capacity(request.parameters.len()) });
                }
                let row = &mut rows[i * n + k];
                if row.valid_date != dv.date {
                    return Err(MeteomaticsError::DocumentError(
                        format!("date mismatch for {}: {} != {}", parameter, dv.date, row.valid_date)));
                }
                row.values.push(dv.value);
            }
        }
    }

    Ok(TimeSeriesTable { columns: request.parameters.clone(), rows })
}

#[derive(Error, Debug)]
pub enum MeteomaticsError {
    #[error("AuthenticationError: {0}")]
    AuthenticationError(String),
    #[error("ValidationError: {0}")]
    ValidationError(String),
    #[error("ServerError: status {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("HttpError: status {status}: {body}")]
    HttpError { status: u16, body: String },
    #[error("DocumentError: {0}")]
    DocumentError(String),
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
}
