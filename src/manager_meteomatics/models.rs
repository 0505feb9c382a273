use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct DateValue {
    pub date: DateTime<Utc>,
    pub value: f64,
}

#[derive(Deserialize, Debug)]
pub struct CoordinateSeries {
    pub lat: f64,
    pub lon: f64,
    pub dates: Vec<DateValue>,
}

#[derive(Deserialize, Debug)]
pub struct ParameterSeries {
    pub parameter: String,
    pub coordinates: Vec<CoordinateSeries>,
}

#[derive(Deserialize, Debug)]
pub struct TimeSeriesDocument {
    pub status: Option<String>,
    pub data: Vec<ParameterSeries>,
}
