use serde::{Deserialize, Serialize};

use crate::series::Series;

/// Raw query-string parameters of `GET /api/v1/query`.
///
/// Kept as strings so a malformed number surfaces as our own
/// `MissingParameters` error instead of axum's extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub query: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    pub res_type: String,
    pub resp_version: u32,
    pub query: String,
    pub from_date: i64,
    pub to_date: i64,
    pub series: Vec<Series>,
    pub values: Vec<f64>,
    pub times: Vec<f64>,
    pub message: String,
    pub group_by: Vec<String>,
}

impl QueryResponse {
    pub fn time_series(
        query: String,
        from_date: i64,
        to_date: i64,
        series: Vec<Series>,
        group_by: Vec<String>,
    ) -> Self {
        Self {
            status: "ok".to_string(),
            res_type: "time_series".to_string(),
            resp_version: 1,
            query,
            from_date,
            to_date,
            series,
            values: Vec::new(),
            times: Vec::new(),
            message: String::new(),
            group_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
