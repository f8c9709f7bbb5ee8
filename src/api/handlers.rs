use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::borrow::Cow;
use tracing::{debug, info};

use crate::{
    metrics::{self, RequestTimer},
    models::{HealthResponse, QueryParams, QueryResponse, ValidateResponse},
    query::parse_query,
    series::{
        effective_interval, SeriesGenerator, TimeRange, DEFAULT_INTERVAL_SECS,
        MAX_POINTS_PER_SERIES,
    },
    Result, SimulatorError,
};

use super::AppState;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    let _timer = RequestTimer::new("health");
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /api/v1/validate
pub async fn validate() -> Json<ValidateResponse> {
    let _timer = RequestTimer::new("validate");
    Json(ValidateResponse { valid: true })
}

/// GET /api/v1/query
pub async fn query_metrics(
    State(state): State<AppState>,
    params: std::result::Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>> {
    let _timer = RequestTimer::new("query");

    // Repeated keys such as `from=0&from=5` fail here.
    let Query(params) =
        params.map_err(|rejection| SimulatorError::InvalidParameter(rejection.body_text()))?;

    let from = parse_epoch(params.from.as_deref());
    let to = parse_epoch(params.to.as_deref());
    let raw_query = params.query.filter(|query| !query.is_empty());

    let (Some(from), Some(to), Some(raw_query)) = (from, to, raw_query) else {
        return Err(SimulatorError::MissingParameters);
    };

    let interval = match params.interval.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_INTERVAL_SECS,
        Some(value) => value.parse::<u32>().map_err(|e| {
            SimulatorError::InvalidParameter(format!("interval {value:?}: {e}"))
        })?,
    };
    let interval = effective_interval(interval);

    let range = TimeRange::new(from, to);
    let expected_points = range.point_count(interval);
    if expected_points > MAX_POINTS_PER_SERIES {
        return Err(SimulatorError::InvalidParameter(format!(
            "range of {expected_points} points exceeds the limit of {MAX_POINTS_PER_SERIES} per series"
        )));
    }

    // Clients commonly encode the query twice.
    let query = urlencoding::decode(&raw_query)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw_query.clone());

    info!("Query {} from {} to {}", query, from, to);

    let parsed = parse_query(&query)?;
    debug!(
        "Parsed metric={} aggregation={} tags={:?} group_by={:?}",
        parsed.metric, parsed.aggregation, parsed.tags, parsed.group_by
    );

    let mut generator = SeriesGenerator::with_seed(state.seed);
    let series = generator.generate(
        range,
        &parsed.group_by,
        &parsed.tags,
        &parsed.metric,
        &parsed.aggregation,
        interval,
    );

    let points: usize = series.iter().map(|s| s.length).sum();
    metrics::record_generated(series.len(), points);

    Ok(Json(QueryResponse::time_series(
        query,
        range.from_millis(),
        range.to_millis(),
        series,
        parsed.group_by,
    )))
}

/// GET /metrics
pub async fn prometheus_metrics() -> Result<impl IntoResponse> {
    let body = metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

pub async fn method_not_allowed() -> SimulatorError {
    SimulatorError::MethodNotAllowed
}

pub async fn not_found() -> SimulatorError {
    SimulatorError::NotFound("Endpoint not found".to_string())
}

fn parse_epoch(value: Option<&str>) -> Option<i64> {
    value.and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epoch() {
        assert_eq!(parse_epoch(Some("1764658800")), Some(1_764_658_800));
        assert_eq!(parse_epoch(Some(" 42 ")), Some(42));
        assert_eq!(parse_epoch(Some("0")), Some(0));
        assert_eq!(parse_epoch(Some("now")), None);
        assert_eq!(parse_epoch(Some("")), None);
        assert_eq!(parse_epoch(None), None);
    }
}
