use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{config::Credentials, metrics, Result, SimulatorError};

use super::AppState;

pub const API_KEY_HEADER: &str = "dd-api-key";
pub const APPLICATION_KEY_HEADER: &str = "dd-application-key";

/// Checks both key headers against the configured credentials.
pub fn check_auth(headers: &HeaderMap, credentials: &Credentials) -> Result<()> {
    let api_key = header_value(headers, API_KEY_HEADER);
    let app_key = header_value(headers, APPLICATION_KEY_HEADER);

    let (Some(api_key), Some(app_key)) = (api_key, app_key) else {
        return Err(SimulatorError::MissingCredentials);
    };

    if api_key != credentials.api_key {
        return Err(SimulatorError::InvalidApiKey);
    }

    if app_key != credentials.application_key {
        return Err(SimulatorError::InvalidApplicationKey);
    }

    Ok(())
}

// Empty or non-ASCII header values count as missing.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

pub async fn require_keys(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if let Err(e) = check_auth(request.headers(), &state.credentials) {
        warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        metrics::record_auth_failure(match e {
            SimulatorError::MissingCredentials => "missing",
            SimulatorError::InvalidApiKey => "api_key",
            _ => "application_key",
        });
        return Err(e);
    }

    Ok(next.run(request).await)
}
