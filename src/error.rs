use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Debug, Error, PartialEq)]
pub enum SimulatorError {
    #[error("Invalid query format")]
    InvalidQueryFormat,

    #[error("Missing required parameters: from, to, query")]
    MissingParameters,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("API key and application key are required")]
    MissingCredentials,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid application key")]
    InvalidApplicationKey,

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SimulatorError {
    pub fn status(&self) -> StatusCode {
        match self {
            SimulatorError::InvalidQueryFormat
            | SimulatorError::MissingParameters
            | SimulatorError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            SimulatorError::MissingCredentials
            | SimulatorError::InvalidApiKey
            | SimulatorError::InvalidApplicationKey => StatusCode::FORBIDDEN,
            SimulatorError::NotFound(_) => StatusCode::NOT_FOUND,
            SimulatorError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SimulatorError::Config(_) | SimulatorError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<prometheus::Error> for SimulatorError {
    fn from(err: prometheus::Error) -> Self {
        SimulatorError::Internal(err.to_string())
    }
}

impl IntoResponse for SimulatorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody::new(self.to_string()));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SimulatorError>;
