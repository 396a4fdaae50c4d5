use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::ComplianceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Workflow(ComplianceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid configuration: {}", err),
            AppError::Telemetry(err) => write!(f, "failed to initialise tracing: {}", err),
            AppError::Io(err) => write!(f, "io failure: {}", err),
            AppError::Server(err) => write!(f, "http server failure: {}", err),
            AppError::Workflow(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl AppError {
    /// Status and machine-readable kind reported to HTTP callers.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Workflow(err) => {
                let kind = err.kind();
                (kind.status_code(), kind.label())
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        }

        let body = Json(json!({ "error": self.to_string(), "kind": kind }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ComplianceError> for AppError {
    fn from(value: ComplianceError) -> Self {
        Self::Workflow(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ids::RequirementId;

    #[test]
    fn workflow_errors_keep_their_status() {
        let err = AppError::from(ComplianceError::ResponseAlreadyExists(RequirementId::new(
            "req-1",
        )));
        assert_eq!(err.classify(), (StatusCode::CONFLICT, "conflict"));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let err = AppError::from(ComplianceError::Unavailable("store offline".to_string()));
        assert_eq!(err.classify().0, StatusCode::SERVICE_UNAVAILABLE);

        let err = AppError::from(ConfigError::InvalidPort);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
