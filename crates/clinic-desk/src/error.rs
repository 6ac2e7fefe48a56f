use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::directory::{directory_error_response, DirectoryError};
use crate::workflows::enquiry::router::service_error_response;
use crate::workflows::enquiry::{DocumentError, EnquiryServiceError, NotificationError};
use crate::workflows::visit::router::visit_error_response;
use crate::workflows::visit::VisitServiceError;
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
    Seed(DocumentError),
    Markers(NotificationError),
    Enquiry(EnquiryServiceError),
    Visit(VisitServiceError),
    Directory(DirectoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Seed(err) => write!(f, "seed import failed: {}", err),
            AppError::Markers(err) => write!(f, "notification markers: {}", err),
            AppError::Enquiry(err) => write!(f, "enquiry error: {}", err),
            AppError::Visit(err) => write!(f, "visit error: {}", err),
            AppError::Directory(err) => write!(f, "directory error: {}", err),
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
            AppError::Seed(err) => Some(err),
            AppError::Markers(err) => Some(err),
            AppError::Enquiry(err) => Some(err),
            AppError::Visit(err) => Some(err),
            AppError::Directory(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Enquiry(err) => return service_error_response(err),
            AppError::Visit(err) => return visit_error_response(err),
            AppError::Directory(err) => return directory_error_response(err),
            AppError::Seed(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Markers(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
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

impl From<DocumentError> for AppError {
    fn from(value: DocumentError) -> Self {
        Self::Seed(value)
    }
}

impl From<NotificationError> for AppError {
    fn from(value: NotificationError) -> Self {
        Self::Markers(value)
    }
}

impl From<EnquiryServiceError> for AppError {
    fn from(value: EnquiryServiceError) -> Self {
        Self::Enquiry(value)
    }
}

impl From<VisitServiceError> for AppError {
    fn from(value: VisitServiceError) -> Self {
        Self::Visit(value)
    }
}

impl From<DirectoryError> for AppError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}
