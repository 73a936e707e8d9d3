use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use geofence_core::GeofenceError;
use thiserror::Error;

use crate::registration::RegistrationFailure;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Registration(#[from] RegistrationFailure),
    #[error("Insufficient permissions")]
    PermissionDenied,
    #[error(transparent)]
    Geofence(#[from] GeofenceError),
    #[error("Preference store error: {0}")]
    Preferences(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sample queue closed")]
    QueueClosed,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Registration(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::PermissionDenied => StatusCode::FORBIDDEN,
            ServerError::Geofence(_) => StatusCode::BAD_REQUEST,
            ServerError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Preferences(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofence_core::status;

    #[test]
    fn test_status_codes() {
        let err = ServerError::Geofence(GeofenceError::InvalidSample("lat".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = ServerError::Geofence(GeofenceError::DuplicateId("SFO".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        let err = ServerError::from(RegistrationFailure::from_code(status::GEOFENCE_NOT_AVAILABLE));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
