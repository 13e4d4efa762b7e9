//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wichtel_core::{CoreError, EventId};
use wichtel_mail::{MailError, SessionError};

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// A domain rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The mail backend failed.
    #[error("mail delivery failed: {0}")]
    Mail(#[from] MailError),

    /// The requested event does not exist in the pool.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The request body or path is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The route is only served in development mode.
    #[error("only available in development mode")]
    DevelopmentOnly,
}

impl From<SessionError> for GatewayError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Core(e) => Self::Core(e),
            SessionError::Mail(e) => Self::Mail(e),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::Core(e) => match e {
                CoreError::Validation { .. } | CoreError::InsufficientParticipants { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CoreError::DuplicateParticipant { .. } | CoreError::BatchAlreadyPending => {
                    StatusCode::CONFLICT
                }
                CoreError::ParticipantNotFound { .. } | CoreError::TokenNotFound => StatusCode::NOT_FOUND,
                CoreError::AdminProtected { .. } | CoreError::HumanVerificationFailed => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::Mail(MailError::Connection(_) | MailError::Timeout(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Mail(MailError::InvalidAddress { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::EventNotFound(_) | GatewayError::DevelopmentOnly => StatusCode::NOT_FOUND,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use axum::response::IntoResponse;

    fn status_of(err: impl Into<GatewayError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn core_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(CoreError::Validation { field: "name", reason: "too short".to_owned() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(CoreError::DuplicateParticipant { field: "name", value: "Alice".to_owned() }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::AdminProtected { name: "Alice".to_owned() }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(CoreError::TokenNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CoreError::BatchAlreadyPending), StatusCode::CONFLICT);
        assert_eq!(status_of(CoreError::HumanVerificationFailed), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(CoreError::AssignmentGeneration { attempts: 1000 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn mail_errors_map_to_server_statuses() {
        assert_eq!(
            status_of(MailError::Timeout(Duration::from_secs(30))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(MailError::Configuration("missing".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn session_error_unwraps_into_matching_variant() {
        let err = GatewayError::from(SessionError::Core(CoreError::TokenNotFound));
        assert!(matches!(err, GatewayError::Core(CoreError::TokenNotFound)));
        assert_eq!(err.to_string(), "invalid or expired confirmation link");
    }

    #[test]
    fn event_not_found_and_bad_request() {
        assert_eq!(status_of(GatewayError::EventNotFound(EventId::new())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(GatewayError::InvalidRequest("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
    }
}
