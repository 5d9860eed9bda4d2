//! Error handler for userdir.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::user::{ArgumentError, UserError};

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("The id in the path and the payload do not match")]
    IdMismatch,

    #[error("internal server error, {details}")]
    Internal { details: String },
}

impl ServerError {
    /// HTTP status matching this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::User(UserError::Conflict(_)) => StatusCode::CONFLICT,
            ServerError::User(UserError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            },
            ServerError::User(UserError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
            ServerError::Json(_)
            | ServerError::Path(_)
            | ServerError::Query(_)
            | ServerError::IdMismatch => StatusCode::BAD_REQUEST,
            ServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    timestamp: DateTime<Utc>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(skip)]
    status: u16,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            message: "Internal server error.".to_owned(),
            errors: None,
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect::<Vec<_>>();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let response = ResponseError::default()
            .message(&self.to_string())
            .status(status);

        let response = match &self {
            ServerError::User(UserError::InvalidArgument(ArgumentError::Fields(
                errors,
            ))) => response
                .message("There were validation errors with your request.")
                .errors(errors),

            ServerError::User(UserError::Storage(err)) => {
                tracing::error!(error = %err, "server returned 500 status");
                response.message("Internal server error.")
            },

            ServerError::Internal { details } => {
                tracing::error!(%details, "server returned 500 status");
                response.message("Internal server error.")
            },

            _ => response,
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "timestamp": Utc::now(),
                "message": "Internal server error.",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use validator::Validate;

    use super::*;
    use crate::user::{ERR_EMAIL_IN_USE, ERR_ID_OUT_OF_RANGE, StoreError, User};

    async fn body(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::from(UserError::Conflict(ERR_EMAIL_IN_USE)), StatusCode::CONFLICT),
            (
                ServerError::from(UserError::invalid(ERR_ID_OUT_OF_RANGE)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::from(UserError::from(StoreError::Unavailable("down".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServerError::IdMismatch, StatusCode::BAD_REQUEST),
            (
                ServerError::Internal { details: "boom".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_conflict_body() {
        let response =
            ServerError::from(UserError::Conflict(ERR_EMAIL_IN_USE)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body(response).await;
        assert_eq!(body["message"], ERR_EMAIL_IN_USE);
        assert!(body["timestamp"].is_string());
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let errors = User::default().validate().unwrap_err();
        let response = ServerError::from(UserError::from(errors)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body(response).await;
        let fields = body["errors"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["field"], "email");
        assert_eq!(fields[1]["field"], "roles");
    }

    #[tokio::test]
    async fn test_storage_body_hides_details() {
        let err = UserError::from(StoreError::Unavailable("secret host".into()));
        let body = body(ServerError::from(err).into_response()).await;
        assert_eq!(body["message"], "Internal server error.");
    }
}
