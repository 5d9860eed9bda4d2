//! HTTP transport adapter.
pub mod status;
pub mod users;

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};

use crate::ServerError;

/// JSON extractor and response answering with [`ServerError`] on rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path extractor answering with [`ServerError`] on rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct Path<T>(pub T);

/// Query extractor answering with [`ServerError`] on rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct Query<T>(pub T);

#[cfg(test)]
pub(crate) fn state() -> crate::AppState {
    use std::sync::Arc;

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        users: crate::user::UserService::with_store(Arc::new(
            crate::user::MemoryUserStore::new(),
        )),
        metrics: None,
    }
}
