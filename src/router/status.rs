//! Public service status.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Structured status.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub version: String,
    pub name: String,
    pub store: String,
}

/// Public server status (configuration).
pub async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(Status {
        version: state.config.version.clone(),
        name: if state.config.name.is_empty() {
            env!("CARGO_CRATE_NAME").into()
        } else {
            state.config.name.clone()
        },
        store: state.config.store.to_string(),
    })
}
