//! Users-related HTTP API.
//!
//! - `GET /users` lists users, `GET /users?name=value` only those named `value`.
//! - `GET /users/{key}` gets a user by numeric id or, otherwise, by email.
//! - `POST /users` creates a user.
//! - `PUT /users/{id}` updates `name` and `roles` of a user.
//! - `DELETE /users/{id}` deletes a user; always answers 204.

use std::convert::Infallible;
use std::str::FromStr;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use crate::router::{Json, Path, Query};
use crate::user::UserData;
use crate::{AppState, Result, ServerError};

/// Query string of `GET /users`.
#[derive(Debug, Default, Deserialize)]
pub struct Filter {
    pub name: Option<String>,
}

/// Address of a user on `GET /users/{key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(i64),
    Email(String),
}

impl FromStr for UserKey {
    type Err = Infallible;

    fn from_str(key: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match key.parse::<i64>() {
            Ok(id) => UserKey::Id(id),
            Err(_) => UserKey::Email(key.to_owned()),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{key}", get(find).put(update).delete(delete))
}

/// Gets a list of users, with an optional filter by name.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<Filter>,
) -> Json<Vec<UserData>> {
    Json(state.users.get_users(filter.name.as_deref()).await)
}

/// Gets a user by id or email.
pub async fn find(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let user = match key.parse::<UserKey>() {
        Ok(UserKey::Id(id)) => state.users.get_user(id).await?,
        Ok(UserKey::Email(email)) => state.users.get_user_by_email(&email).await?,
        Err(never) => match never {},
    };

    Ok(match user {
        Some(user) => Json(user).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// Creates a new user.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<UserData>,
) -> Result<Response> {
    let user = state.users.create_user(body).await?;

    let location = user
        .id
        .map(|id| format!("/users/{id}"))
        .ok_or_else(|| ServerError::Internal {
            details: "created user has no id".into(),
        })?;

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)).into_response())
}

/// Updates an existing user.
///
/// The id in the path and the id in the payload must match.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UserData>,
) -> Result<Response> {
    if body.id != Some(id) {
        return Err(ServerError::IdMismatch);
    }

    Ok(match state.users.update_user(body).await? {
        Some(user) => (StatusCode::ACCEPTED, Json(user)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// Deletes a user. We do not indicate whether a user was actually deleted.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::*;

    async fn parse<T: serde::de::DeserializeOwned>(
        response: axum::http::Response<axum::body::Body>,
    ) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn payload(name: &str) -> UserData {
        UserData {
            id: None,
            email: format!("{name}@integration.com"),
            name: Some(name.into()),
            roles: vec!["role1".into()],
        }
    }

    #[test]
    fn test_user_key() {
        assert_eq!("12".parse::<UserKey>().unwrap(), UserKey::Id(12));
        assert_eq!("-3".parse::<UserKey>().unwrap(), UserKey::Id(-3));
        assert_eq!(
            "a@x.com".parse::<UserKey>().unwrap(),
            UserKey::Email("a@x.com".into())
        );
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let app = app(router::state());

        // create.
        let input = UserData {
            id: None,
            email: "a@x.com".into(),
            name: Some("A".into()),
            roles: vec!["admin".into()],
        };
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users",
            json!(input).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_owned();
        let created: UserData = parse(response).await;
        let id = created.id.unwrap();
        assert_eq!(location, format!("/users/{id}"));
        assert_eq!(UserData { id: None, ..created.clone() }, input);

        // same email again.
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users",
            json!(input).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // get by id and email.
        for path in [location.clone(), "/users/a@x.com".to_owned()] {
            let response =
                make_request(app.clone(), Method::GET, &path, String::default()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let found: UserData = parse(response).await;
            assert_eq!(found, created);
        }

        // update name and roles, without sending the email.
        let changes = json!({
            "id": id,
            "name": "B",
            "roles": ["admin", "ops"],
        });
        let response =
            make_request(app.clone(), Method::PUT, &location, changes.to_string()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let updated: UserData = parse(response).await;
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.name.as_deref(), Some("B"));
        assert_eq!(updated.roles, vec!["admin", "ops"]);

        // delete, twice.
        for _ in 0..2 {
            let response =
                make_request(app.clone(), Method::DELETE, &location, String::default())
                    .await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = make_request(app, Method::GET, &location, String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_invalid_payloads() {
        let app = app(router::state());

        let cases = [
            json!({ "email": "", "name": "A", "roles": ["admin"] }),
            json!({ "email": "a@x.com", "name": "A", "roles": [] }),
            json!({ "email": "a@x.com", "name": "A" }),
            json!({ "name": "A", "roles": ["admin"] }),
        ];
        for body in cases {
            let response =
                make_request(app.clone(), Method::POST, "/users", body.to_string()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");

            let body: serde_json::Value = parse(response).await;
            assert!(body["timestamp"].is_string());
            assert!(body["message"].is_string());
        }

        let response =
            make_request(app, Method::POST, "/users", "{not json".to_owned()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_users() {
        let app = app(router::state());
        for name in ["user1", "user2", "user3"] {
            let response = make_request(
                app.clone(),
                Method::POST,
                "/users",
                json!(payload(name)).to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let cases = [
            ("/users", 3),
            ("/users?name=user1", 1),
            ("/users?name=user777", 0),
            ("/users?name=", 3),
        ];
        for (path, count) in cases {
            let response =
                make_request(app.clone(), Method::GET, path, String::default()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let users: Vec<UserData> = parse(response).await;
            assert_eq!(users.len(), count, "{path}");
        }
    }

    #[tokio::test]
    async fn test_get_invalid_id() {
        let app = app(router::state());

        for path in ["/users/0", "/users/-1"] {
            let response =
                make_request(app.clone(), Method::GET, path, String::default()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response =
            make_request(app, Method::GET, "/users/42", String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let app = app(router::state());
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users",
            json!(payload("initial")).to_string(),
        )
        .await;
        let created: UserData = parse(response).await;
        let id = created.id.unwrap();

        // id in the path and in the payload differ.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &format!("/users/{}", id + 10),
            json!(created).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // no id in the payload.
        let response = make_request(
            app.clone(),
            Method::PUT,
            &format!("/users/{id}"),
            json!(payload("initial")).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // unknown user.
        let missing = UserData {
            id: Some(id + 10),
            ..payload("notvalid")
        };
        let response = make_request(
            app.clone(),
            Method::PUT,
            &format!("/users/{}", id + 10),
            json!(missing).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // email owned by another user.
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users",
            json!(payload("other")).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let taken = UserData {
            email: "other@integration.com".into(),
            ..created
        };
        let response = make_request(
            app.clone(),
            Method::PUT,
            &format!("/users/{id}"),
            json!(taken).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // non numeric id.
        let response = make_request(
            app,
            Method::PUT,
            "/users/abc",
            json!(taken).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
