//! Record store port for users.

use async_trait::async_trait;

use crate::user::User;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`UserStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email violates unique constraint")]
    UniqueViolation,

    #[error("SQL request failed: {0}")]
    Database(sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::UniqueViolation,
            _ => Self::Database(err),
        }
    }
}

/// Port for user persistence.
///
/// Implementations must reject a second record with the same email on
/// [`UserStore::insert`] and [`UserStore::update`] with
/// [`StoreError::UniqueViolation`], whatever the caller checked before.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every stored user, ordered by id.
    async fn find_all(&self) -> StoreResult<Vec<User>>;

    /// Users whose name equals `name`.
    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persist a new user and return it with its assigned id.
    async fn insert(&self, user: &User) -> StoreResult<User>;

    /// Overwrite `name` and `roles` of the user with the same id.
    ///
    /// Returns `None` when no such user exists.
    async fn update(&self, user: &User) -> StoreResult<Option<User>>;

    /// Remove a user. Returns whether a record was removed.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
