//! PostgreSQL implementation of the user store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::user::{StoreResult, User, UserStore};

const COLUMNS: &str = "id, email, name, roles";

/// PostgreSQL user store.
///
/// Email uniqueness is enforced by the `users_email_key` unique index.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new [`PgUserStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE name = $1 ORDER BY id"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: &User) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (email, name, roles)
                VALUES ($1, $2, $3)
                RETURNING {COLUMNS}"#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.roles)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<Option<User>> {
        let Some(id) = user.id else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
                SET name = $2, roles = $3
                WHERE id = $1
                RETURNING {COLUMNS}"#
        ))
        .bind(id)
        .bind(&user.name)
        .bind(&user.roles)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::user::StoreError;

    fn user(email: &str) -> User {
        User {
            id: None,
            email: email.into(),
            name: Some("bob".into()),
            roles: vec!["admin".into(), "customerservice".into()],
        }
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_insert_and_find(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);
        let stored = store.insert(&user("bob@mail.com")).await.unwrap();
        let id = stored.id.unwrap();

        assert_eq!(store.find_by_id(id).await.unwrap(), Some(stored.clone()));
        assert_eq!(
            store.find_by_email("bob@mail.com").await.unwrap(),
            Some(stored.clone())
        );
        assert_eq!(store.find_by_name("bob").await.unwrap(), vec![stored]);
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_unique_email(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);
        store.insert(&user("bob@mail.com")).await.unwrap();

        let err = store.insert(&user("bob@mail.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_and_delete(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);
        let stored = store.insert(&user("bob@mail.com")).await.unwrap();

        let changes = User {
            name: Some("robert".into()),
            roles: vec!["ops".into()],
            ..stored.clone()
        };
        let updated = store.update(&changes).await.unwrap().unwrap();
        assert_eq!(updated.name.as_deref(), Some("robert"));
        assert_eq!(updated.email, "bob@mail.com");

        let id = stored.id.unwrap();
        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert_eq!(store.update(&changes).await.unwrap(), None);
    }
}
