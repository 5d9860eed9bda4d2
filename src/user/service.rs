use std::sync::Arc;

use crate::user::{
    ERR_EMAIL_BLANK, ERR_ID_MISSING, ERR_ID_OUT_OF_RANGE, Result, UserData,
    UserError, UserGuard, UserMapper, UserStore,
};

/// User manager.
///
/// Stateless apart from its collaborators, so clones can serve requests
/// concurrently.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    mapper: UserMapper,
    guard: UserGuard,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(
        store: Arc<dyn UserStore>,
        mapper: UserMapper,
        guard: UserGuard,
    ) -> Self {
        Self {
            store,
            mapper,
            guard,
        }
    }

    /// Create a [`UserService`] whose guard reads from the same `store`.
    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        let guard = UserGuard::new(Arc::clone(&store));
        Self::new(store, UserMapper, guard)
    }

    /// List users, optionally only those named `name`.
    ///
    /// Listing is best effort: a store failure yields an empty list.
    pub async fn get_users(&self, name: Option<&str>) -> Vec<UserData> {
        let name = name.map(str::trim).filter(|name| !name.is_empty());

        let users = match name {
            Some(name) => self.store.find_by_name(name).await,
            None => self.store.find_all().await,
        };

        match users {
            Ok(users) => users.iter().map(|user| self.mapper.to_data(user)).collect(),
            Err(err) => {
                tracing::error!(name, error = %err, "failed to get users");
                Vec::new()
            },
        }
    }

    /// Find a user by its id.
    pub async fn get_user(&self, id: i64) -> Result<Option<UserData>> {
        if id <= 0 {
            return Err(UserError::invalid(ERR_ID_OUT_OF_RANGE));
        }

        match self.store.find_by_id(id).await {
            Ok(user) => Ok(user.map(|user| self.mapper.to_data(&user))),
            Err(err) => {
                tracing::error!(user_id = id, error = %err, "failed to get user");
                Ok(None)
            },
        }
    }

    /// Find a user by its email address.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserData>> {
        if email.trim().is_empty() {
            return Err(UserError::invalid(ERR_EMAIL_BLANK));
        }

        match self.store.find_by_email(email).await {
            Ok(user) => Ok(user.map(|user| self.mapper.to_data(&user))),
            Err(err) => {
                tracing::error!(%email, error = %err, "failed to get user");
                Ok(None)
            },
        }
    }

    /// Create a user. Any `id` carried by `data` is ignored.
    pub async fn create_user(&self, data: UserData) -> Result<UserData> {
        if data.email.trim().is_empty() {
            return Err(UserError::invalid(ERR_EMAIL_BLANK));
        }

        let mut user = self.mapper.to_entity(&data);
        user.id = None;

        self.guard.validate_for_create(&user).await?;
        let user = self.store.insert(&user).await?;

        tracing::info!(user_id = user.id, email = %user.email, "user created");
        Ok(self.mapper.to_data(&user))
    }

    /// Update `name` and `roles` of an existing user.
    ///
    /// Returns `None` when no user has the id carried by `data`.
    pub async fn update_user(&self, data: UserData) -> Result<Option<UserData>> {
        let id = match data.id {
            Some(id) if id > 0 => id,
            Some(_) => return Err(UserError::invalid(ERR_ID_OUT_OF_RANGE)),
            None => return Err(UserError::invalid(ERR_ID_MISSING)),
        };

        let Some(existing) = self.store.find_by_id(id).await? else {
            tracing::debug!(user_id = id, "cannot update missing user");
            return Ok(None);
        };

        let incoming = self.mapper.to_entity(&data);
        self.guard.validate_for_update(&incoming, &existing).await?;

        let updated = self.store.update(&existing.updated_with(&incoming)).await?;
        if updated.is_some() {
            tracing::info!(user_id = id, "user updated");
        }

        Ok(updated.map(|user| self.mapper.to_data(&user)))
    }

    /// Delete a user. Deleting a missing user is not an error.
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        if self.store.delete(id).await? {
            tracing::info!(user_id = id, "user deleted");
        } else {
            tracing::debug!(user_id = id, "no user to delete");
        }
        Ok(())
    }
}
