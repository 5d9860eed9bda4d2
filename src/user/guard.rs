//! Checks run before any user write.

use std::sync::Arc;

use validator::Validate;

use crate::user::{ERR_EMAIL_IN_USE, Result, User, UserError, UserStore};

/// Validation and uniqueness gate.
///
/// The uniqueness lookup is advisory: the store still rejects a racing
/// duplicate through its own constraint.
#[derive(Clone)]
pub struct UserGuard {
    store: Arc<dyn UserStore>,
}

impl UserGuard {
    /// Create a new [`UserGuard`] over `store`.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Decide whether `user` may be inserted.
    pub async fn validate_for_create(&self, user: &User) -> Result<()> {
        user.validate()?;

        if self.store.find_by_email(&user.email).await?.is_some() {
            return Err(UserError::Conflict(ERR_EMAIL_IN_USE));
        }

        Ok(())
    }

    /// Decide whether `existing` may be overwritten with `incoming`.
    pub async fn validate_for_update(
        &self,
        incoming: &User,
        existing: &User,
    ) -> Result<()> {
        existing.updated_with(incoming).validate()?;

        if incoming.email.trim().is_empty() {
            return Ok(());
        }

        match self.store.find_by_email(&incoming.email).await? {
            Some(owner) if owner.id != existing.id => {
                Err(UserError::Conflict(ERR_EMAIL_IN_USE))
            },
            _ => Ok(()),
        }
    }
}
