//! User entity and wire representation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// User as saved on the record store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Validate, sqlx::FromRow)]
pub struct User {
    pub id: Option<i64>,
    #[validate(custom(
        function = "crate::user::model::validate_not_blank",
        message = "The email address must be provided."
    ))]
    pub email: String,
    pub name: Option<String>,
    #[validate(length(min = 1, message = "At least one user role must be provided."))]
    pub roles: Vec<String>,
}

impl User {
    /// Record that an update would write: identity fields from `self`,
    /// mutable fields from `changes`.
    pub fn updated_with(&self, changes: &User) -> Self {
        Self {
            id: self.id,
            email: self.email.clone(),
            name: changes.name.clone(),
            roles: changes.roles.clone(),
        }
    }
}

/// User as exchanged on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

pub(crate) fn validate_not_blank(
    value: &str,
) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
