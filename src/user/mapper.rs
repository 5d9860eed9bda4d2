//! Translation between [`UserData`] and [`User`].

use crate::user::{User, UserData};

/// Stateless converter between wire and storage representations.
///
/// Both directions copy every field, so the output never shares a role
/// list with its input.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserMapper;

impl UserMapper {
    /// Convert a [`UserData`] into a [`User`] entity.
    pub fn to_entity(&self, data: &UserData) -> User {
        User {
            id: data.id,
            email: data.email.clone(),
            name: data.name.clone(),
            roles: data.roles.to_vec(),
        }
    }

    /// Convert a [`User`] entity into a [`UserData`].
    pub fn to_data(&self, user: &User) -> UserData {
        UserData {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.to_vec(),
        }
    }
}

impl From<&UserData> for User {
    fn from(data: &UserData) -> Self {
        UserMapper.to_entity(data)
    }
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        UserMapper.to_data(user)
    }
}
