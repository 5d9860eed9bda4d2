//! In-process record store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::user::{StoreError, StoreResult, User, UserStore};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Table {
    fn email_owner(&self, email: &str) -> Option<i64> {
        self.rows
            .iter()
            .find(|(_, user)| user.email == email)
            .map(|(id, _)| *id)
    }
}

/// [`UserStore`] kept in memory.
///
/// Email uniqueness is checked under the write lock, so two racing inserts
/// cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

impl MemoryUserStore {
    /// Create an empty [`MemoryUserStore`].
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<User>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|user| user.name.as_deref() == Some(name))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.email_owner(email).and_then(|id| table.rows.get(&id).cloned()))
    }

    async fn insert(&self, user: &User) -> StoreResult<User> {
        let mut table = self.table.write().await;
        if table.email_owner(&user.email).is_some() {
            return Err(StoreError::UniqueViolation);
        }

        table.next_id += 1;
        let id = table.next_id;
        let stored = User {
            id: Some(id),
            ..user.clone()
        };
        table.rows.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update(&self, user: &User) -> StoreResult<Option<User>> {
        let Some(id) = user.id else {
            return Ok(None);
        };

        let mut table = self.table.write().await;
        match table.email_owner(&user.email) {
            Some(owner) if owner != id => return Err(StoreError::UniqueViolation),
            _ => (),
        }

        Ok(table.rows.get_mut(&id).map(|stored| {
            stored.name = user.name.clone();
            stored.roles = user.roles.clone();
            stored.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
