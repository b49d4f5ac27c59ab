use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<User>,
}

/// Process-local store with the same contract as the Postgres one.
#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with explicit timestamps.
    pub async fn insert_at(
        &self,
        user: NewUser,
        at: OffsetDateTime,
    ) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        table.next_id += 1;
        let row = User {
            id: table.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: at,
            updated_at: at,
        };
        table.rows.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_latest(&self) -> Result<Vec<User>, StoreError> {
        let mut users = self.table.read().await.rows.clone();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.insert_at(user, OffsetDateTime::now_utc()).await
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut table = self.table.write().await;
        if table
            .rows
            .iter()
            .any(|u| u.id != id && u.email == changes.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        let Some(row) = table.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        row.name = changes.name;
        row.email = changes.email;
        row.password_hash = changes.password_hash;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        Ok(table.rows.len() < before)
    }
}
