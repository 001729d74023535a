//! In-memory user store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::store::{StoreError, User, UserStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryUsers {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate(user.email.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}
