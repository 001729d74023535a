//! User account storage.
//!
//! # Implementations
//! - `postgres.rs`: sqlx-backed store for deployments
//! - `memory.rs`: in-process store for development and tests

pub mod memory;
pub mod postgres;

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};

pub use memory::MemoryUsers;
pub use postgres::PgUsers;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the lookup.
    #[error("not found")]
    NotFound,

    #[error("user with e-mail {0} already exists")]
    Duplicate(String),

    #[error("invalid table name '{0}'")]
    InvalidTable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A user account. `password` holds the Argon2 hash and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password: String,
}

impl User {
    /// Create a user with a fresh id, hashing the plain password.
    pub fn new(email: impl Into<String>, plain_password: &str) -> Result<Self, PasswordError> {
        Ok(Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password: password::hash_password(plain_password)?,
        })
    }

    /// Whether `plain_password` matches the stored hash. Empty input never matches.
    pub fn is_valid_password(&self, plain_password: &str) -> bool {
        password::verify_password(plain_password, &self.password)
    }
}

/// Lookup and insertion of user accounts.
pub trait UserStore: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn find_by_email(&self, email: &str)
        -> impl Future<Output = Result<User, StoreError>> + Send;

    fn insert(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;
}
